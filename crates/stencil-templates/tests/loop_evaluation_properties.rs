//! Property-based tests for loop evaluation
//! **Property: loops unroll in order with correct metadata, nested loops
//! fully unroll per outer item, and exactly one trailing comma is stripped**

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use stencil_templates::{TemplateContext, TemplateEngine};

fn item_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,5}"
}

fn context(value: Value) -> TemplateContext {
    TemplateContext::from_value(value).unwrap()
}

proptest! {
    /// Property: @index, @first and @last follow item positions
    #[test]
    fn prop_loop_metadata(items in prop::collection::vec(item_strategy(), 0..8)) {
        let engine = TemplateEngine::new();
        let rendered = engine.render(
            "{{#each items}}{{@index}}:{{@first}}:{{@last}}:{{this}} {{/each}}",
            &context(json!({ "items": items })),
        );

        let expected: String = items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}:{}:{}:{} ", i, i == 0, i + 1 == items.len(), item))
            .collect();
        prop_assert_eq!(rendered, expected);
    }

    /// Property: nested loops render every inner item in order
    #[test]
    fn prop_nested_loops_unroll(outer in prop::collection::vec(prop::collection::vec(item_strategy(), 0..4), 0..5)) {
        let value: Vec<Value> = outer.iter().map(|inner| json!({ "inner": inner })).collect();
        let engine = TemplateEngine::new();
        let rendered = engine.render(
            "{{#each outer}}{{#each inner}}{{this}}{{/each}}{{/each}}",
            &context(json!({ "outer": value })),
        );
        prop_assert_eq!(rendered, outer.concat().concat());
    }

    /// Property: comma-separated items lose only the final comma
    #[test]
    fn prop_trailing_comma_stripped(items in prop::collection::vec(item_strategy(), 0..8)) {
        let engine = TemplateEngine::new();
        let rendered = engine.render(
            "[{{#each items}}\"{{this}}\",{{/each}}]",
            &context(json!({ "items": items })),
        );
        let expected = format!(
            "[{}]",
            items.iter().map(|i| format!("\"{}\"", i)).collect::<Vec<_>>().join(",")
        );
        prop_assert_eq!(rendered, expected);
    }

    /// Property: maps iterate in insertion order with @key bound
    #[test]
    fn prop_map_iteration_order(entries in prop::collection::btree_map("[a-z]{1,6}", item_strategy(), 0..6)) {
        let mut map = Map::new();
        for (key, value) in &entries {
            map.insert(key.clone(), Value::String(value.clone()));
        }
        let engine = TemplateEngine::new();
        let rendered = engine.render(
            "{{#each deps}}{{@key}}={{this}};{{/each}}",
            &context(json!({ "deps": Value::Object(map) })),
        );
        let expected: String = entries.iter().map(|(k, v)| format!("{}={};", k, v)).collect();
        prop_assert_eq!(rendered, expected);
    }

    /// Property: loop evaluation leaves the caller's context untouched
    #[test]
    fn prop_context_not_mutated(names in prop::collection::vec(item_strategy(), 0..5)) {
        let rows: Vec<Value> = names.iter().map(|n| json!({ "name": n, "extra": 1 })).collect();
        let ctx = context(json!({ "name": "outer", "rows": rows }));
        let before = ctx.clone();
        let engine = TemplateEngine::new();
        let rendered = engine.render("{{#each rows}}{{name}}{{/each}}|{{name}}", &ctx);
        prop_assert_eq!(ctx, before);
        prop_assert_eq!(rendered, format!("{}|outer", names.concat()));
    }

    /// Property: object items shadow outer values of the same name
    #[test]
    fn prop_item_fields_shadow(fields in prop::collection::btree_map("v[a-z]{1,4}", item_strategy(), 1..4)) {
        let item: Map<String, Value> = fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        let mut root = Map::new();
        for key in fields.keys() {
            root.insert(key.clone(), Value::String("outer".to_string()));
        }
        root.insert("items".to_string(), json!([Value::Object(item)]));

        let template: String = fields
            .keys()
            .map(|k| format!("{{{{#each items}}}}{{{{{}}}}}{{{{/each}}}}", k))
            .collect();
        let expected: String = fields.values().cloned().collect();

        let rendered = TemplateEngine::new().render(&template, &context(Value::Object(root)));
        prop_assert_eq!(rendered, expected);
    }
}
