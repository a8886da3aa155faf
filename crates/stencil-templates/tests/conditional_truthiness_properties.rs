//! Property-based tests for conditional truthiness
//! **Property: `{{#if x}}Y{{/if}}` renders Y exactly when x is truthy**

use proptest::prelude::*;
use serde_json::{json, Value};
use stencil_templates::{is_truthy, TemplateContext, TemplateEngine};

fn render_if(value: Value) -> String {
    let context = TemplateContext::from_value(json!({ "x": value })).unwrap();
    TemplateEngine::new().render("{{#if x}}Y{{/if}}", &context)
}

proptest! {
    /// Property: integers are truthy iff non-zero
    #[test]
    fn prop_integers(n in any::<i64>()) {
        prop_assert_eq!(render_if(json!(n)), if n != 0 { "Y" } else { "" });
    }

    /// Property: strings are truthy iff non-empty
    #[test]
    fn prop_strings(s in "[a-z ]{0,6}") {
        let expected = if s.is_empty() { "" } else { "Y" };
        prop_assert_eq!(render_if(json!(s)), expected);
    }

    /// Property: booleans pass through
    #[test]
    fn prop_booleans(b in any::<bool>()) {
        prop_assert_eq!(render_if(json!(b)), if b { "Y" } else { "" });
    }

    /// Property: collections are truthy iff non-empty
    #[test]
    fn prop_arrays(items in prop::collection::vec(any::<u8>(), 0..4)) {
        let expected = if items.is_empty() { "" } else { "Y" };
        prop_assert_eq!(render_if(json!(items)), expected);
    }

    /// Property: rendering agrees with `is_truthy` on the resolved value
    #[test]
    fn prop_render_agrees_with_is_truthy(f in any::<f64>().prop_filter("finite", |f| f.is_finite())) {
        let value = json!(f);
        let expected = if is_truthy(Some(&value)) { "Y" } else { "" };
        prop_assert_eq!(render_if(value), expected);
    }

    /// Property: conditions on absent paths are always false
    #[test]
    fn prop_absent_is_false(path in "[a-z]{1,6}(\\.[a-z]{1,6}){0,2}") {
        let template = format!("{{{{#if {}}}}}Y{{{{/if}}}}", path);
        prop_assert_eq!(TemplateEngine::new().render(&template, &TemplateContext::new()), "");
    }
}

#[test]
fn test_null_is_false() {
    assert_eq!(render_if(Value::Null), "");
}
