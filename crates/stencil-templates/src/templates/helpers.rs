//! Helper registry and built-in helpers
//!
//! Helpers are pure functions of positional arguments. Built-ins are a closed
//! enum; caller-supplied helpers are plain function pointers. Both sit behind
//! a single name map, and registering an existing name replaces the entry.

use std::{cmp::Ordering, collections::HashMap};

use chrono::{Datelike, Utc};
use heck::{ToKebabCase, ToLowerCamelCase, ToPascalCase, ToSnakeCase};
use parking_lot::RwLock;
use serde_json::Value;

use crate::{error::HelperError, templates::resolver::stringify};

/// Signature of a caller-supplied helper
pub type HelperFn = fn(&[Value]) -> Result<Value, HelperError>;

/// Default separator used by `join` when none is given
pub const DEFAULT_JOIN_SEPARATOR: &str = ", ";

/// Helpers shipped with the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinHelper {
    /// Uppercase the first character
    Capitalize,
    /// camelCase
    CamelCase,
    /// PascalCase
    PascalCase,
    /// kebab-case
    KebabCase,
    /// snake_case
    SnakeCase,
    /// lowercase
    LowerCase,
    /// UPPERCASE
    UpperCase,
    /// Join an array with a separator
    Join,
    /// First element of an array
    First,
    /// Last element of an array
    Last,
    /// Equality
    Eq,
    /// Inequality
    Ne,
    /// Less than
    Lt,
    /// Less than or equal
    Lte,
    /// Greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Current UTC timestamp (RFC 3339)
    Now,
    /// Current UTC year
    Year,
}

impl BuiltinHelper {
    /// Every built-in, in registration order
    pub const ALL: [BuiltinHelper; 18] = [
        BuiltinHelper::Capitalize,
        BuiltinHelper::CamelCase,
        BuiltinHelper::PascalCase,
        BuiltinHelper::KebabCase,
        BuiltinHelper::SnakeCase,
        BuiltinHelper::LowerCase,
        BuiltinHelper::UpperCase,
        BuiltinHelper::Join,
        BuiltinHelper::First,
        BuiltinHelper::Last,
        BuiltinHelper::Eq,
        BuiltinHelper::Ne,
        BuiltinHelper::Lt,
        BuiltinHelper::Lte,
        BuiltinHelper::Gt,
        BuiltinHelper::Gte,
        BuiltinHelper::Now,
        BuiltinHelper::Year,
    ];

    /// Name the helper is registered under
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinHelper::Capitalize => "capitalize",
            BuiltinHelper::CamelCase => "camelCase",
            BuiltinHelper::PascalCase => "pascalCase",
            BuiltinHelper::KebabCase => "kebabCase",
            BuiltinHelper::SnakeCase => "snakeCase",
            BuiltinHelper::LowerCase => "lowercase",
            BuiltinHelper::UpperCase => "uppercase",
            BuiltinHelper::Join => "join",
            BuiltinHelper::First => "first",
            BuiltinHelper::Last => "last",
            BuiltinHelper::Eq => "eq",
            BuiltinHelper::Ne => "ne",
            BuiltinHelper::Lt => "lt",
            BuiltinHelper::Lte => "lte",
            BuiltinHelper::Gt => "gt",
            BuiltinHelper::Gte => "gte",
            BuiltinHelper::Now => "now",
            BuiltinHelper::Year => "year",
        }
    }

    /// Invoke the helper
    pub fn call(&self, args: &[Value]) -> Result<Value, HelperError> {
        let name = self.name();
        match self {
            BuiltinHelper::Capitalize => {
                let text = single_text(name, args)?;
                let mut chars = text.chars();
                Ok(Value::String(match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }))
            }
            BuiltinHelper::CamelCase => {
                Ok(Value::String(single_text(name, args)?.to_lower_camel_case()))
            }
            BuiltinHelper::PascalCase => Ok(Value::String(single_text(name, args)?.to_pascal_case())),
            BuiltinHelper::KebabCase => Ok(Value::String(single_text(name, args)?.to_kebab_case())),
            BuiltinHelper::SnakeCase => Ok(Value::String(single_text(name, args)?.to_snake_case())),
            BuiltinHelper::LowerCase => Ok(Value::String(single_text(name, args)?.to_lowercase())),
            BuiltinHelper::UpperCase => Ok(Value::String(single_text(name, args)?.to_uppercase())),
            BuiltinHelper::Join => {
                expect_args(name, args, 1, 2)?;
                let separator = args
                    .get(1)
                    .map(stringify)
                    .unwrap_or_else(|| DEFAULT_JOIN_SEPARATOR.to_string());
                Ok(Value::String(match &args[0] {
                    Value::Array(items) => items
                        .iter()
                        .map(stringify)
                        .collect::<Vec<_>>()
                        .join(&separator),
                    other => stringify(other),
                }))
            }
            BuiltinHelper::First => {
                expect_args(name, args, 1, 1)?;
                let items = array_arg(name, &args[0])?;
                Ok(items.first().cloned().unwrap_or(Value::Null))
            }
            BuiltinHelper::Last => {
                expect_args(name, args, 1, 1)?;
                let items = array_arg(name, &args[0])?;
                Ok(items.last().cloned().unwrap_or(Value::Null))
            }
            BuiltinHelper::Eq => {
                expect_args(name, args, 2, 2)?;
                Ok(Value::Bool(values_equal(&args[0], &args[1])))
            }
            BuiltinHelper::Ne => {
                expect_args(name, args, 2, 2)?;
                Ok(Value::Bool(!values_equal(&args[0], &args[1])))
            }
            BuiltinHelper::Lt => compare(name, args, |o| o == Ordering::Less),
            BuiltinHelper::Lte => compare(name, args, |o| o != Ordering::Greater),
            BuiltinHelper::Gt => compare(name, args, |o| o == Ordering::Greater),
            BuiltinHelper::Gte => compare(name, args, |o| o != Ordering::Less),
            BuiltinHelper::Now => Ok(Value::String(Utc::now().to_rfc3339())),
            BuiltinHelper::Year => Ok(Value::from(Utc::now().year())),
        }
    }
}

fn expect_args(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), HelperError> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{}-{}", min, max)
        };
        return Err(HelperError::ArgumentCount {
            helper: name.to_string(),
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}

fn single_text(name: &str, args: &[Value]) -> Result<String, HelperError> {
    expect_args(name, args, 1, 1)?;
    Ok(stringify(&args[0]))
}

fn array_arg<'v>(name: &str, value: &'v Value) -> Result<&'v [Value], HelperError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(HelperError::InvalidArgument {
            helper: name.to_string(),
            message: format!("expected an array, got {}", crate::models::type_name(other)),
        }),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Structural equality, with numbers and numeric strings compared by value
fn values_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
            matches!((as_number(a), as_number(b)), (Some(x), Some(y)) if x == y)
        }
        _ => false,
    }
}

fn compare(
    name: &str,
    args: &[Value],
    accept: impl Fn(Ordering) -> bool,
) -> Result<Value, HelperError> {
    expect_args(name, args, 2, 2)?;
    let ordering = match (as_number(&args[0]), as_number(&args[1])) {
        (Some(x), Some(y)) => x.partial_cmp(&y).ok_or_else(|| HelperError::InvalidArgument {
            helper: name.to_string(),
            message: "values are not comparable".to_string(),
        })?,
        _ => stringify(&args[0]).cmp(&stringify(&args[1])),
    };
    Ok(Value::Bool(accept(ordering)))
}

/// Registered helper entry
#[derive(Clone, Copy)]
pub enum HelperHandle {
    /// Engine-provided helper
    Builtin(BuiltinHelper),
    /// Caller-provided helper
    Custom(HelperFn),
}

impl HelperHandle {
    /// Invoke the helper
    pub fn call(&self, args: &[Value]) -> Result<Value, HelperError> {
        match self {
            HelperHandle::Builtin(builtin) => builtin.call(args),
            HelperHandle::Custom(f) => f(args),
        }
    }
}

impl std::fmt::Debug for HelperHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HelperHandle::Builtin(builtin) => write!(f, "Builtin({})", builtin.name()),
            HelperHandle::Custom(_) => write!(f, "Custom(fn)"),
        }
    }
}

/// Name to helper table, safe to share between threads
#[derive(Debug)]
pub struct HelperRegistry {
    helpers: RwLock<HashMap<String, HelperHandle>>,
}

impl HelperRegistry {
    /// Registry pre-populated with every built-in
    pub fn new() -> Self {
        let registry = Self::empty();
        {
            let mut helpers = registry.helpers.write();
            for builtin in BuiltinHelper::ALL {
                helpers.insert(builtin.name().to_string(), HelperHandle::Builtin(builtin));
            }
        }
        registry
    }

    /// Registry with no helpers at all
    pub fn empty() -> Self {
        Self {
            helpers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a helper, replacing any existing entry with the same name
    pub fn register(&self, name: impl Into<String>, helper: HelperFn) {
        let name = name.into();
        let replaced = self
            .helpers
            .write()
            .insert(name.clone(), HelperHandle::Custom(helper))
            .is_some();
        tracing::debug!(helper = %name, replaced, "Registered template helper");
    }

    /// Whether a helper is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.helpers.read().contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.helpers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Look up and invoke a helper
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, HelperError> {
        // Copy the handle out so the lock is not held while the helper runs.
        let handle = self
            .helpers
            .read()
            .get(name)
            .copied()
            .ok_or_else(|| HelperError::UnknownHelper(name.to_string()))?;
        handle.call(args)
    }
}

impl Default for HelperRegistry {
    fn default() -> Self {
        Self::new()
    }
}
