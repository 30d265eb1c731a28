/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Context values.
//!
//! Anything a template can look up lives in a [`Value`]: maps, arrays,
//! scalars, callables ([`Lambda`]) and host objects that answer keyed
//! lookups ([`Model`]). Truthiness and textual conversion follow the
//! JavaScript conventions Mustache templates are written against, so that
//! `0`, `""` and `null` are falsy while empty maps and arrays are not.

use indexmap::IndexMap;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// A value that can appear on the context stack.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// A null/missing value.
    #[default]
    Null,

    /// A boolean value.
    Bool(bool),

    /// A number. All numbers are doubles, as in JSON.
    Number(f64),

    /// A string value.
    String(String),

    /// A list of values.
    Array(Vec<Value>),

    /// An ordered map of string keys to values.
    Map(IndexMap<String, Value>),

    /// A callable value.
    Lambda(Lambda),

    /// A host object resolved through [`Model::get`].
    Model(Arc<dyn Model>),
}

/// Host objects that expose fields through a `get(key)` method.
///
/// Models are only consulted when the template was compiled with
/// `model_get` enabled; otherwise they behave like an object with no fields.
pub trait Model: fmt::Debug + Send + Sync {
    /// Look up a field by name.
    fn get(&self, key: &str) -> Option<Value>;

    /// Textual form used when the model itself is interpolated.
    fn to_text(&self) -> String {
        OBJECT_TEXT.to_string()
    }
}

const OBJECT_TEXT: &str = "[object Object]";

/// Arguments passed to a [`Lambda`] when it is invoked.
#[derive(Debug, Clone, Copy)]
pub struct LambdaCall<'a> {
    /// The scope the lambda is bound to (top of the context stack, or the
    /// owning object for dotted lookups).
    pub this: &'a Value,

    /// Raw template text of the section body, when the lambda is the
    /// second stage of a section lambda.
    pub text: Option<&'a str>,
}

type LambdaFn = dyn Fn(LambdaCall<'_>) -> Value + Send + Sync;

/// A callable context value.
///
/// A lambda returning a plain value acts as a computed property. A lambda
/// returning another `Lambda` is higher-order: the inner lambda receives the
/// section text and its output is compiled and rendered as a template.
#[derive(Clone)]
pub struct Lambda(Arc<LambdaFn>);

impl Lambda {
    /// Wrap a closure as a lambda value.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(LambdaCall<'_>) -> Value + Send + Sync + 'static,
    {
        Lambda(Arc::new(f))
    }

    /// Build a higher-order lambda from a text transformation.
    ///
    /// The closure receives the raw section text (empty in interpolation
    /// position) and returns template source, which is compiled and rendered
    /// against the current context.
    pub fn template<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Lambda::new(move |_| {
            let f = Arc::clone(&f);
            Value::Lambda(Lambda::new(move |call| {
                Value::String(f(call.text.unwrap_or("")))
            }))
        })
    }

    /// Invoke the lambda.
    pub fn call(&self, this: &Value, text: Option<&str>) -> Value {
        (self.0)(LambdaCall { this, text })
    }

    /// Whether two handles refer to the same closure.
    pub fn ptr_eq(&self, other: &Lambda) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Lambda(..)")
    }
}

impl Value {
    /// Check if this value is "truthy" for section evaluation.
    ///
    /// - `Null`, `false`, `0`, `NaN` and the empty string are falsy
    /// - Everything else is truthy, including empty maps and arrays
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Map(_) | Value::Lambda(_) | Value::Model(_) => true,
        }
    }

    /// Whether a section over this value introduces a new lookup scope.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Map(_) | Value::Model(_))
    }

    /// Look up an own field of this value.
    ///
    /// Maps answer with their entries, arrays with `length` and numeric
    /// indices, and models with [`Model::get`] when `model_get` is set.
    /// Scalars have no fields.
    pub fn field(&self, key: &str, model_get: bool) -> Option<Value> {
        match self {
            Value::Map(map) => map.get(key).cloned(),
            Value::Array(items) => {
                if key == "length" {
                    Some(Value::Number(items.len() as f64))
                } else {
                    key.parse::<usize>()
                        .ok()
                        .and_then(|index| items.get(index).cloned())
                }
            }
            Value::Model(model) if model_get => model.get(key),
            _ => None,
        }
    }

    /// Render this value as text.
    ///
    /// - Null and lambdas: ""
    /// - Bool: "true" / "false"
    /// - Number: shortest decimal form (`3`, `1.5`, `NaN`, `Infinity`)
    /// - Array: elements joined with ","
    /// - Map and models: "[object Object]"
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Value::Null | Value::Lambda(_) => Cow::Borrowed(""),
            Value::Bool(true) => Cow::Borrowed("true"),
            Value::Bool(false) => Cow::Borrowed("false"),
            Value::Number(n) => Cow::Owned(format_number(*n)),
            Value::String(s) => Cow::Borrowed(s),
            Value::Array(items) => Cow::Owned(
                items
                    .iter()
                    .map(|item| item.to_text())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            Value::Map(_) => Cow::Borrowed(OBJECT_TEXT),
            Value::Model(model) => Cow::Owned(model.to_text()),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        // Covers negative zero.
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        exponent_form(n)
    } else {
        n.to_string()
    }
}

/// `1e+21`, `1.5e-7`: shortest digits with an explicitly signed exponent.
fn exponent_form(n: f64) -> String {
    let text = format!("{n:e}");
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => text,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Lambda(a), Value::Lambda(b)) => a.ptr_eq(b),
            (Value::Model(a), Value::Model(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<Lambda> for Value {
    fn from(lambda: Lambda) -> Self {
        Value::Lambda(lambda)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}
