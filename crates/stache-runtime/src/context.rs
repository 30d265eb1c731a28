/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The context stack.
//!
//! Scopes are pushed when a section is entered and popped when it is left.
//! Names resolve against the innermost scope that defines them; the rest of
//! a dotted name is then resolved against that value alone.

use crate::value::Value;

/// An ordered stack of lookup scopes, innermost last.
#[derive(Debug, Clone, Default)]
pub struct ContextStack {
    scopes: Vec<Value>,
}

/// The outcome of resolving a key against a [`ContextStack`].
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    /// The resolved value.
    pub value: Value,

    /// For dotted keys, the object the last segment was read from. Lambdas
    /// found this way are bound to it.
    pub owner: Option<Value>,
}

impl Lookup {
    fn missing(return_found: bool) -> Self {
        let value = if return_found {
            Value::Bool(false)
        } else {
            Value::String(String::new())
        };
        Lookup { value, owner: None }
    }
}

impl Lookup {
    /// Resolve the segments after the first one of a dotted key against
    /// `value` alone.
    pub fn resolve<'k>(
        mut value: Value,
        segments: impl IntoIterator<Item = &'k str>,
        model_get: bool,
    ) -> Self {
        let mut owner = None;
        for segment in segments {
            match value.field(segment, model_get) {
                Some(found) => owner = Some(std::mem::replace(&mut value, found)),
                None => {
                    // Missing intermediate segments degrade to "".
                    value = Value::String(String::new());
                    break;
                }
            }
        }
        Lookup { value, owner }
    }
}

impl ContextStack {
    /// Create a stack holding a single root scope.
    pub fn new(root: Value) -> Self {
        Self { scopes: vec![root] }
    }

    /// Enter a new scope.
    pub fn push(&mut self, scope: Value) {
        self.scopes.push(scope);
    }

    /// Leave the innermost scope.
    pub fn pop(&mut self) -> Option<Value> {
        self.scopes.pop()
    }

    /// The innermost scope.
    pub fn top(&self) -> Option<&Value> {
        self.scopes.last()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Find a single name, scanning from the innermost scope outwards.
    ///
    /// A scope that defines the name wins even if the value is falsy.
    pub fn find(&self, name: &str, model_get: bool) -> Option<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.field(name, model_get))
    }

    /// Resolve a (possibly dotted) key.
    ///
    /// With `return_found`, a missing or falsy result is reported as
    /// `false`; otherwise a missing key resolves to the empty string and
    /// falsy values are returned as they are.
    pub fn lookup(&self, key: &str, model_get: bool, return_found: bool) -> Lookup {
        let mut lookup = if key == "." && self.iterating_array() {
            Lookup {
                value: self.top().cloned().unwrap_or_default(),
                owner: None,
            }
        } else {
            let mut segments = key.split('.');
            let first = segments.next().unwrap_or(key);
            let Some(value) = self.find(first, model_get) else {
                return Lookup::missing(return_found);
            };
            Lookup::resolve(value, segments, model_get)
        };

        if return_found && !lookup.value.is_truthy() {
            lookup.value = Value::Bool(false);
        }
        lookup
    }

    /// Whether the scope below the top is an array, i.e. the top is the
    /// current element of an array section.
    fn iterating_array(&self) -> bool {
        self.scopes.len() >= 2
            && matches!(self.scopes[self.scopes.len() - 2], Value::Array(_))
    }
}
