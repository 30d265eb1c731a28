/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Compile-time and render-time configuration.
//!
//! Both option structs deserialize with defaults for any missing field, so
//! hosts can keep them in a JSON or TOML configuration file.

use serde::{Deserialize, Serialize};

/// Default bound on nested partial inclusion and lambda expansion.
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// The open/close tag markers active for a span of template text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Delimiters {
    pub open: String,
    pub close: String,
}

impl Delimiters {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new("{{", "}}")
    }
}

/// Options handed to the compiler, and remembered by the templates it
/// produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Delimiters in effect. Lambda sections compile their output with the
    /// delimiters that were active around the section.
    pub delimiters: Delimiters,

    /// Resolve names through [`Model::get`](crate::Model::get) on host objects.
    pub model_get: bool,

    /// Refuse to expand higher-order lambdas.
    pub disable_lambda: bool,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    pub fn with_model_get(mut self, enabled: bool) -> Self {
        self.model_get = enabled;
        self
    }

    pub fn with_disable_lambda(mut self, disabled: bool) -> Self {
        self.disable_lambda = disabled;
        self
    }
}

/// Per-call render configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Maximum nesting of partials and lambda expansions before the render
    /// fails with [`TemplateError::RecursionLimitExceeded`](crate::TemplateError::RecursionLimitExceeded).
    pub max_depth: usize,

    /// Strict mode: a partial missing from the pool is an error instead of
    /// empty output.
    pub strict_partials: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strict_partials: false,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum nesting depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Enable or disable strict partial resolution.
    pub fn with_strict_partials(mut self, strict: bool) -> Self {
        self.strict_partials = strict;
        self
    }
}
