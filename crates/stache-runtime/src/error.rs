/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for template compilation and rendering.
//!
//! Missing keys and (by default) missing partials are not errors: they render
//! as empty text. Every variant here aborts the render in progress.

use thiserror::Error;

/// Errors that can occur during template operations.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Error reported by a [`Compiler`](crate::Compiler) implementation.
    #[error("Parse error: {message}")]
    ParseError { message: String },

    /// Template text had to be compiled but no compiler was configured.
    #[error("No compiler available to compile {context}")]
    MissingCompiler { context: String },

    /// A higher-order lambda was expanded with lambdas disabled.
    #[error("Lambda features disabled")]
    LambdaDisabled,

    /// A partial was missing from the pool in strict mode.
    #[error("Partial not found: {name}")]
    PartialNotFound { name: String },

    /// Partial inclusion or lambda expansion nested too deeply, usually a
    /// partial that includes itself.
    #[error("Recursion limit exceeded (depth > {max_depth}): {name}")]
    RecursionLimitExceeded { name: String, max_depth: usize },
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;
