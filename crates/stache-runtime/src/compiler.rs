/*
 * compiler.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The compiler boundary.
//!
//! Turning template source into a [`Template`] is the job of an external
//! compiler. The runtime only calls it when it has to: for partials supplied
//! as source text, and for the output of higher-order lambdas.

use crate::error::TemplateResult;
use crate::options::CompileOptions;
use crate::template::Template;
use std::sync::Arc;

/// Trait for compiling template source text.
///
/// Implementations should honour `options.delimiters`, which differ from the
/// defaults when a lambda section was written under custom delimiters.
pub trait Compiler: Send + Sync {
    /// Compile `source` into a template.
    ///
    /// The returned template should keep `source` (see
    /// [`Template::with_source`]) so that section lambdas inside it can be
    /// handed their raw text.
    fn compile(&self, source: &str, options: &CompileOptions) -> TemplateResult<Template>;
}

/// Compile `source` and attach the compiler to the result, so that lambdas
/// and source partials reached from it can be compiled in turn.
pub(crate) fn compile_with(
    compiler: &Arc<dyn Compiler>,
    source: &str,
    options: &CompileOptions,
) -> TemplateResult<Arc<Template>> {
    let mut template = compiler.compile(source, options)?;
    if template.compiler.is_none() {
        template.compiler = Some(Arc::clone(compiler));
    }
    Ok(Arc::new(template))
}
