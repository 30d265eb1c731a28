/*
 * lambda.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Lambda invocation.
//!
//! A lambda found in interpolation or section position is called with the
//! current scope as `this`. When it returns another lambda, that inner
//! lambda is higher-order: it is called with the section's raw source text
//! (or with no text in interpolation position), and whatever it returns is
//! compiled as a template and rendered against the current context stack.

use crate::compiler::compile_with;
use crate::context::{ContextStack, Lookup};
use crate::error::{TemplateError, TemplateResult};
use crate::options::{CompileOptions, Delimiters};
use crate::partial::Instance;
use crate::render::RenderFrame;
use crate::section::SectionKind;
use crate::value::{Lambda, Value};
use std::ops::Range;

/// What a lambda in section position turned into.
pub(crate) enum LambdaSection {
    /// A higher-order lambda whose output has been written to the buffer.
    Expanded,
    /// A higher-order lambda in an inverted section: the body is skipped.
    Suppressed,
    /// A plain value, evaluated like any other section value.
    Value(Value),
}

impl RenderFrame<'_> {
    /// Invoke a lambda found in section position.
    pub(crate) fn lambda_section(
        &mut self,
        instance: Instance<'_>,
        lambda: &Lambda,
        stack: &mut ContextStack,
        kind: SectionKind<'_>,
    ) -> TemplateResult<LambdaSection> {
        let this = stack.top().cloned().unwrap_or_default();
        let expand = match lambda.call(&this, None) {
            Value::Lambda(expand) => expand,
            value => return Ok(LambdaSection::Value(value)),
        };

        let SectionKind::Normal(section) = kind else {
            return Ok(LambdaSection::Suppressed);
        };

        let source = self.call_source(instance);
        let text = slice_source(&source, &section.span);
        let output = expand.call(&this, Some(text));
        let rendered =
            self.render_lambda_output(instance, &output.to_text(), stack, Some(&section.delimiters))?;
        self.buf.push_str(&rendered);
        Ok(LambdaSection::Expanded)
    }

    /// Invoke a lambda found in interpolation position and return the value
    /// to interpolate.
    ///
    /// Lambdas reached through a dotted key are bound to their owner, which
    /// is pushed for the duration of the call.
    pub(crate) fn lambda_value(
        &mut self,
        instance: Instance<'_>,
        lambda: &Lambda,
        owner: Option<Value>,
        stack: &mut ContextStack,
    ) -> TemplateResult<Value> {
        let bound = owner.is_some();
        if let Some(owner) = owner {
            stack.push(owner);
        }

        let this = stack.top().cloned().unwrap_or_default();
        let result = match lambda.call(&this, None) {
            Value::Lambda(expand) => {
                let output = expand.call(&this, None);
                self.render_lambda_output(instance, &output.to_text(), stack, None)
                    .map(Value::String)
            }
            value => Ok(value),
        };

        if bound {
            stack.pop();
        }
        result
    }

    /// Resolve a key in interpolation position.
    ///
    /// When the first segment of a dotted key names a lambda, the lambda is
    /// invoked and the rest of the key is resolved against its result.
    pub(crate) fn lookup_interpolated(
        &mut self,
        instance: Instance<'_>,
        key: &str,
        stack: &mut ContextStack,
    ) -> TemplateResult<Lookup> {
        let model_get = instance.template().options.model_get;
        if let Some((first, rest)) = key.split_once('.').filter(|_| key != ".") {
            if let Some(Value::Lambda(lambda)) = stack.find(first, model_get) {
                let value = self.lambda_value(instance, &lambda, None, stack)?;
                return Ok(Lookup::resolve(value, rest.split('.'), model_get));
            }
        }
        Ok(stack.lookup(key, model_get, false))
    }

    /// Compile lambda output as a template and render it against `stack`.
    ///
    /// The output is compiled with the options of the template the lambda
    /// was found in, and with the section's delimiters when it came from a
    /// section.
    pub(crate) fn render_lambda_output(
        &mut self,
        instance: Instance<'_>,
        text: &str,
        stack: &mut ContextStack,
        delimiters: Option<&Delimiters>,
    ) -> TemplateResult<String> {
        let template = instance.template();
        if template.options.disable_lambda {
            return Err(TemplateError::LambdaDisabled);
        }
        let compiler = template
            .compiler
            .as_ref()
            .or(self.pool.compiler())
            .ok_or_else(|| TemplateError::MissingCompiler {
                context: "lambda output".to_string(),
            })?;

        let options = match delimiters {
            Some(delimiters) => CompileOptions {
                delimiters: delimiters.clone(),
                ..template.options.clone()
            },
            None => template.options.clone(),
        };
        tracing::debug!(len = text.len(), "Compiling lambda output");
        let compiled = compile_with(compiler, text, &options)?;

        self.enter("lambda")?;
        let outer_buf = std::mem::take(&mut self.buf);
        let outer_sub = self.active_sub.take();
        let result = self.render_instance(Instance::Base(&compiled), stack, "");
        self.active_sub = outer_sub;
        let rendered = std::mem::replace(&mut self.buf, outer_buf);
        self.leave();

        result.map(|()| rendered)
    }
}

/// The section body text for a lambda, or `""` when `span` does not fall on
/// character boundaries inside `source`.
fn slice_source<'s>(source: &'s str, span: &Range<usize>) -> &'s str {
    source.get(span.clone()).unwrap_or_else(|| {
        tracing::warn!(
            start = span.start,
            end = span.end,
            len = source.len(),
            "Section span outside template source"
        );
        ""
    })
}
