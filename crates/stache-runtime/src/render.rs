/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template rendering.
//!
//! Every render call owns a [`RenderFrame`]: the output buffer, the block
//! override currently being rendered and the nesting depth. Templates and
//! pools are only read, so a single `Arc<Template>` can be rendered from
//! many threads at once.

use crate::context::{ContextStack, Lookup};
use crate::error::{TemplateError, TemplateResult};
use crate::escape::escape;
use crate::options::RenderOptions;
use crate::partial::{Instance, PartialPool, resolve_partial};
use crate::program::{Node, PartialCall, Program, Variable};
use crate::section::SectionKind;
use crate::template::Template;
use crate::value::Value;
use std::sync::Arc;

/// Per-call render state.
pub(crate) struct RenderFrame<'a> {
    pub(crate) buf: String,

    /// Source of the block override being rendered, if any. Section lambdas
    /// inside an override are handed text sliced from it.
    pub(crate) active_sub: Option<Arc<str>>,

    depth: usize,
    pub(crate) pool: &'a PartialPool,
    options: &'a RenderOptions,
}

impl<'a> RenderFrame<'a> {
    pub(crate) fn new(pool: &'a PartialPool, options: &'a RenderOptions) -> Self {
        Self {
            buf: String::new(),
            active_sub: None,
            depth: 0,
            pool,
            options,
        }
    }

    pub(crate) fn finish(self) -> String {
        self.buf
    }

    /// Enter a nested partial or lambda expansion.
    pub(crate) fn enter(&mut self, name: &str) -> TemplateResult<()> {
        if self.depth >= self.options.max_depth {
            tracing::warn!(
                name,
                max_depth = self.options.max_depth,
                "Recursion limit exceeded"
            );
            return Err(TemplateError::RecursionLimitExceeded {
                name: name.to_string(),
                max_depth: self.options.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Source the code being executed was written in.
    pub(crate) fn call_source(&self, instance: Instance<'_>) -> Arc<str> {
        match &self.active_sub {
            Some(source) => Arc::clone(source),
            None => Arc::clone(instance.source()),
        }
    }

    /// Render a whole template, starting with its indentation.
    pub(crate) fn render_instance(
        &mut self,
        instance: Instance<'_>,
        stack: &mut ContextStack,
        indent: &str,
    ) -> TemplateResult<()> {
        self.buf.push_str(indent);
        self.render_program(instance, instance.program(), stack, indent)
    }

    pub(crate) fn render_program(
        &mut self,
        instance: Instance<'_>,
        program: &Program,
        stack: &mut ContextStack,
        indent: &str,
    ) -> TemplateResult<()> {
        let model_get = instance.template().options.model_get;

        for node in program.nodes() {
            match node {
                Node::Text(text) => self.buf.push_str(text),
                Node::Newline => {
                    self.buf.push('\n');
                    self.buf.push_str(indent);
                }
                Node::Variable(variable) => self.interpolate(instance, variable, stack)?,
                Node::Section(section) => {
                    let value = stack.lookup(&section.key, model_get, true).value;
                    let kind = SectionKind::Normal(section);
                    if self.evaluate_section(instance, value, stack, kind)? {
                        let result = self.iterate_section(stack, |frame, stack| {
                            frame.render_program(instance, &section.body, stack, indent)
                        });
                        stack.pop();
                        result?;
                    }
                }
                Node::Inverted(inverted) => {
                    let value = stack.lookup(&inverted.key, model_get, true).value;
                    if !self.evaluate_section(instance, value, stack, SectionKind::Inverted)? {
                        self.render_program(instance, &inverted.body, stack, indent)?;
                    }
                }
                Node::Partial(call) => self.render_partial(instance, call, stack, indent)?,
                Node::Block(block) => self.render_block(instance, &block.name, stack, indent)?,
            }
        }
        Ok(())
    }

    fn interpolate(
        &mut self,
        instance: Instance<'_>,
        variable: &Variable,
        stack: &mut ContextStack,
    ) -> TemplateResult<()> {
        let Lookup { value, owner } = self.lookup_interpolated(instance, &variable.key, stack)?;

        let value = match value {
            Value::Lambda(lambda) => self.lambda_value(instance, &lambda, owner, stack)?,
            other => other,
        };

        if variable.escape {
            self.buf.push_str(&escape(&value));
        } else {
            self.buf.push_str(&value.to_text());
        }
        Ok(())
    }

    fn render_partial(
        &mut self,
        instance: Instance<'_>,
        call: &PartialCall,
        stack: &mut ContextStack,
        indent: &str,
    ) -> TemplateResult<()> {
        let source = self.call_source(instance);
        let strict = self.options.strict_partials;
        let Some((name, resolved)) =
            resolve_partial(instance, &call.symbol, self.pool, &source, strict)?
        else {
            return Ok(());
        };

        // The current line already carries the enclosing indentation; lines
        // after it get both.
        let indent = format!("{indent}{}", call.indent);
        self.enter(&name)?;
        // Overrides of the including template do not apply to the partial's
        // own code.
        let outer_sub = self.active_sub.take();
        let instance = resolved.instance();
        self.buf.push_str(&call.indent);
        let result = self.render_program(instance, instance.program(), stack, &indent);
        self.active_sub = outer_sub;
        self.leave();
        result
    }

    fn render_block(
        &mut self,
        instance: Instance<'_>,
        name: &str,
        stack: &mut ContextStack,
        indent: &str,
    ) -> TemplateResult<()> {
        let Some(block) = instance.block(name) else {
            return Ok(());
        };

        let outer_sub = self.active_sub.replace(block.source);
        let result = self.render_program(instance, &block.body, stack, indent);
        self.active_sub = outer_sub;
        result
    }
}

impl Template {
    /// Render the template against `context`.
    ///
    /// Missing keys render as nothing, as do missing partials unless
    /// [`RenderOptions::strict_partials`] is set.
    pub fn render(&self, context: &Value, partials: &PartialPool) -> TemplateResult<String> {
        self.render_with_options(context, partials, "", &RenderOptions::default())
    }

    /// Render with every line, including the first, prefixed by `indent`.
    pub fn render_indented(
        &self,
        context: &Value,
        partials: &PartialPool,
        indent: &str,
    ) -> TemplateResult<String> {
        self.render_with_options(context, partials, indent, &RenderOptions::default())
    }

    pub fn render_with_options(
        &self,
        context: &Value,
        partials: &PartialPool,
        indent: &str,
        options: &RenderOptions,
    ) -> TemplateResult<String> {
        let mut stack = ContextStack::new(context.clone());
        let mut frame = RenderFrame::new(partials, options);
        frame.render_instance(Instance::Base(self), &mut stack, indent)?;
        Ok(frame.finish())
    }
}
