/*
 * section.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Section evaluation.
//!
//! A section value decides whether the body renders and with which scope:
//!
//! - empty arrays and falsy values skip the body
//! - non-empty arrays render the body once per element
//! - objects render it once with the object pushed as a new scope
//! - any other truthy value renders it once with the current scope repeated
//! - lambdas are invoked first (see [`crate::lambda`])

use crate::context::ContextStack;
use crate::error::TemplateResult;
use crate::lambda::LambdaSection;
use crate::partial::Instance;
use crate::program::Section;
use crate::render::RenderFrame;
use crate::value::Value;

/// The kind of section being evaluated.
#[derive(Debug, Clone, Copy)]
pub(crate) enum SectionKind<'s> {
    Normal(&'s Section),
    Inverted,
}

impl SectionKind<'_> {
    pub(crate) fn is_inverted(self) -> bool {
        matches!(self, SectionKind::Inverted)
    }
}

impl RenderFrame<'_> {
    /// Decide whether a section passes.
    ///
    /// For a passing normal section, the scope to render the body in is
    /// pushed onto `stack`; the caller pops it when the body is done. A
    /// higher-order lambda writes its expansion directly and reports the
    /// section as not passing, so the body is skipped.
    pub(crate) fn evaluate_section(
        &mut self,
        instance: Instance<'_>,
        value: Value,
        stack: &mut ContextStack,
        kind: SectionKind<'_>,
    ) -> TemplateResult<bool> {
        if matches!(&value, Value::Array(items) if items.is_empty()) {
            return Ok(false);
        }

        let value = match value {
            Value::Lambda(lambda) => match self.lambda_section(instance, &lambda, stack, kind)? {
                LambdaSection::Expanded => return Ok(false),
                LambdaSection::Suppressed => return Ok(true),
                LambdaSection::Value(value) => value,
            },
            other => other,
        };

        let pass = value.is_truthy();
        if pass && !kind.is_inverted() {
            let scope = if value.is_object() {
                value
            } else {
                stack.top().cloned().unwrap_or_default()
            };
            stack.push(scope);
        }
        Ok(pass)
    }

    /// Render a passing section's body.
    ///
    /// When the scope on top of `stack` is an array the body renders once
    /// per element, with the element pushed for the duration; otherwise it
    /// renders once.
    pub(crate) fn iterate_section<F>(
        &mut self,
        stack: &mut ContextStack,
        mut body: F,
    ) -> TemplateResult<()>
    where
        F: FnMut(&mut Self, &mut ContextStack) -> TemplateResult<()>,
    {
        let items = match stack.top() {
            Some(Value::Array(items)) => items.clone(),
            _ => return body(self, stack),
        };

        for item in items {
            stack.push(item);
            let result = body(self, stack);
            stack.pop();
            result?;
        }
        Ok(())
    }
}
