/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Render runtime for Mustache templates with inheritance and lambdas.
//!
//! This crate executes compiled templates. It supports:
//!
//! - Escaped and raw interpolation: `{{name}}`, `{{{name}}}`
//! - Dotted names and the implicit iterator: `{{person.name}}`, `{{.}}`
//! - Sections and inverted sections over maps, arrays and scalars
//! - Lambdas, including higher-order lambdas whose output is re-rendered
//! - Partials with standalone indentation: `{{>name}}`
//! - Template inheritance: `{{<parent}}{{$block}}...{{/block}}{{/parent}}`
//!
//! # Architecture
//!
//! Parsing is **not** part of this crate. A [`Compiler`] turns source text
//! into a [`Template`] holding a render [`Program`]; the runtime calls it only
//! for partials supplied as source and for lambda output. Context data is a
//! [`Value`], which converts from `serde_json::Value` or can wrap host
//! objects through the [`Model`] trait.
//!
//! # Example
//!
//! ```ignore
//! use stache_runtime::{PartialPool, Program, Template, Value};
//!
//! let template = Template::new(
//!     Program::builder()
//!         .text("Hello ")
//!         .section("names", Program::builder().var(".").text(", "))
//!         .text("!"),
//! );
//!
//! let data: Value = serde_json::json!({ "names": ["A", "B"] }).into();
//! let output = template.render(&data, &PartialPool::new())?;
//! assert_eq!(output, "Hello A, B, !");
//! ```

pub mod compiler;
pub mod context;
pub mod error;
pub mod escape;
mod lambda;
pub mod options;
pub mod partial;
pub mod program;
mod render;
mod section;
pub mod template;
pub mod value;

// Re-export main types at crate root
pub use compiler::Compiler;
pub use context::{ContextStack, Lookup};
pub use error::{TemplateError, TemplateResult};
pub use escape::{escape, escape_html};
pub use options::{CompileOptions, DEFAULT_MAX_DEPTH, Delimiters, RenderOptions};
pub use partial::PartialPool;
pub use program::{
    BlockCall, Inverted, Node, PartialCall, Program, ProgramBuilder, Section, Variable,
};
pub use template::{BlockMap, PartialRef, PartialTable, Template};
pub use value::{Lambda, LambdaCall, Model, Value};
