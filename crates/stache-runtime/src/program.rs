/*
 * program.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Render programs.
//!
//! A [`Program`] is the compiled form of a template: a tree of instructions
//! executed in order against the context stack. Programs are produced by an
//! external [`Compiler`](crate::Compiler); the runtime never reorders what
//! they emit. They serialize with serde so a compiler running elsewhere can
//! ship them as JSON.

use crate::options::Delimiters;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A compiled sequence of render instructions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Program {
    nodes: Vec<Node>,
}

impl Program {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn builder() -> ProgramBuilder {
        ProgramBuilder::new()
    }
}

impl From<Vec<Node>> for Program {
    fn from(nodes: Vec<Node>) -> Self {
        Self::new(nodes)
    }
}

/// A single render instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Literal text, emitted as-is.
    Text(String),

    /// A line break followed by the current indentation.
    Newline,

    /// Interpolation: `{{name}}` or `{{{name}}}`.
    Variable(Variable),

    /// Section: `{{#name}}...{{/name}}`.
    Section(Section),

    /// Inverted section: `{{^name}}...{{/name}}`.
    Inverted(Inverted),

    /// Partial inclusion: `{{>name}}`, or `{{<name}}...{{/name}}` when the
    /// partials table entry carries block overrides.
    Partial(PartialCall),

    /// Block: `{{$name}}...{{/name}}`.
    Block(BlockCall),
}

/// Interpolation of a context value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Possibly dotted key (`person.name`, or `.` for the current element).
    pub key: String,
    /// HTML-escape the output.
    #[serde(default = "escape_by_default")]
    pub escape: bool,
}

fn escape_by_default() -> bool {
    true
}

/// A section rendered zero, one or many times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub key: String,
    pub body: Program,
    /// Byte range of the body in the template source, handed to section
    /// lambdas.
    #[serde(default)]
    pub span: Range<usize>,
    /// Delimiters active around the section.
    #[serde(default)]
    pub delimiters: Delimiters,
}

/// A section rendered once when its value is falsy or empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inverted {
    pub key: String,
    pub body: Program,
}

/// Reference to an entry in the owning template's partials table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialCall {
    /// Local symbol, a key of the template's partials table.
    pub symbol: String,
    /// Indentation for standalone partials, appended to the current one.
    #[serde(default)]
    pub indent: String,
}

/// A named, overridable block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockCall {
    pub name: String,
}

/// Fluent construction of programs.
///
/// ```ignore
/// let program = Program::builder()
///     .text("Hello ")
///     .section("names", Program::builder().var(".").text(", "))
///     .text("!")
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    nodes: Vec<Node>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.node(Node::Text(text.into()))
    }

    pub fn newline(self) -> Self {
        self.node(Node::Newline)
    }

    /// Escaped interpolation.
    pub fn var(self, key: impl Into<String>) -> Self {
        self.node(Node::Variable(Variable {
            key: key.into(),
            escape: true,
        }))
    }

    /// Unescaped interpolation.
    pub fn raw(self, key: impl Into<String>) -> Self {
        self.node(Node::Variable(Variable {
            key: key.into(),
            escape: false,
        }))
    }

    pub fn section(self, key: impl Into<String>, body: ProgramBuilder) -> Self {
        self.section_spanning(key, body, 0..0)
    }

    /// A section whose body occupies `span` in the template source.
    pub fn section_spanning(
        self,
        key: impl Into<String>,
        body: ProgramBuilder,
        span: Range<usize>,
    ) -> Self {
        self.section_with_delimiters(key, body, span, Delimiters::default())
    }

    pub fn section_with_delimiters(
        self,
        key: impl Into<String>,
        body: ProgramBuilder,
        span: Range<usize>,
        delimiters: Delimiters,
    ) -> Self {
        self.node(Node::Section(Section {
            key: key.into(),
            body: body.build(),
            span,
            delimiters,
        }))
    }

    pub fn inverted(self, key: impl Into<String>, body: ProgramBuilder) -> Self {
        self.node(Node::Inverted(Inverted {
            key: key.into(),
            body: body.build(),
        }))
    }

    pub fn partial(self, symbol: impl Into<String>) -> Self {
        self.partial_indented(symbol, "")
    }

    pub fn partial_indented(self, symbol: impl Into<String>, indent: impl Into<String>) -> Self {
        self.node(Node::Partial(PartialCall {
            symbol: symbol.into(),
            indent: indent.into(),
        }))
    }

    pub fn block(self, name: impl Into<String>) -> Self {
        self.node(Node::Block(BlockCall { name: name.into() }))
    }

    pub fn build(self) -> Program {
        Program::new(self.nodes)
    }
}

impl From<ProgramBuilder> for Program {
    fn from(builder: ProgramBuilder) -> Self {
        builder.build()
    }
}
