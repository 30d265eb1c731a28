/*
 * escape.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! HTML escaping for interpolated values.

use crate::value::Value;
use std::borrow::Cow;

/// Stringify a value and HTML-escape the result.
///
/// This is what `{{name}}` emits. Raw interpolation (`{{{name}}}`) uses
/// [`Value::to_text`] directly.
pub fn escape(value: &Value) -> Cow<'_, str> {
    escape_html(value.to_text())
}

/// HTML-escape `& < > " '`.
///
/// Text without any of those characters is returned unchanged, without
/// allocating. Each character is replaced exactly once, so entities already
/// present in the input (`&amp;`) are escaped again rather than preserved.
pub fn escape_html(text: Cow<'_, str>) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return text;
    }

    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
