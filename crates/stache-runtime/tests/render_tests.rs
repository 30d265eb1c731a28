/*
 * render_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * End-to-end rendering tests: interpolation, sections, partials and
 * indentation.
 */

mod common;

use common::{MapCompiler, as_compiler, load_program, map, text};
use pretty_assertions::assert_eq;
use serde_json::json;
use stache_runtime::{
    CompileOptions, Model, PartialPool, PartialRef, Program, RenderOptions, Template,
    TemplateError, Value,
};
use std::sync::Arc;

fn render(template: &Template, data: Value) -> String {
    template.render(&data, &PartialPool::new()).unwrap()
}

#[test]
fn test_implicit_iterator_over_array() {
    let template = Template::new(
        Program::builder()
            .text("Hello ")
            .section("names", Program::builder().var(".").text(", "))
            .text("!"),
    );

    let data = json!({ "names": ["A", "B"] }).into();
    assert_eq!(render(&template, data), "Hello A, B, !");
}

#[test]
fn test_empty_array_renders_inverted() {
    let template = Template::new(
        Program::builder()
            .section("names", text("x"))
            .inverted("names", text("no")),
    );

    assert_eq!(render(&template, json!({ "names": [] }).into()), "no");
    assert_eq!(render(&template, json!({ "names": [1] }).into()), "x");
}

#[test]
fn test_empty_map_is_truthy() {
    let template = Template::new(
        Program::builder()
            .section("meta", text("yes"))
            .inverted("meta", text("no")),
    );

    assert_eq!(render(&template, json!({ "meta": {} }).into()), "yes");
}

#[test]
fn test_escaping_is_applied_once() {
    let template = Template::new(Program::builder().var("x").text("|").raw("x"));

    let data = map(&[("x", "&amp; <tag> \"q\" 'a'".into())]);
    assert_eq!(
        render(&template, data),
        "&amp;amp; &lt;tag&gt; &quot;q&quot; &#39;a&#39;|&amp; <tag> \"q\" 'a'"
    );
}

#[test]
fn test_scalar_text_forms() {
    let template = Template::new(
        Program::builder()
            .var("int")
            .text(" ")
            .var("float")
            .text(" ")
            .var("flag")
            .text(" ")
            .var("list")
            .text(" ")
            .var("nothing"),
    );

    let data = json!({ "int": 3, "float": 1.5, "flag": false, "list": [1, 2], "nothing": null });
    assert_eq!(render(&template, data.into()), "3 1.5 false 1,2 ");
}

#[test]
fn test_scalar_section_keeps_scope() {
    let template = Template::new(
        Program::builder().section("flag", Program::builder().var("name")),
    );

    let data = json!({ "flag": "yes", "name": "Ann" });
    assert_eq!(render(&template, data.into()), "Ann");
}

#[test]
fn test_dotted_names() {
    let template = Template::new(
        Program::builder()
            .var("person.name")
            .text("|")
            .var("person.missing.deep")
            .text("|")
            .var("nobody.name")
            .text("|")
            .var("list.length"),
    );

    let data = json!({ "person": { "name": "Ann" }, "list": [1, 2, 3] });
    assert_eq!(render(&template, data.into()), "Ann|||3");
}

#[test]
fn test_dotted_names_do_not_rescan_outer_scopes() {
    let template = Template::new(
        Program::builder().section("inner", Program::builder().var("a.b")),
    );

    // The inner scope defines `a`, so the outer `a.b` is never consulted.
    let data = json!({ "a": { "b": "outer" }, "inner": { "a": { "c": 1 } } });
    assert_eq!(render(&template, data.into()), "");
}

#[test]
fn test_falsy_value_shadows_outer_scope() {
    let template = Template::new(
        Program::builder().section("inner", Program::builder().var("count")),
    );

    let data = json!({ "count": 5, "inner": { "count": 0 } });
    assert_eq!(render(&template, data.into()), "0");
}

#[derive(Debug)]
struct Person {
    name: String,
}

impl Model for Person {
    fn get(&self, key: &str) -> Option<Value> {
        match key {
            "name" => Some(Value::from(self.name.as_str())),
            _ => None,
        }
    }
}

#[test]
fn test_model_lookup_requires_model_get() {
    let program = Program::builder()
        .section("person", Program::builder().var("name"))
        .text("|")
        .var("person.name");
    let data = map(&[(
        "person",
        Value::Model(Arc::new(Person {
            name: "Ann".to_string(),
        })),
    )]);

    let enabled = Template::new(program.build())
        .with_options(CompileOptions::new().with_model_get(true));
    assert_eq!(render(&enabled, data.clone()), "Ann|Ann");

    let disabled = Template::new(enabled.program().clone());
    assert_eq!(render(&disabled, data), "|");
}

#[test]
fn test_program_fixtures() {
    let greeting = Template::new(load_program("greeting.json"));
    assert_eq!(
        render(&greeting, json!({ "names": ["x", "y"] }).into()),
        "Hello x, y, !"
    );

    let card = Template::new(load_program("card.json"));
    let data = json!({ "person": { "name": "Ann & Bo", "bio": "<em>hi</em>" } });
    assert_eq!(
        render(&card, data.into()),
        "<div>\n  <h1>Ann &amp; Bo</h1>\n  <p><em>hi</em></p>\n</div>\n"
    );
    assert_eq!(
        render(&card, json!({}).into()),
        "<div>\n  anonymous\n</div>\n"
    );
}

fn list_page() -> Template {
    Template::new(
        Program::builder()
            .text("<ul>")
            .newline()
            .partial_indented("item", "  ")
            .text("</ul>"),
    )
    .with_partial("item", PartialRef::new("item"))
}

fn item_partial() -> Arc<Template> {
    Arc::new(Template::new(
        Program::builder()
            .text("<li>")
            .newline()
            .text("</li>")
            .text("\n"),
    ))
}

#[test]
fn test_standalone_partial_indentation() {
    let pool = PartialPool::with_templates([("item", item_partial())]);

    let output = list_page().render(&Value::Null, &pool).unwrap();
    assert_eq!(output, "<ul>\n  <li>\n  </li>\n</ul>");
}

#[test]
fn test_nested_partial_indentation_accumulates() {
    let outer = Arc::new(
        Template::new(
            Program::builder()
                .text("<section>")
                .newline()
                .partial_indented("item", "  "),
        )
        .with_partial("item", PartialRef::new("item")),
    );
    let pool = PartialPool::with_templates([("item", item_partial()), ("outer", outer)]);
    let page = Template::new(Program::builder().partial_indented("outer", "    "))
        .with_partial("outer", PartialRef::new("outer"));

    let output = page.render(&Value::Null, &pool).unwrap();
    assert_eq!(output, "    <section>\n      <li>\n      </li>\n");
}

#[test]
fn test_render_indented_prefixes_first_line() {
    let output = item_partial()
        .render_indented(&Value::Null, &PartialPool::new(), "> ")
        .unwrap();
    assert_eq!(output, "> <li>\n> </li>\n");
}

#[test]
fn test_missing_partial() {
    let page = list_page();

    let lenient = page.render(&Value::Null, &PartialPool::new()).unwrap();
    assert_eq!(lenient, "<ul>\n</ul>");

    let strict = RenderOptions::new().with_strict_partials(true);
    let err = page
        .render_with_options(&Value::Null, &PartialPool::new(), "", &strict)
        .unwrap_err();
    assert!(matches!(err, TemplateError::PartialNotFound { name } if name == "item"));
}

#[test]
fn test_source_partial_compiled_once() {
    let compiler = MapCompiler::new()
        .with("P{{x}}", Program::builder().text("P").var("x"))
        .into_arc();
    let pool =
        PartialPool::with_sources([("p", "P{{x}}")]).with_compiler(as_compiler(&compiler));
    let page = Template::new(
        Program::builder()
            .partial("p")
            .section("items", Program::builder().partial("p")),
    )
    .with_partial("p", PartialRef::new("p"));

    let data = json!({ "x": 1, "items": [{ "x": 2 }, { "x": 3 }] }).into();
    assert_eq!(page.render(&data, &pool).unwrap(), "P1P2P3");
    assert_eq!(page.render(&data, &pool).unwrap(), "P1P2P3");
    assert_eq!(compiler.compiles(), 1);
}

#[test]
fn test_source_partial_without_compiler() {
    let pool = PartialPool::with_sources([("p", "P{{x}}")]);
    let page = Template::new(Program::builder().partial("p"))
        .with_partial("p", PartialRef::new("p"));

    let err = page.render(&Value::Null, &pool).unwrap_err();
    assert!(matches!(err, TemplateError::MissingCompiler { .. }));
}

#[test]
fn test_recursive_partial_over_tree() {
    let node = Arc::new(
        Template::new(
            Program::builder()
                .var("name")
                .section("kids", Program::builder().partial("node")),
        )
        .with_partial("node", PartialRef::new("node")),
    );
    let pool = PartialPool::with_templates([("node", Arc::clone(&node))]);

    let data = json!({
        "name": "a",
        "kids": [
            { "name": "b", "kids": [{ "name": "c", "kids": [] }] },
            { "name": "d", "kids": [] }
        ]
    });
    assert_eq!(node.render(&data.into(), &pool).unwrap(), "abcd");
}

#[test]
fn test_self_including_partial_hits_depth_limit() {
    let looping = Arc::new(
        Template::new(Program::builder().text("x").partial("loop"))
            .with_partial("loop", PartialRef::new("loop")),
    );
    let pool = PartialPool::with_templates([("loop", Arc::clone(&looping))]);
    let options = RenderOptions::new().with_max_depth(5);

    let err = looping
        .render_with_options(&Value::Null, &pool, "", &options)
        .unwrap_err();
    assert!(matches!(
        err,
        TemplateError::RecursionLimitExceeded { name, max_depth: 5 } if name == "loop"
    ));
}

#[test]
fn test_concurrent_renders_share_template() {
    let template = Arc::new(
        Template::new(
            Program::builder().section("items", Program::builder().var("n").text(",")),
        ),
    );
    let pool = PartialPool::new();

    let outputs: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let template = Arc::clone(&template);
                let pool = &pool;
                scope.spawn(move || {
                    let data = json!({ "items": [{ "n": i }, { "n": i * 10 }] }).into();
                    template.render(&data, pool).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, output) in outputs.iter().enumerate() {
        assert_eq!(output, &format!("{},{},", i, i * 10));
    }
}
