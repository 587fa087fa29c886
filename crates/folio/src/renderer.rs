// File: src/renderer.rs
// Purpose: Placeholder interpolation for page and layout templates

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

static VAR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_\.\-]*)\}").unwrap());

/// Prefix reserved for layout slots
const SLOT_PREFIX: &str = "slots.";

/// Template renderer with variable interpolation
///
/// `{name}` and `{a.b}` are looked up in a JSON scope and HTML-escaped.
/// Unknown names stay in the output untouched. `{slots.*}` is only filled by
/// [`Renderer::render_with_slots`].
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    scope: Map<String, Value>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.scope.insert(name.into(), value.into());
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_var(name, value);
        self
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        let (head, rest) = path.split_once('.').unwrap_or((path, ""));
        let mut current = self.scope.get(head)?;
        for part in rest.split('.').filter(|p| !p.is_empty()) {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    pub fn render(&self, content: &str) -> String {
        self.substitute(content, None)
    }

    /// Interpolates variables and fills `{slots.<name>}` with raw HTML
    ///
    /// One pass over `content`: substituted text is never scanned again, so a
    /// value spelling `{slots.content}` stays literal. Unfilled slots render
    /// empty.
    pub fn render_with_slots(&self, content: &str, slots: &BTreeMap<String, String>) -> String {
        self.substitute(content, Some(slots))
    }

    fn substitute(&self, content: &str, slots: Option<&BTreeMap<String, String>>) -> String {
        VAR_REGEX
            .replace_all(content, |caps: &Captures| {
                let name = &caps[1];
                if let Some(slot) = name.strip_prefix(SLOT_PREFIX) {
                    return match slots {
                        Some(slots) => slots.get(slot).cloned().unwrap_or_default(),
                        None => caps[0].to_string(),
                    };
                }
                match self.get(name).and_then(display) {
                    Some(text) => escape(&text),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

fn display(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn escape(text: &str) -> String {
    maud::html! { (text) }.into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_simple_interpolation() {
        let renderer = Renderer::new().with_var("name", "Alice").with_var("age", 30);
        assert_eq!(
            renderer.render("<p>Hello, {name}! Age: {age}</p>"),
            "<p>Hello, Alice! Age: 30</p>"
        );
    }

    #[test]
    fn test_nested_value() {
        let renderer = Renderer::new().with_var("params", json!({ "slug": "hello-world" }));
        assert_eq!(renderer.render("<p>{params.slug}</p>"), "<p>hello-world</p>");
    }

    #[test]
    fn test_values_are_escaped() {
        let renderer = Renderer::new().with_var("q", "<script>alert(1)</script>");
        assert_eq!(
            renderer.render("{q}"),
            "&lt;script&gt;alert(1)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_unknown_and_slot_placeholders_survive() {
        let renderer = Renderer::new();
        assert_eq!(
            renderer.render("{missing} {slots.content}"),
            "{missing} {slots.content}"
        );
    }

    #[test]
    fn test_layout_rendering() {
        let renderer = Renderer::new().with_var("title", "Test");
        let mut slots = BTreeMap::new();
        slots.insert("content".to_string(), "<h1>{title}</h1>".to_string());

        let html = renderer.render_with_slots(
            "<html><title>{title}</title><body>{slots.content}{slots.scripts}</body></html>",
            &slots,
        );

        assert_eq!(html, "<html><title>Test</title><body><h1>{title}</h1></body></html>");
    }

    #[test]
    fn test_value_naming_a_slot_stays_literal() {
        let renderer = Renderer::new().with_var("query", json!({ "q": "{slots.content}" }));
        let mut slots = BTreeMap::new();
        slots.insert("content".to_string(), "<h1>About</h1>".to_string());

        let html = renderer.render_with_slots("<title>{query.q}</title>{slots.content}", &slots);

        assert_eq!(html, "<title>{slots.content}</title><h1>About</h1>");
    }
}
