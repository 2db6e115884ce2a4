//! Template Adapter (§4.2)
//!
//! Contract: `render(template, variables) -> String` and `parse(template)`.
//! A narrow Liquid-like interpreter: variable/dotted-path substitution,
//! `if/else/endif`, `for/endfor`, and the seven named filters. No
//! off-the-shelf crate in this corpus matches the grammar closely enough,
//! so the subset actually used is implemented directly.

mod ast;
mod cache;
mod filters;
mod parser;

use crate::utils::error::{EngineError, ErrorDetails, Result};
use ast::{Expression, Node};
use serde_json::Value;

fn suggestion_for(message: &str) -> Option<String> {
    if message.contains("Unknown filter") {
        Some("check the filter name against the supported filter set".to_string())
    } else if message.contains("unexpected token") {
        Some("check for unbalanced `{{ }}`/`{% %}` delimiters or a malformed expression".to_string())
    } else if message.contains("EOF") {
        Some("check for a missing `endif`/`endfor`".to_string())
    } else {
        None
    }
}

fn template_error(source: &str, message: String) -> EngineError {
    let mut details = ErrorDetails::new();
    if let Some(hint) = suggestion_for(&message) {
        details = details.with_suggestion(hint);
    }
    EngineError::template_with(message, source, details)
}

fn resolve_path(context: &Value, path: &[String]) -> Value {
    let mut current = context;
    for segment in path {
        match current.get(segment) {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    current.clone()
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn eval_expression(expr: &Expression, context: &Value, strict: bool) -> std::result::Result<Value, String> {
    let mut value = resolve_path(context, &expr.path);
    for filter in &expr.filters {
        match filters::apply(&filter.name, filter.arg.as_deref(), value.clone()) {
            Some(next) => value = next,
            None => {
                if strict {
                    return Err(format!("Unknown filter `{}`", filter.name));
                }
            }
        }
    }
    Ok(value)
}

fn render_nodes(nodes: &[Node], context: &Value, out: &mut String) -> std::result::Result<(), String> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Variable(expr) => {
                let value = eval_expression(expr, context, false)?;
                out.push_str(&filters::value_to_display(&value));
            }
            Node::If { condition, body, else_body } => {
                let value = resolve_path(context, condition);
                if truthy(&value) {
                    render_nodes(body, context, out)?;
                } else {
                    render_nodes(else_body, context, out)?;
                }
            }
            Node::For { binding, iterable, body } => {
                let items = resolve_path(context, iterable);
                if let Value::Array(items) = items {
                    for item in items {
                        let mut scoped = context.clone();
                        if let Value::Object(map) = &mut scoped {
                            map.insert(binding.clone(), item);
                        }
                        render_nodes(body, &scoped, out)?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Render a template against a variable map. Missing variables resolve to
/// empty string; unknown filters are a no-op (non-strict).
pub fn render(source: &str, variables: &Value) -> Result<String> {
    let ast = cache::parse_cached(source).map_err(|e| template_error(source, e))?;
    let mut out = String::new();
    render_nodes(&ast, variables, &mut out).map_err(|e| template_error(source, e))?;
    Ok(out)
}

/// Parse a template and reject it if any filter name is unknown (strict
/// mode), used by config validation (§4.1 step 7).
pub fn parse_strict(source: &str) -> Result<()> {
    let ast = cache::parse_cached(source).map_err(|e| template_error(source, e))?;
    check_strict(&ast).map_err(|e| template_error(source, e))
}

fn check_strict(nodes: &[Node]) -> std::result::Result<(), String> {
    for node in nodes {
        match node {
            Node::Variable(expr) => {
                for filter in &expr.filters {
                    if !filters::KNOWN_FILTERS.contains(&filter.name.as_str()) {
                        return Err(format!("Unknown filter `{}`", filter.name));
                    }
                }
            }
            Node::If { body, else_body, .. } => {
                check_strict(body)?;
                check_strict(else_body)?;
            }
            Node::For { body, .. } => check_strict(body)?,
            Node::Text(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_filter_chain() {
        let vars = json!({ "items": ["a", "b", "c"] });
        let out = render(r#"Items: {{ items | join: ", " }} ({{ items | size }} total)"#, &vars).unwrap();
        assert_eq!(out, "Items: a, b, c (3 total)");
    }

    #[test]
    fn missing_variable_renders_empty_string() {
        let out = render("hi {{ missing.path }}", &json!({})).unwrap();
        assert_eq!(out, "hi ");
    }

    #[test]
    fn if_else_picks_branch() {
        let out = render("{% if flag %}yes{% else %}no{% endif %}", &json!({ "flag": true })).unwrap();
        assert_eq!(out, "yes");
        let out = render("{% if flag %}yes{% else %}no{% endif %}", &json!({ "flag": false })).unwrap();
        assert_eq!(out, "no");
    }

    #[test]
    fn for_loop_iterates_binding() {
        let out = render("{% for item in items %}[{{ item }}]{% endfor %}", &json!({ "items": [1, 2, 3] })).unwrap();
        assert_eq!(out, "[1][2][3]");
    }

    #[test]
    fn unknown_filter_is_noop_at_render_time() {
        let out = render("{{ name | shout }}", &json!({ "name": "a" })).unwrap();
        assert_eq!(out, "a");
    }

    #[test]
    fn unknown_filter_rejected_in_strict_mode() {
        let err = parse_strict("{{ name | shout }}").unwrap_err();
        assert_eq!(err.kind(), "template-error");
    }

    #[test]
    fn unterminated_tag_is_a_template_error() {
        let err = render("{{ name", &json!({})).unwrap_err();
        assert_eq!(err.kind(), "template-error");
    }
}
