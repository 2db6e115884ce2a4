//! Template tokenizer and recursive-descent parser (§4.2)
//!
//! Grammar: text interspersed with `{{ expr }}` variable expressions and
//! `{% if %}`/`{% else %}`/`{% endif %}`/`{% for x in y %}`/`{% endfor %}`
//! statements. `expr` is a dotted path followed by zero or more
//! `| filter` or `| filter: arg` applications.

use super::ast::{Expression, FilterCall, Node, Path};

enum Token {
    Text(String),
    Expr(String),
    Stmt(String),
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut rest = source;
    loop {
        let next_expr = rest.find("{{");
        let next_stmt = rest.find("{%");
        let next = match (next_expr, next_stmt) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };
        let Some(start) = next else {
            if !rest.is_empty() {
                tokens.push(Token::Text(rest.to_string()));
            }
            break;
        };
        if start > 0 {
            tokens.push(Token::Text(rest[..start].to_string()));
        }
        let is_expr = rest[start..].starts_with("{{");
        let close = if is_expr { "}}" } else { "%}" };
        let body_start = start + 2;
        let Some(rel_end) = rest[body_start..].find(close) else {
            return Err(format!("unexpected EOF: unterminated `{}`", if is_expr { "{{" } else { "{%" }));
        };
        let inner = rest[body_start..body_start + rel_end].trim().to_string();
        tokens.push(if is_expr { Token::Expr(inner) } else { Token::Stmt(inner) });
        rest = &rest[body_start + rel_end + close.len()..];
    }
    Ok(tokens)
}

fn parse_path(s: &str) -> Path {
    s.split('.').map(|p| p.trim().to_string()).collect()
}

fn strip_quotes(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && (s.starts_with('"') && s.ends_with('"') || s.starts_with('\'') && s.ends_with('\'')) {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

fn parse_expression(raw: &str) -> Result<Expression, String> {
    let mut parts = raw.split('|');
    let path_part = parts.next().unwrap_or("").trim();
    if path_part.is_empty() {
        return Err("unexpected token: empty variable expression".to_string());
    }
    let path = parse_path(path_part);
    let mut filters = Vec::new();
    for filter_part in parts {
        let filter_part = filter_part.trim();
        if filter_part.is_empty() {
            return Err("unexpected token: empty filter".to_string());
        }
        let (name, arg) = match filter_part.split_once(':') {
            Some((name, arg)) => (name.trim().to_string(), Some(strip_quotes(arg))),
            None => (filter_part.to_string(), None),
        };
        filters.push(FilterCall { name, arg });
    }
    Ok(Expression { path, filters })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Parse nodes until a statement keyword in `stop_kw` is hit (and
    /// consumed) or the token stream is exhausted. Returns the matched stop
    /// keyword, if any.
    fn parse_block(&mut self, stop_kw: &[&str]) -> Result<(Vec<Node>, Option<String>), String> {
        let mut nodes = Vec::new();
        while self.pos < self.tokens.len() {
            match &self.tokens[self.pos] {
                Token::Text(t) => {
                    nodes.push(Node::Text(t.clone()));
                    self.pos += 1;
                }
                Token::Expr(e) => {
                    let expr = parse_expression(e)?;
                    nodes.push(Node::Variable(expr));
                    self.pos += 1;
                }
                Token::Stmt(s) => {
                    let mut split = s.splitn(2, char::is_whitespace);
                    let kw = split.next().unwrap_or("").to_string();
                    if stop_kw.contains(&kw.as_str()) {
                        self.pos += 1;
                        return Ok((nodes, Some(kw)));
                    }
                    match kw.as_str() {
                        "if" => {
                            self.pos += 1;
                            let cond = split.next().unwrap_or("").trim();
                            if cond.is_empty() {
                                return Err("unexpected token: `if` requires a condition".to_string());
                            }
                            let condition = parse_path(cond);
                            let (body, stopped) = self.parse_block(&["else", "endif"])?;
                            let else_body = match stopped.as_deref() {
                                Some("else") => {
                                    let (else_body, stopped2) = self.parse_block(&["endif"])?;
                                    if stopped2.is_none() {
                                        return Err("unexpected EOF: missing endif".to_string());
                                    }
                                    else_body
                                }
                                Some("endif") => Vec::new(),
                                _ => return Err("unexpected EOF: missing endif".to_string()),
                            };
                            nodes.push(Node::If { condition, body, else_body });
                        }
                        "for" => {
                            self.pos += 1;
                            let rest = split.next().unwrap_or("").trim();
                            let mut it = rest.splitn(2, " in ");
                            let binding = it.next().unwrap_or("").trim().to_string();
                            let iterable_str = it
                                .next()
                                .ok_or_else(|| "unexpected token: expected `in` in for statement".to_string())?
                                .trim();
                            if binding.is_empty() || iterable_str.is_empty() {
                                return Err("unexpected token: malformed for statement".to_string());
                            }
                            let iterable = parse_path(iterable_str);
                            let (body, stopped) = self.parse_block(&["endfor"])?;
                            if stopped.is_none() {
                                return Err("unexpected EOF: missing endfor".to_string());
                            }
                            nodes.push(Node::For { binding, iterable, body });
                        }
                        other => {
                            return Err(format!("unexpected token: `{{% {other} %}}`"));
                        }
                    }
                }
            }
        }
        Ok((nodes, None))
    }
}

/// Parse a template source string into an AST. Succeeds regardless of
/// whether referenced filter names are known — that distinction is only
/// enforced by the strict-mode check used at config-validation time.
pub fn parse(source: &str) -> Result<Vec<Node>, String> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let (nodes, stopped) = parser.parse_block(&[])?;
    if let Some(kw) = stopped {
        return Err(format!("unexpected token: stray `{{% {kw} %}}`"));
    }
    Ok(nodes)
}
