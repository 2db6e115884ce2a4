//! Identifier pattern check (§6): `^[A-Za-z0-9_-]+$`

use regex::Regex;
use std::sync::OnceLock;

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap())
}

pub fn is_valid_identifier(s: &str) -> bool {
    pattern().is_match(s)
}
