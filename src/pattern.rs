//! Patterns for `LIKE` and `MATCH`, compiled once per bind or rebind.

use regex::Regex;

use crate::ast::ComparisonOperator;

#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compiles the right operand of a pattern operator. `LIKE` uses SQL
    /// wildcards; `MATCH` is a regular expression that must match the whole
    /// string.
    pub fn compile(op: ComparisonOperator, source: &str) -> Result<Self, regex::Error> {
        let expression = match op {
            ComparisonOperator::Like => format!("(?s)^{}$", like_to_regex(source)),
            _ => format!("^(?:{})$", source),
        };
        Regex::new(&expression).map(Pattern)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

// % is any run, _ is one character, \ escapes the next character
fn like_to_regex(pattern: &str) -> String {
    let mut result = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();
    let mut buffer = [0u8; 4];

    while let Some(c) = chars.next() {
        match c {
            '%' => result.push_str(".*"),
            '_' => result.push('.'),
            '\\' => {
                let escaped = chars.next().unwrap_or('\\');
                result.push_str(&regex::escape(escaped.encode_utf8(&mut buffer)));
            }
            _ => result.push_str(&regex::escape(c.encode_utf8(&mut buffer))),
        }
    }

    result
}
