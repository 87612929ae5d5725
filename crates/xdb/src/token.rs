//! Named placeholder parsing.
//!
//! `${name}` tokens are replaced by the driver's positional placeholder and their
//! names collected in order of appearance:
//!
//! ```ignore
//! let syntax = TokenSyntax::default();
//! let parsed = parse_tokens("id = ${x} and y = ${y}", &syntax, Placeholder::Question);
//! assert_eq!(parsed.sql, "id = ? and y = ?");
//! assert_eq!(parsed.tokens, ["x", "y"]);
//! ```
//!
//! Parsing never fails. An escaped open delimiter (`\${`) is kept literally and an
//! unterminated one is copied through with the rest of the text.

use std::fmt::Write;

/// Driver-native positional placeholder style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placeholder {
    /// `?` for every parameter.
    #[default]
    Question,
    /// `$1, $2, ...` numbered from one.
    Dollar,
}

impl Placeholder {
    /// Append the placeholder for the parameter at `index` (1-based).
    pub fn write(self, out: &mut String, index: usize) {
        match self {
            Placeholder::Question => out.push('?'),
            Placeholder::Dollar => {
                // Writing into a String cannot fail.
                let _ = write!(out, "${index}");
            }
        }
    }
}

/// Delimiters recognized around named tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSyntax {
    pub open: String,
    pub close: String,
    pub escape: char,
}

impl Default for TokenSyntax {
    fn default() -> Self {
        Self {
            open: "${".to_string(),
            close: "}".to_string(),
            escape: '\\',
        }
    }
}

impl TokenSyntax {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
            ..Self::default()
        }
    }

    pub fn escape(mut self, escape: char) -> Self {
        self.escape = escape;
        self
    }
}

/// SQL with named tokens rewritten to positional placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedSql {
    pub sql: String,
    /// Token names in order of appearance, duplicates kept.
    pub tokens: Vec<String>,
}

/// Rewrite every `open name close` occurrence in `sql` into a placeholder.
pub fn parse_tokens(sql: &str, syntax: &TokenSyntax, placeholder: Placeholder) -> ParsedSql {
    let mut out = String::with_capacity(sql.len());
    let mut tokens = Vec::new();
    let open = syntax.open.as_str();
    let close = syntax.close.as_str();

    if open.is_empty() || close.is_empty() {
        return ParsedSql {
            sql: sql.to_string(),
            tokens,
        };
    }

    let mut rest = sql;
    while let Some(start) = rest.find(open) {
        if rest[..start].ends_with(syntax.escape) {
            // Drop the escape, keep the delimiter as text.
            let escape_at = start - syntax.escape.len_utf8();
            out.push_str(&rest[..escape_at]);
            out.push_str(open);
            rest = &rest[start + open.len()..];
            continue;
        }

        let name_start = start + open.len();
        let Some(offset) = rest[name_start..].find(close) else {
            break;
        };
        out.push_str(&rest[..start]);
        tokens.push(rest[name_start..name_start + offset].to_string());
        placeholder.write(&mut out, tokens.len());
        rest = &rest[name_start + offset + close.len()..];
    }
    out.push_str(rest);

    ParsedSql { sql: out, tokens }
}
