use crate::token::{Placeholder, TokenSyntax};

/// Configuration shared by every statement created from a [`Db`](crate::Db).
#[derive(Debug, Clone, Default)]
pub struct DbConfig {
    /// Delimiters of named tokens.
    pub token_syntax: TokenSyntax,
    /// Placeholder style to emit instead of the driver's own.
    pub placeholder: Option<Placeholder>,
}

impl DbConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the named-token delimiters.
    pub fn token_syntax(mut self, syntax: TokenSyntax) -> Self {
        self.token_syntax = syntax;
        self
    }

    /// Set the escape character for a literal open delimiter.
    pub fn token_escape(mut self, escape: char) -> Self {
        self.token_syntax.escape = escape;
        self
    }

    /// Override the driver's placeholder style.
    pub fn placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    /// The placeholder to emit for a driver whose native style is `native`.
    pub(crate) fn resolve_placeholder(&self, native: Placeholder) -> Placeholder {
        self.placeholder.unwrap_or(native)
    }
}
