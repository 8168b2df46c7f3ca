use crate::lexer::{Token, TokenKind};

/// Parse error, carrying the 1-indexed source location it was raised at.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl ParseError {
    pub(super) fn from_token(message: String, token: &Token) -> Self {
        Self {
            message,
            line: token.line,
            column: token.column,
        }
    }

    pub(super) fn unexpected_token(expected: &str, token: &Token, source: &str) -> Self {
        let found = match &token.kind {
            TokenKind::Eof => "end of file".to_string(),
            TokenKind::Identifier => format!("identifier '{}'", token.text(source)),
            other => format!("{:?}", other),
        };
        Self::from_token(format!("Expected {}, found {}", expected, found), token)
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "E:L{}:C{}:{}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseError {}
