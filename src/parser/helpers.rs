use super::error::ParseError;
use crate::ast::BinOp;
use crate::lexer::{Token, TokenKind};

/// Binary operator precedence (higher binds tighter). `None` for non-operator tokens.
pub(super) fn get_precedence(token_kind: &TokenKind) -> Option<(u8, BinOp)> {
    match token_kind {
        TokenKind::Eq => Some((1, BinOp::Eq)),
        TokenKind::Ne => Some((1, BinOp::Ne)),
        TokenKind::Lt => Some((1, BinOp::Lt)),
        TokenKind::Gt => Some((1, BinOp::Gt)),
        TokenKind::Le => Some((1, BinOp::Le)),
        TokenKind::Ge => Some((1, BinOp::Ge)),
        TokenKind::Plus => Some((2, BinOp::Add)),
        TokenKind::Minus => Some((2, BinOp::Sub)),
        TokenKind::Star => Some((3, BinOp::Mul)),
        TokenKind::Slash => Some((3, BinOp::Div)),
        TokenKind::Percent => Some((3, BinOp::Rem)),
        _ => None,
    }
}

impl<'a> super::Parser<'a> {
    pub(super) fn check_depth(&self, depth: usize) -> Result<(), ParseError> {
        if depth >= self.limits.max_expr_depth {
            return Err(ParseError::from_token(
                format!(
                    "Parsing nesting too deep: {} levels (max {}). Consider simplifying.",
                    depth, self.limits.max_expr_depth
                ),
                self.current_token(),
            ));
        }
        Ok(())
    }

    pub(super) fn consume(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        let token = self.current_token().clone();
        if token.kind != kind {
            return Err(ParseError::unexpected_token(expected, &token, self.source));
        }
        self.current += 1;
        Ok(token)
    }

    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        &self.current_token().kind == kind
    }

    pub(super) fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if self.current < self.tokens.len() - 1 {
            self.current += 1;
        }
        token
    }

    pub(super) fn current_token(&self) -> &Token {
        &self.tokens[self.current]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_levels() {
        assert_eq!(get_precedence(&TokenKind::Star).unwrap().0, 3);
        assert_eq!(get_precedence(&TokenKind::Plus).unwrap().0, 2);
        assert_eq!(get_precedence(&TokenKind::Lt).unwrap().0, 1);
        assert!(get_precedence(&TokenKind::Identifier).is_none());
    }
}
