use super::helpers::get_precedence;
use super::{ParseError, Parser};
use crate::ast::{Expr, Location, UnOp};
use crate::lexer::TokenKind;

impl<'a> Parser<'a> {
    /// Parse an expression, handling `=` (lowest precedence, right-associative)
    /// before falling into precedence-climbing for the relational/arithmetic chain.
    pub(super) fn parse_expression(&mut self, depth: usize) -> Result<Expr, ParseError> {
        self.check_depth(depth)?;

        if self.check(&TokenKind::Identifier) {
            let save = self.current;
            let name_token = self.advance();
            if self.check(&TokenKind::Assign) {
                let loc = Location::point(name_token.line, name_token.column);
                self.advance();
                let rhs = self.parse_expression(depth + 1)?;
                return Ok(Expr::Assignment {
                    target: name_token.text(self.source).to_string(),
                    expr: Box::new(rhs),
                    loc,
                });
            }
            self.current = save;
        }

        self.parse_binary(depth, 0)
    }

    /// Precedence-climbing parser for the binary operator chain.
    fn parse_binary(&mut self, depth: usize, min_precedence: u8) -> Result<Expr, ParseError> {
        self.check_depth(depth)?;
        let mut lhs = self.parse_unary(depth)?;

        loop {
            let token = self.current_token();
            let (precedence, op) = match get_precedence(&token.kind) {
                Some(p) if p.0 >= min_precedence => p,
                _ => break,
            };
            let loc = Location::point(token.line, token.column);
            self.advance();
            let rhs = self.parse_binary(depth + 1, precedence + 1)?;
            lhs = Expr::BinaryOp {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                loc,
            };
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self, depth: usize) -> Result<Expr, ParseError> {
        self.check_depth(depth)?;
        let token = self.current_token();
        if token.kind == TokenKind::Minus {
            let loc = Location::point(token.line, token.column);
            self.advance();
            let operand = self.parse_unary(depth + 1)?;
            return Ok(Expr::UnaryOp {
                op: UnOp::Neg,
                operand: Box::new(operand),
                loc,
            });
        }
        self.parse_postfix(depth)
    }

    fn parse_postfix(&mut self, depth: usize) -> Result<Expr, ParseError> {
        let primary = self.parse_primary(depth)?;
        if let Expr::Identifier { name, loc } = &primary {
            if self.check(&TokenKind::LParen) {
                let name = name.clone();
                let loc = *loc;
                return self.parse_call(depth, name, loc);
            }
        }
        Ok(primary)
    }

    fn parse_call(&mut self, depth: usize, name: String, loc: Location) -> Result<Expr, ParseError> {
        self.consume(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            args.push(self.parse_expression(depth + 1)?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                args.push(self.parse_expression(depth + 1)?);
            }
        }
        self.consume(TokenKind::RParen, "')'")?;
        Ok(Expr::Call { name, args, loc })
    }

    fn parse_primary(&mut self, depth: usize) -> Result<Expr, ParseError> {
        self.check_depth(depth)?;
        let token = self.current_token().clone();
        match token.kind {
            TokenKind::IntLiteral(v) => {
                self.advance();
                Ok(Expr::Integer(v))
            }
            TokenKind::DoubleLiteral(v) => {
                self.advance();
                Ok(Expr::Double(v))
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Identifier {
                    name: token.text(self.source).to_string(),
                    loc: Location::point(token.line, token.column),
                })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression(depth + 1)?;
                self.consume(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            _ => Err(ParseError::unexpected_token("an expression", &token, self.source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::limits::CompilerLimits;

    fn parse_expr(src: &str) -> Expr {
        let limits = CompilerLimits::default();
        let tokens = lex(src, &limits).unwrap();
        let mut parser = Parser::new(tokens, src, &limits);
        parser.parse_expression(0).unwrap()
    }

    #[test]
    fn respects_arithmetic_precedence() {
        match parse_expr("1 + 2 * 3") {
            Expr::BinaryOp { op: crate::ast::BinOp::Add, rhs, .. } => {
                assert!(matches!(*rhs, Expr::BinaryOp { op: crate::ast::BinOp::Mul, .. }));
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn parses_assignment_right_associative() {
        match parse_expr("x = y = 1") {
            Expr::Assignment { target, expr, .. } => {
                assert_eq!(target, "x");
                assert!(matches!(*expr, Expr::Assignment { .. }));
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn parses_call_with_args() {
        match parse_expr("sum(1, 2)") {
            Expr::Call { name, args, .. } => {
                assert_eq!(name, "sum");
                assert_eq!(args.len(), 2);
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn parses_unary_minus() {
        assert!(matches!(parse_expr("-5"), Expr::UnaryOp { .. }));
    }
}
