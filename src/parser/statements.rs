use super::{ParseError, Parser};
use crate::ast::{Block, Location, Param, Stmt};
use crate::lexer::TokenKind;

impl<'a> Parser<'a> {
    /// Parse a top-level declaration: `fn_decl | var_decl`, nothing else.
    /// Anything else (a bare `if`/`for`/`return`/expression statement at
    /// file scope) is a parse error rather than silently accepted.
    pub(super) fn parse_top_level_statement(&mut self, depth: usize) -> Result<Stmt, ParseError> {
        self.check_depth(depth)?;
        match self.current_token().kind {
            TokenKind::Def | TokenKind::Extern => self.parse_fn_decl(depth + 1),
            TokenKind::Int | TokenKind::Double | TokenKind::Void => self.parse_var_decl(depth + 1),
            _ => Err(ParseError::unexpected_token(
                "a function or variable declaration",
                self.current_token(),
                self.source,
            )),
        }
    }

    /// Parse a single statement.
    pub(super) fn parse_statement(&mut self, depth: usize) -> Result<Stmt, ParseError> {
        self.check_depth(depth)?;
        match self.current_token().kind {
            TokenKind::Def | TokenKind::Extern => self.parse_fn_decl(depth + 1),
            TokenKind::Int | TokenKind::Double | TokenKind::Void => self.parse_var_decl(depth + 1),
            TokenKind::If => self.parse_if_stmt(depth + 1),
            TokenKind::For => self.parse_for_stmt(depth + 1),
            TokenKind::Return => self.parse_return_stmt(depth + 1),
            _ => self.parse_expr_stmt(depth + 1),
        }
    }

    /// A braced block, or (for `if`/`for` bodies written without braces) a
    /// single statement implicitly wrapped into a one-statement block.
    fn parse_body_or_stmt(&mut self, depth: usize) -> Result<Block, ParseError> {
        if self.check(&TokenKind::LBrace) {
            self.parse_block(depth)
        } else {
            Ok(Block {
                statements: vec![self.parse_statement(depth)?],
            })
        }
    }

    pub(super) fn parse_block(&mut self, depth: usize) -> Result<Block, ParseError> {
        self.check_depth(depth)?;
        self.consume(TokenKind::LBrace, "'{'")?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            statements.push(self.parse_statement(depth + 1)?);
        }
        self.consume(TokenKind::RBrace, "'}'")?;
        Ok(Block { statements })
    }

    fn parse_type_name(&mut self) -> Result<String, ParseError> {
        let token = self.current_token().clone();
        match token.kind {
            TokenKind::Int | TokenKind::Double | TokenKind::Void => {
                self.advance();
                Ok(token.text(self.source).to_string())
            }
            _ => Err(ParseError::unexpected_token("a type name", &token, self.source)),
        }
    }

    fn parse_var_decl(&mut self, depth: usize) -> Result<Stmt, ParseError> {
        let type_token = self.current_token().clone();
        let type_name = self.parse_type_name()?;
        let name_token = self.consume(TokenKind::Identifier, "a variable name")?;
        let name = name_token.text(self.source).to_string();
        let init = if self.check(&TokenKind::Assign) {
            self.advance();
            Some(self.parse_expression(depth)?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "';'")?;
        Ok(Stmt::VarDecl {
            type_name,
            name,
            init,
            loc: Location::point(type_token.line, type_token.column),
        })
    }

    fn parse_param(&mut self) -> Result<Param, ParseError> {
        let type_token = self.current_token().clone();
        let type_name = self.parse_type_name()?;
        let name_token = self.consume(TokenKind::Identifier, "a parameter name")?;
        Ok(Param {
            type_name,
            name: name_token.text(self.source).to_string(),
            loc: Location::point(type_token.line, type_token.column),
        })
    }

    fn parse_fn_decl(&mut self, depth: usize) -> Result<Stmt, ParseError> {
        let start = self.current_token().clone();
        let declared_external = if self.check(&TokenKind::Extern) {
            self.advance();
            true
        } else {
            false
        };
        self.consume(TokenKind::Def, "'def'")?;
        let return_type = self.parse_type_name()?;
        let name_token = self.consume(TokenKind::Identifier, "a function name")?;
        let name = name_token.text(self.source).to_string();

        self.consume(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            params.push(self.parse_param()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                params.push(self.parse_param()?);
            }
        }
        self.consume(TokenKind::RParen, "')'")?;

        let (body, is_external) = if self.check(&TokenKind::LBrace) {
            (Some(self.parse_block(depth)?), declared_external)
        } else {
            self.consume(TokenKind::Semicolon, "';'")?;
            (None, true)
        };

        Ok(Stmt::FnDecl {
            return_type,
            name,
            params,
            body,
            is_external,
            loc: Location::point(start.line, start.column),
        })
    }

    fn parse_if_stmt(&mut self, depth: usize) -> Result<Stmt, ParseError> {
        let if_token = self.consume(TokenKind::If, "'if'")?;
        self.consume(TokenKind::LParen, "'('")?;
        let cond = self.parse_expression(depth)?;
        self.consume(TokenKind::RParen, "')'")?;
        let then_block = self.parse_body_or_stmt(depth)?;
        let else_block = if self.check(&TokenKind::Else) {
            self.advance();
            Some(self.parse_body_or_stmt(depth)?)
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_block,
            else_block,
            loc: Location::point(if_token.line, if_token.column),
        })
    }

    fn parse_for_stmt(&mut self, depth: usize) -> Result<Stmt, ParseError> {
        let for_token = self.consume(TokenKind::For, "'for'")?;
        let iter_name = self
            .consume(TokenKind::Identifier, "a loop variable name")?
            .text(self.source)
            .to_string();
        self.consume(TokenKind::Colon, "':'")?;
        let iter_type = self.parse_type_name()?;
        self.consume(TokenKind::In, "'in'")?;
        let from = self.parse_expression(depth)?;
        self.consume(TokenKind::To, "'to'")?;
        let to = self.parse_expression(depth)?;
        let step = if self.check(&TokenKind::By) {
            self.advance();
            Some(self.parse_expression(depth)?)
        } else {
            None
        };
        self.consume(TokenKind::Do, "'do'")?;
        let body = self.parse_body_or_stmt(depth)?;
        Ok(Stmt::For {
            iter_name,
            iter_type,
            from,
            to,
            body,
            step,
            loc: Location::point(for_token.line, for_token.column),
        })
    }

    fn parse_return_stmt(&mut self, depth: usize) -> Result<Stmt, ParseError> {
        let return_token = self.consume(TokenKind::Return, "'return'")?;
        let expr = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression(depth)?)
        };
        self.consume(TokenKind::Semicolon, "';'")?;
        Ok(Stmt::Return {
            expr,
            loc: Location::point(return_token.line, return_token.column),
        })
    }

    fn parse_expr_stmt(&mut self, depth: usize) -> Result<Stmt, ParseError> {
        let expr = self.parse_expression(depth)?;
        self.consume(TokenKind::Semicolon, "';'")?;
        Ok(Stmt::ExprStmt(expr))
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use crate::ast::Stmt;
    use crate::lexer::lex;
    use crate::limits::CompilerLimits;

    fn parse_program(src: &str) -> Vec<Stmt> {
        let limits = CompilerLimits::default();
        let tokens = lex(src, &limits).unwrap();
        parse(tokens, src, &limits).unwrap().statements
    }

    /// `if`/`for`/`return`/bare-expression statements are only legal inside a
    /// function body, not at top level; wrap `src` in one and pull the body back out.
    fn parse_fn_body_statements(src: &str) -> Vec<Stmt> {
        let wrapped = format!("def int wrapper(){{ {} }}", src);
        match &parse_program(&wrapped)[0] {
            Stmt::FnDecl { body, .. } => body.as_ref().unwrap().statements.clone(),
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn parses_var_decl_with_initializer() {
        let stmts = parse_program("int x = 1;");
        assert!(matches!(&stmts[0], Stmt::VarDecl { name, .. } if name == "x"));
    }

    #[test]
    fn parses_fn_decl_with_body() {
        let stmts = parse_program("def int sum(int a, int b){ return a + b; }");
        match &stmts[0] {
            Stmt::FnDecl { name, params, body, is_external, .. } => {
                assert_eq!(name, "sum");
                assert_eq!(params.len(), 2);
                assert!(body.is_some());
                assert!(!is_external);
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn parses_extern_fn_decl_without_body() {
        let stmts = parse_program("extern def int puts(int s);");
        match &stmts[0] {
            Stmt::FnDecl { body, is_external, .. } => {
                assert!(body.is_none());
                assert!(is_external);
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn parses_braceless_if_else() {
        let stmts = parse_fn_body_statements("if(1 < 2) echo(1); else echo(2);");
        match &stmts[0] {
            Stmt::If { then_block, else_block, .. } => {
                assert_eq!(then_block.statements.len(), 1);
                assert_eq!(else_block.as_ref().unwrap().statements.len(), 1);
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn parses_for_with_step() {
        let stmts = parse_fn_body_statements("for i:int in 3 to 1 by -1 do echo(i);");
        match &stmts[0] {
            Stmt::For { iter_name, step, .. } => {
                assert_eq!(iter_name, "i");
                assert!(step.is_some());
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn parses_bare_return() {
        let stmts = parse_fn_body_statements("return;");
        assert!(matches!(&stmts[0], Stmt::Return { expr: None, .. }));
    }

    #[test]
    fn rejects_bare_expression_statement_at_top_level() {
        assert!(parse(
            lex("echo(42);", &CompilerLimits::default()).unwrap(),
            "echo(42);",
            &CompilerLimits::default(),
        )
        .is_err());
    }

    #[test]
    fn rejects_if_at_top_level() {
        let src = "if(1 < 2) echo(1);";
        assert!(parse(lex(src, &CompilerLimits::default()).unwrap(), src, &CompilerLimits::default()).is_err());
    }
}
