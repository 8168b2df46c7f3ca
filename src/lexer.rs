//! Tokenizer.
//!
//! Produces a flat `Vec<Token>` terminated by `Eof`. Whitespace and `//` line
//! comments are discarded; everything else becomes a token carrying its
//! 1-indexed line/column for diagnostics.

use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Int,
    Double,
    Void,
    Def,
    Extern,
    If,
    Else,
    For,
    In,
    To,
    By,
    Do,
    Return,

    // Identifiers and literals
    Identifier,
    IntLiteral(i64),
    DoubleLiteral(f64),

    // Punctuation
    Colon,
    Semicolon,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "E:L{}:C{}:{}", self.line, self.column, self.message)
    }
}

impl std::error::Error for LexError {}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn keyword(text: &str) -> Option<TokenKind> {
    Some(match text {
        "int" => TokenKind::Int,
        "double" => TokenKind::Double,
        "void" => TokenKind::Void,
        "def" => TokenKind::Def,
        "extern" => TokenKind::Extern,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "in" => TokenKind::In,
        "to" => TokenKind::To,
        "by" => TokenKind::By,
        "do" => TokenKind::Do,
        "return" => TokenKind::Return,
        _ => return None,
    })
}

pub struct Lexer<'src> {
    source: &'src str,
    chars: Peekable<CharIndices<'src>>,
    pos: usize,
    line: u32,
    column: u32,
    limits: crate::limits::CompilerLimits,
    token_count: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, limits: &crate::limits::CompilerLimits) -> Result<Self, LexError> {
        if source.len() > limits.max_input_size {
            return Err(LexError {
                message: format!(
                    "Input too large: {} bytes (max: {} bytes).",
                    source.len(),
                    limits.max_input_size
                ),
                line: 1,
                column: 1,
            });
        }

        Ok(Self {
            source,
            chars: source.char_indices().peekable(),
            pos: 0,
            line: 1,
            column: 1,
            limits: limits.clone(),
            token_count: 0,
        })
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_char2(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.peek().map(|(_, c)| *c)
    }

    fn consume_char(&mut self) -> Option<char> {
        if let Some((pos, ch)) = self.chars.next() {
            self.pos = pos + ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(ch)
        } else {
            None
        }
    }

    fn consume_while<F: Fn(char) -> bool>(&mut self, predicate: F) {
        while let Some(c) = self.peek_char() {
            if predicate(c) {
                self.consume_char();
            } else {
                break;
            }
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.consume_char();
                }
                Some('/') if self.peek_char2() == Some('/') => {
                    self.consume_while(|c| c != '\n');
                }
                _ => break,
            }
        }
    }

    fn error(&self, message: String) -> LexError {
        LexError {
            message,
            line: self.line,
            column: self.column,
        }
    }

    /// Tokenize the whole source into a token stream terminated by `Eof`.
    pub fn lex(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        if self.token_count >= self.limits.max_token_count {
            return Err(self.error(format!(
                "Token limit exceeded (max {}). File is too complex.",
                self.limits.max_token_count
            )));
        }

        self.skip_trivia();

        let start_pos = self.pos;
        let start_line = self.line;
        let start_column = self.column;

        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some(c) if c.is_ascii_digit() => self.lex_number()?,
            Some(c) if is_ident_start(c) => self.lex_ident()?,
            Some(':') => {
                self.consume_char();
                TokenKind::Colon
            }
            Some(';') => {
                self.consume_char();
                TokenKind::Semicolon
            }
            Some(',') => {
                self.consume_char();
                TokenKind::Comma
            }
            Some('(') => {
                self.consume_char();
                TokenKind::LParen
            }
            Some(')') => {
                self.consume_char();
                TokenKind::RParen
            }
            Some('{') => {
                self.consume_char();
                TokenKind::LBrace
            }
            Some('}') => {
                self.consume_char();
                TokenKind::RBrace
            }
            Some('+') => {
                self.consume_char();
                TokenKind::Plus
            }
            Some('-') => {
                self.consume_char();
                TokenKind::Minus
            }
            Some('*') => {
                self.consume_char();
                TokenKind::Star
            }
            Some('/') => {
                self.consume_char();
                TokenKind::Slash
            }
            Some('%') => {
                self.consume_char();
                TokenKind::Percent
            }
            Some('=') => {
                self.consume_char();
                if self.peek_char() == Some('=') {
                    self.consume_char();
                    TokenKind::Eq
                } else {
                    TokenKind::Assign
                }
            }
            Some('!') if self.peek_char2() == Some('=') => {
                self.consume_char();
                self.consume_char();
                TokenKind::Ne
            }
            Some('<') => {
                self.consume_char();
                if self.peek_char() == Some('=') {
                    self.consume_char();
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            Some('>') => {
                self.consume_char();
                if self.peek_char() == Some('=') {
                    self.consume_char();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            Some(c) => return Err(self.error(format!("Unexpected character '{}'", c))),
        };

        self.token_count += 1;
        Ok(Token {
            kind,
            start: start_pos,
            end: self.pos,
            line: start_line,
            column: start_column,
        })
    }

    fn lex_ident(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;
        self.consume_while(is_ident_continue);
        let text = &self.source[start..self.pos];
        if text.len() > self.limits.max_identifier_length {
            return Err(self.error(format!(
                "Identifier too long: {} bytes (max {}).",
                text.len(),
                self.limits.max_identifier_length
            )));
        }
        Ok(keyword(text).unwrap_or(TokenKind::Identifier))
    }

    fn lex_number(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;
        self.consume_while(|c| c.is_ascii_digit());
        let mut is_float = false;
        if self.peek_char() == Some('.') && self.peek_char2().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.consume_char();
            self.consume_while(|c| c.is_ascii_digit());
        }
        let text = &self.source[start..self.pos];
        if is_float {
            let value: f64 = text
                .parse()
                .map_err(|_| self.error(format!("Invalid double literal '{}'", text)))?;
            Ok(TokenKind::DoubleLiteral(value))
        } else {
            let value: i64 = text
                .parse()
                .map_err(|_| self.error(format!("Invalid integer literal '{}'", text)))?;
            Ok(TokenKind::IntLiteral(value))
        }
    }
}

/// Convenience entry point: lex `source` under the given limits.
pub fn lex(source: &str, limits: &crate::limits::CompilerLimits) -> Result<Vec<Token>, LexError> {
    Lexer::new(source, limits)?.lex()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src, &crate::limits::CompilerLimits::default())
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_keywords_and_punctuation() {
        assert_eq!(
            kinds("def int main(){}"),
            vec![
                TokenKind::Def,
                TokenKind::Int,
                TokenKind::Identifier,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_numbers() {
        assert_eq!(
            kinds("42 3.14 0"),
            vec![
                TokenKind::IntLiteral(42),
                TokenKind::DoubleLiteral(3.14),
                TokenKind::IntLiteral(0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_comparison_operators() {
        assert_eq!(
            kinds("== != < > <= >= ="),
            vec![
                TokenKind::Eq,
                TokenKind::Ne,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Assign,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(
            kinds("int x; // trailing comment\nint y;"),
            vec![
                TokenKind::Int,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::Int,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = lex("int\nx", &crate::limits::CompilerLimits::default()).unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[1].column, 1);
    }

    #[test]
    fn rejects_identifier_over_limit() {
        let mut limits = crate::limits::CompilerLimits::default();
        limits.max_identifier_length = 3;
        let err = lex("abcdef", &limits).unwrap_err();
        assert!(err.message.contains("too long"));
    }
}
