use phf::phf_map;

use crate::error::EvalaError;
use crate::token::{Literal, Token, TokenType};

pub static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "and" => TokenType::And,
    "break" => TokenType::Break,
    "class" => TokenType::Class,
    "else" => TokenType::Else,
    "false" => TokenType::False,
    "for" => TokenType::For,
    "fun" => TokenType::Fun,
    "if" => TokenType::If,
    "nil" => TokenType::Nil,
    "or" => TokenType::Or,
    "print" => TokenType::Print,
    "return" => TokenType::Return,
    "super" => TokenType::Super,
    "this" => TokenType::This,
    "true" => TokenType::True,
    "var" => TokenType::Var,
    "while" => TokenType::While,
};

/// Check if a character can start an identifier
pub fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier
pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Line counts gathered while scanning, consumed by the style grader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentStats {
    pub single_line: usize,
    pub block_lines: usize,
    pub code_lines: usize,
    pub total_lines: usize,
}

impl CommentStats {
    pub fn comment_lines(&self) -> usize {
        self.single_line + self.block_lines
    }
}

/// Everything a full scan produces.
#[derive(Debug, Default)]
pub struct Scanned {
    pub tokens: Vec<Token>,
    pub errors: Vec<EvalaError>,
    pub comments: CommentStats,
}

pub struct Scanner<'a> {
    source: &'a str,
    start: usize,
    current: usize,
    line: usize,
    finished: bool,
    comments: CommentStats,
    last_code_line: Option<usize>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            start: 0,
            current: 0,
            line: 1,
            finished: false,
            comments: CommentStats::default(),
            last_code_line: None,
        }
    }

    /// Drains the scanner, keeping going past lexical errors.
    pub fn scan_all(mut self) -> Scanned {
        let mut scanned = Scanned::default();
        for result in self.by_ref() {
            match result {
                Ok(token) => scanned.tokens.push(token),
                Err(e) => scanned.errors.push(e),
            }
        }
        scanned.comments = self.comment_stats();
        scanned
    }

    pub fn comment_stats(&self) -> CommentStats {
        CommentStats {
            total_lines: self.line,
            ..self.comments
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Token, EvalaError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            if self.is_at_end() {
                self.finished = true;
                self.start = self.current;
                return Some(Ok(self.add_token(TokenType::Eof)));
            }

            self.start = self.current;
            let c = self.advance();

            let token_type = match c {
                ' ' | '\r' | '\t' => continue,
                '\n' => {
                    self.line += 1;
                    continue;
                }
                '(' => TokenType::LeftParen,
                ')' => TokenType::RightParen,
                '{' => TokenType::LeftBrace,
                '}' => TokenType::RightBrace,
                ',' => TokenType::Comma,
                '.' => TokenType::Dot,
                '-' => TokenType::Minus,
                '+' => TokenType::Plus,
                ';' => TokenType::Semicolon,
                '*' => TokenType::Star,
                '/' => {
                    if self.match_char('/') {
                        self.line_comment();
                        continue;
                    } else if self.match_char('*') {
                        self.block_comment();
                        continue;
                    }
                    TokenType::Slash
                }
                '!' => self.either('=', TokenType::BangEqual, TokenType::Bang),
                '=' => self.either('=', TokenType::EqualEqual, TokenType::Equal),
                '<' => self.either('=', TokenType::LessEqual, TokenType::Less),
                '>' => self.either('=', TokenType::GreaterEqual, TokenType::Greater),
                '"' => return Some(self.string()),
                c if c.is_ascii_digit() => return Some(self.number()),
                c if is_identifier_start(c) => return Some(Ok(self.identifier())),
                _ => {
                    return Some(Err(EvalaError::Scan {
                        message: format!("Unexpected character '{}'.", c),
                        line: self.line,
                        span: self.start..self.current,
                    }));
                }
            };

            return Some(Ok(self.add_token(token_type)));
        }
    }
}

impl Scanner<'_> {
    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        match self.source[self.current..].chars().next() {
            Some(c) => {
                self.current += c.len_utf8();
                c
            }
            None => '\0',
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.current..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.current..].chars();
        chars.next();
        chars.next()
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn either(&mut self, next: char, matched: TokenType, single: TokenType) -> TokenType {
        if self.match_char(next) { matched } else { single }
    }

    fn add_token(&mut self, token_type: TokenType) -> Token {
        self.make_token(token_type, None)
    }

    fn make_token(&mut self, token_type: TokenType, literal: Option<Literal>) -> Token {
        if token_type != TokenType::Eof && self.last_code_line != Some(self.line) {
            self.comments.code_lines += 1;
            self.last_code_line = Some(self.line);
        }

        Token {
            token_type,
            lexeme: self.source[self.start..self.current].to_string(),
            literal,
            line: self.line,
            span: self.start..self.current,
        }
    }

    fn line_comment(&mut self) {
        self.comments.single_line += 1;
        while self.peek().is_some_and(|c| c != '\n') {
            self.advance();
        }
    }

    /// Consumes up to the first `*/`. An unterminated comment swallows the
    /// rest of the input without an error.
    fn block_comment(&mut self) {
        let start_line = self.line;

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_next() == Some('/') {
                self.advance();
                self.advance();
                break;
            }
            if self.advance() == '\n' {
                self.line += 1;
            }
        }

        self.comments.block_lines += self.line - start_line + 1;
    }

    fn identifier(&mut self) -> Token {
        while self.peek().is_some_and(is_identifier_char) {
            self.advance();
        }

        let text = &self.source[self.start..self.current];
        let token_type = KEYWORDS
            .get(text)
            .copied()
            .unwrap_or(TokenType::Identifier);
        self.add_token(token_type)
    }

    fn number(&mut self) -> Result<Token, EvalaError> {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        // Only a dot followed by a digit starts a fraction
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = &self.source[self.start..self.current];
        let value: f64 = text.parse().map_err(|_| EvalaError::Scan {
            message: format!("Invalid number '{}'.", text),
            line: self.line,
            span: self.start..self.current,
        })?;
        Ok(self.make_token(TokenType::Number, Some(Literal::Number(value))))
    }

    fn string(&mut self) -> Result<Token, EvalaError> {
        loop {
            match self.peek() {
                None => {
                    return Err(EvalaError::Scan {
                        message: "Unterminated string.".to_string(),
                        line: self.line,
                        span: self.start..self.current,
                    });
                }
                Some('"') => break,
                Some('\n') => {
                    self.line += 1;
                    self.advance();
                }
                Some(_) => {
                    self.advance();
                }
            }
        }

        self.advance(); // closing quote
        let value = self.source[self.start + 1..self.current - 1].to_string();
        Ok(self.make_token(TokenType::String, Some(Literal::String(value))))
    }
}
