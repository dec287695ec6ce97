use std::ops::Range;

use thiserror::Error;

use crate::token::{Token, TokenType};

#[derive(Debug, Error)]
pub enum EvalaError {
    #[error("Could not read script: {0}")]
    Io(#[from] std::io::Error),

    #[error("[line {line}] Error: {message}")]
    Scan {
        message: String,
        line: usize,
        span: Range<usize>,
    },

    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
        span: Range<usize>,
    },

    #[error("{message}\n[line {line}]")]
    Runtime {
        message: String,
        line: usize,
        span: Range<usize>,
    },
}

impl EvalaError {
    pub fn parse(token: &Token, message: impl Into<String>) -> Self {
        let location = if token.token_type == TokenType::Eof {
            " at end".to_string()
        } else {
            format!(" at '{}'", token.lexeme)
        };
        EvalaError::Parse {
            message: message.into(),
            location,
            line: token.line,
            span: token.span.clone(),
        }
    }

    pub fn runtime(token: &Token, message: impl Into<String>) -> Self {
        EvalaError::Runtime {
            message: message.into(),
            line: token.line,
            span: token.span.clone(),
        }
    }

    /// Lexical and syntax errors; these suppress evaluation.
    pub fn is_static(&self) -> bool {
        matches!(self, EvalaError::Scan { .. } | EvalaError::Parse { .. })
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, EvalaError::Runtime { .. })
    }

    pub fn message(&self) -> String {
        match self {
            EvalaError::Io(e) => e.to_string(),
            EvalaError::Scan { message, .. }
            | EvalaError::Parse { message, .. }
            | EvalaError::Runtime { message, .. } => message.clone(),
        }
    }

    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            EvalaError::Io(_) => None,
            EvalaError::Scan { span, .. }
            | EvalaError::Parse { span, .. }
            | EvalaError::Runtime { span, .. } => Some(span.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    fn token(token_type: TokenType, lexeme: &str, line: usize) -> Token {
        Token::synthetic(token_type, lexeme, line)
    }

    #[test]
    fn io_error_converts_to_evala_error() {
        let io_err = Error::new(ErrorKind::NotFound, "file not found");
        let err: EvalaError = io_err.into();
        assert!(matches!(err, EvalaError::Io(_)));
        assert_eq!(err.to_string(), "Could not read script: file not found");
    }

    #[test]
    fn scan_error_shows_line() {
        let err = EvalaError::Scan {
            message: "Unexpected character.".to_string(),
            line: 3,
            span: 10..11,
        };
        assert_eq!(err.to_string(), "[line 3] Error: Unexpected character.");
    }

    #[test]
    fn parse_error_names_offending_lexeme() {
        let err = EvalaError::parse(&token(TokenType::Plus, "+", 2), "Expect expression.");
        assert_eq!(err.to_string(), "[line 2] Error at '+': Expect expression.");
    }

    #[test]
    fn parse_error_at_eof_says_at_end() {
        let err = EvalaError::parse(&token(TokenType::Eof, "", 7), "Expect ';' after value.");
        assert_eq!(err.to_string(), "[line 7] Error at end: Expect ';' after value.");
    }

    #[test]
    fn runtime_error_puts_line_after_message() {
        let err = EvalaError::runtime(&token(TokenType::Minus, "-", 4), "Operand must be a number.");
        assert_eq!(err.to_string(), "Operand must be a number.\n[line 4]");
        assert!(err.is_runtime());
        assert!(!err.is_static());
    }

    #[test]
    fn message_strips_location() {
        let err = EvalaError::parse(&token(TokenType::Plus, "+", 2), "Expect expression.");
        assert_eq!(err.message(), "Expect expression.");
        assert!(err.is_static());
    }
}
