use std::borrow::Cow;

use evala::{EvalaError, Scanner, Token, TokenType};

/// Source typed at the REPL, held back until every block is closed.
pub struct ReplState {
    pending: String,
    depth: usize,
}

impl ReplState {
    pub fn new() -> Self {
        Self {
            pending: String::new(),
            depth: 0,
        }
    }

    pub fn prompt(&self) -> String {
        match self.depth {
            0 => "> ".to_string(),
            depth => format!("..{depth} "),
        }
    }

    /// Adds a line and hands back the whole entry once its braces balance.
    pub fn feed(&mut self, line: &str) -> Option<String> {
        self.pending.push_str(line);
        self.pending.push('\n');
        self.depth = open_braces(&self.pending);
        if self.depth > 0 {
            return None;
        }
        Some(std::mem::take(&mut self.pending))
    }

    pub fn cancel(&mut self) {
        self.pending.clear();
        self.depth = 0;
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Rewrites a bare expression such as `a + 1` into `print a + 1;`.
/// Anything else comes back untouched.
pub fn echo_expression(entry: &str) -> Cow<'_, str> {
    let Ok(tokens) = tokens(entry).collect::<Result<Vec<_>, _>>() else {
        return Cow::Borrowed(entry);
    };
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) if is_bare_expression(first, last) => Cow::Owned(format!(
            "print {};",
            &entry[first.span.start..last.span.end]
        )),
        _ => Cow::Borrowed(entry),
    }
}

fn is_bare_expression(first: &Token, last: &Token) -> bool {
    // Statements missing their `;` are left for the parser to report.
    let starts_statement = matches!(
        first.token_type,
        TokenType::Var
            | TokenType::Fun
            | TokenType::Class
            | TokenType::If
            | TokenType::While
            | TokenType::For
            | TokenType::Print
            | TokenType::Return
            | TokenType::Break
            | TokenType::LeftBrace
    );
    let ends_statement = matches!(
        last.token_type,
        TokenType::Semicolon | TokenType::RightBrace
    );
    !starts_statement && !ends_statement
}

/// Tokens of `source` without the trailing EOF. Strings and comments never
/// produce brace tokens, so they can't throw the depth off.
fn tokens(source: &str) -> impl Iterator<Item = Result<Token, EvalaError>> + '_ {
    Scanner::new(source)
        .filter(|result| !matches!(result, Ok(token) if token.token_type == TokenType::Eof))
}

fn open_braces(source: &str) -> usize {
    tokens(source)
        .filter_map(Result::ok)
        .fold(0, |depth, token| match token.token_type {
            TokenType::LeftBrace => depth + 1,
            TokenType::RightBrace => depth.saturating_sub(1),
            _ => depth,
        })
}
