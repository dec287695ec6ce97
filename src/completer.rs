use std::cell::RefCell;
use std::collections::BTreeSet;

use rustyline::Context;
use rustyline::completion::{Completer, Pair};
use rustyline_derive::{Helper, Highlighter, Hinter, Validator};

/// Completes keywords and the names currently in scope.
#[derive(Helper, Highlighter, Hinter, Validator)]
pub struct EvalaHelper {
    names: RefCell<BTreeSet<String>>,
}

impl EvalaHelper {
    pub fn new() -> Self {
        Self {
            names: RefCell::new(BTreeSet::new()),
        }
    }

    /// Replaces the known names with what the session currently defines.
    pub fn refresh_names(&self, names: impl IntoIterator<Item = String>) {
        *self.names.borrow_mut() = names.into_iter().collect();
    }

    fn word_start(line: &str, pos: usize) -> usize {
        line[..pos]
            .char_indices()
            .rev()
            .find(|(_, c)| !evala::is_identifier_char(*c))
            .map_or(0, |(i, c)| i + c.len_utf8())
    }

    /// Keywords and names starting with `prefix`, sorted, no duplicates.
    fn candidates(&self, prefix: &str) -> Vec<String> {
        if prefix.is_empty() {
            return Vec::new();
        }

        let mut matches: BTreeSet<String> = evala::KEYWORDS
            .keys()
            .filter(|keyword| keyword.starts_with(prefix))
            .map(|keyword| keyword.to_string())
            .collect();
        matches.extend(
            self.names
                .borrow()
                .iter()
                .filter(|name| name.starts_with(prefix))
                .cloned(),
        );
        matches.into_iter().collect()
    }
}

impl Completer for EvalaHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = Self::word_start(line, pos);
        let pairs = self
            .candidates(&line[start..pos])
            .into_iter()
            .map(|s| Pair {
                display: s.clone(),
                replacement: s,
            })
            .collect();

        Ok((start, pairs))
    }
}
