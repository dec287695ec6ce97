//! Scope chain storage.
//!
//! Scopes live in an arena and refer to their enclosing scope by handle.
//! Closures hold the handle of the scope they were declared in, so a scope
//! that was captured must outlive the block that created it. Scopes are
//! created and released in stack order; a released scope is reclaimed once
//! it reaches the top of the arena, unless a closure captured it.

use std::collections::HashMap;

use crate::error::EvalaError;
use crate::token::Token;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvId(usize);

impl EnvId {
    pub const GLOBAL: EnvId = EnvId(0);
}

#[derive(Debug, Default)]
struct Scope {
    values: HashMap<String, Value>,
    enclosing: Option<EnvId>,
    captured: bool,
    released: bool,
}

#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                captured: true,
                ..Scope::default()
            }],
        }
    }

    /// Opens a child scope of `enclosing`.
    pub fn push(&mut self, enclosing: EnvId) -> EnvId {
        self.scopes.push(Scope {
            enclosing: Some(enclosing),
            ..Scope::default()
        });
        EnvId(self.scopes.len() - 1)
    }

    /// Marks a scope as exited and reclaims whatever dead scopes sit on top.
    pub fn release(&mut self, id: EnvId) {
        if let Some(scope) = self.scopes.get_mut(id.0) {
            scope.released = true;
        }
        while self
            .scopes
            .last()
            .is_some_and(|scope| scope.released && !scope.captured)
        {
            self.scopes.pop();
        }
    }

    /// Keeps `id` and every scope it can see alive for good.
    pub fn capture(&mut self, id: EnvId) {
        let mut current = Some(id);
        while let Some(EnvId(index)) = current {
            let scope = &mut self.scopes[index];
            if scope.captured {
                break;
            }
            scope.captured = true;
            current = scope.enclosing;
        }
    }

    /// Binds `name` in `env` itself, shadowing any outer binding.
    pub fn define(&mut self, env: EnvId, name: String, value: Value) {
        self.scopes[env.0].values.insert(name, value);
    }

    pub fn get(&self, env: EnvId, name: &Token) -> Result<Value, EvalaError> {
        let mut current = Some(env);
        while let Some(EnvId(index)) = current {
            let scope = &self.scopes[index];
            if let Some(value) = scope.values.get(&name.lexeme) {
                return Ok(value.clone());
            }
            current = scope.enclosing;
        }

        Err(undefined(name))
    }

    /// Updates the nearest existing binding; never creates one.
    pub fn assign(&mut self, env: EnvId, name: &Token, value: Value) -> Result<(), EvalaError> {
        let mut current = Some(env);
        while let Some(EnvId(index)) = current {
            let scope = &mut self.scopes[index];
            if let Some(slot) = scope.values.get_mut(&name.lexeme) {
                *slot = value;
                return Ok(());
            }
            current = scope.enclosing;
        }

        Err(undefined(name))
    }

    /// Looks a name up in one scope only.
    pub fn get_local(&self, env: EnvId, name: &str) -> Option<Value> {
        self.scopes.get(env.0)?.values.get(name).cloned()
    }

    pub fn variable_names(&self, env: EnvId) -> Vec<String> {
        let mut names = Vec::new();
        let mut current = Some(env);
        while let Some(EnvId(index)) = current {
            let scope = &self.scopes[index];
            for name in scope.values.keys() {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            current = scope.enclosing;
        }
        names
    }

    /// Number of scopes currently held.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }
}

fn undefined(name: &Token) -> EvalaError {
    EvalaError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}
