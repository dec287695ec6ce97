//! Read-only walk over a parsed program collecting style facts.

use std::collections::HashSet;

use crate::ast::{Expr, FunctionDecl, Stmt};
use crate::stack::ensure_sufficient_stack;
use crate::token::Literal;

/// A numeric literal outside a variable initializer or assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct MagicNumber {
    pub value: f64,
    pub line: usize,
}

/// Parameters a function declares and the ones its own body reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionUsage {
    pub name: String,
    pub params: Vec<String>,
    pub params_read: HashSet<String>,
}

impl FunctionUsage {
    pub fn unused_params(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(|p| !self.params_read.contains(*p))
            .map(String::as_str)
    }
}

#[derive(Debug, Default)]
pub struct UsageCollector {
    pub writes: HashSet<String>,
    pub reads: HashSet<String>,
    pub functions: Vec<FunctionUsage>,
    pub if_count: usize,
    pub if_without_else: usize,
    pub magic_numbers: Vec<MagicNumber>,
    /// Indices into `functions` for the declarations being walked.
    function_stack: Vec<usize>,
    in_initializer: bool,
}

impl UsageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect(statements: &[Stmt]) -> Self {
        let mut collector = Self::new();
        collector.walk(statements);
        collector
    }

    pub fn walk(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        ensure_sufficient_stack(|| self.visit_stmt_inner(stmt));
    }

    fn visit_stmt_inner(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression { expression } | Stmt::Print { expression } => {
                self.visit_expr(expression)
            }
            Stmt::Var { name, initializer } => {
                self.writes.insert(name.lexeme.clone());
                if let Some(init) = initializer {
                    self.visit_initializer(init);
                }
            }
            Stmt::Block { statements } => self.walk(statements),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.if_count += 1;
                if else_branch.is_none() {
                    self.if_without_else += 1;
                }
                self.visit_expr(condition);
                self.visit_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.visit_stmt(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                self.visit_expr(condition);
                self.visit_stmt(body);
            }
            Stmt::Break { .. } => {}
            Stmt::Function(declaration) => self.visit_function(declaration),
            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    self.visit_expr(value);
                }
            }
        }
    }

    fn visit_function(&mut self, declaration: &FunctionDecl) {
        self.functions.push(FunctionUsage {
            name: declaration.name.lexeme.clone(),
            params: declaration.params.iter().map(|p| p.lexeme.clone()).collect(),
            params_read: HashSet::new(),
        });
        self.function_stack.push(self.functions.len() - 1);
        self.walk(&declaration.body);
        self.function_stack.pop();
    }

    fn visit_initializer(&mut self, expr: &Expr) {
        let previous = std::mem::replace(&mut self.in_initializer, true);
        self.visit_expr(expr);
        self.in_initializer = previous;
    }

    fn visit_expr(&mut self, expr: &Expr) {
        ensure_sufficient_stack(|| self.visit_expr_inner(expr));
    }

    fn visit_expr_inner(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal {
                value: Literal::Number(value),
                line,
            } => {
                if !self.in_initializer {
                    self.magic_numbers.push(MagicNumber {
                        value: *value,
                        line: *line,
                    });
                }
            }
            Expr::Literal { .. } => {}
            Expr::Grouping { expression } => self.visit_expr(expression),
            Expr::Unary { right, .. } => self.visit_expr(right),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.visit_expr(left);
                self.visit_expr(right);
            }
            Expr::Variable { name } => {
                self.reads.insert(name.lexeme.clone());
                if let Some(&index) = self.function_stack.last() {
                    let function = &mut self.functions[index];
                    if function.params.contains(&name.lexeme) {
                        function.params_read.insert(name.lexeme.clone());
                    }
                }
            }
            Expr::Assign { name, value } => {
                self.writes.insert(name.lexeme.clone());
                self.visit_initializer(value);
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                self.visit_expr(callee);
                for argument in arguments {
                    self.visit_expr(argument);
                }
            }
        }
    }
}
