use std::fmt;
use std::rc::Rc;

use crate::token::{Literal, Token};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        value: Literal,
        line: usize,
    },
    Grouping {
        expression: Box<Expr>,
    },
    Unary {
        operator: Token,
        right: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Variable {
        name: Token,
    },
    Assign {
        name: Token,
        value: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },
}

/// A function declaration. Shared between the statement tree and every
/// closure created from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression {
        expression: Expr,
    },
    Print {
        expression: Expr,
    },
    Var {
        name: Token,
        initializer: Option<Expr>,
    },
    Block {
        statements: Vec<Stmt>,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    Break {
        keyword: Token,
    },
    Function(Rc<FunctionDecl>),
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
}

/// Frees a program one node at a time. The derived drop recurses once per
/// nesting level, which deeply nested scripts can't afford.
pub fn free_program(statements: Vec<Stmt>) {
    let mut statements = statements;
    let mut expressions = Vec::new();

    while let Some(stmt) = statements.pop() {
        match stmt {
            Stmt::Expression { expression } | Stmt::Print { expression } => {
                expressions.push(expression)
            }
            Stmt::Var { initializer, .. } => expressions.extend(initializer),
            Stmt::Block { statements: inner } => statements.extend(inner),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                expressions.push(condition);
                statements.push(*then_branch);
                statements.extend(else_branch.map(|branch| *branch));
            }
            Stmt::While { condition, body } => {
                expressions.push(condition);
                statements.push(*body);
            }
            Stmt::Break { .. } => {}
            // A closure still holding the declaration frees it later.
            Stmt::Function(declaration) => {
                if let Ok(declaration) = Rc::try_unwrap(declaration) {
                    statements.extend(declaration.body);
                }
            }
            Stmt::Return { value, .. } => expressions.extend(value),
        }
    }

    while let Some(expr) = expressions.pop() {
        match expr {
            Expr::Literal { .. } | Expr::Variable { .. } => {}
            Expr::Grouping { expression } => expressions.push(*expression),
            Expr::Unary { right, .. } => expressions.push(*right),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                expressions.push(*left);
                expressions.push(*right);
            }
            Expr::Assign { value, .. } => expressions.push(*value),
            Expr::Call {
                callee, arguments, ..
            } => {
                expressions.push(*callee);
                expressions.extend(arguments);
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal {
                value: Literal::String(s),
                ..
            } => write!(f, "\"{}\"", s),
            Expr::Literal { value, .. } => write!(f, "{}", value),
            Expr::Grouping { expression } => write!(f, "(group {})", expression),
            Expr::Unary { operator, right } => write!(f, "({} {})", operator.lexeme, right),
            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", operator.lexeme, left, right),
            Expr::Variable { name } => write!(f, "{}", name.lexeme),
            Expr::Assign { name, value } => write!(f, "(= {} {})", name.lexeme, value),
            Expr::Call {
                callee, arguments, ..
            } => {
                write!(f, "(call {}", callee)?;
                for argument in arguments {
                    write!(f, " {}", argument)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expression { expression } => write!(f, "(; {})", expression),
            Stmt::Print { expression } => write!(f, "(print {})", expression),
            Stmt::Var {
                name,
                initializer: Some(init),
            } => write!(f, "(var {} {})", name.lexeme, init),
            Stmt::Var { name, .. } => write!(f, "(var {})", name.lexeme),
            Stmt::Block { statements } => {
                write!(f, "(block")?;
                for stmt in statements {
                    write!(f, " {}", stmt)?;
                }
                write!(f, ")")
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => {
                    write!(f, "(if {} {} {})", condition, then_branch, else_branch)
                }
                None => write!(f, "(if {} {})", condition, then_branch),
            },
            Stmt::While { condition, body } => write!(f, "(while {} {})", condition, body),
            Stmt::Break { .. } => write!(f, "(break)"),
            Stmt::Function(decl) => {
                let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
                write!(f, "(fun {} ({})", decl.name.lexeme, params.join(" "))?;
                for stmt in &decl.body {
                    write!(f, " {}", stmt)?;
                }
                write!(f, ")")
            }
            Stmt::Return { value: Some(v), .. } => write!(f, "(return {})", v),
            Stmt::Return { value: None, .. } => write!(f, "(return)"),
        }
    }
}
