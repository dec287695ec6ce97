mod ast;
mod environment;
mod error;
mod grader;
mod interpreter;
mod native;
mod parser;
mod scanner;
mod stack;
mod token;
mod usage;
mod value;

use std::io::Write;

use tracing::debug;

pub use ast::{Expr, FunctionDecl, Stmt, free_program};
pub use error::EvalaError;
pub use grader::{CommentAnalysis, GradeReport, Grader, MagicNumber, UnusedParam, Verdict};
pub use interpreter::{Flow, Interpreter, MAX_CALL_DEPTH};
pub use parser::Parser;
pub use scanner::{
    CommentStats, KEYWORDS, Scanned, Scanner, is_identifier_char, is_identifier_start,
};
pub use token::{Literal, Token, TokenType};
pub use usage::{FunctionUsage, UsageCollector};
pub use value::{Arity, NativeCall, NativeFn, Value};

/// Native functions available in every program.
pub const NATIVE_FUNCTIONS: &[&str] = &["clock", "TestCase", "runTests"];

pub struct Evala {
    interpreter: Interpreter,
}

impl Default for Evala {
    fn default() -> Self {
        Self::new()
    }
}

impl Evala {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.interpreter.variable_names()
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Scans, parses and runs `source`. Lexical and syntax errors are all
    /// collected and suppress evaluation; otherwise at most one runtime
    /// error is returned. Globals persist between calls.
    pub fn run<O: Write>(&mut self, source: &str, mut stdout: O) -> Vec<EvalaError> {
        let program = front_end(source);
        if !program.errors.is_empty() {
            free_program(program.statements);
            return program.errors;
        }

        let result = self.interpreter.interpret(&program.statements, &mut stdout);
        free_program(program.statements);
        match result {
            Ok(()) => Vec::new(),
            Err(e) => {
                debug!(error = %e, "runtime error aborted program");
                vec![e]
            }
        }
    }

    /// Grades the style of `source` without running it.
    pub fn grade(source: &str) -> Result<GradeReport, Vec<EvalaError>> {
        let program = front_end(source);
        if !program.errors.is_empty() {
            free_program(program.statements);
            return Err(program.errors);
        }

        let usage = UsageCollector::collect(&program.statements);
        free_program(program.statements);
        Ok(Grader::grade(&program.comments, &usage))
    }
}

/// A parsed source file along with everything its front end reported.
struct Program {
    statements: Vec<Stmt>,
    comments: CommentStats,
    errors: Vec<EvalaError>,
}

fn front_end(source: &str) -> Program {
    let scanned = Scanner::new(source).scan_all();
    debug!(
        tokens = scanned.tokens.len(),
        errors = scanned.errors.len(),
        "scanned source"
    );
    let mut errors = scanned.errors;

    let mut parser = Parser::new(scanned.tokens);
    let statements = parser.parse();
    errors.extend(parser.take_errors());

    Program {
        statements,
        comments: scanned.comments,
        errors,
    }
}
