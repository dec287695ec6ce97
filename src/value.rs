use std::fmt;
use std::io::Write;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::environment::EnvId;
use crate::error::EvalaError;
use crate::interpreter::Interpreter;
use crate::token::{Literal, Token};

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Function(Rc<Function>),
    TestCase(Rc<TestCase>),
}

impl Value {
    /// `nil` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }
}

/// How many arguments a callable takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    /// The callable validates its own argument count.
    Variadic,
}

#[derive(Debug)]
pub enum Function {
    User(UserFunction),
    Native(NativeFunction),
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::User(f) => &f.declaration.name.lexeme,
            Function::Native(f) => &f.name,
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Function::User(f) => Arity::Fixed(f.declaration.params.len()),
            Function::Native(f) => f.arity,
        }
    }

    /// Invokes the callable. The argument count has already been checked
    /// against `arity` by the caller.
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
        output: &mut dyn Write,
    ) -> Result<Value, EvalaError> {
        match self {
            Function::User(f) => interpreter.call_function(f, arguments, paren, output),
            Function::Native(f) => {
                let mut call = NativeCall {
                    interpreter,
                    paren,
                    output,
                };
                (f.func)(&mut call, &arguments)
            }
        }
    }
}

/// A closure: the declaration plus the scope it was declared in.
#[derive(Debug)]
pub struct UserFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: EnvId,
}

pub type NativeFn = fn(&mut NativeCall<'_>, &[Value]) -> Result<Value, EvalaError>;

pub struct NativeFunction {
    pub name: String,
    pub arity: Arity,
    pub func: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// What a native function gets to work with while it runs.
pub struct NativeCall<'a> {
    pub interpreter: &'a mut Interpreter,
    pub paren: &'a Token,
    pub output: &'a mut dyn Write,
}

impl NativeCall<'_> {
    pub fn error(&self, message: impl Into<String>) -> EvalaError {
        EvalaError::runtime(self.paren, message)
    }
}

/// Built by the `TestCase` native, consumed by `runTests`.
#[derive(Debug)]
pub struct TestCase {
    pub function_name: String,
    pub args: Vec<Value>,
    pub expected: Value,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) if n.is_infinite() => {
                write!(f, "{}Infinity", if *n < 0.0 { "-" } else { "" })
            }
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Function(func) => write!(f, "{}", func),
            Value::TestCase(tc) => write!(f, "<test {}>", tc.function_name),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::User(_) => write!(f, "<fn {}>", self.name()),
            Function::Native(_) => write!(f, "<native fn {}>", self.name()),
        }
    }
}

impl From<Literal> for Value {
    fn from(lit: Literal) -> Self {
        match lit {
            Literal::Number(n) => Value::Number(n),
            Literal::String(s) => Value::String(s),
            Literal::Bool(b) => Value::Bool(b),
            Literal::Nil => Value::Nil,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::TestCase(a), Value::TestCase(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
