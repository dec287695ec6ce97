use std::io::Write;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::ast::{Expr, Stmt};
use crate::environment::{EnvId, Environment};
use crate::error::EvalaError;
use crate::native;
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};
use crate::value::{Arity, Function, NativeFn, NativeFunction, UserFunction, Value};

/// Deepest chain of script function calls before a call fails.
pub const MAX_CALL_DEPTH: usize = 1000;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
    Break,
}

pub struct Interpreter {
    environments: Environment,
    environment: EnvId,
    loop_depth: usize,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let mut interpreter = Self {
            environments: Environment::new(),
            environment: EnvId::GLOBAL,
            loop_depth: 0,
            call_depth: 0,
        };
        native::install(&mut interpreter);
        interpreter
    }

    /// Registers a host function in the global scope.
    pub fn define_native(&mut self, name: &str, arity: Arity, func: NativeFn) {
        let function = Function::Native(NativeFunction {
            name: name.to_string(),
            arity,
            func,
        });
        self.environments.define(
            EnvId::GLOBAL,
            name.to_string(),
            Value::Function(Rc::new(function)),
        );
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.environments.get_local(EnvId::GLOBAL, name)
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.environments.variable_names(self.environment)
    }

    /// Runs a program, stopping at the first runtime error.
    pub fn interpret(
        &mut self,
        statements: &[Stmt],
        output: &mut dyn Write,
    ) -> Result<(), EvalaError> {
        debug!(statements = statements.len(), "interpreting program");
        for statement in statements {
            self.execute(statement, output)?;
        }
        Ok(())
    }

    pub fn execute(&mut self, stmt: &Stmt, output: &mut dyn Write) -> Result<Flow, EvalaError> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt, output))
    }

    fn execute_stmt(&mut self, stmt: &Stmt, output: &mut dyn Write) -> Result<Flow, EvalaError> {
        match stmt {
            Stmt::Print { expression } => {
                let value = self.evaluate(expression, output)?;
                writeln!(output, "{}", value)?;
                Ok(Flow::Normal)
            }
            Stmt::Expression { expression } => {
                self.evaluate(expression, output)?;
                Ok(Flow::Normal)
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr, output)?,
                    None => Value::Nil,
                };
                self.environments
                    .define(self.environment, name.lexeme.clone(), value);
                Ok(Flow::Normal)
            }
            Stmt::Block { statements } => {
                let env = self.environments.push(self.environment);
                self.execute_block(statements, env, output)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition, output)?.is_truthy() {
                    self.execute(then_branch, output)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt, output)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { condition, body } => {
                self.loop_depth += 1;
                let result = self.execute_loop(condition, body, output);
                self.loop_depth -= 1;
                result
            }
            Stmt::Break { keyword } => {
                if self.loop_depth == 0 {
                    return Err(EvalaError::runtime(
                        keyword,
                        "Can't use 'break' outside of a loop.",
                    ));
                }
                Ok(Flow::Break)
            }
            Stmt::Function(declaration) => {
                self.environments.capture(self.environment);
                let function = Function::User(UserFunction {
                    declaration: Rc::clone(declaration),
                    closure: self.environment,
                });
                self.environments.define(
                    self.environment,
                    declaration.name.lexeme.clone(),
                    Value::Function(Rc::new(function)),
                );
                Ok(Flow::Normal)
            }
            Stmt::Return { keyword, value } => {
                if self.call_depth == 0 {
                    return Err(EvalaError::runtime(
                        keyword,
                        "Can't return from top-level code.",
                    ));
                }
                let value = match value {
                    Some(expr) => self.evaluate(expr, output)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }
        }
    }

    fn execute_loop(
        &mut self,
        condition: &Expr,
        body: &Stmt,
        output: &mut dyn Write,
    ) -> Result<Flow, EvalaError> {
        while self.evaluate(condition, output)?.is_truthy() {
            match self.execute(body, output)? {
                Flow::Normal => {}
                Flow::Break => break,
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// Runs `statements` with `env` as the current scope, then restores the
    /// previous scope and releases `env` however the block exits.
    fn execute_block(
        &mut self,
        statements: &[Stmt],
        env: EnvId,
        output: &mut dyn Write,
    ) -> Result<Flow, EvalaError> {
        let previous = std::mem::replace(&mut self.environment, env);

        let mut result = Ok(Flow::Normal);
        for statement in statements {
            match self.execute(statement, output) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        self.environments.release(env);
        result
    }

    pub(crate) fn call_function(
        &mut self,
        function: &UserFunction,
        arguments: Vec<Value>,
        paren: &Token,
        output: &mut dyn Write,
    ) -> Result<Value, EvalaError> {
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(EvalaError::runtime(paren, "Stack overflow."));
        }
        trace!(
            function = %function.declaration.name.lexeme,
            depth = self.call_depth,
            "calling function"
        );

        let env = self.environments.push(function.closure);
        for (param, argument) in function.declaration.params.iter().zip(arguments) {
            self.environments.define(env, param.lexeme.clone(), argument);
        }

        let saved_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        self.call_depth += 1;
        let result = ensure_sufficient_stack(|| {
            self.execute_block(&function.declaration.body, env, output)
        });
        self.call_depth -= 1;
        self.loop_depth = saved_loop_depth;

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal | Flow::Break => Ok(Value::Nil),
        }
    }

    pub fn evaluate(&mut self, expr: &Expr, output: &mut dyn Write) -> Result<Value, EvalaError> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr, output))
    }

    fn evaluate_expr(&mut self, expr: &Expr, output: &mut dyn Write) -> Result<Value, EvalaError> {
        match expr {
            Expr::Literal { value, .. } => Ok(Value::from(value.clone())),
            Expr::Grouping { expression } => self.evaluate(expression, output),
            Expr::Unary { operator, right } => {
                let right_val = self.evaluate(right, output)?;
                match operator.token_type {
                    TokenType::Minus => match right_val {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(EvalaError::runtime(operator, "Operand must be a number.")),
                    },
                    TokenType::Bang => Ok(Value::Bool(!right_val.is_truthy())),
                    _ => unreachable!(),
                }
            }
            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left, output)?;
                let right_val = self.evaluate(right, output)?;
                self.binary(operator, left_val, right_val)
            }
            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left, output)?;
                let short_circuits = match operator.token_type {
                    TokenType::Or => left_val.is_truthy(),
                    _ => !left_val.is_truthy(),
                };
                if short_circuits {
                    Ok(left_val)
                } else {
                    self.evaluate(right, output)
                }
            }
            Expr::Variable { name } => self.environments.get(self.environment, name),
            Expr::Assign { name, value } => {
                let value = self.evaluate(value, output)?;
                self.environments
                    .assign(self.environment, name, value.clone())?;
                Ok(value)
            }
            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee, output)?;
                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument, output)?);
                }

                let Value::Function(function) = callee else {
                    return Err(EvalaError::runtime(
                        paren,
                        "Can only call functions and classes.",
                    ));
                };
                match function.arity() {
                    Arity::Fixed(expected) if expected != values.len() => {
                        Err(EvalaError::runtime(
                            paren,
                            format!("Expected {} arguments but got {}.", expected, values.len()),
                        ))
                    }
                    Arity::Fixed(_) | Arity::Variadic => {
                        function.call(self, values, paren, output)
                    }
                }
            }
        }
    }

    fn binary(&self, operator: &Token, left: Value, right: Value) -> Result<Value, EvalaError> {
        match operator.token_type {
            TokenType::Minus | TokenType::Slash | TokenType::Star => {
                let (a, b) = self.require_numbers(&left, &right, operator)?;
                match operator.token_type {
                    TokenType::Minus => Ok(Value::Number(a - b)),
                    TokenType::Slash => Ok(Value::Number(a / b)),
                    TokenType::Star => Ok(Value::Number(a * b)),
                    _ => unreachable!(),
                }
            }
            TokenType::Plus => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(EvalaError::runtime(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },
            TokenType::Greater
            | TokenType::GreaterEqual
            | TokenType::Less
            | TokenType::LessEqual => {
                let (a, b) = self.require_numbers(&left, &right, operator)?;
                let result = match operator.token_type {
                    TokenType::Greater => a > b,
                    TokenType::GreaterEqual => a >= b,
                    TokenType::Less => a < b,
                    TokenType::LessEqual => a <= b,
                    _ => unreachable!(),
                };
                Ok(Value::Bool(result))
            }
            TokenType::EqualEqual => Ok(Value::Bool(left == right)),
            TokenType::BangEqual => Ok(Value::Bool(left != right)),
            _ => unreachable!(),
        }
    }

    fn require_numbers(
        &self,
        left: &Value,
        right: &Value,
        operator: &Token,
    ) -> Result<(f64, f64), EvalaError> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
            _ => Err(EvalaError::runtime(operator, "Operands must be numbers.")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;
    use crate::token::Literal;

    fn make_token(token_type: TokenType, lexeme: &str, line: usize) -> Token {
        Token::synthetic(token_type, lexeme, line)
    }

    fn literal(value: Literal) -> Expr {
        Expr::Literal { value, line: 1 }
    }

    fn binary(left: Literal, token_type: TokenType, lexeme: &str, right: Literal) -> Expr {
        Expr::Binary {
            left: Box::new(literal(left)),
            operator: make_token(token_type, lexeme, 1),
            right: Box::new(literal(right)),
        }
    }

    fn eval(expr: &Expr) -> Result<Value, EvalaError> {
        Interpreter::new().evaluate(expr, &mut Vec::new())
    }

    fn parse(source: &str) -> Vec<Stmt> {
        let scanned = Scanner::new(source).scan_all();
        assert!(scanned.errors.is_empty(), "scan errors: {:?}", scanned.errors);
        let mut parser = Parser::new(scanned.tokens);
        let statements = parser.parse();
        assert!(!parser.had_error(), "parse errors: {:?}", parser.take_errors());
        statements
    }

    fn run_with(
        interpreter: &mut Interpreter,
        source: &str,
    ) -> (String, Result<(), EvalaError>) {
        let statements = parse(source);
        let mut output = Vec::new();
        let result = interpreter.interpret(&statements, &mut output);
        (String::from_utf8(output).unwrap(), result)
    }

    fn run(source: &str) -> (String, Result<(), EvalaError>) {
        run_with(&mut Interpreter::new(), source)
    }

    fn run_ok(source: &str) -> String {
        let (output, result) = run(source);
        assert!(result.is_ok(), "runtime error: {:?}", result);
        output
    }

    fn run_err(source: &str) -> (String, String) {
        let (output, result) = run(source);
        let err = result.expect_err("expected a runtime error");
        assert!(err.is_runtime());
        (output, err.message())
    }

    // === expressions ===

    #[test]
    fn evaluates_literals() {
        assert_eq!(eval(&literal(Literal::Number(42.0))).unwrap(), Value::Number(42.0));
        assert_eq!(
            eval(&literal(Literal::String("evala".to_string()))).unwrap(),
            Value::String("evala".to_string())
        );
        assert_eq!(eval(&literal(Literal::Nil)).unwrap(), Value::Nil);
    }

    #[test]
    fn evaluates_grouping() {
        let expr = Expr::Grouping {
            expression: Box::new(literal(Literal::Bool(true))),
        };
        assert_eq!(eval(&expr).unwrap(), Value::Bool(true));
    }

    #[test]
    fn evaluates_unary_minus() {
        let expr = Expr::Unary {
            operator: make_token(TokenType::Minus, "-", 1),
            right: Box::new(literal(Literal::Number(3.0))),
        };
        assert_eq!(eval(&expr).unwrap(), Value::Number(-3.0));
    }

    #[test]
    fn unary_minus_requires_a_number() {
        let expr = Expr::Unary {
            operator: make_token(TokenType::Minus, "-", 7),
            right: Box::new(literal(Literal::String("x".to_string()))),
        };
        let err = eval(&expr).unwrap_err();
        assert_eq!(err.to_string(), "Operand must be a number.\n[line 7]");
    }

    #[test]
    fn bang_applies_truthiness() {
        let not = |value| Expr::Unary {
            operator: make_token(TokenType::Bang, "!", 1),
            right: Box::new(literal(value)),
        };
        assert_eq!(eval(&not(Literal::Number(0.0))).unwrap(), Value::Bool(false));
        assert_eq!(eval(&not(Literal::Nil)).unwrap(), Value::Bool(true));
        assert_eq!(
            eval(&not(Literal::String(String::new()))).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(eval(&not(Literal::Bool(false))).unwrap(), Value::Bool(true));
    }

    #[test]
    fn evaluates_arithmetic() {
        let n = Literal::Number;
        assert_eq!(
            eval(&binary(n(1.0), TokenType::Plus, "+", n(2.0))).unwrap(),
            Value::Number(3.0)
        );
        assert_eq!(
            eval(&binary(n(5.0), TokenType::Minus, "-", n(2.0))).unwrap(),
            Value::Number(3.0)
        );
        assert_eq!(
            eval(&binary(n(4.0), TokenType::Star, "*", n(2.5))).unwrap(),
            Value::Number(10.0)
        );
        assert_eq!(
            eval(&binary(n(10.0), TokenType::Slash, "/", n(4.0))).unwrap(),
            Value::Number(2.5)
        );
    }

    #[test]
    fn plus_concatenates_strings() {
        let s = |text: &str| Literal::String(text.to_string());
        assert_eq!(
            eval(&binary(s("a"), TokenType::Plus, "+", s("b"))).unwrap(),
            Value::String("ab".to_string())
        );
    }

    #[test]
    fn plus_rejects_mixed_operands() {
        let expr = binary(
            Literal::Number(1.0),
            TokenType::Plus,
            "+",
            Literal::String("a".to_string()),
        );
        assert_eq!(
            eval(&expr).unwrap_err().message(),
            "Operands must be two numbers or two strings."
        );
    }

    #[test]
    fn arithmetic_and_comparison_require_numbers() {
        for (token_type, lexeme) in [
            (TokenType::Minus, "-"),
            (TokenType::Star, "*"),
            (TokenType::Slash, "/"),
            (TokenType::Greater, ">"),
            (TokenType::LessEqual, "<="),
        ] {
            let expr = binary(Literal::Bool(true), token_type, lexeme, Literal::Number(1.0));
            assert_eq!(eval(&expr).unwrap_err().message(), "Operands must be numbers.");
        }
    }

    #[test]
    fn evaluates_comparisons() {
        let n = Literal::Number;
        assert_eq!(
            eval(&binary(n(2.0), TokenType::Greater, ">", n(1.0))).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            eval(&binary(n(1.0), TokenType::GreaterEqual, ">=", n(1.0))).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            eval(&binary(n(2.0), TokenType::Less, "<", n(1.0))).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn equality_never_fails() {
        let eq = |l, r| eval(&binary(l, TokenType::EqualEqual, "==", r)).unwrap();
        assert_eq!(eq(Literal::Nil, Literal::Nil), Value::Bool(true));
        assert_eq!(eq(Literal::Nil, Literal::Bool(false)), Value::Bool(false));
        assert_eq!(
            eq(Literal::Number(1.0), Literal::String("1".to_string())),
            Value::Bool(false)
        );
        let ne = eval(&binary(
            Literal::Number(1.0),
            TokenType::BangEqual,
            "!=",
            Literal::Number(2.0),
        ))
        .unwrap();
        assert_eq!(ne, Value::Bool(true));
    }

    #[test]
    fn logical_operators_return_an_operand() {
        assert_eq!(run_ok("print nil or \"yes\";"), "yes\n");
        assert_eq!(run_ok("print 0 or \"no\";"), "0\n");
        assert_eq!(run_ok("print nil and undefined;"), "nil\n");
        assert_eq!(run_ok("print 1 and 2;"), "2\n");
    }

    #[test]
    fn logical_operators_short_circuit() {
        let output = run_ok(
            "var called = false;\n\
             fun touch() { called = true; return true; }\n\
             var r = true or touch();\n\
             print called;\n\
             r = false and touch();\n\
             print called;",
        );
        assert_eq!(output, "false\nfalse\n");
    }

    // === statements ===

    #[test]
    fn executes_print_statement() {
        let mut interpreter = Interpreter::new();
        let stmt = Stmt::Print {
            expression: literal(Literal::Number(42.0)),
        };
        let mut output = Vec::new();
        let flow = interpreter.execute(&stmt, &mut output).unwrap();
        assert_eq!(flow, Flow::Normal);
        assert_eq!(String::from_utf8(output).unwrap(), "42\n");
    }

    #[test]
    fn expression_statement_prints_nothing() {
        assert_eq!(run_ok("1 + 2;"), "");
    }

    #[test]
    fn var_without_initializer_is_nil() {
        assert_eq!(run_ok("var a; print a;"), "nil\n");
    }

    #[test]
    fn assignment_is_an_expression() {
        assert_eq!(run_ok("var a; var b; a = b = 3; print a; print b;"), "3\n3\n");
    }

    #[test]
    fn undefined_read_and_assignment_fail() {
        let (_, message) = run_err("print ghost;");
        assert_eq!(message, "Undefined variable 'ghost'.");
        let (_, message) = run_err("ghost = 1;");
        assert_eq!(message, "Undefined variable 'ghost'.");
    }

    #[test]
    fn definitions_are_not_hoisted() {
        let mut interpreter = Interpreter::new();
        let (_, result) = run_with(&mut interpreter, "print later;");
        assert!(result.is_err());
        let (output, result) = run_with(&mut interpreter, "var later = 1; print later;");
        assert!(result.is_ok());
        assert_eq!(output, "1\n");
    }

    #[test]
    fn block_shadows_and_restores() {
        let output = run_ok("var x = 1; { var x = 2; print x; } print x;");
        assert_eq!(output, "2\n1\n");
    }

    #[test]
    fn block_assignment_updates_outer_scope() {
        assert_eq!(run_ok("var x = 1; { x = 2; } print x;"), "2\n");
    }

    #[test]
    fn block_error_restores_environment() {
        let mut interpreter = Interpreter::new();
        let (_, result) = run_with(&mut interpreter, "var x = 1; { var y = 99; missing; }");
        assert!(result.is_err());

        let (output, result) = run_with(&mut interpreter, "print x;");
        assert!(result.is_ok());
        assert_eq!(output, "1\n");
        let (_, result) = run_with(&mut interpreter, "print y;");
        assert!(result.is_err());
    }

    #[test]
    fn if_else_picks_a_branch() {
        assert_eq!(run_ok("if (0) print \"then\"; else print \"else\";"), "then\n");
        assert_eq!(run_ok("if (nil) print \"then\"; else print \"else\";"), "else\n");
        assert_eq!(run_ok("if (false) print \"then\";"), "");
    }

    #[test]
    fn while_loops_until_condition_is_falsy() {
        assert_eq!(
            run_ok("var i = 0; while (i < 3) { print i; i = i + 1; }"),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn for_loop_runs_initializer_condition_and_increment() {
        assert_eq!(
            run_ok("for (var i = 0; i < 3; i = i + 1) print i;"),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn break_leaves_only_the_innermost_loop() {
        let output = run_ok(
            "while (true) { while (true) { break; } print \"inner done\"; break; }",
        );
        assert_eq!(output, "inner done\n");
    }

    #[test]
    fn break_inside_for_skips_increment() {
        let output = run_ok(
            "var i = 0;\n\
             for (; i < 10; i = i + 1) { if (i == 2) break; }\n\
             print i;",
        );
        assert_eq!(output, "2\n");
    }

    #[test]
    fn stray_break_is_a_runtime_error() {
        let mut interpreter = Interpreter::new();
        let stmt = Stmt::Break {
            keyword: make_token(TokenType::Break, "break", 4),
        };
        let err = interpreter.execute(&stmt, &mut Vec::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Can't use 'break' outside of a loop.\n[line 4]"
        );
    }

    #[test]
    fn stray_return_is_a_runtime_error() {
        let mut interpreter = Interpreter::new();
        let stmt = Stmt::Return {
            keyword: make_token(TokenType::Return, "return", 2),
            value: None,
        };
        let err = interpreter.execute(&stmt, &mut Vec::new()).unwrap_err();
        assert_eq!(err.message(), "Can't return from top-level code.");
    }

    #[test]
    fn runtime_error_aborts_the_rest_of_the_program() {
        let (output, message) = run_err("print 1; print -\"a\"; print 2;");
        assert_eq!(output, "1\n");
        assert_eq!(message, "Operand must be a number.");
    }

    // === functions ===

    #[test]
    fn calls_user_function() {
        assert_eq!(run_ok("fun add(a, b) { return a + b; } print add(2, 3);"), "5\n");
    }

    #[test]
    fn function_without_return_yields_nil() {
        assert_eq!(run_ok("fun f() { 1; } print f();"), "nil\n");
        assert_eq!(run_ok("fun f() { return; } print f();"), "nil\n");
    }

    #[test]
    fn return_unwinds_nested_loops() {
        let output = run_ok(
            "fun find() {\n\
               var i = 0;\n\
               while (true) { while (true) { i = i + 1; if (i == 5) return i; } }\n\
             }\n\
             print find();",
        );
        assert_eq!(output, "5\n");
    }

    #[test]
    fn recursion_works() {
        let output = run_ok(
            "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }\n\
             print fib(15);",
        );
        assert_eq!(output, "610\n");
    }

    #[test]
    fn functions_display_by_name() {
        assert_eq!(run_ok("fun f() {} print f;"), "<fn f>\n");
        assert_eq!(run_ok("print clock;"), "<native fn clock>\n");
    }

    #[test]
    fn closures_keep_their_defining_scope() {
        let output = run_ok(
            "fun makeCounter() {\n\
               var i = 0;\n\
               fun count() { i = i + 1; return i; }\n\
               return count;\n\
             }\n\
             var c = makeCounter();\n\
             print c();\n\
             print c();\n\
             var d = makeCounter();\n\
             print d();",
        );
        assert_eq!(output, "1\n2\n1\n");
    }

    #[test]
    fn closures_share_their_defining_scope() {
        let output = run_ok(
            "var a = \"global\";\n\
             {\n\
               fun show() { print a; }\n\
               show();\n\
               var a = \"block\";\n\
               show();\n\
             }",
        );
        // The block scope is captured by reference, so the later
        // declaration is visible to the second call.
        assert_eq!(output, "global\nblock\n");
    }

    #[test]
    fn closures_capture_each_iteration_scope() {
        let output = run_ok(
            "var first; var second;\n\
             for (var i = 0; i < 2; i = i + 1) {\n\
               var j = i;\n\
               fun f() { print j; }\n\
               if (i == 0) first = f; else second = f;\n\
             }\n\
             first();\n\
             second();",
        );
        assert_eq!(output, "0\n1\n");
    }

    #[test]
    fn calling_a_non_function_fails() {
        let (_, message) = run_err("\"text\"();");
        assert_eq!(message, "Can only call functions and classes.");
    }

    #[test]
    fn arity_mismatch_reports_expected_and_actual() {
        let (_, message) = run_err("fun add(a, b) { return a + b; } add(1);");
        assert_eq!(message, "Expected 2 arguments but got 1.");
        let (_, message) = run_err("fun add(a, b) { return a + b; } add(1, 2, 3);");
        assert_eq!(message, "Expected 2 arguments but got 3.");
    }

    #[test]
    fn arguments_evaluate_left_to_right() {
        let output = run_ok(
            "fun show(x) { print x; return x; }\n\
             fun pair(a, b) {}\n\
             pair(show(1), show(2));",
        );
        assert_eq!(output, "1\n2\n");
    }

    #[test]
    fn unbounded_recursion_is_a_runtime_error() {
        let (_, message) = run_err("fun f() { f(); } f();");
        assert_eq!(message, "Stack overflow.");
    }

    #[test]
    fn call_depth_recovers_after_overflow() {
        let mut interpreter = Interpreter::new();
        let (_, result) = run_with(&mut interpreter, "fun f() { f(); } f();");
        assert!(result.is_err());
        let (output, result) = run_with(&mut interpreter, "fun g() { return 1; } print g();");
        assert!(result.is_ok());
        assert_eq!(output, "1\n");
    }

    #[test]
    fn variadic_native_skips_arity_check() {
        fn count(_: &mut crate::value::NativeCall<'_>, args: &[Value]) -> Result<Value, EvalaError> {
            Ok(Value::Number(args.len() as f64))
        }
        let mut interpreter = Interpreter::new();
        interpreter.define_native("count", Arity::Variadic, count);
        let (output, result) = run_with(&mut interpreter, "print count(); print count(1, 2, 3);");
        assert!(result.is_ok());
        assert_eq!(output, "0\n3\n");
    }

    // === scopes ===

    #[test]
    fn exited_scopes_are_reclaimed() {
        let mut interpreter = Interpreter::new();
        let (_, result) = run_with(
            &mut interpreter,
            "fun id(x) { return x; }\n\
             for (var i = 0; i < 100; i = i + 1) { var j = id(i); }",
        );
        assert!(result.is_ok());
        assert_eq!(interpreter.environments.len(), 1);
    }

    #[test]
    fn variable_names_lists_globals() {
        let mut interpreter = Interpreter::new();
        let (_, result) = run_with(&mut interpreter, "var answer = 42;");
        assert!(result.is_ok());
        let names = interpreter.variable_names();
        assert!(names.contains(&"answer".to_string()));
        assert!(names.contains(&"clock".to_string()));
        assert_eq!(interpreter.global("answer"), Some(Value::Number(42.0)));
    }
}
