//! Host functions every program starts with.

use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::EvalaError;
use crate::interpreter::Interpreter;
use crate::value::{Arity, NativeCall, TestCase, Value};

pub fn install(interpreter: &mut Interpreter) {
    interpreter.define_native("clock", Arity::Fixed(0), clock);
    interpreter.define_native("TestCase", Arity::Variadic, test_case);
    interpreter.define_native("runTests", Arity::Variadic, run_tests);
}

/// Seconds since the Unix epoch.
fn clock(call: &mut NativeCall<'_>, _: &[Value]) -> Result<Value, EvalaError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| call.error(e.to_string()))?;
    Ok(Value::Number(elapsed.as_secs_f64()))
}

/// `TestCase("name", arg1, ..., expected)`
fn test_case(call: &mut NativeCall<'_>, arguments: &[Value]) -> Result<Value, EvalaError> {
    let [name, args @ .., expected] = arguments else {
        return Err(call.error(
            "TestCase(fnName, arg1, ..., expected) requires at least 2 arguments.",
        ));
    };
    let Value::String(function_name) = name else {
        return Err(call.error("First argument to TestCase must be a function name (string)."));
    };

    Ok(Value::TestCase(Rc::new(TestCase {
        function_name: function_name.clone(),
        args: args.to_vec(),
        expected: expected.clone(),
    })))
}

/// Runs each test case against the global function it names and prints a
/// line per case plus a summary. Returns the fraction that passed.
fn run_tests(call: &mut NativeCall<'_>, arguments: &[Value]) -> Result<Value, EvalaError> {
    let mut passed = 0usize;
    let mut total = 0usize;

    for argument in arguments {
        let Value::TestCase(case) = argument else {
            writeln!(
                call.output,
                "[WARN] runTests: argument is not a TestCase: {}",
                argument
            )?;
            continue;
        };
        total += 1;

        let result = call_by_name(call, &case.function_name, case.args.clone())?;
        let shown = describe(case);
        if result == case.expected {
            passed += 1;
            writeln!(call.output, "[PASS] {} == {}", shown, case.expected)?;
        } else {
            writeln!(
                call.output,
                "[FAIL] {} expected: {}, got: {}",
                shown, case.expected, result
            )?;
        }
    }

    writeln!(call.output, "--- TEST SUMMARY ---")?;
    writeln!(call.output, "Passed {} / {}", passed, total)?;

    if total == 0 {
        return Ok(Value::Number(0.0));
    }
    Ok(Value::Number(passed as f64 / total as f64))
}

fn call_by_name(
    call: &mut NativeCall<'_>,
    name: &str,
    arguments: Vec<Value>,
) -> Result<Value, EvalaError> {
    let Some(Value::Function(function)) = call.interpreter.global(name) else {
        return Err(call.error(format!("Test error: '{}' is not a function.", name)));
    };

    match function.arity() {
        Arity::Fixed(expected) if expected != arguments.len() => Err(call.error(format!(
            "Test error: function '{}' expects {} args but got {}",
            name,
            expected,
            arguments.len()
        ))),
        Arity::Fixed(_) | Arity::Variadic => {
            function.call(call.interpreter, arguments, call.paren, call.output)
        }
    }
}

fn describe(case: &TestCase) -> String {
    let args: Vec<String> = case.args.iter().map(ToString::to_string).collect();
    format!("{}({})", case.function_name, args.join(", "))
}

#[cfg(test)]
mod tests {
    use crate::error::EvalaError;
    use crate::interpreter::Interpreter;
    use crate::parser::Parser;
    use crate::scanner::Scanner;
    use crate::value::Value;

    fn run(source: &str) -> (String, Result<(), EvalaError>, Interpreter) {
        let scanned = Scanner::new(source).scan_all();
        assert!(scanned.errors.is_empty());
        let mut parser = Parser::new(scanned.tokens);
        let statements = parser.parse();
        assert!(!parser.had_error(), "{:?}", parser.take_errors());

        let mut interpreter = Interpreter::new();
        let mut output = Vec::new();
        let result = interpreter.interpret(&statements, &mut output);
        (String::from_utf8(output).unwrap(), result, interpreter)
    }

    const ADD: &str = "fun add(a, b) { return a + b; }\n";

    #[test]
    fn clock_returns_seconds() {
        let (_, result, interpreter) = run("var now = clock();");
        assert!(result.is_ok());
        let Some(Value::Number(now)) = interpreter.global("now") else {
            panic!("clock did not return a number");
        };
        // Well after 2020-01-01.
        assert!(now > 1_577_836_800.0);
    }

    #[test]
    fn clock_takes_no_arguments() {
        let (_, result, _) = run("clock(1);");
        assert_eq!(result.unwrap_err().message(), "Expected 0 arguments but got 1.");
    }

    #[test]
    fn test_case_displays_with_function_name() {
        let (output, result, _) = run("print TestCase(\"add\", 1, 2, 3);");
        assert!(result.is_ok());
        assert_eq!(output, "<test add>\n");
    }

    #[test]
    fn test_case_needs_at_least_two_arguments() {
        let (_, result, _) = run("TestCase(\"add\");");
        assert_eq!(
            result.unwrap_err().message(),
            "TestCase(fnName, arg1, ..., expected) requires at least 2 arguments."
        );
    }

    #[test]
    fn test_case_needs_a_function_name() {
        let (_, result, _) = run("TestCase(1, 2);");
        assert_eq!(
            result.unwrap_err().message(),
            "First argument to TestCase must be a function name (string)."
        );
    }

    #[test]
    fn run_tests_reports_pass_and_fail() {
        let source = format!(
            "{ADD}var score = runTests(TestCase(\"add\", 1, 2, 3), TestCase(\"add\", 2, 2, 5));"
        );
        let (output, result, interpreter) = run(&source);
        assert!(result.is_ok());
        assert_eq!(
            output,
            "[PASS] add(1, 2) == 3\n\
             [FAIL] add(2, 2) expected: 5, got: 4\n\
             --- TEST SUMMARY ---\n\
             Passed 1 / 2\n"
        );
        assert_eq!(interpreter.global("score"), Some(Value::Number(0.5)));
    }

    #[test]
    fn run_tests_warns_about_other_values() {
        let source = format!("{ADD}var score = runTests(42, TestCase(\"add\", 0, 0, 0));");
        let (output, result, interpreter) = run(&source);
        assert!(result.is_ok());
        assert!(output.starts_with("[WARN] runTests: argument is not a TestCase: 42\n"));
        assert!(output.ends_with("Passed 1 / 1\n"));
        assert_eq!(interpreter.global("score"), Some(Value::Number(1.0)));
    }

    #[test]
    fn run_tests_with_no_cases_scores_zero() {
        let (output, result, interpreter) = run("var score = runTests();");
        assert!(result.is_ok());
        assert_eq!(output, "--- TEST SUMMARY ---\nPassed 0 / 0\n");
        assert_eq!(interpreter.global("score"), Some(Value::Number(0.0)));
    }

    #[test]
    fn run_tests_rejects_unknown_function() {
        let (_, result, _) = run("var x = 1; runTests(TestCase(\"x\", 1, 1));");
        assert_eq!(result.unwrap_err().message(), "Test error: 'x' is not a function.");

        let (_, result, _) = run("runTests(TestCase(\"missing\", 1, 1));");
        assert_eq!(
            result.unwrap_err().message(),
            "Test error: 'missing' is not a function."
        );
    }

    #[test]
    fn run_tests_checks_arity() {
        let source = format!("{ADD}runTests(TestCase(\"add\", 1, 3));");
        let (_, result, _) = run(&source);
        assert_eq!(
            result.unwrap_err().message(),
            "Test error: function 'add' expects 2 args but got 1"
        );
    }

    #[test]
    fn run_tests_compares_strings() {
        let source = "fun greet(name) { return \"hi \" + name; }\n\
                      runTests(TestCase(\"greet\", \"bo\", \"hi bo\"));";
        let (output, result, _) = run(source);
        assert!(result.is_ok());
        assert!(output.starts_with("[PASS] greet(bo) == hi bo\n"));
    }
}
