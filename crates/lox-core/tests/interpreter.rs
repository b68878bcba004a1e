//! Black-box tests driving the interpreter through its public API only,
//! covering the scenarios a conforming implementation must satisfy.

use lox_core::{CollectStringPrint, CollectingSink, DiagnosticSink, Interpreter};
use pretty_assertions::assert_eq;

fn run(source: &str) -> (String, Vec<String>) {
    let sink = CollectingSink::new();
    let mut printer = CollectStringPrint::new();
    let mut interpreter = Interpreter::new();
    interpreter.run(source, &sink, &mut printer);
    (printer.into_output(), sink.messages())
}

#[test]
fn clock_returns_a_number() {
    let (out, errors) = run("print clock() >= 0;");
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(out, "true\n");
}

#[test]
fn clock_rejects_arguments() {
    let (_out, errors) = run("clock(1);");
    assert!(errors.iter().any(|m| m.contains("Expected 0 arguments but got 1.")));
}

#[test]
fn recursive_function_computes_fibonacci() {
    let source = "\
        fun fib(n) {\n\
          if (n < 2) return n;\n\
          return fib(n - 1) + fib(n - 2);\n\
        }\n\
        print fib(10);\n";
    let (out, errors) = run(source);
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(out, "55\n");
}

#[test]
fn while_loop_accumulates() {
    let source = "var i = 0; var sum = 0; while (i < 5) { sum = sum + i; i = i + 1; } print sum;";
    let (out, errors) = run(source);
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(out, "10\n");
}

#[test]
fn desugared_for_loop_runs_the_expected_iterations() {
    let (out, errors) = run("for (var i = 0; i < 3; i = i + 1) print i;");
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(out, "0\n1\n2\n");
}

#[test]
fn nil_and_false_are_the_only_falsey_values() {
    let source = "if (nil) { print \"bad\"; } if (false) { print \"bad\"; } print \"ok\";";
    let (out, errors) = run(source);
    assert!(errors.is_empty());
    assert_eq!(out, "ok\n");
}

#[test]
fn equality_never_coerces_across_types() {
    let (out, errors) = run(r#"print 1 == "1"; print nil == false;"#);
    assert!(errors.is_empty());
    assert_eq!(out, "false\nfalse\n");
}

#[test]
fn undefined_variable_reference_is_a_runtime_error() {
    let (_out, errors) = run("print undefined;");
    assert!(errors.iter().any(|m| m.contains("Undefined variable 'undefined'.")));
}

#[test]
fn assigning_to_an_undeclared_name_is_a_runtime_error() {
    let (_out, errors) = run("undeclared = 1;");
    assert!(errors.iter().any(|m| m.contains("Undefined variable 'undeclared'.")));
}

#[test]
fn functions_are_first_class_values() {
    let source = "\
        fun add(a, b) { return a + b; }\n\
        fun apply(f, x, y) { return f(x, y); }\n\
        print apply(add, 2, 3);\n";
    let (out, errors) = run(source);
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(out, "5\n");
}
