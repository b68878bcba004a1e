//! Tests for stateful, line-at-a-time execution against a single persistent
//! interpreter, the shape the CLI's prompt loop drives.

use lox_core::{CollectStringPrint, CollectingSink, DiagnosticSink, Interpreter};
use pretty_assertions::assert_eq;

fn feed(interpreter: &mut Interpreter, sink: &CollectingSink, printer: &mut CollectStringPrint, line: &str) {
    interpreter.run(line, sink, printer);
    sink.reset();
}

#[test]
fn persists_global_declarations_across_lines() {
    let sink = CollectingSink::new();
    let mut printer = CollectStringPrint::new();
    let mut interpreter = Interpreter::new();

    feed(&mut interpreter, &sink, &mut printer, "var counter = 0;\n");
    feed(&mut interpreter, &sink, &mut printer, "counter = counter + 1;\n");
    feed(&mut interpreter, &sink, &mut printer, "print counter;\n");

    assert!(sink.messages().is_empty(), "{:?}", sink.messages());
    assert_eq!(printer.output(), "1\n");
}

#[test]
fn function_defined_on_one_line_is_callable_on_the_next() {
    let sink = CollectingSink::new();
    let mut printer = CollectStringPrint::new();
    let mut interpreter = Interpreter::new();

    feed(&mut interpreter, &sink, &mut printer, "var x = 10;\n");
    feed(
        &mut interpreter,
        &sink,
        &mut printer,
        "fun addX(v) { return x + v; }\n",
    );
    feed(&mut interpreter, &sink, &mut printer, "print addX(22);\n");
    feed(&mut interpreter, &sink, &mut printer, "x = 20;\n");
    feed(&mut interpreter, &sink, &mut printer, "print addX(22);\n");

    assert!(sink.messages().is_empty(), "{:?}", sink.messages());
    assert_eq!(printer.output(), "32\n42\n");
}

#[test]
fn redefining_a_function_uses_the_latest_definition() {
    let sink = CollectingSink::new();
    let mut printer = CollectStringPrint::new();
    let mut interpreter = Interpreter::new();

    feed(&mut interpreter, &sink, &mut printer, "fun f() { return 1; }\n");
    feed(&mut interpreter, &sink, &mut printer, "print f();\n");
    feed(&mut interpreter, &sink, &mut printer, "fun f() { return 2; }\n");
    feed(&mut interpreter, &sink, &mut printer, "print f();\n");

    assert!(sink.messages().is_empty(), "{:?}", sink.messages());
    assert_eq!(printer.output(), "1\n2\n");
}

#[test]
fn an_error_on_one_line_does_not_poison_later_lines() {
    let sink = CollectingSink::new();
    let mut printer = CollectStringPrint::new();
    let mut interpreter = Interpreter::new();

    feed(&mut interpreter, &sink, &mut printer, "var x = 1 +;\n");
    assert!(!sink.messages().is_empty());

    feed(&mut interpreter, &sink, &mut printer, "print 2 + 2;\n");
    assert_eq!(printer.output(), "4\n");
}
