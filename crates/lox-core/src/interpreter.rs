//! The tree-walking evaluator.

use std::rc::Rc;

use crate::ast::expr::ExprKind;
use crate::ast::stmt::StmtKind;
use crate::ast::{Expr, Stmt};
use crate::diagnostics::DiagnosticSink;
use crate::environment::Environment;
use crate::function::{ExecResult, RunResult, RuntimeError, UserFn, Unwind};
use crate::io::PrintWriter;
use crate::resolver::Locals;
use crate::token::{Literal, Token, TokenKind};
use crate::value::Value;
use crate::{native, parser, resolver, scanner};

/// Evaluates statements against a persistent global environment.
///
/// One `Interpreter` is built per process (the CLI keeps a single instance
/// alive across every line of a REPL session) so that top-level `var`
/// declarations from earlier input remain visible to later input, exactly
/// like the global environment of a real script.
pub struct Interpreter {
    globals: Environment,
    environment: Environment,
    locals: Locals,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    #[must_use]
    pub fn new() -> Self {
        let globals = Environment::global();
        native::install(&globals);
        Self {
            environment: globals.clone(),
            globals,
            locals: Locals::default(),
        }
    }

    /// Scans, parses, resolves, and executes `source` in one pass.
    ///
    /// Returns early without executing anything if scanning, parsing, or
    /// resolving reported an error to `sink`; otherwise merges the fresh
    /// resolution into the interpreter's running `locals` table and
    /// executes the statements, reporting a runtime error (if any) to
    /// `sink` as well.
    pub fn run(&mut self, source: &str, sink: &dyn DiagnosticSink, printer: &mut dyn PrintWriter) {
        let tokens = scanner::scan_tokens(source, sink);
        let statements = parser::parse(tokens, sink);
        if sink.had_error() {
            return;
        }

        let locals = resolver::resolve(&statements, sink);
        if sink.had_error() {
            return;
        }
        self.locals.extend(locals);

        if let Err(err) = self.interpret(&statements, printer) {
            sink.runtime_error(err.line, &err.message);
        }
    }

    fn interpret(&mut self, statements: &[Stmt], printer: &mut dyn PrintWriter) -> RunResult<()> {
        for stmt in statements {
            match self.execute(stmt, printer) {
                Ok(()) => {}
                Err(Unwind::Return(_)) => {
                    unreachable!("resolver rejects return outside of a function body")
                }
                Err(Unwind::Error(err)) => return Err(err),
            }
        }
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt, printer: &mut dyn PrintWriter) -> ExecResult<()> {
        match &stmt.kind {
            StmtKind::Block { statements } => {
                let block_env = Environment::child_of(&self.environment);
                self.execute_block(statements, block_env, printer)
            }
            StmtKind::Class { name, .. } => Err(RuntimeError::new(name.line, "Classes are not supported.").into()),
            StmtKind::ExpressionStmt { expression } => {
                self.evaluate(expression, printer)?;
                Ok(())
            }
            StmtKind::Function { declaration } => {
                let function = Value::Function(Rc::new(UserFn::new(declaration.clone(), self.environment.clone())));
                self.environment.define(&declaration.name.lexeme, function);
                Ok(())
            }
            StmtKind::If { condition, then_branch, else_branch } => {
                if self.evaluate(condition, printer)?.is_truthy() {
                    self.execute(then_branch, printer)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch, printer)
                } else {
                    Ok(())
                }
            }
            StmtKind::Print { expression } => {
                let value = self.evaluate(expression, printer)?;
                printer.print_line(&value.stringify());
                Ok(())
            }
            StmtKind::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr, printer)?,
                    None => Value::Nil,
                };
                Err(Unwind::Return(value))
            }
            StmtKind::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr, printer)?,
                    None => Value::Nil,
                };
                self.environment.define(&name.lexeme, value);
                Ok(())
            }
            StmtKind::While { condition, body } => {
                while self.evaluate(condition, printer)?.is_truthy() {
                    self.execute(body, printer)?;
                }
                Ok(())
            }
        }
    }

    /// Runs `statements` in `block_env`, restoring the previous environment
    /// afterward whether execution succeeded, returned, or errored.
    fn execute_block(&mut self, statements: &[Stmt], block_env: Environment, printer: &mut dyn PrintWriter) -> ExecResult<()> {
        let previous = std::mem::replace(&mut self.environment, block_env);
        let result = (|| {
            for stmt in statements {
                self.execute(stmt, printer)?;
            }
            Ok(())
        })();
        self.environment = previous;
        result
    }

    fn evaluate(&mut self, expr: &Expr, printer: &mut dyn PrintWriter) -> RunResult<Value> {
        match &expr.kind {
            ExprKind::Assign { name, value } => {
                let value = self.evaluate(value, printer)?;
                match self.locals.get(&expr.id) {
                    Some(&distance) => self.environment.assign_at(distance, &name.lexeme, value.clone()),
                    None => {
                        if !self.globals.assign(&name.lexeme, value.clone()) {
                            return Err(RuntimeError::new(name.line, format!("Undefined variable '{}'.", name.lexeme)));
                        }
                    }
                }
                Ok(value)
            }
            ExprKind::Binary { left, operator, right } => self.evaluate_binary(left, operator, right, printer),
            ExprKind::Call { callee, paren, arguments } => self.evaluate_call(callee, paren, arguments, printer),
            ExprKind::Get { name, .. } => Err(RuntimeError::new(name.line, "Classes are not supported.")),
            ExprKind::Grouping { expression } => self.evaluate(expression, printer),
            ExprKind::Literal { value } => Ok(literal_value(value)),
            ExprKind::Logical { left, operator, right } => self.evaluate_logical(left, operator, right, printer),
            ExprKind::Set { name, .. } => Err(RuntimeError::new(name.line, "Classes are not supported.")),
            ExprKind::Super { keyword, .. } | ExprKind::This { keyword } => {
                Err(RuntimeError::new(keyword.line, "Classes are not supported."))
            }
            ExprKind::Unary { operator, right } => self.evaluate_unary(operator, right, printer),
            ExprKind::Variable { name } => self.look_up_variable(name, expr),
        }
    }

    fn look_up_variable(&self, name: &Token, expr: &Expr) -> RunResult<Value> {
        match self.locals.get(&expr.id) {
            Some(&distance) => Ok(self.environment.get_at(distance, &name.lexeme)),
            None => self
                .globals
                .get(&name.lexeme)
                .ok_or_else(|| RuntimeError::new(name.line, format!("Undefined variable '{}'.", name.lexeme))),
        }
    }

    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr, printer: &mut dyn PrintWriter) -> RunResult<Value> {
        let left = self.evaluate(left, printer)?;
        match operator.kind {
            TokenKind::Or if left.is_truthy() => Ok(left),
            TokenKind::And if !left.is_truthy() => Ok(left),
            _ => self.evaluate(right, printer),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr, printer: &mut dyn PrintWriter) -> RunResult<Value> {
        let right = self.evaluate(right, printer)?;
        match operator.kind {
            TokenKind::Minus => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RuntimeError::new(operator.line, "Operand must be a number.")),
            },
            TokenKind::Bang => Ok(Value::Bool(!right.is_truthy())),
            _ => unreachable!("parser never produces a unary operator outside ! and -"),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr, printer: &mut dyn PrintWriter) -> RunResult<Value> {
        let left = self.evaluate(left, printer)?;
        let right = self.evaluate(right, printer)?;

        let number_operands = |a: &Value, b: &Value| match (a, b) {
            (Value::Number(a), Value::Number(b)) => Some((*a, *b)),
            _ => None,
        };

        match operator.kind {
            TokenKind::Minus => number_operands(&left, &right)
                .map(|(a, b)| Value::Number(a - b))
                .ok_or_else(|| RuntimeError::new(operator.line, "Operands must be numbers.")),
            TokenKind::Slash => number_operands(&left, &right)
                .map(|(a, b)| Value::Number(a / b))
                .ok_or_else(|| RuntimeError::new(operator.line, "Operands must be numbers.")),
            TokenKind::Star => number_operands(&left, &right)
                .map(|(a, b)| Value::Number(a * b))
                .ok_or_else(|| RuntimeError::new(operator.line, "Operands must be numbers.")),
            TokenKind::Plus => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::Str(a), Value::Str(b)) => Ok(Value::string(format!("{a}{b}"))),
                _ => Err(RuntimeError::new(operator.line, "Operands must be two numbers or two strings.")),
            },
            TokenKind::Greater => number_operands(&left, &right)
                .map(|(a, b)| Value::Bool(a > b))
                .ok_or_else(|| RuntimeError::new(operator.line, "Operands must be numbers.")),
            TokenKind::GreaterEqual => number_operands(&left, &right)
                .map(|(a, b)| Value::Bool(a >= b))
                .ok_or_else(|| RuntimeError::new(operator.line, "Operands must be numbers.")),
            TokenKind::Less => number_operands(&left, &right)
                .map(|(a, b)| Value::Bool(a < b))
                .ok_or_else(|| RuntimeError::new(operator.line, "Operands must be numbers.")),
            TokenKind::LessEqual => number_operands(&left, &right)
                .map(|(a, b)| Value::Bool(a <= b))
                .ok_or_else(|| RuntimeError::new(operator.line, "Operands must be numbers.")),
            TokenKind::EqualEqual => Ok(Value::Bool(left == right)),
            TokenKind::BangEqual => Ok(Value::Bool(left != right)),
            _ => unreachable!("parser never produces a binary operator outside these kinds"),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr], printer: &mut dyn PrintWriter) -> RunResult<Value> {
        let callee = self.evaluate(callee, printer)?;
        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            args.push(self.evaluate(argument, printer)?);
        }

        match callee {
            Value::Native(native) => {
                check_arity(native.arity, args.len(), paren)?;
                (native.call)(&args)
            }
            Value::Function(function) => {
                check_arity(function.arity(), args.len(), paren)?;
                self.call_user_function(&function, args, printer)
            }
            _ => Err(RuntimeError::new(paren.line, "Can only call functions and classes.")),
        }
    }

    /// Runs a user function's body in a fresh environment parented on its
    /// closure, per the five-step call protocol: new call frame, bind
    /// parameters, execute the body, capture any `return`, and otherwise
    /// implicitly yield `nil`.
    fn call_user_function(&mut self, function: &Rc<UserFn>, args: Vec<Value>, printer: &mut dyn PrintWriter) -> RunResult<Value> {
        let call_env = Environment::child_of(&function.closure);
        for (param, arg) in function.decl.params.iter().zip(args) {
            call_env.define(&param.lexeme, arg);
        }

        let previous = std::mem::replace(&mut self.environment, call_env);
        let result = self.run_function_body(&function.decl.body, printer);
        self.environment = previous;
        result
    }

    fn run_function_body(&mut self, body: &[Stmt], printer: &mut dyn PrintWriter) -> RunResult<Value> {
        for stmt in body {
            match self.execute(stmt, printer) {
                Ok(()) => {}
                Err(Unwind::Return(value)) => return Ok(value),
                Err(Unwind::Error(err)) => return Err(err),
            }
        }
        Ok(Value::Nil)
    }
}

fn check_arity(expected: usize, got: usize, paren: &Token) -> RunResult<()> {
    if expected == got {
        Ok(())
    } else {
        Err(RuntimeError::new(paren.line, format!("Expected {expected} arguments but got {got}.")))
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::None => Value::Nil,
        Literal::Boolean(b) => Value::Bool(*b),
        Literal::Number(n) => Value::Number(*n),
        Literal::String(s) => Value::string(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;
    use crate::io::CollectStringPrint;

    fn run(source: &str) -> (String, Vec<String>) {
        let sink = CollectingSink::new();
        let mut printer = CollectStringPrint::new();
        let mut interpreter = Interpreter::new();
        interpreter.run(source, &sink, &mut printer);
        (printer.into_output(), sink.messages())
    }

    #[test]
    fn evaluates_arithmetic_and_concatenation() {
        let (out, errors) = run(r#"print 1 + 2; print "a" + "b";"#);
        assert!(errors.is_empty());
        assert_eq!(out, "3\nab\n");
    }

    #[test]
    fn block_scoping_shadows_without_leaking() {
        let (out, errors) = run("var a = 1; { var a = 2; print a; } print a;");
        assert!(errors.is_empty());
        assert_eq!(out, "2\n1\n");
    }

    #[test]
    fn closures_capture_mutable_state() {
        let source = "\
            fun makeCounter() {\n\
              var i = 0;\n\
              fun count() {\n\
                i = i + 1;\n\
                print i;\n\
              }\n\
              return count;\n\
            }\n\
            var counter = makeCounter();\n\
            counter();\n\
            counter();\n\
            counter();\n";
        let (out, errors) = run(source);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(out, "1\n2\n3\n");
    }

    #[test]
    fn resolver_binds_closure_to_declaration_time_scope() {
        let source = "\
            var a = \"global\";\n\
            {\n\
              fun show() { print a; }\n\
              show();\n\
              var a = \"local\";\n\
              show();\n\
            }\n";
        let (out, errors) = run(source);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(out, "global\nglobal\n");
    }

    #[test]
    fn or_short_circuits_and_skips_the_right_operand() {
        let source = "fun fail() { print \"should not run\"; return nil; } print 1 or fail();";
        let (out, errors) = run(source);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(out, "1\n");
    }

    #[test]
    fn division_by_zero_produces_infinity_not_an_error() {
        let (out, errors) = run("print 1 / 0;");
        assert!(errors.is_empty());
        assert_eq!(out, "Infinity\n");
    }

    #[test]
    fn zero_and_empty_string_are_truthy() {
        let (out, errors) = run(r#"if (0) { print "zero truthy"; } if ("") { print "empty truthy"; }"#);
        assert!(errors.is_empty());
        assert_eq!(out, "zero truthy\nempty truthy\n");
    }

    #[test]
    fn arity_mismatch_reports_exact_counts() {
        let (_out, errors) = run("fun f(a, b) { return a + b; } f(1);");
        assert!(errors.iter().any(|m| m.contains("Expected 2 arguments but got 1.")));
    }

    #[test]
    fn calling_a_non_callable_value_errors() {
        let (_out, errors) = run("var x = 1; x();");
        assert!(errors.iter().any(|m| m.contains("Can only call functions and classes.")));
    }

    #[test]
    fn unary_minus_on_non_number_errors() {
        let (_out, errors) = run(r#"print -"a";"#);
        assert!(errors.iter().any(|m| m.contains("Operand must be a number.")));
    }

    #[test]
    fn adding_number_and_string_errors() {
        let (_out, errors) = run(r#"print 1 + "a";"#);
        assert!(errors.iter().any(|m| m.contains("Operands must be two numbers or two strings.")));
    }

    #[test]
    fn integral_numbers_print_without_trailing_zero() {
        let (out, _errors) = run("print 3.0; print 3.5;");
        assert_eq!(out, "3\n3.5\n");
    }

    #[test]
    fn class_declarations_are_rejected_at_runtime() {
        let (_out, errors) = run("class Foo {} ");
        assert!(errors.iter().any(|m| m.contains("Classes are not supported.")));
    }
}
