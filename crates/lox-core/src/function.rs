//! Callable values: user-defined closures and native functions.

use std::rc::Rc;

use crate::ast::stmt::FunctionDecl;
use crate::environment::Environment;
use crate::value::Value;

/// A runtime error raised while evaluating already-resolved code.
///
/// Carries the source line rather than a token, since by the time an error
/// surfaces from deep inside a call chain the originating token may belong
/// to a different function's AST than the one the interpreter is unwinding
/// through; the line is enough to report and is always available.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub line: usize,
    pub message: String,
}

impl RuntimeError {
    #[must_use]
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

pub type RunResult<T> = Result<T, RuntimeError>;

/// Non-local control flow produced while executing a statement.
///
/// Modeled as a typed unwinding result distinct from an ordinary error:
/// a `return` inside a loop inside a function must unwind past every
/// enclosing block and loop without being mistaken for a failure, and
/// without the interpreter having to thread an out-of-band "did we return"
/// flag through every `execute` call.
#[derive(Debug, Clone)]
pub enum Unwind {
    Return(Value),
    Error(RuntimeError),
}

impl From<RuntimeError> for Unwind {
    fn from(err: RuntimeError) -> Self {
        Self::Error(err)
    }
}

pub type ExecResult<T> = Result<T, Unwind>;

/// A user-defined function: its declaration plus the environment it closed
/// over at the point it was declared.
///
/// The closure is captured once, at `fun` (or function-expression)
/// evaluation time, not at call time; that's what lets a function returned
/// from another function keep seeing the returning function's locals after
/// that call has ended.
#[derive(Debug)]
pub struct UserFn {
    pub decl: Rc<FunctionDecl>,
    pub closure: Environment,
}

impl UserFn {
    #[must_use]
    pub fn new(decl: Rc<FunctionDecl>, closure: Environment) -> Self {
        Self { decl, closure }
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }
}

/// A native function implemented in Rust and exposed to Lox code, such as
/// `clock`.
pub struct NativeFn {
    pub name: &'static str,
    pub arity: usize,
    pub call: fn(&[Value]) -> RunResult<Value>,
}

impl std::fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeFn").field("name", &self.name).finish()
    }
}
