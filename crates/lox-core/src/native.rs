//! Native functions bound into the global environment at startup.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::environment::Environment;
use crate::function::{NativeFn, RunResult};
use crate::value::Value;

/// Binds every native function into `globals`. Called once when building a
/// fresh [`crate::Interpreter`].
pub fn install(globals: &Environment) {
    define(globals, "clock", 0, clock);
}

fn define(globals: &Environment, name: &'static str, arity: usize, call: fn(&[Value]) -> RunResult<Value>) {
    globals.define(name, Value::Native(std::rc::Rc::new(NativeFn { name, arity, call })));
}

/// Wall-clock time in fractional seconds since the Unix epoch.
fn clock(_args: &[Value]) -> RunResult<Value> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch");
    Ok(Value::Number(now.as_secs_f64()))
}
