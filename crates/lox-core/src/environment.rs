//! Named-binding environment frames.
//!
//! One frame per block, function call, and the global scope, chained through
//! an optional parent. Closures hold a strong `Rc` to the frame they were
//! declared in, which is what lets a returned function keep seeing variables
//! from an enclosing call that has already returned.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;

use crate::value::Value;

/// A reference-counted, interior-mutable environment frame.
///
/// Cloning an `Environment` clones the handle, not the bindings; every clone
/// sees the same underlying map.
#[derive(Clone, Debug)]
pub struct Environment(Rc<RefCell<Frame>>);

#[derive(Debug)]
struct Frame {
    values: AHashMap<String, Value>,
    enclosing: Option<Environment>,
}

impl Environment {
    /// Creates the outermost frame, with no parent.
    #[must_use]
    pub fn global() -> Self {
        Self(Rc::new(RefCell::new(Frame {
            values: AHashMap::new(),
            enclosing: None,
        })))
    }

    /// Creates a new frame nested inside `enclosing`.
    #[must_use]
    pub fn child_of(enclosing: &Self) -> Self {
        Self(Rc::new(RefCell::new(Frame {
            values: AHashMap::new(),
            enclosing: Some(enclosing.clone()),
        })))
    }

    /// Binds `name` in this frame. Re-declaring an existing name in the same
    /// frame overwrites it, matching the REPL's tolerance for redefining
    /// globals across separate input lines.
    pub fn define(&self, name: &str, value: Value) {
        self.0.borrow_mut().values.insert(name.to_owned(), value);
    }

    /// Looks up `name` starting in this frame and walking out through each
    /// enclosing frame.
    pub fn get(&self, name: &str) -> Option<Value> {
        let frame = self.0.borrow();
        if let Some(value) = frame.values.get(name) {
            return Some(value.clone());
        }
        frame.enclosing.as_ref()?.get(name)
    }

    /// Assigns to an existing binding for `name`, walking out through
    /// enclosing frames. Returns `false` if `name` is not bound anywhere in
    /// the chain; assignment never implicitly creates a new binding.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        let mut frame = self.0.borrow_mut();
        if frame.values.contains_key(name) {
            frame.values.insert(name.to_owned(), value);
            return true;
        }
        match &frame.enclosing {
            Some(enclosing) => {
                let enclosing = enclosing.clone();
                drop(frame);
                enclosing.assign(name, value)
            }
            None => false,
        }
    }

    /// The frame exactly `distance` links out from this one.
    ///
    /// Called only with a `distance` the resolver computed for the exact
    /// variable reference being evaluated, so the walk is guaranteed not to
    /// run off the end of the chain.
    #[must_use]
    fn ancestor(&self, distance: usize) -> Self {
        let mut env = self.clone();
        for _ in 0..distance {
            let next = env
                .0
                .borrow()
                .enclosing
                .clone()
                .expect("resolver-computed distance exceeds environment chain length");
            env = next;
        }
        env
    }

    /// Looks up `name` in the frame exactly `distance` links out, bypassing
    /// the walk-until-found search `get` performs. Used for references the
    /// resolver has already statically bound to a specific frame.
    #[must_use]
    pub fn get_at(&self, distance: usize, name: &str) -> Value {
        self.ancestor(distance)
            .0
            .borrow()
            .values
            .get(name)
            .cloned()
            .expect("resolver-computed binding missing from its resolved frame")
    }

    /// Assigns in the frame exactly `distance` links out.
    pub fn assign_at(&self, distance: usize, name: &str, value: Value) {
        self.ancestor(distance).0.borrow_mut().values.insert(name.to_owned(), value);
    }
}
