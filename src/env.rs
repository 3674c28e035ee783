// ABOUTME: Environment chain for variable bindings and lexical scopes

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A mapping from names to values with an optional parent, forming the chain
/// lexical lookup walks. Closures hold an `Rc` to their defining scope, so a
/// scope outlives its stack frame whenever a function captured it. Parent
/// pointers never change after construction; only the bindings map does.
#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a new global environment with no parent
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a new child environment with a parent
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Binds in THIS scope, without consulting the parent chain. Used for
    /// function parameters, function names, and built-in registration.
    pub fn define(&self, name: String, value: Value) {
        self.bindings.borrow_mut().insert(name, value);
    }

    /// Looks up a name in this scope and parent scopes recursively
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }

        if let Some(ref parent) = self.parent {
            return parent.get(name);
        }

        None
    }

    /// Assignment with lookup: overwrite the binding here if one exists, else
    /// the nearest ancestor holding one, else declare in this scope. This is
    /// what makes `=` both declaration and mutation — a write to a name bound
    /// in an enclosing closure updates the closure.
    pub fn set(&self, name: &str, value: Value) {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return;
        }

        if let Some(ref parent) = self.parent {
            if parent.has_in_chain(name) {
                parent.set(name, value);
                return;
            }
        }

        self.define(name.to_string(), value);
    }

    fn has_in_chain(&self, name: &str) -> bool {
        if self.bindings.borrow().contains_key(name) {
            return true;
        }
        match self.parent {
            Some(ref parent) => parent.has_in_chain(name),
            None => false,
        }
    }
}
