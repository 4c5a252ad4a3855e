use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::object::Object;

struct EnvironmentCore {
    store: HashMap<Rc<str>, Rc<Object>>,
    outer: Option<Environment>,
}

/// A cheaply clonable handle to one lexical scope. Closures hold a clone of
/// the handle, not a copy of the bindings, so mutations of a scope stay
/// visible through every closure defined in it. The outer link is strong:
/// a closure may outlive the call frame that created its scope.
#[derive(Clone)]
pub struct Environment {
    core: Rc<RefCell<EnvironmentCore>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            core: Rc::new(RefCell::new(EnvironmentCore {
                store: HashMap::new(),
                outer: None,
            })),
        }
    }

    pub fn new_enclosed(outer: Environment) -> Environment {
        Environment {
            core: Rc::new(RefCell::new(EnvironmentCore {
                store: HashMap::new(),
                outer: Some(outer),
            })),
        }
    }

    /// Looks `key` up along the static scope chain, innermost first.
    pub fn get(&self, key: &str) -> Option<Rc<Object>> {
        let env = self.core.borrow();
        env.store
            .get(key)
            .cloned()
            .or_else(|| env.outer.as_ref().and_then(|outer| outer.get(key)))
    }

    /// Binds `key` in this scope. An outer binding of the same name is
    /// shadowed, never overwritten.
    pub fn set(&mut self, key: Rc<str>, value: Rc<Object>) {
        self.core.borrow_mut().store.insert(key, value);
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The chain can contain reference cycles through closures, so the
        // bindings themselves are not printed.
        f.debug_struct("Environment")
            .field("ptr", &Rc::as_ptr(&self.core))
            .finish()
    }
}
