use super::{Dynamic, Flow, Unwind};
use dbscript_core::Error;

use std::{cell::RefCell, collections::HashMap, rc::Rc};

/// One level of lexical bindings.
///
/// `var` declarations land in the nearest function scope, `let` and `const`
/// in the scope of the enclosing block.
pub(crate) struct Scope {
    bindings: RefCell<HashMap<String, Binding>>,
    parent: Option<Rc<Scope>>,
    function: bool,
}

struct Binding {
    value: Dynamic,
    constant: bool,
}

impl Scope {
    pub(crate) fn global() -> Rc<Scope> {
        Rc::new(Scope {
            bindings: RefCell::default(),
            parent: None,
            function: true,
        })
    }

    pub(crate) fn block(parent: &Rc<Scope>) -> Rc<Scope> {
        Rc::new(Scope {
            bindings: RefCell::default(),
            parent: Some(parent.clone()),
            function: false,
        })
    }

    pub(crate) fn function(parent: &Rc<Scope>) -> Rc<Scope> {
        Rc::new(Scope {
            bindings: RefCell::default(),
            parent: Some(parent.clone()),
            function: true,
        })
    }

    pub(crate) fn declare(&self, name: &str, value: Dynamic, constant: bool) {
        self.bindings
            .borrow_mut()
            .insert(name.to_string(), Binding { value, constant });
    }

    /// Declares `name` in the nearest function scope. An existing `var`
    /// binding keeps its value when no initializer is given.
    pub(crate) fn declare_var(self: &Rc<Self>, name: &str, value: Option<Dynamic>) {
        let mut scope = self.clone();
        while !scope.function {
            let Some(parent) = scope.parent.clone() else {
                break;
            };
            scope = parent;
        }

        let mut bindings = scope.bindings.borrow_mut();
        match (bindings.get_mut(name), value) {
            (Some(binding), Some(value)) => binding.value = value,
            (Some(_), None) => {}
            (None, value) => {
                bindings.insert(
                    name.to_string(),
                    Binding {
                        value: value.unwrap_or_default(),
                        constant: false,
                    },
                );
            }
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<Dynamic> {
        if let Some(binding) = self.bindings.borrow().get(name) {
            return Some(binding.value.clone());
        }
        self.parent.as_ref()?.lookup(name)
    }

    /// Assigns an existing binding. Undeclared names become globals.
    pub(crate) fn assign(&self, name: &str, value: Dynamic) -> Flow<()> {
        {
            let mut bindings = self.bindings.borrow_mut();
            if let Some(binding) = bindings.get_mut(name) {
                if binding.constant {
                    return Err(Unwind::Error(Error::evaluation(format!(
                        "assignment to constant `{name}`"
                    ))));
                }
                binding.value = value;
                return Ok(());
            }
        }

        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => {
                self.declare(name, value, false);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_hoists_to_function_scope() {
        let global = Scope::global();
        let block = Scope::block(&global);
        block.declare_var("a", Some(Dynamic::Int(1)));
        block.declare("b", Dynamic::Int(2), false);

        assert_eq!(global.lookup("a"), Some(Dynamic::Int(1)));
        assert_eq!(global.lookup("b"), None);
        assert_eq!(block.lookup("b"), Some(Dynamic::Int(2)));

        block.declare_var("a", None);
        assert_eq!(global.lookup("a"), Some(Dynamic::Int(1)));
    }

    #[test]
    fn assignment() {
        let global = Scope::global();
        let inner = Scope::function(&global);
        inner.declare("c", Dynamic::Int(1), true);

        assert!(inner.assign("c", Dynamic::Int(2)).is_err());
        inner.assign("fresh", Dynamic::Int(3)).unwrap();
        assert_eq!(global.lookup("fresh"), Some(Dynamic::Int(3)));
    }
}
