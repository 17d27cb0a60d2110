//! Name-keyed catalog of declared [`Function`]s, insertion-ordered like
//! the original `wtk::utils::CharMap` (spec.md §3 "Function catalog").

use indexmap::IndexMap;

use crate::function::Function;

#[derive(Default)]
pub struct FunctionCatalog {
    functions: IndexMap<String, Function>,
}

impl FunctionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a new function. Functions live for the relation's
    /// lifetime once declared; redeclaring a name is a relation error.
    pub fn declare(&mut self, function: Function) -> Result<(), String> {
        let name = function.signature().name.clone();
        if self.functions.contains_key(&name) {
            return Err(format!("function `{name}` already declared"));
        }
        self.functions.insert(name, function);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sieve_ir::FunctionSignature;
    use std::rc::Rc;

    #[test]
    fn redeclaring_a_name_is_rejected() {
        let mut catalog = FunctionCatalog::new();
        let f = Function::Regular {
            signature: FunctionSignature::new("f"),
            body: Rc::from(Vec::new()),
        };
        catalog.declare(f.clone()).unwrap();
        assert!(catalog.declare(f).is_err());
    }
}
