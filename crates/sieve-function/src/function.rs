//! The function catalog's entries: a [`Function`] is either a recorded
//! regular function or a plugin-backed one (spec.md §3 "Function
//! catalog", §4.F).

use std::rc::Rc;

use sieve_ir::{FunctionSignature, PluginBinding, TypeIndex};
use sieve_plugin::Operation;

use crate::directive::Directive;

/// A declared function, ready to be invoked any number of times.
///
/// `Rc<[Directive]>` / `Rc<dyn Operation>` make a lookup cheap to clone
/// out of the catalog before recursing back into the interpreter to run
/// it — unavoidable since Rust won't let the catalog stay borrowed while
/// the interpreter that owns it is itself mutably borrowed to replay the
/// body or hand a plugin its host (spec.md §9's self-referential-owner
/// note applies here just as it does to `Scope`'s pool handles).
#[derive(Clone)]
pub enum Function {
    Regular {
        signature: FunctionSignature,
        body: Rc<[Directive]>,
    },
    Plugin {
        signature: FunctionSignature,
        binding: PluginBinding,
        bound_type: TypeIndex,
        operation: Rc<dyn Operation>,
    },
}

impl Function {
    pub fn signature(&self) -> &FunctionSignature {
        match self {
            Function::Regular { signature, .. } => signature,
            Function::Plugin { signature, .. } => signature,
        }
    }
}
