//! [`SimplePlugin`]: a convenience [`Plugin`] that maps an operation
//! name to a reusable [`SimpleOperation`] (spec.md §4.I "SimplePlugin").
//! Standard plugins (component J) are built on this rather than
//! implementing [`Plugin`] directly.

use std::sync::Arc;

use sieve_ir::{FieldValue, FunctionSignature, PluginBinding, TypeIndex, WireRange};
use sieve_interpreter::InterpreterError;

use crate::host::{Operation, TypeInterpreterHost};
use crate::manager::Plugin;

/// A reusable, stateless operation implementation: one instance serves
/// every invocation and every type it is asked to support, since all
/// per-invocation state lives in the wires themselves, never in the
/// operation object.
pub trait SimpleOperation: 'static + Send + Sync {
    /// Whether this operation accepts `type_index`/`signature`/
    /// `binding` at all (arity, parameter shape, parameter values).
    fn check_signature(
        &self,
        type_index: TypeIndex,
        max_value: Option<FieldValue>,
        signature: &FunctionSignature,
        binding: &PluginBinding,
    ) -> Result<bool, String>;

    fn evaluate(
        &self,
        host: &mut dyn TypeInterpreterHost,
        signature: &FunctionSignature,
        bound_type: TypeIndex,
        line: usize,
        outputs: &[WireRange],
        inputs: &[WireRange],
    ) -> Result<(), InterpreterError>;
}

/// Bridges a shared [`SimpleOperation`] into the [`Operation`] a
/// [`Plugin::create`] call must hand back, without moving it out of the
/// plugin's catalog.
struct SharedOperation(Arc<dyn SimpleOperation>);

impl Operation for SharedOperation {
    fn evaluate(
        &self,
        host: &mut dyn TypeInterpreterHost,
        signature: &FunctionSignature,
        bound_type: TypeIndex,
        line: usize,
        outputs: &[WireRange],
        inputs: &[WireRange],
    ) -> Result<(), InterpreterError> {
        self.0.evaluate(host, signature, bound_type, line, outputs, inputs)
    }
}

pub struct SimplePlugin {
    name: String,
    operations: rustc_hash::FxHashMap<String, Arc<dyn SimpleOperation>>,
}

impl SimplePlugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: rustc_hash::FxHashMap::default(),
        }
    }

    pub fn with_operation(mut self, op_name: impl Into<String>, op: impl SimpleOperation) -> Self {
        self.operations.insert(op_name.into(), Arc::new(op));
        self
    }
}

impl Plugin for SimplePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn create(
        &self,
        type_index: TypeIndex,
        max_value: Option<FieldValue>,
        signature: &FunctionSignature,
        binding: &PluginBinding,
    ) -> Result<Option<Box<dyn Operation>>, String> {
        let Some(op) = self.operations.get(&binding.operation) else {
            return Ok(None);
        };
        if op.check_signature(type_index, max_value, signature, binding)? {
            Ok(Some(Box::new(SharedOperation(Arc::clone(op)))))
        } else {
            Ok(None)
        }
    }
}
