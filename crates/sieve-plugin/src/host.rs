//! The seam a plugin [`Operation`] runs against: one bound wire type's
//! [`TypeInterpreter`], plus the ability to invoke a declared function
//! (used by the iteration-map plugin to apply a function per element
//! without the plugin crate depending on the function catalog itself).

use sieve_ir::{FieldValue, FunctionSignature, TypeIndex, WireRange};
use sieve_interpreter::{InterpreterError, TypeInterpreter};

/// Implemented by the top-level `Interpreter` (in `sieve-function`),
/// which owns every `TypeInterpreter` and the function catalog. Kept
/// here, rather than defined alongside the interpreter, so this crate's
/// [`Operation`] trait can reference it without depending upward on
/// `sieve-function`.
pub trait TypeInterpreterHost {
    fn type_interpreter(&mut self, ty: TypeIndex) -> &mut dyn TypeInterpreter;
    fn max_value(&self, ty: TypeIndex) -> Option<FieldValue>;

    /// Invokes a declared (regular or plugin) function exactly as a
    /// top-level `invoke` callback would, short-circuiting on sticky
    /// failure instead of via the normal guard check (a nested
    /// call from inside a plugin operation already runs with the
    /// outer dispatch's failure guaranteed clear).
    fn invoke(
        &mut self,
        line: usize,
        name: &str,
        outputs: &[WireRange],
        inputs: &[WireRange],
    ) -> Result<(), InterpreterError>;
}

/// A plugin-provided operation, bound to one wire type at creation time
/// (spec.md §4.I "Operation creation protocol"). `outputs`/`inputs` are
/// the call site's own wire ranges, in signature order, with `signature`
/// carried alongside so an operation whose params span more than one
/// type (e.g. a multiplexer's selector bit versus its payload) can read
/// each param's own type rather than assume everything is `bound_type`.
/// A stateless operation that needs scratch wires pushes its own frame
/// via `host.type_interpreter(ty)` and maps them in, exactly as a
/// regular function call does.
pub trait Operation: 'static {
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
