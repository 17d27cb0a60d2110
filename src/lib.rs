//! Interpreter core for the SIEVE circuit IR.
//!
//! This crate is a thin facade over the workspace: it re-exports the
//! public surface of `sieve-ir` (the data model), `sieve-interpreter`
//! (scoped wire memory, per-type dispatch, conversion — components C/D/E
//! of spec.md §4), `sieve-function` (the function catalog and top-level
//! dispatcher — components F/G), `sieve-plugin` and `sieve-plugins-std`
//! (the plugin framework and standard plugins — components I/J), and
//! `sieve-adapter` (the circuit-handler state machine — component H), so
//! a caller depends on one crate rather than assembling the workspace
//! themselves. Mirrors `kirin`'s own root crate, which re-exports its
//! dialect crates the same way rather than defining behavior itself.

pub use sieve_adapter::CircuitHandler;
pub use sieve_function::{Directive, Function, FunctionCatalog, Interpreter};
pub use sieve_interpreter::{
    ConvertBackend, ConverterRegistry, EmptyStream, InputStream, InterpreterError, LeadTypeInterpreter, Scope,
    ScopeError, TypeBackend, TypeInterpreter, VecStream,
};
pub use sieve_ir::{
    ConversionSpec, FieldValue, FunctionCall, FunctionSignature, ParamSpec, ParameterValue, PluginBinding, TypeIndex,
    TypeSpec, WireIdx, WireRange, WIRE_IDX_MAX,
};
pub use sieve_plugin::{Operation, Plugin, PluginsManager, SimpleOperation, SimplePlugin, TypeInterpreterHost};
pub use sieve_plugins_std::register_all as register_standard_plugins;

/// Overall status of a finished circuit run (spec.md §6.4): `true` iff
/// every function declaration the upstream parser opened was closed,
/// no sticky [`InterpreterError`] was ever raised, every type's public
/// and private input stream was exactly exhausted, and every backend's
/// and converter's `check()` returned true.
///
/// Call once the parser's callback stream has ended; `handler` is
/// consumed since there is nothing left to dispatch to it afterwards.
pub fn overall_status(mut handler: CircuitHandler) -> bool {
    let finished = handler.finished();
    finished && handler.interpreter_mut().check()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sieve_ir::{ParamSpec, TypeSpec};

    #[derive(Default, Clone)]
    struct V(u128);

    struct FieldBackend {
        modulus: u128,
        bad: bool,
    }

    impl TypeBackend for FieldBackend {
        type Value = V;
        fn assign(&mut self, wire: &mut V, value: FieldValue) {
            wire.0 = value;
        }
        fn copy(&mut self, dst: &mut V, src: &V) {
            dst.0 = src.0;
        }
        fn add_gate(&mut self, out: &mut V, l: &V, r: &V) {
            out.0 = (l.0 + r.0) % self.modulus;
        }
        fn mul_gate(&mut self, out: &mut V, l: &V, r: &V) {
            out.0 = (l.0 * r.0) % self.modulus;
        }
        fn addc_gate(&mut self, out: &mut V, l: &V, c: FieldValue) {
            out.0 = (l.0 + c) % self.modulus;
        }
        fn mulc_gate(&mut self, out: &mut V, l: &V, c: FieldValue) {
            out.0 = (l.0 * c) % self.modulus;
        }
        fn assert_zero(&mut self, value: &V) {
            if value.0 != 0 {
                self.bad = true;
            }
        }
        fn public_in(&mut self, wire: &mut V, value: FieldValue) {
            wire.0 = value;
        }
        fn private_in(&mut self, wire: &mut V, value: FieldValue) {
            wire.0 = value;
        }
        fn check(&mut self) -> bool {
            !self.bad
        }
    }

    fn field_type(modulus: u128, public: Vec<FieldValue>, private: Vec<FieldValue>) -> Box<dyn TypeInterpreter> {
        let spec = TypeSpec::Field { modulus };
        Box::new(LeadTypeInterpreter::new(
            TypeIndex(0),
            spec.max_value(),
            FieldBackend { modulus, bad: false },
            Box::new(VecStream::new(public)),
            Box::new(VecStream::new(private)),
        ))
    }

    #[test]
    fn overall_status_true_for_clean_single_add() {
        let mut interp = Interpreter::new();
        interp.declare_type(field_type(7, vec![3, 4], vec![]));
        let mut handler = CircuitHandler::new(interp);

        let t0 = TypeIndex(0);
        handler.public_in(0, t0, 0).unwrap();
        handler.public_in(0, t0, 1).unwrap();
        handler.add_gate(0, t0, 2, 0, 1).unwrap();
        handler.assert_zero(0, t0, 2).unwrap();

        assert!(overall_status(handler));
    }

    #[test]
    fn overall_status_false_when_function_left_open() {
        let mut interp = Interpreter::new();
        interp.declare_type(field_type(7, vec![], vec![]));
        let mut handler = CircuitHandler::new(interp);

        let mut sig = FunctionSignature::new("f");
        sig.outputs.push(ParamSpec::new(TypeIndex(0), 1));
        handler.start_function(sig).unwrap();
        handler.regular_function(0).unwrap();
        // no matching end_function: the stream ends mid-declaration.

        assert!(!overall_status(handler));
    }

    #[test]
    fn overall_status_false_on_bad_witness() {
        let mut interp = Interpreter::new();
        interp.declare_type(field_type(7, vec![], vec![9]));
        let mut handler = CircuitHandler::new(interp);

        let t0 = TypeIndex(0);
        assert!(handler.private_in(0, t0, 0).is_err());
        assert!(!overall_status(handler));
    }
}
