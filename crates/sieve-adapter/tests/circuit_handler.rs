//! Drives [`CircuitHandler`] the way a parser would: one callback per
//! directive, in the exact calling order `wtk::circuit::Handler`
//! documents for regular and plugin-backed functions.

use sieve_adapter::CircuitHandler;
use sieve_function::Interpreter;
use sieve_interpreter::{InterpreterError, LeadTypeInterpreter, TypeBackend, VecStream};
use sieve_ir::{FieldValue, FunctionSignature, ParamSpec, PluginBinding, TypeIndex, TypeSpec, WireRange};

#[derive(Default, Clone, PartialEq, Debug)]
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

fn new_handler(modulus: u128, public: Vec<FieldValue>, private: Vec<FieldValue>) -> CircuitHandler {
    let mut interp = Interpreter::new();
    let spec = TypeSpec::Field { modulus };
    interp.declare_type(Box::new(LeadTypeInterpreter::new(
        TypeIndex(0),
        spec.max_value(),
        FieldBackend { modulus, bad: false },
        Box::new(VecStream::new(public)),
        Box::new(VecStream::new(private)),
    )));
    CircuitHandler::new(interp)
}

#[test]
fn top_level_gates_dispatch_immediately() {
    let mut handler = new_handler(97, vec![], vec![]);
    let ty = TypeIndex(0);
    handler.interpreter_mut().new_range(1, ty, 0, 2).unwrap();
    handler.assign(1, ty, 0, 3).unwrap();
    handler.assign(1, ty, 1, 4).unwrap();
    handler.add_gate(1, ty, 2, 0, 1).unwrap();
    handler.assert_zero(1, ty, 2).unwrap();
    // 3 + 4 = 7, not zero: the backend records the failure, but only
    // `check()` surfaces it — the gate callback itself still succeeds.
    assert!(!handler.interpreter_mut().check());
}

#[test]
fn regular_function_body_is_buffered_until_end_function() {
    let mut handler = new_handler(97, vec![], vec![]);
    let ty = TypeIndex(0);

    let mut sig = FunctionSignature::new("double");
    sig.outputs.push(ParamSpec::new(ty, 1));
    sig.inputs.push(ParamSpec::new(ty, 1));
    sig.line = 1;
    handler.start_function(sig).unwrap();
    handler.regular_function(1).unwrap();
    // Buffered, not dispatched: local wire 0 is the callee's output,
    // local wire 1 its single input (map_outputs runs before map_inputs).
    handler.mulc_gate(2, ty, 0, 1, 2).unwrap();
    handler.end_function(3).unwrap();

    handler.interpreter_mut().new_range(4, ty, 0, 1).unwrap();
    handler.assign(4, ty, 0, 5).unwrap();
    handler.invoke(4, "double", &[WireRange::single(1)], &[WireRange::single(0)]).unwrap();
}

#[test]
fn plugin_function_never_opens_a_buffered_body() {
    let mut handler = new_handler(97, vec![], vec![]);
    let ty = TypeIndex(0);

    sieve_plugins_std::register_all(handler.interpreter_mut().plugins_mut());

    let mut sig = FunctionSignature::new("sum3");
    sig.outputs.push(ParamSpec::new(ty, 1));
    sig.inputs.push(ParamSpec::new(ty, 3));
    sig.line = 1;
    handler.start_function(sig).unwrap();
    let binding = PluginBinding::new("vectors", "sum");
    handler.plugin_function(1, binding).unwrap();

    // No end_function call for this one: it already returned to top level.
    handler.interpreter_mut().new_range(2, ty, 0, 3).unwrap();
    handler.assign(2, ty, 0, 2).unwrap();
    handler.assign(2, ty, 1, 3).unwrap();
    handler.assign(2, ty, 2, 4).unwrap();
    handler.invoke(2, "sum3", &[WireRange::single(3)], &[WireRange::new(0, 2)]).unwrap();
}

#[test]
fn gate_callback_while_signature_pending_is_rejected() {
    let mut handler = new_handler(97, vec![], vec![]);
    let ty = TypeIndex(0);
    let mut sig = FunctionSignature::new("f");
    sig.line = 1;
    handler.start_function(sig).unwrap();
    let err = handler.add_gate(2, ty, 0, 0, 0).unwrap_err();
    assert!(matches!(err, InterpreterError::BadRelation { .. }));
}

#[test]
fn end_function_without_regular_function_is_rejected() {
    let mut handler = new_handler(97, vec![], vec![]);
    let mut sig = FunctionSignature::new("f");
    sig.line = 1;
    handler.start_function(sig).unwrap();
    let err = handler.end_function(2).unwrap_err();
    assert!(matches!(err, InterpreterError::BadRelation { .. }));
}

#[test]
fn nested_start_function_is_rejected() {
    let mut handler = new_handler(97, vec![], vec![]);
    let mut sig = FunctionSignature::new("outer");
    sig.line = 1;
    handler.start_function(sig).unwrap();
    let mut inner = FunctionSignature::new("inner");
    inner.line = 2;
    let err = handler.start_function(inner).unwrap_err();
    assert!(matches!(err, InterpreterError::BadRelation { .. }));
}
