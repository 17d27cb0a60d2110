//! The callback interface a ZK backend implements for one declared type
//! (spec.md §6.2), plus the finite external value streams (§3 "Stream
//! semantics") a [`crate::TypeInterpreter`] reads from.

use sieve_ir::FieldValue;

/// Per-type backend callbacks. The core never interprets `Value` itself —
/// it only moves values between wires as the gate stream dictates.
///
/// Mirrors `wtk::TypeBackend<Number_T, Wire_T>` with `Number_T` fixed to
/// [`FieldValue`] (see `sieve_ir::value`).
pub trait TypeBackend: 'static {
    /// Opaque per-wire backend state (e.g. a commitment, a share, or in a
    /// plaintext test backend just the field element itself). `Clone` lets
    /// gate dispatch read an operand's current value out of the arena
    /// before taking a fresh mutable borrow for the output slot, which
    /// keeps the dispatcher free of aliasing raw pointers.
    type Value: Default + Clone;

    fn assign(&mut self, wire: &mut Self::Value, value: FieldValue);
    fn copy(&mut self, dst: &mut Self::Value, src: &Self::Value);
    fn add_gate(&mut self, out: &mut Self::Value, left: &Self::Value, right: &Self::Value);
    fn mul_gate(&mut self, out: &mut Self::Value, left: &Self::Value, right: &Self::Value);
    fn addc_gate(&mut self, out: &mut Self::Value, left: &Self::Value, constant: FieldValue);
    fn mulc_gate(&mut self, out: &mut Self::Value, left: &Self::Value, constant: FieldValue);
    fn assert_zero(&mut self, value: &Self::Value);
    fn public_in(&mut self, wire: &mut Self::Value, value: FieldValue);
    fn private_in(&mut self, wire: &mut Self::Value, value: FieldValue);

    /// Surfaces any constraint failures accumulated since the last call
    /// (e.g. a non-zero `assert_zero`). Called once, after the stream ends.
    fn check(&mut self) -> bool;

    /// Optional finalization hook, distinct from `check`, for backends
    /// that need an explicit end-of-stream step (e.g. flushing a proof
    /// transcript). No-op by default.
    fn finish(&mut self) {}

    /// False for a backend that only ever participates via plugin
    /// operations (e.g. a RAM-only type) and rejects ordinary gates.
    fn supports_gates(&self) -> bool {
        true
    }

    /// Whether [`Self::get_extended_witness`] can produce a value.
    fn supports_extended_witness(&self) -> bool {
        false
    }

    /// Debug-only plaintext readback of a wire's value, used by
    /// verifier-side diagnostics tooling. `None` unless the backend
    /// opts in via [`Self::supports_extended_witness`].
    fn get_extended_witness(&self, _value: &Self::Value) -> Option<FieldValue> {
        None
    }
}

/// A public or private input stream: a finite lazy sequence of field
/// elements (spec.md §4.D "Stream semantics").
pub trait InputStream: 'static {
    /// Advance the stream, returning the next value or `None` at the end.
    fn next_value(&mut self) -> Option<FieldValue>;

    /// Whether every value the stream carries has been consumed. Used by
    /// the top-level overall-status check (spec.md §6.4 "every stream
    /// exactly consumed") to catch a circuit that under-reads its
    /// declared witness/instance.
    fn is_exhausted(&self) -> bool;
}

/// An [`InputStream`] with no values, for types that never consume input.
#[derive(Default)]
pub struct EmptyStream;

impl InputStream for EmptyStream {
    fn next_value(&mut self) -> Option<FieldValue> {
        None
    }

    fn is_exhausted(&self) -> bool {
        true
    }
}

/// A fixed, pre-supplied sequence of input values — the obvious
/// [`InputStream`] for tests and for a circuit driven from an in-memory
/// witness/instance.
#[derive(Debug, Default, Clone)]
pub struct VecStream {
    values: std::collections::VecDeque<FieldValue>,
}

impl VecStream {
    pub fn new(values: impl IntoIterator<Item = FieldValue>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl InputStream for VecStream {
    fn next_value(&mut self) -> Option<FieldValue> {
        self.values.pop_front()
    }

    fn is_exhausted(&self) -> bool {
        self.values.is_empty()
    }
}

/// Per-conversion-shape backend callback (spec.md §6.2 "Per conversion
/// shape").
pub trait ConvertBackend<Out: TypeBackend, In: TypeBackend>: 'static {
    fn convert(&mut self, out_wires: &mut [Out::Value], in_wires: &[In::Value], modulus: bool);

    fn check(&mut self) -> bool {
        true
    }
}
