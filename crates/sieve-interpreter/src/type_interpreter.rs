//! Per-type gate dispatch (spec.md §4.D). [`TypeInterpreter`] is the
//! object-safe surface the top-level dispatcher, the converter registry,
//! and plugin operations all drive without knowing a backend's concrete
//! `Value` representation — the same "generics where monomorphization is
//! acceptable, erased trait object at the dispatch boundary" split spec.md
//! §9 calls for. [`LeadTypeInterpreter`] is the one implementation,
//! generic over a [`TypeBackend`].

use std::any::Any;

use sieve_arena::{Pool, Run};
use sieve_ir::{FieldValue, TypeIndex, WireIdx, WireRange};

use crate::backend::{InputStream, TypeBackend};
use crate::error::InterpreterError;
use crate::scope::Scope;

/// Dispatch surface for one declared type: gates, stream reads, scope
/// memory ops, and the frame push/pop/remap machinery a call site or a
/// plugin operation drives directly.
pub trait TypeInterpreter {
    fn type_index(&self) -> TypeIndex;

    /// `None` for a plugin-defined type with no numeric domain.
    fn max_value(&self) -> Option<FieldValue>;

    fn supports_gates(&self) -> bool;

    fn add_gate(
        &mut self,
        line: usize,
        out: WireIdx,
        left: WireIdx,
        right: WireIdx,
    ) -> Result<(), InterpreterError>;
    fn mul_gate(
        &mut self,
        line: usize,
        out: WireIdx,
        left: WireIdx,
        right: WireIdx,
    ) -> Result<(), InterpreterError>;
    fn addc_gate(
        &mut self,
        line: usize,
        out: WireIdx,
        left: WireIdx,
        constant: FieldValue,
    ) -> Result<(), InterpreterError>;
    fn mulc_gate(
        &mut self,
        line: usize,
        out: WireIdx,
        left: WireIdx,
        constant: FieldValue,
    ) -> Result<(), InterpreterError>;
    fn copy(&mut self, line: usize, out: WireIdx, left: WireIdx) -> Result<(), InterpreterError>;
    fn copy_multi(
        &mut self,
        line: usize,
        out: WireRange,
        inputs: &[WireRange],
    ) -> Result<(), InterpreterError>;
    fn assign(
        &mut self,
        line: usize,
        out: WireIdx,
        constant: FieldValue,
    ) -> Result<(), InterpreterError>;
    fn assert_zero(&mut self, line: usize, wire: WireIdx) -> Result<(), InterpreterError>;
    fn public_in(&mut self, line: usize, out: WireIdx) -> Result<(), InterpreterError>;
    fn public_in_multi(&mut self, line: usize, range: WireRange) -> Result<(), InterpreterError>;
    fn private_in(&mut self, line: usize, out: WireIdx) -> Result<(), InterpreterError>;
    fn private_in_multi(&mut self, line: usize, range: WireRange) -> Result<(), InterpreterError>;

    /// Number of public-input values drawn so far, for the stream
    /// accounting check on plugin-bound functions (spec.md §4.F step 4).
    fn public_consumed(&self) -> u64;
    fn private_consumed(&self) -> u64;

    /// Whether both input streams have nothing left unconsumed (spec.md
    /// §6.4 "every stream exactly consumed").
    fn streams_exhausted(&self) -> bool;

    fn new_range(&mut self, line: usize, first: WireIdx, last: WireIdx)
    -> Result<(), InterpreterError>;
    fn delete_range(
        &mut self,
        line: usize,
        first: WireIdx,
        last: WireIdx,
    ) -> Result<(), InterpreterError>;

    fn push_frame(&mut self);
    fn pop_frame(&mut self);

    /// Start of this frame's purely-local wire address space: wires
    /// below it are remapped from the caller, wires at or above it are
    /// free for a plugin operation to use as scratch (spec.md §4.C).
    fn first_local(&self) -> WireIdx;

    fn find_outputs(&mut self, line: usize, range: WireRange) -> Result<Run, InterpreterError>;
    fn find_inputs(&mut self, line: usize, range: WireRange) -> Result<Run, InterpreterError>;
    fn map_outputs(&mut self, run: Run) -> WireRange;
    fn map_inputs(&mut self, run: Run) -> WireRange;
    fn commit_outputs(&mut self, range: WireRange);
    fn is_active(&self, wire: WireIdx) -> bool;

    /// Plaintext readback of an active wire's value, for a backend that
    /// opts into it (spec.md §6.2 `getExtendedWitness`, SPEC_FULL.md
    /// supplemented feature 2). `None` if the backend doesn't support it
    /// or the wire isn't active.
    fn extended_witness(&self, wire: WireIdx) -> Option<FieldValue>;

    /// Surfaces accumulated backend assertion failures after the stream
    /// ends (spec.md §6.2, §7 `BackendAssertFailure`).
    fn check(&mut self) -> bool;
    fn finish(&mut self);

    /// Downcast seam used by the converter registry and plugin
    /// operations that need concrete `Value` access (e.g. a converter
    /// bridging two backends' native value representations).
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// The one [`TypeInterpreter`] implementation: a backend, its public/
/// private input streams, and a stack of [`Scope`]s sharing one arena.
pub struct LeadTypeInterpreter<B: TypeBackend> {
    type_index: TypeIndex,
    max_value: Option<FieldValue>,
    backend: B,
    pool: Pool<B::Value>,
    frames: Vec<Scope<B::Value>>,
    public_in: Box<dyn InputStream>,
    private_in: Box<dyn InputStream>,
    public_consumed: u64,
    private_consumed: u64,
}

impl<B: TypeBackend> LeadTypeInterpreter<B> {
    pub fn new(
        type_index: TypeIndex,
        max_value: Option<FieldValue>,
        backend: B,
        public_in: Box<dyn InputStream>,
        private_in: Box<dyn InputStream>,
    ) -> Self {
        Self {
            type_index,
            max_value,
            backend,
            pool: Pool::new(),
            frames: vec![Scope::new()],
            public_in,
            private_in,
            public_consumed: 0,
            private_consumed: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Raw arena access, used by the converter registry after it has
    /// already validated a [`Run`] via [`TypeInterpreter::find_inputs`]/
    /// [`TypeInterpreter::find_outputs`].
    pub fn pool_get(&self, index: usize) -> &B::Value {
        self.pool
            .get(index)
            .expect("pool slot within a committed run is always live")
    }

    pub fn pool_set(&mut self, index: usize, value: B::Value) {
        self.pool.set(index, value);
    }

    fn top(&self) -> &Scope<B::Value> {
        self.frames.last().expect("a TypeInterpreter always has a frame")
    }

    fn top_mut(&mut self) -> &mut Scope<B::Value> {
        self.frames
            .last_mut()
            .expect("a TypeInterpreter always has a frame")
    }

    fn check_const(&self, line: usize, value: FieldValue) -> Result<(), InterpreterError> {
        match self.max_value {
            Some(max) if value <= max => Ok(()),
            Some(max) => Err(InterpreterError::bad_relation(
                line,
                format!("constant {value} exceeds type's maximum value {max}"),
            )),
            None => Err(InterpreterError::bad_relation(
                line,
                "type has no numeric domain",
            )),
        }
    }

    /// Witness/instance values out of range are `BadStream` (spec.md §7),
    /// distinct from an out-of-range gate constant (`BadRelation`).
    fn check_stream_value(&self, line: usize, value: FieldValue) -> Result<(), InterpreterError> {
        match self.max_value {
            Some(max) if value <= max => Ok(()),
            Some(max) => Err(InterpreterError::bad_stream(
                line,
                format!("stream value {value} exceeds type's maximum value {max}"),
            )),
            None => Err(InterpreterError::bad_stream(line, "type has no numeric domain")),
        }
    }
}

impl<B: TypeBackend> TypeInterpreter for LeadTypeInterpreter<B> {
    fn type_index(&self) -> TypeIndex {
        self.type_index
    }

    fn max_value(&self) -> Option<FieldValue> {
        self.max_value
    }

    fn supports_gates(&self) -> bool {
        self.backend.supports_gates()
    }

    fn add_gate(
        &mut self,
        line: usize,
        out: WireIdx,
        left: WireIdx,
        right: WireIdx,
    ) -> Result<(), InterpreterError> {
        if !self.backend.supports_gates() {
            return Err(InterpreterError::bad_relation(line, "type does not support gates"));
        }
        let l = self
            .top()
            .retrieve(&self.pool, left)
            .map_err(|e| InterpreterError::scope(line, e))?
            .clone();
        let r = self
            .top()
            .retrieve(&self.pool, right)
            .map_err(|e| InterpreterError::scope(line, e))?
            .clone();
        let slot = self
            .top_mut()
            .assign(&mut self.pool, out)
            .map_err(|e| InterpreterError::scope(line, e))?;
        self.backend.add_gate(slot, &l, &r);
        Ok(())
    }

    fn mul_gate(
        &mut self,
        line: usize,
        out: WireIdx,
        left: WireIdx,
        right: WireIdx,
    ) -> Result<(), InterpreterError> {
        if !self.backend.supports_gates() {
            return Err(InterpreterError::bad_relation(line, "type does not support gates"));
        }
        let l = self
            .top()
            .retrieve(&self.pool, left)
            .map_err(|e| InterpreterError::scope(line, e))?
            .clone();
        let r = self
            .top()
            .retrieve(&self.pool, right)
            .map_err(|e| InterpreterError::scope(line, e))?
            .clone();
        let slot = self
            .top_mut()
            .assign(&mut self.pool, out)
            .map_err(|e| InterpreterError::scope(line, e))?;
        self.backend.mul_gate(slot, &l, &r);
        Ok(())
    }

    fn addc_gate(
        &mut self,
        line: usize,
        out: WireIdx,
        left: WireIdx,
        constant: FieldValue,
    ) -> Result<(), InterpreterError> {
        if !self.backend.supports_gates() {
            return Err(InterpreterError::bad_relation(line, "type does not support gates"));
        }
        self.check_const(line, constant)?;
        let l = self
            .top()
            .retrieve(&self.pool, left)
            .map_err(|e| InterpreterError::scope(line, e))?
            .clone();
        let slot = self
            .top_mut()
            .assign(&mut self.pool, out)
            .map_err(|e| InterpreterError::scope(line, e))?;
        self.backend.addc_gate(slot, &l, constant);
        Ok(())
    }

    fn mulc_gate(
        &mut self,
        line: usize,
        out: WireIdx,
        left: WireIdx,
        constant: FieldValue,
    ) -> Result<(), InterpreterError> {
        if !self.backend.supports_gates() {
            return Err(InterpreterError::bad_relation(line, "type does not support gates"));
        }
        self.check_const(line, constant)?;
        let l = self
            .top()
            .retrieve(&self.pool, left)
            .map_err(|e| InterpreterError::scope(line, e))?
            .clone();
        let slot = self
            .top_mut()
            .assign(&mut self.pool, out)
            .map_err(|e| InterpreterError::scope(line, e))?;
        self.backend.mulc_gate(slot, &l, constant);
        Ok(())
    }

    fn copy(&mut self, line: usize, out: WireIdx, left: WireIdx) -> Result<(), InterpreterError> {
        let l = self
            .top()
            .retrieve(&self.pool, left)
            .map_err(|e| InterpreterError::scope(line, e))?
            .clone();
        let slot = self
            .top_mut()
            .assign(&mut self.pool, out)
            .map_err(|e| InterpreterError::scope(line, e))?;
        self.backend.copy(slot, &l);
        Ok(())
    }

    fn copy_multi(
        &mut self,
        line: usize,
        out: WireRange,
        inputs: &[WireRange],
    ) -> Result<(), InterpreterError> {
        let total: u64 = inputs.iter().map(WireRange::len).sum();
        if total != out.len() {
            return Err(InterpreterError::bad_relation(
                line,
                "copy_multi: output length does not match total input length",
            ));
        }
        let mut flat = Vec::with_capacity(total as usize);
        for input in inputs {
            for w in input.first..=input.last {
                let v = self
                    .top()
                    .retrieve(&self.pool, w)
                    .map_err(|e| InterpreterError::scope(line, e))?
                    .clone();
                flat.push(v);
            }
        }
        for (i, value) in flat.into_iter().enumerate() {
            let wire = out.first + i as u64;
            let slot = self
                .top_mut()
                .assign(&mut self.pool, wire)
                .map_err(|e| InterpreterError::scope(line, e))?;
            self.backend.copy(slot, &value);
        }
        Ok(())
    }

    fn assign(
        &mut self,
        line: usize,
        out: WireIdx,
        constant: FieldValue,
    ) -> Result<(), InterpreterError> {
        self.check_const(line, constant)?;
        let slot = self
            .top_mut()
            .assign(&mut self.pool, out)
            .map_err(|e| InterpreterError::scope(line, e))?;
        self.backend.assign(slot, constant);
        Ok(())
    }

    fn assert_zero(&mut self, line: usize, wire: WireIdx) -> Result<(), InterpreterError> {
        let v = self
            .top()
            .retrieve(&self.pool, wire)
            .map_err(|e| InterpreterError::scope(line, e))?
            .clone();
        self.backend.assert_zero(&v);
        Ok(())
    }

    fn public_in(&mut self, line: usize, out: WireIdx) -> Result<(), InterpreterError> {
        let value = self
            .public_in
            .next_value()
            .ok_or_else(|| InterpreterError::bad_stream(line, "public input stream exhausted"))?;
        self.check_stream_value(line, value)?;
        self.public_consumed += 1;
        let slot = self
            .top_mut()
            .assign(&mut self.pool, out)
            .map_err(|e| InterpreterError::scope(line, e))?;
        self.backend.public_in(slot, value);
        Ok(())
    }

    fn public_in_multi(&mut self, line: usize, range: WireRange) -> Result<(), InterpreterError> {
        for wire in range.first..=range.last {
            self.public_in(line, wire)?;
        }
        Ok(())
    }

    fn private_in(&mut self, line: usize, out: WireIdx) -> Result<(), InterpreterError> {
        let value = self
            .private_in
            .next_value()
            .ok_or_else(|| InterpreterError::bad_stream(line, "private input stream exhausted"))?;
        self.check_stream_value(line, value)?;
        self.private_consumed += 1;
        let slot = self
            .top_mut()
            .assign(&mut self.pool, out)
            .map_err(|e| InterpreterError::scope(line, e))?;
        self.backend.private_in(slot, value);
        Ok(())
    }

    fn private_in_multi(&mut self, line: usize, range: WireRange) -> Result<(), InterpreterError> {
        for wire in range.first..=range.last {
            self.private_in(line, wire)?;
        }
        Ok(())
    }

    fn public_consumed(&self) -> u64 {
        self.public_consumed
    }

    fn private_consumed(&self) -> u64 {
        self.private_consumed
    }

    fn streams_exhausted(&self) -> bool {
        self.public_in.is_exhausted() && self.private_in.is_exhausted()
    }

    fn new_range(
        &mut self,
        line: usize,
        first: WireIdx,
        last: WireIdx,
    ) -> Result<(), InterpreterError> {
        self.top_mut()
            .new_range(&mut self.pool, first, last)
            .map_err(|e| InterpreterError::scope(line, e))
    }

    fn delete_range(
        &mut self,
        line: usize,
        first: WireIdx,
        last: WireIdx,
    ) -> Result<(), InterpreterError> {
        self.top_mut()
            .delete_range(&mut self.pool, first, last)
            .map_err(|e| InterpreterError::scope(line, e))
    }

    fn push_frame(&mut self) {
        self.frames.push(Scope::new());
    }

    fn pop_frame(&mut self) {
        debug_assert!(self.frames.len() > 1, "pop_frame called on the top-level frame");
        self.frames.pop();
    }

    fn first_local(&self) -> WireIdx {
        self.top().first_local()
    }

    fn find_outputs(&mut self, line: usize, range: WireRange) -> Result<Run, InterpreterError> {
        self.top_mut()
            .find_outputs(&mut self.pool, range.first, range.last)
            .map_err(|e| InterpreterError::scope(line, e))
    }

    fn find_inputs(&mut self, line: usize, range: WireRange) -> Result<Run, InterpreterError> {
        self.top()
            .find_inputs(range.first, range.last)
            .map_err(|e| InterpreterError::scope(line, e))
    }

    fn map_outputs(&mut self, run: Run) -> WireRange {
        let (first, last) = self.top_mut().map_outputs(run);
        WireRange::new(first, last)
    }

    fn map_inputs(&mut self, run: Run) -> WireRange {
        let (first, last) = self.top_mut().map_inputs(run);
        WireRange::new(first, last)
    }

    fn commit_outputs(&mut self, range: WireRange) {
        self.top_mut().commit_outputs(range.first, range.last);
    }

    fn is_active(&self, wire: WireIdx) -> bool {
        self.top().is_active(wire)
    }

    fn extended_witness(&self, wire: WireIdx) -> Option<FieldValue> {
        if !self.backend.supports_extended_witness() {
            return None;
        }
        let value = self.top().retrieve(&self.pool, wire).ok()?;
        self.backend.get_extended_witness(value)
    }

    fn check(&mut self) -> bool {
        self.backend.check()
    }

    fn finish(&mut self) {
        self.backend.finish();
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::VecStream;

    #[derive(Default, Clone)]
    struct PlainValue(FieldValue);

    struct PlainBackend {
        modulus: FieldValue,
        failed: bool,
    }

    impl TypeBackend for PlainBackend {
        type Value = PlainValue;

        fn assign(&mut self, wire: &mut Self::Value, value: FieldValue) {
            wire.0 = value % self.modulus;
        }
        fn copy(&mut self, dst: &mut Self::Value, src: &Self::Value) {
            dst.0 = src.0;
        }
        fn add_gate(&mut self, out: &mut Self::Value, left: &Self::Value, right: &Self::Value) {
            out.0 = (left.0 + right.0) % self.modulus;
        }
        fn mul_gate(&mut self, out: &mut Self::Value, left: &Self::Value, right: &Self::Value) {
            out.0 = (left.0 * right.0) % self.modulus;
        }
        fn addc_gate(&mut self, out: &mut Self::Value, left: &Self::Value, constant: FieldValue) {
            out.0 = (left.0 + constant) % self.modulus;
        }
        fn mulc_gate(&mut self, out: &mut Self::Value, left: &Self::Value, constant: FieldValue) {
            out.0 = (left.0 * constant) % self.modulus;
        }
        fn assert_zero(&mut self, value: &Self::Value) {
            if value.0 != 0 {
                self.failed = true;
            }
        }
        fn public_in(&mut self, wire: &mut Self::Value, value: FieldValue) {
            wire.0 = value % self.modulus;
        }
        fn private_in(&mut self, wire: &mut Self::Value, value: FieldValue) {
            wire.0 = value % self.modulus;
        }
        fn check(&mut self) -> bool {
            !self.failed
        }
    }

    fn interp(modulus: FieldValue) -> LeadTypeInterpreter<PlainBackend> {
        LeadTypeInterpreter::new(
            TypeIndex(0),
            Some(modulus - 1),
            PlainBackend { modulus, failed: false },
            Box::new(VecStream::new([3, 4])),
            Box::new(VecStream::new([])),
        )
    }

    #[test]
    fn single_add_matches_s1() {
        let mut ti = interp(7);
        ti.public_in(0, 0).unwrap();
        ti.public_in(0, 1).unwrap();
        ti.add_gate(0, 2, 0, 1).unwrap();
        ti.assert_zero(0, 2).unwrap();
        assert!(!ti.check());
        assert_eq!(*ti.top().retrieve(&ti.pool, 2).unwrap(), PlainValue(0));
    }

    #[test]
    fn private_in_out_of_range_is_bad_stream() {
        let mut ti = LeadTypeInterpreter::new(
            TypeIndex(0),
            Some(6),
            PlainBackend { modulus: 7, failed: false },
            Box::new(VecStream::new([])),
            Box::new(VecStream::new([9])),
        );
        let err = ti.private_in(0, 0).unwrap_err();
        assert!(matches!(err, InterpreterError::BadStream { .. }));
    }

    #[test]
    fn call_style_remap_round_trips_through_pool() {
        let mut ti = interp(7);
        ti.assign(0, 0, 5).unwrap();
        let out_run = ti.find_outputs(0, WireRange::single(1)).unwrap();
        let in_run = ti.find_inputs(0, WireRange::single(0)).unwrap();
        ti.push_frame();
        let local_out = ti.map_outputs(out_run);
        let local_in = ti.map_inputs(in_run);
        ti.copy(0, local_out.first, local_in.first).unwrap();
        ti.pop_frame();
        ti.commit_outputs(WireRange::single(1));
        assert_eq!(*ti.top().retrieve(&ti.pool, 1).unwrap(), PlainValue(5));
    }
}
