//! Shared scratch-frame and field-arithmetic helpers used by more than
//! one standard plugin (spec.md §4.J). Every plugin operation here
//! reaches its scratch wires the same way a regular function call
//! reaches its locals: push a frame, remap the call's own ranges in,
//! then `assign`/gate sequentially from `first_local()` onward so the
//! scope's tail-growth path (`Scope::assign`) mints each new wire.

use sieve_interpreter::{InterpreterError, TypeInterpreter};
use sieve_ir::{FieldValue, WireIdx, WireRange};

/// A pushed frame plus the next unused local wire index, handed out by
/// [`LocalFrame::fresh`].
pub struct LocalFrame {
    next: WireIdx,
}

impl LocalFrame {
    /// Pushes a frame on `ti` and remaps every output range, then every
    /// input range, in call order. Returns the frame handle plus each
    /// range's local addressing, in the same order as given.
    pub fn enter(
        ti: &mut dyn TypeInterpreter,
        line: usize,
        outputs: &[WireRange],
        inputs: &[WireRange],
    ) -> Result<(Self, Vec<WireRange>, Vec<WireRange>), InterpreterError> {
        let out_runs = outputs
            .iter()
            .map(|r| ti.find_outputs(line, *r))
            .collect::<Result<Vec<_>, _>>()?;
        let in_runs = inputs
            .iter()
            .map(|r| ti.find_inputs(line, *r))
            .collect::<Result<Vec<_>, _>>()?;

        ti.push_frame();
        let local_outputs: Vec<WireRange> =
            out_runs.into_iter().map(|run| ti.map_outputs(run)).collect();
        let local_inputs: Vec<WireRange> =
            in_runs.into_iter().map(|run| ti.map_inputs(run)).collect();
        let next = ti.first_local();
        Ok((Self { next }, local_outputs, local_inputs))
    }

    /// Hands out the next unused local wire. Callers must `assign`/gate
    /// it immediately and in increasing order — the scope only grows its
    /// implicit tail range contiguously.
    pub fn fresh(&mut self) -> WireIdx {
        let wire = self.next;
        self.next += 1;
        wire
    }

    /// Materializes a compile-time constant on a fresh scratch wire.
    pub fn constant(
        &mut self,
        ti: &mut dyn TypeInterpreter,
        line: usize,
        value: FieldValue,
    ) -> Result<WireIdx, InterpreterError> {
        let wire = self.fresh();
        ti.assign(line, wire, value)?;
        Ok(wire)
    }

    /// Pops the frame and commits every original (caller-addressed)
    /// output range as assigned. Always call this before returning,
    /// success or not — there is no other path back to the caller's
    /// frame.
    pub fn exit(ti: &mut dyn TypeInterpreter, outputs: &[WireRange]) {
        ti.pop_frame();
        for range in outputs {
            ti.commit_outputs(*range);
        }
    }
}

/// Which gate family [`fold`] chains together.
#[derive(Clone, Copy)]
pub enum Assoc {
    Add,
    Mul,
}

/// Left-to-right fold of `values` (already local wires) through `op`,
/// threading each partial result through a fresh scratch wire. `values`
/// must be non-empty.
pub fn fold(
    ti: &mut dyn TypeInterpreter,
    frame: &mut LocalFrame,
    line: usize,
    op: Assoc,
    values: &[WireIdx],
) -> Result<WireIdx, InterpreterError> {
    let mut acc = values[0];
    for &v in &values[1..] {
        let w = frame.fresh();
        match op {
            Assoc::Add => ti.add_gate(line, w, acc, v)?,
            Assoc::Mul => ti.mul_gate(line, w, acc, v)?,
        }
        acc = w;
    }
    Ok(acc)
}

/// `left - right`, via negate-then-add since no gate takes two wire
/// operands and a subtraction.
pub fn sub_gate(
    ti: &mut dyn TypeInterpreter,
    frame: &mut LocalFrame,
    line: usize,
    modulus: FieldValue,
    left: WireIdx,
    right: WireIdx,
) -> Result<WireIdx, InterpreterError> {
    let neg_right = frame.fresh();
    ti.mulc_gate(line, neg_right, right, modulus - 1)?;
    let out = frame.fresh();
    ti.add_gate(line, out, left, neg_right)?;
    Ok(out)
}

/// `base ^ exp` by repeated squaring, `exp` a compile-time constant
/// (e.g. `modulus - 1` for a Fermat's Little Theorem indicator).
pub fn pow_const_exp(
    ti: &mut dyn TypeInterpreter,
    frame: &mut LocalFrame,
    line: usize,
    base: WireIdx,
    mut exp: u128,
) -> Result<WireIdx, InterpreterError> {
    if exp == 0 {
        return frame.constant(ti, line, 1);
    }
    let mut cur = base;
    let mut result: Option<WireIdx> = None;
    if exp & 1 == 1 {
        result = Some(cur);
    }
    exp >>= 1;
    while exp > 0 {
        let sq = frame.fresh();
        ti.mul_gate(line, sq, cur, cur)?;
        cur = sq;
        if exp & 1 == 1 {
            result = Some(match result {
                None => cur,
                Some(r) => {
                    let w = frame.fresh();
                    ti.mul_gate(line, w, r, cur)?;
                    w
                }
            });
        }
        exp >>= 1;
    }
    Ok(result.expect("exp != 0 guarantees at least one bit set"))
}

/// Fermat's Little Theorem equality indicator: `1` if `wire == constant`
/// (mod `modulus`), else `0`, valid whenever `modulus` is prime (a
/// declared `Field` type — see `sieve_ir::TypeSpec::Field`). Computed as
/// `1 - (wire - constant)^(modulus - 1)`.
pub fn flt_eq_indicator(
    ti: &mut dyn TypeInterpreter,
    frame: &mut LocalFrame,
    line: usize,
    modulus: FieldValue,
    wire: WireIdx,
    constant: FieldValue,
) -> Result<WireIdx, InterpreterError> {
    let diff = frame.fresh();
    let neg_const = (modulus - (constant % modulus)) % modulus;
    ti.addc_gate(line, diff, wire, neg_const)?;
    let pow = pow_const_exp(ti, frame, line, diff, modulus - 1)?;
    let neg_pow = frame.fresh();
    ti.mulc_gate(line, neg_pow, pow, modulus - 1)?;
    let indicator = frame.fresh();
    ti.addc_gate(line, indicator, neg_pow, 1)?;
    Ok(indicator)
}

/// Boolean-select: `if bit == 1 { on_true } else { on_false }`, via
/// `on_false + bit * (on_true - on_false)`. `bit` must be a 0/1 wire.
pub fn select(
    ti: &mut dyn TypeInterpreter,
    frame: &mut LocalFrame,
    line: usize,
    modulus: FieldValue,
    bit: WireIdx,
    on_false: WireIdx,
    on_true: WireIdx,
) -> Result<WireIdx, InterpreterError> {
    let diff = sub_gate(ti, frame, line, modulus, on_true, on_false)?;
    let term = frame.fresh();
    ti.mul_gate(line, term, diff, bit)?;
    let out = frame.fresh();
    ti.add_gate(line, out, on_false, term)?;
    Ok(out)
}
