//! `extended_arithmetic` plugin: comparisons, division, and bit
//! decomposition (spec.md §4.J), grounded on
//! `wtk::plugins::ExtendedArithmetic`'s `Fallback*Operation` family —
//! each reconstructs its result from a witness-derived bit decomposition
//! plus the constraints that tie the decomposition back to the
//! original wire, the same "fallback" role the header documents for a
//! backend that doesn't natively support these operations.
//!
//! All four operations read a plaintext value out of the input wire via
//! [`TypeInterpreter::extended_witness`] to decide what to assign, then
//! issue ordinary gates that constrain the assigned wires against the
//! input — the plugin never trusts the peeked value on its own.

use sieve_ir::{FieldValue, FunctionSignature, PluginBinding, TypeIndex, WireIdx, WireRange};
use sieve_interpreter::{InterpreterError, TypeInterpreter};
use sieve_plugin::{SimpleOperation, SimplePlugin, TypeInterpreterHost};

use crate::support::{Assoc, LocalFrame, fold, sub_gate};

pub fn plugin() -> SimplePlugin {
    SimplePlugin::new("extended_arithmetic")
        .with_operation("less_than", LessThan)
        .with_operation("less_than_equal", LessThanEqual)
        .with_operation("division", Division)
        .with_operation("bit_decompose", BitDecompose)
}

fn bit_width(max_value: FieldValue) -> u32 {
    if max_value == 0 { 1 } else { 128 - max_value.leading_zeros() }
}

/// Peeks `wire`'s plaintext value, assigns `bit_count` big-endian
/// constant bits for it, and constrains their weighted sum to equal
/// `wire` modulo `modulus`.
fn decompose(
    ti: &mut dyn TypeInterpreter,
    frame: &mut LocalFrame,
    line: usize,
    modulus: FieldValue,
    bit_count: u32,
    wire: WireIdx,
) -> Result<Vec<WireIdx>, InterpreterError> {
    let value = ti.extended_witness(wire).ok_or_else(|| {
        InterpreterError::bad_relation(
            line,
            "extended_arithmetic: backend does not support extended witness readback",
        )
    })?;

    let mut bits = Vec::with_capacity(bit_count as usize);
    for i in 0..bit_count {
        let shift = bit_count - 1 - i;
        let bit_val = (value >> shift) & 1;
        bits.push(frame.constant(ti, line, bit_val)?);
    }

    let mut terms = Vec::with_capacity(bit_count as usize);
    for (i, &b) in bits.iter().enumerate() {
        let shift = bit_count - 1 - i as u32;
        let weight = (1u128 << shift) % modulus;
        let t = frame.fresh();
        ti.mulc_gate(line, t, b, weight)?;
        terms.push(t);
    }
    let sum = fold(ti, frame, line, Assoc::Add, &terms)?;
    let diff = sub_gate(ti, frame, line, modulus, sum, wire)?;
    ti.assert_zero(line, diff)?;
    Ok(bits)
}

fn bool_not(
    ti: &mut dyn TypeInterpreter,
    frame: &mut LocalFrame,
    line: usize,
    modulus: FieldValue,
    bit: WireIdx,
) -> Result<WireIdx, InterpreterError> {
    let neg = frame.fresh();
    ti.mulc_gate(line, neg, bit, modulus - 1)?;
    let out = frame.fresh();
    ti.addc_gate(line, out, neg, 1)?;
    Ok(out)
}

/// `1` if the number `a_bits` spells out (big-endian) is strictly less
/// than the one `b_bits` spells out, else `0`. Standard bitwise
/// comparator: walk most-significant bit to least, tracking "still
/// equal so far" and "already decided less".
fn less_than_bits(
    ti: &mut dyn TypeInterpreter,
    frame: &mut LocalFrame,
    line: usize,
    modulus: FieldValue,
    a_bits: &[WireIdx],
    b_bits: &[WireIdx],
) -> Result<WireIdx, InterpreterError> {
    let mut lt = frame.constant(ti, line, 0)?;
    let mut eq = frame.constant(ti, line, 1)?;
    for (&a, &b) in a_bits.iter().zip(b_bits) {
        let not_a = bool_not(ti, frame, line, modulus, a)?;
        let not_b = bool_not(ti, frame, line, modulus, b)?;

        let bit_lt = frame.fresh();
        ti.mul_gate(line, bit_lt, not_a, b)?;

        let both_one = frame.fresh();
        ti.mul_gate(line, both_one, a, b)?;
        let both_zero = frame.fresh();
        ti.mul_gate(line, both_zero, not_a, not_b)?;
        let bit_eq = fold(ti, frame, line, Assoc::Add, &[both_one, both_zero])?;

        let newly_lt = frame.fresh();
        ti.mul_gate(line, newly_lt, eq, bit_lt)?;
        let lt_next = frame.fresh();
        ti.add_gate(line, lt_next, lt, newly_lt)?;

        let eq_next = frame.fresh();
        ti.mul_gate(line, eq_next, eq, bit_eq)?;

        lt = lt_next;
        eq = eq_next;
    }
    Ok(lt)
}

fn unary_signature_ok(signature: &FunctionSignature, out_len: u64, in_len: u64) -> bool {
    signature.outputs.len() == 1
        && signature.outputs[0].length == out_len
        && signature.inputs.len() == 1
        && signature.inputs[0].length == in_len
}

fn comparison_signature_ok(signature: &FunctionSignature) -> bool {
    signature.outputs.len() == 1
        && signature.outputs[0].length == 1
        && signature.inputs.len() == 2
        && signature.inputs[0].length == 1
        && signature.inputs[1].length == 1
}

struct LessThan;

impl SimpleOperation for LessThan {
    fn check_signature(
        &self,
        _type_index: TypeIndex,
        max_value: Option<FieldValue>,
        signature: &FunctionSignature,
        _binding: &PluginBinding,
    ) -> Result<bool, String> {
        Ok(max_value.is_some() && comparison_signature_ok(signature))
    }

    fn evaluate(
        &self,
        host: &mut dyn TypeInterpreterHost,
        _signature: &FunctionSignature,
        bound_type: TypeIndex,
        line: usize,
        outputs: &[WireRange],
        inputs: &[WireRange],
    ) -> Result<(), InterpreterError> {
        let max_value = host
            .max_value(bound_type)
            .expect("check_signature requires a numeric domain");
        let modulus = max_value + 1;
        let bits = bit_width(max_value);
        let ti = host.type_interpreter(bound_type);
        let (mut frame, local_outputs, local_inputs) = LocalFrame::enter(ti, line, outputs, inputs)?;
        let a_bits = decompose(ti, &mut frame, line, modulus, bits, local_inputs[0].first)?;
        let b_bits = decompose(ti, &mut frame, line, modulus, bits, local_inputs[1].first)?;
        let lt = less_than_bits(ti, &mut frame, line, modulus, &a_bits, &b_bits)?;
        ti.copy(line, local_outputs[0].first, lt)?;
        LocalFrame::exit(ti, outputs);
        Ok(())
    }
}

struct LessThanEqual;

impl SimpleOperation for LessThanEqual {
    fn check_signature(
        &self,
        _type_index: TypeIndex,
        max_value: Option<FieldValue>,
        signature: &FunctionSignature,
        _binding: &PluginBinding,
    ) -> Result<bool, String> {
        Ok(max_value.is_some() && comparison_signature_ok(signature))
    }

    fn evaluate(
        &self,
        host: &mut dyn TypeInterpreterHost,
        _signature: &FunctionSignature,
        bound_type: TypeIndex,
        line: usize,
        outputs: &[WireRange],
        inputs: &[WireRange],
    ) -> Result<(), InterpreterError> {
        let max_value = host
            .max_value(bound_type)
            .expect("check_signature requires a numeric domain");
        let modulus = max_value + 1;
        let bits = bit_width(max_value);
        let ti = host.type_interpreter(bound_type);
        let (mut frame, local_outputs, local_inputs) = LocalFrame::enter(ti, line, outputs, inputs)?;
        let a_bits = decompose(ti, &mut frame, line, modulus, bits, local_inputs[0].first)?;
        let b_bits = decompose(ti, &mut frame, line, modulus, bits, local_inputs[1].first)?;
        // a <= b  <=>  not(b < a)
        let b_lt_a = less_than_bits(ti, &mut frame, line, modulus, &b_bits, &a_bits)?;
        let le = bool_not(ti, &mut frame, line, modulus, b_lt_a)?;
        ti.copy(line, local_outputs[0].first, le)?;
        LocalFrame::exit(ti, outputs);
        Ok(())
    }
}

struct Division;

impl SimpleOperation for Division {
    fn check_signature(
        &self,
        _type_index: TypeIndex,
        max_value: Option<FieldValue>,
        signature: &FunctionSignature,
        _binding: &PluginBinding,
    ) -> Result<bool, String> {
        Ok(max_value.is_some()
            && signature.outputs.len() == 2
            && signature.outputs[0].length == 1
            && signature.outputs[1].length == 1
            && signature.inputs.len() == 2
            && signature.inputs[0].length == 1
            && signature.inputs[1].length == 1)
    }

    fn evaluate(
        &self,
        host: &mut dyn TypeInterpreterHost,
        _signature: &FunctionSignature,
        bound_type: TypeIndex,
        line: usize,
        outputs: &[WireRange],
        inputs: &[WireRange],
    ) -> Result<(), InterpreterError> {
        let max_value = host
            .max_value(bound_type)
            .expect("check_signature requires a numeric domain");
        let modulus = max_value + 1;
        let bits = bit_width(max_value);
        let ti = host.type_interpreter(bound_type);
        let (mut frame, local_outputs, local_inputs) = LocalFrame::enter(ti, line, outputs, inputs)?;
        let left_wire = local_inputs[0].first;
        let right_wire = local_inputs[1].first;

        let left = ti.extended_witness(left_wire).ok_or_else(|| {
            InterpreterError::bad_relation(line, "division: backend does not support extended witness readback")
        })?;
        let right = ti.extended_witness(right_wire).ok_or_else(|| {
            InterpreterError::bad_relation(line, "division: backend does not support extended witness readback")
        })?;
        if right == 0 {
            return Err(InterpreterError::bad_relation(line, "division by zero"));
        }
        let quotient = left / right;
        let remainder = left % right;

        let quotient_wire = frame.constant(ti, line, quotient)?;
        let remainder_wire = frame.constant(ti, line, remainder)?;

        let product = frame.fresh();
        ti.mul_gate(line, product, right_wire, quotient_wire)?;
        let reconstructed = frame.fresh();
        ti.add_gate(line, reconstructed, product, remainder_wire)?;
        let diff = sub_gate(ti, &mut frame, line, modulus, reconstructed, left_wire)?;
        ti.assert_zero(line, diff)?;

        let remainder_bits = decompose(ti, &mut frame, line, modulus, bits, remainder_wire)?;
        let right_bits = decompose(ti, &mut frame, line, modulus, bits, right_wire)?;
        let remainder_lt_right = less_than_bits(ti, &mut frame, line, modulus, &remainder_bits, &right_bits)?;
        let must_be_one = frame.fresh();
        ti.addc_gate(line, must_be_one, remainder_lt_right, modulus - 1)?;
        ti.assert_zero(line, must_be_one)?;

        ti.copy(line, local_outputs[0].first, quotient_wire)?;
        ti.copy(line, local_outputs[1].first, remainder_wire)?;
        LocalFrame::exit(ti, outputs);
        Ok(())
    }
}

struct BitDecompose;

impl SimpleOperation for BitDecompose {
    fn check_signature(
        &self,
        _type_index: TypeIndex,
        max_value: Option<FieldValue>,
        signature: &FunctionSignature,
        _binding: &PluginBinding,
    ) -> Result<bool, String> {
        Ok(max_value.is_some()
            && signature.outputs.len() == 1
            && signature.outputs[0].length >= 1
            && unary_signature_ok(signature, signature.outputs[0].length, 1))
    }

    fn evaluate(
        &self,
        host: &mut dyn TypeInterpreterHost,
        signature: &FunctionSignature,
        bound_type: TypeIndex,
        line: usize,
        outputs: &[WireRange],
        inputs: &[WireRange],
    ) -> Result<(), InterpreterError> {
        let max_value = host
            .max_value(bound_type)
            .expect("check_signature requires a numeric domain");
        let modulus = max_value + 1;
        let bit_count = signature.outputs[0].length as u32;
        let ti = host.type_interpreter(bound_type);
        let (mut frame, local_outputs, local_inputs) = LocalFrame::enter(ti, line, outputs, inputs)?;
        let bits = decompose(ti, &mut frame, line, modulus, bit_count, local_inputs[0].first)?;
        for (i, &b) in bits.iter().enumerate() {
            ti.copy(line, local_outputs[0].first + i as u64, b)?;
        }
        LocalFrame::exit(ti, outputs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_width_covers_max_value() {
        assert_eq!(bit_width(6), 3);
        assert_eq!(bit_width(255), 8);
        assert_eq!(bit_width(0), 1);
    }

    #[test]
    fn less_than_rejects_missing_domain() {
        let sig = {
            let mut s = FunctionSignature::new("lt");
            s.outputs.push(sieve_ir::ParamSpec::new(TypeIndex(0), 1));
            s.inputs.push(sieve_ir::ParamSpec::new(TypeIndex(0), 1));
            s.inputs.push(sieve_ir::ParamSpec::new(TypeIndex(0), 1));
            s
        };
        let op = LessThan;
        assert!(
            !op.check_signature(TypeIndex(0), None, &sig, &PluginBinding::new("extended_arithmetic", "less_than"))
                .unwrap()
        );
    }

    #[test]
    fn division_requires_two_outputs() {
        let mut sig = FunctionSignature::new("div");
        sig.outputs.push(sieve_ir::ParamSpec::new(TypeIndex(0), 1));
        sig.inputs.push(sieve_ir::ParamSpec::new(TypeIndex(0), 1));
        sig.inputs.push(sieve_ir::ParamSpec::new(TypeIndex(0), 1));
        let op = Division;
        assert!(
            !op.check_signature(TypeIndex(0), Some(6), &sig, &PluginBinding::new("extended_arithmetic", "division"))
                .unwrap()
        );
    }
}
