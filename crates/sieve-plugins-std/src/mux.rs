//! `mux` plugin: select one of several wire bundles (spec.md §4.J),
//! grounded on `wtk::plugins::Multiplexer`'s `StrictFLTMuxOperation` /
//! `PermissiveFLTMuxOperation` (arithmetic, any prime-field type) and
//! `StrictTreedBooleanMuxOperation` / `PermissiveTreedBooleanMuxOperation`
//! (boolean, GF(2)).
//!
//! Binding shape: `inputs[0]` is the selector (one wire for the
//! arithmetic case naming a case index 0..cases-1 directly, or a
//! big-endian bundle of boolean selector bits for the GF(2) case
//! naming `2^bits` cases); `inputs[1..]` are the candidate cases, each
//! the same length as `outputs[0]`. `strict` additionally asserts
//! exactly one case's indicator fires; `permissive` does not.

use sieve_ir::{FieldValue, FunctionSignature, PluginBinding, TypeIndex, WireRange};
use sieve_interpreter::{InterpreterError, TypeInterpreter};
use sieve_plugin::{SimpleOperation, SimplePlugin, TypeInterpreterHost};

use crate::support::{Assoc, LocalFrame, flt_eq_indicator, fold};

pub fn plugin() -> SimplePlugin {
    SimplePlugin::new("mux")
        .with_operation("strict_mux", Multiplexer { strict: true })
        .with_operation("permissive_mux", Multiplexer { strict: false })
}

struct Multiplexer {
    strict: bool,
}

impl SimpleOperation for Multiplexer {
    fn check_signature(
        &self,
        _type_index: TypeIndex,
        max_value: Option<FieldValue>,
        signature: &FunctionSignature,
        _binding: &PluginBinding,
    ) -> Result<bool, String> {
        if max_value.is_none() {
            return Ok(false);
        }
        if signature.outputs.len() != 1 || signature.inputs.len() < 2 {
            return Ok(false);
        }
        let out_len = signature.outputs[0].length;
        if out_len == 0 {
            return Ok(false);
        }
        let cases = &signature.inputs[1..];
        Ok(cases.iter().all(|c| c.length == out_len))
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
        let modulus = host
            .max_value(bound_type)
            .ok_or_else(|| InterpreterError::plugin_reject(line, "mux: type has no numeric domain"))?
            + 1;
        let ti = host.type_interpreter(bound_type);
        let (mut frame, local_outputs, local_inputs) = LocalFrame::enter(ti, line, outputs, inputs)?;
        let selector = local_inputs[0];
        let cases = &local_inputs[1..];
        let out = local_outputs[0];

        let indicators = if modulus == 2 && selector.len() > 1 {
            treed_boolean_indicators(ti, &mut frame, line, selector, cases.len())?
        } else {
            flt_indicators(ti, &mut frame, line, modulus, selector.first, cases.len())?
        };

        if self.strict {
            let sum = fold(ti, &mut frame, line, Assoc::Add, &indicators)?;
            let check = frame.fresh();
            ti.addc_gate(line, check, sum, modulus - 1)?;
            ti.assert_zero(line, check)?;
        }

        for i in 0..out.len() {
            let terms: Vec<_> = cases
                .iter()
                .zip(&indicators)
                .map(|(case, &ind)| {
                    let t = frame.fresh();
                    ti.mul_gate(line, t, ind, case.first + i).map(|_| t)
                })
                .collect::<Result<_, _>>()?;
            let acc = fold(ti, &mut frame, line, Assoc::Add, &terms)?;
            ti.copy(line, out.first + i, acc)?;
        }

        LocalFrame::exit(ti, outputs);
        Ok(())
    }
}

/// `indicator[j] = 1` iff `selector == j`, via Fermat's Little Theorem.
/// Valid only when `modulus` is prime, i.e. the bound type is a declared
/// `Field` rather than a `Ring`.
fn flt_indicators(
    ti: &mut dyn TypeInterpreter,
    frame: &mut LocalFrame,
    line: usize,
    modulus: FieldValue,
    selector: sieve_ir::WireIdx,
    cases: usize,
) -> Result<Vec<sieve_ir::WireIdx>, InterpreterError> {
    (0..cases as u128)
        .map(|j| flt_eq_indicator(ti, frame, line, modulus, selector, j))
        .collect()
}

/// `indicator[j] = 1` iff the big-endian selector bits spell out `j`,
/// for a boolean (GF(2)) selector bundle: product of each bit or its
/// complement, matching the requested index's binary expansion.
fn treed_boolean_indicators(
    ti: &mut dyn TypeInterpreter,
    frame: &mut LocalFrame,
    line: usize,
    selector: WireRange,
    cases: usize,
) -> Result<Vec<sieve_ir::WireIdx>, InterpreterError> {
    let bits = selector.len() as usize;
    let mut out = Vec::with_capacity(cases);
    for j in 0..cases {
        let mut factors = Vec::with_capacity(bits);
        for (b, bit_wire) in (0..bits).rev().zip(selector.first..=selector.last) {
            let want_one = (j >> b) & 1 == 1;
            factors.push(if want_one {
                bit_wire
            } else {
                let notted = frame.fresh();
                ti.addc_gate(line, notted, bit_wire, 1)?;
                notted
            });
        }
        out.push(fold(ti, frame, line, Assoc::Mul, &factors)?);
    }
    Ok(out)
}
