//! `ram` plugin: functional random-access memory over a wire range
//! (spec.md §4.J), grounded on `wtk::firealarm::RAM`'s
//! `RAMInitOperation`/`RAMReadOperation`/`RAMWriteOperation`. Unlike the
//! original's mutable `RAMBuffer`, memory here is represented purely by
//! wires: `init` produces the initial cell range, `write` produces a
//! *new* cell range with one cell replaced (the usual SSA-circuit
//! encoding of mutable memory), and `read` selects one cell out of a
//! range — so the plugin itself stays as stateless as every other
//! `SimpleOperation` here, with no persistent object of its own.
//!
//! `init`'s declared output length fixes the memory's size; `read`/
//! `write` take that same range as an input and select by an index wire
//! via a Fermat's Little Theorem equality indicator per cell (valid for
//! a prime-modulus `Field` type; see `sieve_ir::TypeSpec::Field`). A
//! single generic implementation serves both the arithmetic and the
//! bit-bundled boolean representation the original splits into separate
//! `RAMPlugin`/`BoolRAMPlugin` types — here the difference is entirely
//! which type the binding names (a GF(2) field for the bit-bundled
//! form), not a second algorithm.

use sieve_ir::{FieldValue, FunctionSignature, PluginBinding, TypeIndex, WireRange};
use sieve_interpreter::{InterpreterError, TypeInterpreter};
use sieve_plugin::{SimpleOperation, SimplePlugin, TypeInterpreterHost};

use crate::support::{Assoc, LocalFrame, fold, flt_eq_indicator, select};

pub fn plugin() -> SimplePlugin {
    SimplePlugin::new("ram")
        .with_operation("init", Init)
        .with_operation("read", Read)
        .with_operation("write", Write)
}

struct Init;

impl SimpleOperation for Init {
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
            && signature.inputs.len() == 1
            && signature.inputs[0].length == 1)
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
        let ti = host.type_interpreter(bound_type);
        let (_frame, local_outputs, local_inputs) = LocalFrame::enter(ti, line, outputs, inputs)?;
        let fill = local_inputs[0].first;
        let out = local_outputs[0];
        for i in 0..out.len() {
            ti.copy(line, out.first + i, fill)?;
        }
        LocalFrame::exit(ti, outputs);
        Ok(())
    }
}

struct Read;

impl SimpleOperation for Read {
    fn check_signature(
        &self,
        _type_index: TypeIndex,
        max_value: Option<FieldValue>,
        signature: &FunctionSignature,
        _binding: &PluginBinding,
    ) -> Result<bool, String> {
        Ok(max_value.is_some()
            && signature.outputs.len() == 1
            && signature.outputs[0].length == 1
            && signature.inputs.len() == 2
            && signature.inputs[0].length >= 1
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
        let modulus = host
            .max_value(bound_type)
            .ok_or_else(|| InterpreterError::plugin_reject(line, "ram: type has no numeric domain"))?
            + 1;
        let ti = host.type_interpreter(bound_type);
        let (mut frame, local_outputs, local_inputs) = LocalFrame::enter(ti, line, outputs, inputs)?;
        let cells = local_inputs[0];
        let idx = local_inputs[1].first;

        let mut terms = Vec::with_capacity(cells.len() as usize);
        for i in 0..cells.len() {
            let indicator = flt_eq_indicator(ti, &mut frame, line, modulus, idx, i as u128)?;
            let t = frame.fresh();
            ti.mul_gate(line, t, indicator, cells.first + i)?;
            terms.push(t);
        }
        let selected = fold(ti, &mut frame, line, Assoc::Add, &terms)?;
        ti.copy(line, local_outputs[0].first, selected)?;
        LocalFrame::exit(ti, outputs);
        Ok(())
    }
}

struct Write;

impl SimpleOperation for Write {
    fn check_signature(
        &self,
        _type_index: TypeIndex,
        max_value: Option<FieldValue>,
        signature: &FunctionSignature,
        _binding: &PluginBinding,
    ) -> Result<bool, String> {
        Ok(max_value.is_some()
            && signature.outputs.len() == 1
            && signature.inputs.len() == 3
            && signature.inputs[0].length >= 1
            && signature.outputs[0].length == signature.inputs[0].length
            && signature.inputs[1].length == 1
            && signature.inputs[2].length == 1)
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
            .ok_or_else(|| InterpreterError::plugin_reject(line, "ram: type has no numeric domain"))?
            + 1;
        let ti = host.type_interpreter(bound_type);
        let (mut frame, local_outputs, local_inputs) = LocalFrame::enter(ti, line, outputs, inputs)?;
        let cells = local_inputs[0];
        let idx = local_inputs[1].first;
        let value = local_inputs[2].first;
        let out = local_outputs[0];

        for i in 0..cells.len() {
            let indicator = flt_eq_indicator(ti, &mut frame, line, modulus, idx, i as u128)?;
            let new_cell = select(ti, &mut frame, line, modulus, indicator, cells.first + i, value)?;
            ti.copy(line, out.first + i, new_cell)?;
        }
        LocalFrame::exit(ti, outputs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sieve_ir::ParamSpec;

    #[test]
    fn init_requires_single_fill_input() {
        let mut sig = FunctionSignature::new("init");
        sig.outputs.push(ParamSpec::new(TypeIndex(0), 4));
        sig.inputs.push(ParamSpec::new(TypeIndex(0), 2));
        let op = Init;
        assert!(
            !op.check_signature(TypeIndex(0), Some(6), &sig, &PluginBinding::new("ram", "init"))
                .unwrap()
        );
    }

    #[test]
    fn write_requires_matching_output_length() {
        let mut sig = FunctionSignature::new("write");
        sig.outputs.push(ParamSpec::new(TypeIndex(0), 3));
        sig.inputs.push(ParamSpec::new(TypeIndex(0), 4));
        sig.inputs.push(ParamSpec::new(TypeIndex(0), 1));
        sig.inputs.push(ParamSpec::new(TypeIndex(0), 1));
        let op = Write;
        assert!(
            !op.check_signature(TypeIndex(0), Some(6), &sig, &PluginBinding::new("ram", "write"))
                .unwrap()
        );
    }

    #[test]
    fn read_accepts_well_shaped_signature() {
        let mut sig = FunctionSignature::new("read");
        sig.outputs.push(ParamSpec::new(TypeIndex(0), 1));
        sig.inputs.push(ParamSpec::new(TypeIndex(0), 8));
        sig.inputs.push(ParamSpec::new(TypeIndex(0), 1));
        let op = Read;
        assert!(
            op.check_signature(TypeIndex(0), Some(6), &sig, &PluginBinding::new("ram", "read"))
                .unwrap()
        );
    }
}
