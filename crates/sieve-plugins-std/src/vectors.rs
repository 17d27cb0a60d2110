//! `vectors` plugin: element-wise pairwise gates and whole-vector folds
//! (spec.md §4.J), grounded on `wtk::plugins::Vectors` — `PairwiseOperation`
//! for `add`/`mul`, `UniFoldOperation` for `sum`/`product`, and
//! `BiFoldOperation` for `dot_product`.

use sieve_ir::{FieldValue, FunctionSignature, PluginBinding, TypeIndex, WireRange};
use sieve_interpreter::{InterpreterError, TypeInterpreter};
use sieve_plugin::{SimpleOperation, SimplePlugin, TypeInterpreterHost};

use crate::support::{Assoc, LocalFrame, fold};

pub fn plugin() -> SimplePlugin {
    SimplePlugin::new("vectors")
        .with_operation("add", Pairwise::Add)
        .with_operation("mul", Pairwise::Mul)
        .with_operation("sum", Fold::Sum)
        .with_operation("product", Fold::Product)
        .with_operation("dot_product", DotProduct)
}

/// `out[i] = left[i] <op> right[i]` for `i` in `0..n`. No scratch wires
/// needed: every gate writes directly into the caller's own output
/// range.
enum Pairwise {
    Add,
    Mul,
}

impl SimpleOperation for Pairwise {
    fn check_signature(
        &self,
        _type_index: TypeIndex,
        _max_value: Option<FieldValue>,
        signature: &FunctionSignature,
        _binding: &PluginBinding,
    ) -> Result<bool, String> {
        Ok(signature.outputs.len() == 1
            && signature.inputs.len() == 2
            && signature.outputs[0].length > 0
            && signature.outputs[0].length == signature.inputs[0].length
            && signature.outputs[0].length == signature.inputs[1].length)
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
        let out = outputs[0];
        let (left, right) = (inputs[0], inputs[1]);
        for i in 0..out.len() {
            let o = out.first + i;
            let l = left.first + i;
            let r = right.first + i;
            match self {
                Pairwise::Add => ti.add_gate(line, o, l, r)?,
                Pairwise::Mul => ti.mul_gate(line, o, l, r)?,
            }
        }
        Ok(())
    }
}

/// `out = in[0] <op> in[1] <op> ... <op> in[n-1]`.
enum Fold {
    Sum,
    Product,
}

impl SimpleOperation for Fold {
    fn check_signature(
        &self,
        _type_index: TypeIndex,
        _max_value: Option<FieldValue>,
        signature: &FunctionSignature,
        _binding: &PluginBinding,
    ) -> Result<bool, String> {
        Ok(signature.outputs.len() == 1
            && signature.outputs[0].length == 1
            && signature.inputs.len() == 1
            && signature.inputs[0].length >= 1)
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
        let (mut frame, local_outputs, local_inputs) = LocalFrame::enter(ti, line, outputs, inputs)?;
        let values: Vec<_> = (local_inputs[0].first..=local_inputs[0].last).collect();
        let op = match self {
            Fold::Sum => Assoc::Add,
            Fold::Product => Assoc::Mul,
        };
        let acc = fold(ti, &mut frame, line, op, &values)?;
        ti.copy(line, local_outputs[0].first, acc)?;
        LocalFrame::exit(ti, outputs);
        Ok(())
    }
}

/// `out = sum_i(left[i] * right[i])`.
struct DotProduct;

impl SimpleOperation for DotProduct {
    fn check_signature(
        &self,
        _type_index: TypeIndex,
        _max_value: Option<FieldValue>,
        signature: &FunctionSignature,
        _binding: &PluginBinding,
    ) -> Result<bool, String> {
        Ok(signature.outputs.len() == 1
            && signature.outputs[0].length == 1
            && signature.inputs.len() == 2
            && signature.inputs[0].length >= 1
            && signature.inputs[0].length == signature.inputs[1].length)
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
        let (mut frame, local_outputs, local_inputs) = LocalFrame::enter(ti, line, outputs, inputs)?;
        let (left, right) = (local_inputs[0], local_inputs[1]);
        let mut products = Vec::with_capacity(left.len() as usize);
        for i in 0..left.len() {
            let p = frame.fresh();
            ti.mul_gate(line, p, left.first + i, right.first + i)?;
            products.push(p);
        }
        let acc = fold(ti, &mut frame, line, Assoc::Add, &products)?;
        ti.copy(line, local_outputs[0].first, acc)?;
        LocalFrame::exit(ti, outputs);
        Ok(())
    }
}
