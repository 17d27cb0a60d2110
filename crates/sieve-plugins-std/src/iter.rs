//! `iter` plugin: applies a named function once per parallel chunk of
//! the call's output/input ranges (spec.md §4.J), grounded on
//! `wtk::nails::IterPlugin`'s `MapOperation`, which recurses back into
//! the owning interpreter rather than the plugin framework itself —
//! here, [`sieve_plugin::TypeInterpreterHost::invoke`].
//!
//! Unlike the other standard plugins, `map` is not built on
//! [`SimplePlugin`]: the per-call function name and iteration count are
//! binding parameters fixed at declaration time, so they're baked into
//! a dedicated [`Operation`] at `create` rather than re-read on every
//! call (spec.md's "operation reuse" convention — see `sieve-function`'s
//! `declare_plugin_function`).

use sieve_ir::{FieldValue, FunctionSignature, ParameterValue, PluginBinding, TypeIndex, WireRange};
use sieve_interpreter::InterpreterError;
use sieve_plugin::{Operation, Plugin, TypeInterpreterHost};

pub struct IterPlugin;

impl Plugin for IterPlugin {
    fn name(&self) -> &str {
        "iter"
    }

    fn create(
        &self,
        _type_index: TypeIndex,
        _max_value: Option<FieldValue>,
        signature: &FunctionSignature,
        binding: &PluginBinding,
    ) -> Result<Option<Box<dyn Operation>>, String> {
        if binding.operation != "map" {
            return Ok(None);
        }
        let Some(ParameterValue::Text(function)) = binding.parameters.first() else {
            return Err("iter::map requires a text function-name parameter".to_string());
        };
        let Some(ParameterValue::Number(iterations)) = binding.parameters.get(1) else {
            return Err("iter::map requires a numeric iteration-count parameter".to_string());
        };
        let iterations = *iterations;
        if iterations == 0 {
            return Err("iter::map: iteration count must be positive".to_string());
        }
        for param in signature.outputs.iter().chain(signature.inputs.iter()) {
            if param.length % iterations != 0 {
                return Err(
                    "iter::map: every parameter length must be a multiple of the iteration count"
                        .to_string(),
                );
            }
        }
        Ok(Some(Box::new(MapOperation {
            function: function.clone(),
            iterations,
        })))
    }
}

struct MapOperation {
    function: String,
    iterations: u128,
}

impl Operation for MapOperation {
    fn evaluate(
        &self,
        host: &mut dyn TypeInterpreterHost,
        signature: &FunctionSignature,
        _bound_type: TypeIndex,
        line: usize,
        outputs: &[WireRange],
        inputs: &[WireRange],
    ) -> Result<(), InterpreterError> {
        let out_chunks: Vec<u64> = signature
            .outputs
            .iter()
            .map(|p| p.length / self.iterations as u64)
            .collect();
        let in_chunks: Vec<u64> = signature
            .inputs
            .iter()
            .map(|p| p.length / self.iterations as u64)
            .collect();

        for t in 0..self.iterations as u64 {
            let iter_outputs: Vec<WireRange> = outputs
                .iter()
                .zip(&out_chunks)
                .map(|(range, &len)| {
                    let first = range.first + t * len;
                    WireRange::new(first, first + len - 1)
                })
                .collect();
            let iter_inputs: Vec<WireRange> = inputs
                .iter()
                .zip(&in_chunks)
                .map(|(range, &len)| {
                    let first = range.first + t * len;
                    WireRange::new(first, first + len - 1)
                })
                .collect();
            host.invoke(line, &self.function, &iter_outputs, &iter_inputs)?;
        }
        Ok(())
    }
}
