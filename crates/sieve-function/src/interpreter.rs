//! The top-level dispatcher (spec.md §4.G): owns every declared type's
//! [`TypeInterpreter`], the [`ConverterRegistry`], the [`FunctionCatalog`],
//! and the [`PluginsManager`], and forwards every upstream callback to
//! the right one under a single sticky-failure flag (spec.md §7).
//!
//! Lives here rather than in `sieve-interpreter` so the function catalog
//! (which must consult the plugin registry to build a plugin function at
//! declaration time) and this dispatcher can share one crate without
//! `sieve-interpreter` needing to depend on either `sieve-function` or
//! `sieve-plugin` (spec.md §9's cyclic-reference note).

use std::rc::Rc;

use sieve_arena::Run;
use sieve_ir::{ConversionSpec, FieldValue, FunctionSignature, PluginBinding, TypeIndex, WireIdx, WireRange};
use sieve_interpreter::{ConverterRegistry, InterpreterError, TypeInterpreter};
use sieve_plugin::{Operation, PluginsManager, TypeInterpreterHost};

use crate::catalog::FunctionCatalog;
use crate::directive::Directive;
use crate::function::Function;

/// Owns the whole interpreter state for one circuit relation.
pub struct Interpreter {
    type_interpreters: Vec<Box<dyn TypeInterpreter>>,
    converters: ConverterRegistry,
    functions: FunctionCatalog,
    plugins: PluginsManager,
    /// First error raised, if any; every dispatch entry point tests this
    /// on entry and short-circuits (spec.md §7 propagation policy).
    sticky: Option<InterpreterError>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            type_interpreters: Vec::new(),
            converters: ConverterRegistry::new(),
            functions: FunctionCatalog::new(),
            plugins: PluginsManager::new(),
            sticky: None,
        }
    }

    /// Declares the next type index in order; type indices are assigned
    /// by declaration order and are dense and immutable (spec.md §3).
    pub fn declare_type(&mut self, type_interpreter: Box<dyn TypeInterpreter>) -> TypeIndex {
        let idx = TypeIndex(self.type_interpreters.len() as u8);
        debug_assert_eq!(idx, type_interpreter.type_index(), "declared out of order");
        self.type_interpreters.push(type_interpreter);
        idx
    }

    pub fn converters_mut(&mut self) -> &mut ConverterRegistry {
        &mut self.converters
    }

    pub fn plugins_mut(&mut self) -> &mut PluginsManager {
        &mut self.plugins
    }

    pub fn is_failed(&self) -> bool {
        self.sticky.is_some()
    }

    pub fn declare_regular_function(
        &mut self,
        signature: FunctionSignature,
        body: Vec<Directive>,
    ) -> Result<(), InterpreterError> {
        let line = signature.line;
        self.functions
            .declare(Function::Regular {
                signature,
                body: Rc::from(body),
            })
            .map_err(|detail| InterpreterError::bad_relation(line, detail))
    }

    /// Resolves a plugin binding against the declared plugin registry and
    /// creates its `Operation` once, reused for every later `invoke`
    /// (spec.md §9 "Plugin/operation reuse across signatures").
    pub fn declare_plugin_function(
        &mut self,
        signature: FunctionSignature,
        binding: PluginBinding,
    ) -> Result<(), InterpreterError> {
        let line = signature.line;
        let type_interpreters = &self.type_interpreters;
        let (bound_type, operation) = self
            .plugins
            .create_operation(&signature, &binding, |ty| {
                type_interpreters.get(ty.index()).and_then(|t| t.max_value())
            })
            .map_err(|detail| InterpreterError::plugin_reject(line, detail))?;
        self.functions
            .declare(Function::Plugin {
                signature,
                binding,
                bound_type,
                operation: Rc::from(operation),
            })
            .map_err(|detail| InterpreterError::bad_relation(line, detail))
    }

    fn check_sticky(&self) -> Result<(), InterpreterError> {
        match &self.sticky {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn record<T>(&mut self, result: Result<T, InterpreterError>) -> Result<T, InterpreterError> {
        if let Err(err) = &result {
            if self.sticky.is_none() {
                self.sticky = Some(err.clone());
            }
        }
        result
    }

    fn type_mut(&mut self, line: usize, ty: TypeIndex) -> Result<&mut dyn TypeInterpreter, InterpreterError> {
        self.type_interpreters
            .get_mut(ty.index())
            .map(|boxed| boxed.as_mut())
            .ok_or_else(|| InterpreterError::bad_relation(line, format!("unknown type index {}", ty.0)))
    }

    // -- Gate-level dispatch (spec.md §6.1), guarded by the sticky flag --

    pub fn add_gate(
        &mut self,
        line: usize,
        ty: TypeIndex,
        out: WireIdx,
        left: WireIdx,
        right: WireIdx,
    ) -> Result<(), InterpreterError> {
        self.check_sticky()?;
        let result = self.type_mut(line, ty).and_then(|t| t.add_gate(line, out, left, right));
        self.record(result)
    }

    pub fn mul_gate(
        &mut self,
        line: usize,
        ty: TypeIndex,
        out: WireIdx,
        left: WireIdx,
        right: WireIdx,
    ) -> Result<(), InterpreterError> {
        self.check_sticky()?;
        let result = self.type_mut(line, ty).and_then(|t| t.mul_gate(line, out, left, right));
        self.record(result)
    }

    pub fn addc_gate(
        &mut self,
        line: usize,
        ty: TypeIndex,
        out: WireIdx,
        left: WireIdx,
        constant: FieldValue,
    ) -> Result<(), InterpreterError> {
        self.check_sticky()?;
        let result = self
            .type_mut(line, ty)
            .and_then(|t| t.addc_gate(line, out, left, constant));
        self.record(result)
    }

    pub fn mulc_gate(
        &mut self,
        line: usize,
        ty: TypeIndex,
        out: WireIdx,
        left: WireIdx,
        constant: FieldValue,
    ) -> Result<(), InterpreterError> {
        self.check_sticky()?;
        let result = self
            .type_mut(line, ty)
            .and_then(|t| t.mulc_gate(line, out, left, constant));
        self.record(result)
    }

    pub fn copy(&mut self, line: usize, ty: TypeIndex, out: WireIdx, left: WireIdx) -> Result<(), InterpreterError> {
        self.check_sticky()?;
        let result = self.type_mut(line, ty).and_then(|t| t.copy(line, out, left));
        self.record(result)
    }

    pub fn copy_multi(
        &mut self,
        line: usize,
        ty: TypeIndex,
        out: WireRange,
        inputs: &[WireRange],
    ) -> Result<(), InterpreterError> {
        self.check_sticky()?;
        let result = self.type_mut(line, ty).and_then(|t| t.copy_multi(line, out, inputs));
        self.record(result)
    }

    pub fn assign(
        &mut self,
        line: usize,
        ty: TypeIndex,
        out: WireIdx,
        constant: FieldValue,
    ) -> Result<(), InterpreterError> {
        self.check_sticky()?;
        let result = self.type_mut(line, ty).and_then(|t| t.assign(line, out, constant));
        self.record(result)
    }

    pub fn assert_zero(&mut self, line: usize, ty: TypeIndex, wire: WireIdx) -> Result<(), InterpreterError> {
        self.check_sticky()?;
        let result = self.type_mut(line, ty).and_then(|t| t.assert_zero(line, wire));
        self.record(result)
    }

    pub fn public_in(&mut self, line: usize, ty: TypeIndex, out: WireIdx) -> Result<(), InterpreterError> {
        self.check_sticky()?;
        let result = self.type_mut(line, ty).and_then(|t| t.public_in(line, out));
        self.record(result)
    }

    pub fn public_in_multi(&mut self, line: usize, ty: TypeIndex, range: WireRange) -> Result<(), InterpreterError> {
        self.check_sticky()?;
        let result = self.type_mut(line, ty).and_then(|t| t.public_in_multi(line, range));
        self.record(result)
    }

    pub fn private_in(&mut self, line: usize, ty: TypeIndex, out: WireIdx) -> Result<(), InterpreterError> {
        self.check_sticky()?;
        let result = self.type_mut(line, ty).and_then(|t| t.private_in(line, out));
        self.record(result)
    }

    pub fn private_in_multi(&mut self, line: usize, ty: TypeIndex, range: WireRange) -> Result<(), InterpreterError> {
        self.check_sticky()?;
        let result = self.type_mut(line, ty).and_then(|t| t.private_in_multi(line, range));
        self.record(result)
    }

    pub fn new_range(
        &mut self,
        line: usize,
        ty: TypeIndex,
        first: WireIdx,
        last: WireIdx,
    ) -> Result<(), InterpreterError> {
        self.check_sticky()?;
        let result = self.type_mut(line, ty).and_then(|t| t.new_range(line, first, last));
        self.record(result)
    }

    pub fn delete_range(
        &mut self,
        line: usize,
        ty: TypeIndex,
        first: WireIdx,
        last: WireIdx,
    ) -> Result<(), InterpreterError> {
        self.check_sticky()?;
        let result = self.type_mut(line, ty).and_then(|t| t.delete_range(line, first, last));
        self.record(result)
    }

    /// `out_type == in_type` with equal lengths bypasses the converter
    /// registry entirely and is a direct `copy_multi`, since a generic
    /// two-mutable-borrow split can never hand out two live `&mut`
    /// references into the very same `TypeInterpreter` (spec.md §8
    /// property 5, "conversion idempotence").
    pub fn convert(
        &mut self,
        line: usize,
        spec: ConversionSpec,
        out_range: WireRange,
        in_range: WireRange,
        modulus: bool,
    ) -> Result<(), InterpreterError> {
        self.check_sticky()?;
        let result = self.convert_inner(line, spec, out_range, in_range, modulus);
        self.record(result)
    }

    fn convert_inner(
        &mut self,
        line: usize,
        spec: ConversionSpec,
        out_range: WireRange,
        in_range: WireRange,
        modulus: bool,
    ) -> Result<(), InterpreterError> {
        if spec.out_type == spec.in_type && spec.out_len == spec.in_len {
            let _ = modulus;
            return self.type_mut(line, spec.out_type)?.copy_multi(line, out_range, &[in_range]);
        }

        let (out_idx, in_idx) = (spec.out_type.index(), spec.in_type.index());
        let (out, input) = two_mut(&mut self.type_interpreters, out_idx, in_idx)
            .ok_or_else(|| InterpreterError::bad_relation(line, "unknown type index in conversion"))?;
        self.converters
            .convert(line, spec, out.as_mut(), input.as_mut(), out_range, in_range, modulus)
    }

    pub fn invoke(
        &mut self,
        line: usize,
        name: &str,
        outputs: &[WireRange],
        inputs: &[WireRange],
    ) -> Result<(), InterpreterError> {
        self.check_sticky()?;
        let result = self.invoke_inner(line, name, outputs, inputs);
        self.record(result)
    }

    fn invoke_inner(
        &mut self,
        line: usize,
        name: &str,
        outputs: &[WireRange],
        inputs: &[WireRange],
    ) -> Result<(), InterpreterError> {
        let function = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| InterpreterError::bad_relation(line, format!("call to undeclared function `{name}`")))?;

        let output_lens: Vec<u64> = outputs.iter().map(WireRange::len).collect();
        let input_lens: Vec<u64> = inputs.iter().map(WireRange::len).collect();
        if !function.signature().matches_arity(&output_lens, &input_lens) {
            return Err(InterpreterError::bad_relation(
                line,
                format!("call to `{name}`: arity does not match declared signature"),
            ));
        }

        match function {
            Function::Regular { signature, body } => self.invoke_regular(line, &signature, &body, outputs, inputs),
            Function::Plugin {
                signature,
                binding,
                bound_type,
                operation,
            } => self.invoke_plugin(line, &signature, &binding, bound_type, &operation, outputs, inputs),
        }
    }

    /// Replay-based invocation (spec.md §4.F steps 2-3-5): push a Scope
    /// per touched type, remap outputs then inputs in signature order so
    /// the recorded body's wire indices land where they did when the
    /// function was declared, replay every directive, then always pop —
    /// call balance holds regardless of outcome (spec.md §8 property 3).
    fn invoke_regular(
        &mut self,
        line: usize,
        signature: &FunctionSignature,
        body: &[Directive],
        outputs: &[WireRange],
        inputs: &[WireRange],
    ) -> Result<(), InterpreterError> {
        let mut out_runs: Vec<Run> = Vec::with_capacity(signature.outputs.len());
        for (param, range) in signature.outputs.iter().zip(outputs) {
            out_runs.push(self.type_mut(line, param.ty)?.find_outputs(line, *range)?);
        }
        let mut in_runs: Vec<Run> = Vec::with_capacity(signature.inputs.len());
        for (param, range) in signature.inputs.iter().zip(inputs) {
            in_runs.push(self.type_mut(line, param.ty)?.find_inputs(line, *range)?);
        }

        let mut touched: Vec<TypeIndex> = Vec::new();
        for ty in signature.outputs.iter().map(|p| p.ty).chain(signature.inputs.iter().map(|p| p.ty)) {
            if !touched.contains(&ty) {
                touched.push(ty);
            }
        }

        for &ty in &touched {
            let ti = self.type_mut(line, ty)?;
            ti.push_frame();
            for (param, run) in signature.outputs.iter().zip(out_runs.iter().copied()) {
                if param.ty == ty {
                    ti.map_outputs(run);
                }
            }
            for (param, run) in signature.inputs.iter().zip(in_runs.iter().copied()) {
                if param.ty == ty {
                    ti.map_inputs(run);
                }
            }
        }

        let mut result = Ok(());
        for directive in body {
            result = self.replay(directive);
            if result.is_err() {
                break;
            }
        }

        for &ty in touched.iter().rev() {
            self.type_mut(line, ty)?.pop_frame();
        }

        result?;

        for (param, range) in signature.outputs.iter().zip(outputs) {
            self.type_mut(line, param.ty)?.commit_outputs(*range);
        }
        Ok(())
    }

    /// Replays one recorded directive through the same dispatch entry
    /// points a live parser callback would use, so a nested `invoke`
    /// recurses correctly and a nested error sets the same sticky flag.
    fn replay(&mut self, directive: &Directive) -> Result<(), InterpreterError> {
        match directive.clone() {
            Directive::AddGate { line, ty, out, left, right } => self.add_gate(line, ty, out, left, right),
            Directive::MulGate { line, ty, out, left, right } => self.mul_gate(line, ty, out, left, right),
            Directive::AddcGate { line, ty, out, left, constant } => self.addc_gate(line, ty, out, left, constant),
            Directive::MulcGate { line, ty, out, left, constant } => self.mulc_gate(line, ty, out, left, constant),
            Directive::Copy { line, ty, out, left } => self.copy(line, ty, out, left),
            Directive::CopyMulti { line, ty, out, inputs } => self.copy_multi(line, ty, out, &inputs),
            Directive::Assign { line, ty, out, constant } => self.assign(line, ty, out, constant),
            Directive::AssertZero { line, ty, wire } => self.assert_zero(line, ty, wire),
            Directive::PublicIn { line, ty, out } => self.public_in(line, ty, out),
            Directive::PublicInMulti { line, ty, range } => self.public_in_multi(line, ty, range),
            Directive::PrivateIn { line, ty, out } => self.private_in(line, ty, out),
            Directive::PrivateInMulti { line, ty, range } => self.private_in_multi(line, ty, range),
            Directive::Convert {
                line,
                spec,
                out_range,
                in_range,
                modulus,
            } => self.convert(line, spec, out_range, in_range, modulus),
            Directive::NewRange { line, ty, first, last } => self.new_range(line, ty, first, last),
            Directive::DeleteRange { line, ty, first, last } => self.delete_range(line, ty, first, last),
            Directive::Invoke { line, name, outputs, inputs } => self.invoke(line, &name, &outputs, &inputs),
        }
    }

    /// Plugin-backed invocation (spec.md §4.F, "skip step 3"): no frame
    /// push or remap — the operation runs directly against the caller's
    /// own wire ranges via [`TypeInterpreterHost`], then the declared
    /// stream-consumption counts are checked against what actually ran.
    fn invoke_plugin(
        &mut self,
        line: usize,
        signature: &FunctionSignature,
        binding: &PluginBinding,
        bound_type: TypeIndex,
        operation: &Rc<dyn Operation>,
        outputs: &[WireRange],
        inputs: &[WireRange],
    ) -> Result<(), InterpreterError> {
        let before: Vec<(u64, u64)> = self
            .type_interpreters
            .iter()
            .map(|t| (t.public_consumed(), t.private_consumed()))
            .collect();

        operation.evaluate(self, signature, bound_type, line, outputs, inputs)?;

        for (idx, ti) in self.type_interpreters.iter().enumerate() {
            let expected_pub = binding.public_input_count.get(idx).copied().unwrap_or(0) as u64;
            let expected_prv = binding.private_input_count.get(idx).copied().unwrap_or(0) as u64;
            let consumed_pub = ti.public_consumed() - before[idx].0;
            let consumed_prv = ti.private_consumed() - before[idx].1;
            if consumed_pub != expected_pub || consumed_prv != expected_prv {
                return Err(InterpreterError::bad_relation(
                    line,
                    format!(
                        "plugin `{}` op `{}`: declared input counts do not match consumption for type {idx}",
                        binding.name, binding.operation
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Overall status (spec.md §6.4): no sticky error, every stream
    /// exactly drained, and every backend/converter `check()` passed.
    pub fn check(&mut self) -> bool {
        if self.sticky.is_some() {
            return false;
        }
        let streams_ok = self.type_interpreters.iter().all(|t| t.streams_exhausted());
        let backends_ok = self.type_interpreters.iter_mut().all(|t| t.check());
        for t in self.type_interpreters.iter_mut() {
            t.finish();
        }
        let converters_ok = self.converters.check_all();
        streams_ok && backends_ok && converters_ok
    }
}

impl TypeInterpreterHost for Interpreter {
    fn type_interpreter(&mut self, ty: TypeIndex) -> &mut dyn TypeInterpreter {
        self.type_interpreters[ty.index()].as_mut()
    }

    fn max_value(&self, ty: TypeIndex) -> Option<FieldValue> {
        self.type_interpreters.get(ty.index()).and_then(|t| t.max_value())
    }

    fn invoke(
        &mut self,
        line: usize,
        name: &str,
        outputs: &[WireRange],
        inputs: &[WireRange],
    ) -> Result<(), InterpreterError> {
        self.invoke(line, name, outputs, inputs)
    }
}

/// Borrows two distinct slots of `interpreters` mutably at once, or
/// `None` if the indices coincide or are out of range — the only way to
/// hand a converter two live `&mut dyn TypeInterpreter` references
/// without `unsafe`.
fn two_mut(
    interpreters: &mut [Box<dyn TypeInterpreter>],
    a: usize,
    b: usize,
) -> Option<(&mut Box<dyn TypeInterpreter>, &mut Box<dyn TypeInterpreter>)> {
    if a == b || a >= interpreters.len() || b >= interpreters.len() {
        return None;
    }
    if a < b {
        let (left, right) = interpreters.split_at_mut(b);
        Some((&mut left[a], &mut right[0]))
    } else {
        let (left, right) = interpreters.split_at_mut(a);
        Some((&mut right[0], &mut left[b]))
    }
}
