//! [`CircuitHandler`]: the callback-driven state machine an upstream
//! parser drives one directive at a time (spec.md §6.1), grounded on
//! `wtk::circuit::Handler`'s documented calling-order contract and
//! `wtk::nails::Handler`'s concrete dispatch of that contract onto an
//! interpreter/function-factory/plugin-registry triple.
//!
//! A parser calls `start_function` exactly once per function signature
//! encountered, always before anything else about that function:
//! `regular_function()` then gate/stream/range/convert/invoke callbacks
//! until `end_function()`, *or* `plugin_function(binding)` exactly once
//! with neither of those ever called for that function. Everything
//! outside a pending or in-progress function declaration dispatches
//! straight through to the held [`Interpreter`].

use sieve_function::{Directive, Interpreter};
use sieve_interpreter::InterpreterError;
use sieve_ir::{ConversionSpec, FieldValue, FunctionSignature, PluginBinding, TypeIndex, WireIdx, WireRange};

/// What the handler is doing between directives.
enum State {
    /// Dispatching directly against `interpreter`.
    TopLevel,
    /// `start_function` has been seen; waiting on `regular_function()`
    /// or `plugin_function(..)` to say which kind this one is.
    Pending(FunctionSignature),
    /// Inside a regular function's body: gate/stream/range/convert/
    /// invoke callbacks are buffered rather than dispatched, replayed
    /// later at every `invoke` (spec.md §4.F).
    InFunction {
        signature: FunctionSignature,
        body: Vec<Directive>,
    },
}

/// Drives a [`sieve_function::Interpreter`] from an upstream parser's
/// one-callback-per-directive stream (spec.md §6.1), buffering a
/// regular function's body until `end_function` and otherwise
/// dispatching every callback immediately.
///
/// Construct with an `Interpreter` that already has its types declared
/// and plugins registered (spec.md §4.A, §4.J) — relation-header
/// parsing is out of this crate's scope (spec.md Non-goals).
pub struct CircuitHandler {
    interpreter: Interpreter,
    state: State,
}

impl CircuitHandler {
    pub fn new(interpreter: Interpreter) -> Self {
        Self {
            interpreter,
            state: State::TopLevel,
        }
    }

    /// Read-only access, e.g. to call `plugins_mut`/`converters_mut`
    /// before the first directive arrives.
    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Recovers the held interpreter once the callback stream has
    /// ended, so its overall status can be read via
    /// [`Interpreter::check`].
    pub fn into_interpreter(self) -> Interpreter {
        self.interpreter
    }

    /// Whether the callback stream ended with every function
    /// declaration closed (spec.md §4.H terminal state: no
    /// `startFunction` left dangling without a matching
    /// `regularFunction`/`pluginFunction` and, for the former, an
    /// `endFunction`).
    pub fn finished(&self) -> bool {
        matches!(self.state, State::TopLevel)
    }

    fn not_pending(&self, line: usize, what: &str) -> InterpreterError {
        InterpreterError::bad_relation(line, format!("{what} callback received outside a pending function declaration"))
    }

    fn mid_declaration(&self, line: usize, what: &str) -> InterpreterError {
        InterpreterError::bad_relation(
            line,
            format!("{what} callback received while a function signature is pending regularFunction/pluginFunction"),
        )
    }

    // -- Gate/stream/range/convert/invoke callbacks: dispatch at
    // top level, buffer while a regular function body is open --

    pub fn add_gate(
        &mut self,
        line: usize,
        ty: TypeIndex,
        out: WireIdx,
        left: WireIdx,
        right: WireIdx,
    ) -> Result<(), InterpreterError> {
        match &mut self.state {
            State::TopLevel => self.interpreter.add_gate(line, ty, out, left, right),
            State::InFunction { body, .. } => {
                body.push(Directive::AddGate { line, ty, out, left, right });
                Ok(())
            }
            State::Pending(_) => Err(self.mid_declaration(line, "addGate")),
        }
    }

    pub fn mul_gate(
        &mut self,
        line: usize,
        ty: TypeIndex,
        out: WireIdx,
        left: WireIdx,
        right: WireIdx,
    ) -> Result<(), InterpreterError> {
        match &mut self.state {
            State::TopLevel => self.interpreter.mul_gate(line, ty, out, left, right),
            State::InFunction { body, .. } => {
                body.push(Directive::MulGate { line, ty, out, left, right });
                Ok(())
            }
            State::Pending(_) => Err(self.mid_declaration(line, "mulGate")),
        }
    }

    pub fn addc_gate(
        &mut self,
        line: usize,
        ty: TypeIndex,
        out: WireIdx,
        left: WireIdx,
        constant: FieldValue,
    ) -> Result<(), InterpreterError> {
        match &mut self.state {
            State::TopLevel => self.interpreter.addc_gate(line, ty, out, left, constant),
            State::InFunction { body, .. } => {
                body.push(Directive::AddcGate { line, ty, out, left, constant });
                Ok(())
            }
            State::Pending(_) => Err(self.mid_declaration(line, "addcGate")),
        }
    }

    pub fn mulc_gate(
        &mut self,
        line: usize,
        ty: TypeIndex,
        out: WireIdx,
        left: WireIdx,
        constant: FieldValue,
    ) -> Result<(), InterpreterError> {
        match &mut self.state {
            State::TopLevel => self.interpreter.mulc_gate(line, ty, out, left, constant),
            State::InFunction { body, .. } => {
                body.push(Directive::MulcGate { line, ty, out, left, constant });
                Ok(())
            }
            State::Pending(_) => Err(self.mid_declaration(line, "mulcGate")),
        }
    }

    pub fn copy(&mut self, line: usize, ty: TypeIndex, out: WireIdx, left: WireIdx) -> Result<(), InterpreterError> {
        match &mut self.state {
            State::TopLevel => self.interpreter.copy(line, ty, out, left),
            State::InFunction { body, .. } => {
                body.push(Directive::Copy { line, ty, out, left });
                Ok(())
            }
            State::Pending(_) => Err(self.mid_declaration(line, "copy")),
        }
    }

    pub fn copy_multi(
        &mut self,
        line: usize,
        ty: TypeIndex,
        out: WireRange,
        inputs: &[WireRange],
    ) -> Result<(), InterpreterError> {
        match &mut self.state {
            State::TopLevel => self.interpreter.copy_multi(line, ty, out, inputs),
            State::InFunction { body, .. } => {
                body.push(Directive::CopyMulti {
                    line,
                    ty,
                    out,
                    inputs: inputs.iter().copied().collect(),
                });
                Ok(())
            }
            State::Pending(_) => Err(self.mid_declaration(line, "copyMulti")),
        }
    }

    pub fn assign(
        &mut self,
        line: usize,
        ty: TypeIndex,
        out: WireIdx,
        constant: FieldValue,
    ) -> Result<(), InterpreterError> {
        match &mut self.state {
            State::TopLevel => self.interpreter.assign(line, ty, out, constant),
            State::InFunction { body, .. } => {
                body.push(Directive::Assign { line, ty, out, constant });
                Ok(())
            }
            State::Pending(_) => Err(self.mid_declaration(line, "assign")),
        }
    }

    pub fn assert_zero(&mut self, line: usize, ty: TypeIndex, wire: WireIdx) -> Result<(), InterpreterError> {
        match &mut self.state {
            State::TopLevel => self.interpreter.assert_zero(line, ty, wire),
            State::InFunction { body, .. } => {
                body.push(Directive::AssertZero { line, ty, wire });
                Ok(())
            }
            State::Pending(_) => Err(self.mid_declaration(line, "assertZero")),
        }
    }

    pub fn public_in(&mut self, line: usize, ty: TypeIndex, out: WireIdx) -> Result<(), InterpreterError> {
        match &mut self.state {
            State::TopLevel => self.interpreter.public_in(line, ty, out),
            State::InFunction { body, .. } => {
                body.push(Directive::PublicIn { line, ty, out });
                Ok(())
            }
            State::Pending(_) => Err(self.mid_declaration(line, "publicIn")),
        }
    }

    pub fn public_in_multi(&mut self, line: usize, ty: TypeIndex, range: WireRange) -> Result<(), InterpreterError> {
        match &mut self.state {
            State::TopLevel => self.interpreter.public_in_multi(line, ty, range),
            State::InFunction { body, .. } => {
                body.push(Directive::PublicInMulti { line, ty, range });
                Ok(())
            }
            State::Pending(_) => Err(self.mid_declaration(line, "publicInMulti")),
        }
    }

    pub fn private_in(&mut self, line: usize, ty: TypeIndex, out: WireIdx) -> Result<(), InterpreterError> {
        match &mut self.state {
            State::TopLevel => self.interpreter.private_in(line, ty, out),
            State::InFunction { body, .. } => {
                body.push(Directive::PrivateIn { line, ty, out });
                Ok(())
            }
            State::Pending(_) => Err(self.mid_declaration(line, "privateIn")),
        }
    }

    pub fn private_in_multi(&mut self, line: usize, ty: TypeIndex, range: WireRange) -> Result<(), InterpreterError> {
        match &mut self.state {
            State::TopLevel => self.interpreter.private_in_multi(line, ty, range),
            State::InFunction { body, .. } => {
                body.push(Directive::PrivateInMulti { line, ty, range });
                Ok(())
            }
            State::Pending(_) => Err(self.mid_declaration(line, "privateInMulti")),
        }
    }

    pub fn new_range(
        &mut self,
        line: usize,
        ty: TypeIndex,
        first: WireIdx,
        last: WireIdx,
    ) -> Result<(), InterpreterError> {
        match &mut self.state {
            State::TopLevel => self.interpreter.new_range(line, ty, first, last),
            State::InFunction { body, .. } => {
                body.push(Directive::NewRange { line, ty, first, last });
                Ok(())
            }
            State::Pending(_) => Err(self.mid_declaration(line, "newRange")),
        }
    }

    pub fn delete_range(
        &mut self,
        line: usize,
        ty: TypeIndex,
        first: WireIdx,
        last: WireIdx,
    ) -> Result<(), InterpreterError> {
        match &mut self.state {
            State::TopLevel => self.interpreter.delete_range(line, ty, first, last),
            State::InFunction { body, .. } => {
                body.push(Directive::DeleteRange { line, ty, first, last });
                Ok(())
            }
            State::Pending(_) => Err(self.mid_declaration(line, "deleteRange")),
        }
    }

    pub fn convert(
        &mut self,
        line: usize,
        spec: ConversionSpec,
        out_range: WireRange,
        in_range: WireRange,
        modulus: bool,
    ) -> Result<(), InterpreterError> {
        match &mut self.state {
            State::TopLevel => self.interpreter.convert(line, spec, out_range, in_range, modulus),
            State::InFunction { body, .. } => {
                body.push(Directive::Convert {
                    line,
                    spec,
                    out_range,
                    in_range,
                    modulus,
                });
                Ok(())
            }
            State::Pending(_) => Err(self.mid_declaration(line, "convert")),
        }
    }

    pub fn invoke(
        &mut self,
        line: usize,
        name: &str,
        outputs: &[WireRange],
        inputs: &[WireRange],
    ) -> Result<(), InterpreterError> {
        match &mut self.state {
            State::TopLevel => self.interpreter.invoke(line, name, outputs, inputs),
            State::InFunction { body, .. } => {
                body.push(Directive::Invoke {
                    line,
                    name: name.to_string(),
                    outputs: outputs.iter().copied().collect(),
                    inputs: inputs.iter().copied().collect(),
                });
                Ok(())
            }
            State::Pending(_) => Err(self.mid_declaration(line, "invoke")),
        }
    }

    // -- Function-declaration callbacks --

    /// Always the first callback for a not-yet-declared function;
    /// `regular_function`/`plugin_function` says which kind follows.
    pub fn start_function(&mut self, signature: FunctionSignature) -> Result<(), InterpreterError> {
        match self.state {
            State::TopLevel => {
                self.state = State::Pending(signature);
                Ok(())
            }
            _ => Err(InterpreterError::bad_relation(
                signature.line,
                "startFunction callback received while another function declaration is already open",
            )),
        }
    }

    /// Opens the buffered body that `end_function` will later declare.
    pub fn regular_function(&mut self, line: usize) -> Result<(), InterpreterError> {
        match std::mem::replace(&mut self.state, State::TopLevel) {
            State::Pending(signature) => {
                self.state = State::InFunction { signature, body: Vec::new() };
                Ok(())
            }
            other => {
                self.state = other;
                Err(self.not_pending(line, "regularFunction"))
            }
        }
    }

    /// Declares the buffered body against the held interpreter and
    /// returns to top level.
    pub fn end_function(&mut self, line: usize) -> Result<(), InterpreterError> {
        match std::mem::replace(&mut self.state, State::TopLevel) {
            State::InFunction { signature, body } => self.interpreter.declare_regular_function(signature, body),
            other => {
                self.state = other;
                Err(InterpreterError::bad_relation(
                    line,
                    "endFunction callback received outside an open regular function body",
                ))
            }
        }
    }

    /// Declares a plugin-backed function directly; unlike
    /// `regular_function`, this never visits `InFunction` and no
    /// `end_function` follows it.
    pub fn plugin_function(&mut self, line: usize, binding: PluginBinding) -> Result<(), InterpreterError> {
        match std::mem::replace(&mut self.state, State::TopLevel) {
            State::Pending(signature) => self.interpreter.declare_plugin_function(signature, binding),
            other => {
                self.state = other;
                Err(self.not_pending(line, "pluginFunction"))
            }
        }
    }
}
