use std::fmt;

use sieve_ir::TypeIndex;

/// Errors raised while managing a single type's wire memory.
///
/// Mirrors `wtk::nails::ScopeError` exactly; `Success` has no Rust
/// counterpart since it's folded into `Ok(())`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    #[error("wire already exists")]
    AlreadyExists,
    #[error("cannot delete a remapped range")]
    CannotDeleteRemap,
    #[error("range overlaps but does not equal a contiguous allocation boundary")]
    UnmatchedDelete,
    #[error("wire is not assigned")]
    NotAssigned,
    #[error("wire was already deleted")]
    Deleted,
    #[error("range is discontiguous")]
    Discontiguous,
}

/// The sticky error taxonomy of the interpreter as a whole.
///
/// Once raised, the interpreter records the first such error and refuses
/// further gate/conversion/call processing (see
/// [`crate::Interpreter`]'s sticky-failure discipline).
#[derive(Clone, Debug, thiserror::Error)]
pub enum InterpreterError {
    /// A relation-level inconsistency: ill-typed gate, scope violation,
    /// arity mismatch, or any other structural error in the stream of
    /// gates/calls itself.
    #[error("line {line}: bad relation: {detail}")]
    BadRelation { line: usize, detail: String },

    /// The public or private input stream ended before a requested value,
    /// or otherwise misbehaved.
    #[error("line {line}: bad stream: {detail}")]
    BadStream { line: usize, detail: String },

    /// A plugin operation rejected its arguments (bad signature, bad
    /// parameters, unsupported operation name).
    #[error("line {line}: plugin rejected binding: {detail}")]
    PluginReject { line: usize, detail: String },

    /// A backend's `check()` reported failure after the stream ended
    /// (e.g. a failed `assertZero`).
    #[error("type {type_index:?}: backend assertion failed")]
    BackendAssertFailure { type_index: TypeIndex },

    /// A `no_modulus` conversion overflowed its output type's domain.
    #[error("line {line}: conversion overflowed output type's domain")]
    ConversionOverflow { line: usize },

    /// A scope operation failed; carries the line number for reporting.
    #[error("line {line}: {source}")]
    Scope {
        line: usize,
        #[source]
        source: ScopeError,
    },
}

impl InterpreterError {
    pub fn bad_relation(line: usize, detail: impl fmt::Display) -> Self {
        InterpreterError::BadRelation {
            line,
            detail: detail.to_string(),
        }
    }

    pub fn bad_stream(line: usize, detail: impl fmt::Display) -> Self {
        InterpreterError::BadStream {
            line,
            detail: detail.to_string(),
        }
    }

    pub fn plugin_reject(line: usize, detail: impl fmt::Display) -> Self {
        InterpreterError::PluginReject {
            line,
            detail: detail.to_string(),
        }
    }

    pub fn scope(line: usize, source: ScopeError) -> Self {
        InterpreterError::Scope { line, source }
    }
}
