//! Scoped wire memory, per-type gate dispatch, and cross-type
//! conversion: components C, D, and E of spec.md §4.
//!
//! This crate deliberately stops short of the top-level dispatcher
//! (component G) and the function catalog (component F) — both need to
//! sit one layer up, in `sieve-function`, so that the function catalog
//! (which must consult the plugin registry) and this crate never form a
//! dependency cycle (spec.md §9's cyclic-references note).

mod backend;
mod converter;
mod error;
mod scope;
mod type_interpreter;

pub use backend::{ConvertBackend, EmptyStream, InputStream, TypeBackend, VecStream};
pub use converter::ConverterRegistry;
pub use error::{InterpreterError, ScopeError};
pub use scope::Scope;
pub use type_interpreter::{LeadTypeInterpreter, TypeInterpreter};
