//! Circuit-handler adapter (spec.md component H): turns an upstream
//! parser's one-callback-per-directive stream into calls against a
//! [`sieve_function::Interpreter`], buffering regular function bodies
//! until their closing callback.
//!
//! The concrete ZK backend a caller plugs in is defined upstream of
//! this crate, at the [`sieve_interpreter::TypeBackend`] /
//! [`sieve_interpreter::ConvertBackend`] seam (spec.md §6.2); this
//! crate only drives that seam's owner, it doesn't add to it.

mod circuit_handler;

pub use circuit_handler::CircuitHandler;
pub use sieve_interpreter::{ConvertBackend, EmptyStream, InputStream, TypeBackend, VecStream};
