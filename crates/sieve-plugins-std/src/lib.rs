//! Standard library of plugins (component J of spec.md §4): vectors,
//! multiplexer, extended arithmetic, RAM, and iteration-map. Every
//! stateless operation here is a [`sieve_plugin::SimpleOperation`]
//! driven purely by the wires its own call site names; the sole
//! exception, `iter::map`, bakes its binding's function name and
//! iteration count into a dedicated `Operation` at declaration time
//! because [`sieve_plugin::SimpleOperation::evaluate`] never sees the
//! binding again.

mod extended_arithmetic;
mod iter;
mod mux;
mod ram;
mod support;
mod vectors;

use sieve_plugin::PluginsManager;

/// Registers every standard plugin this crate provides into `manager`.
pub fn register_all(manager: &mut PluginsManager) {
    manager.register(Box::new(vectors::plugin()));
    manager.register(Box::new(mux::plugin()));
    manager.register(Box::new(extended_arithmetic::plugin()));
    manager.register(Box::new(ram::plugin()));
    manager.register(Box::new(iter::IterPlugin));
}
