//! Type-erased plugin registry and operation dispatch: component I of
//! spec.md §4, plus the `TypeInterpreterHost` seam that lets a plugin
//! operation invoke another declared function (used by the
//! iteration-map plugin) without this crate depending on the function
//! catalog that sits above it.

mod host;
mod manager;
mod simple;

pub use host::{Operation, TypeInterpreterHost};
pub use manager::{Plugin, PluginsManager};
pub use simple::{SimpleOperation, SimplePlugin};
