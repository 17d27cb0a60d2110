//! [`PluginsManager`]: a name-keyed registry of [`Plugin`] instances,
//! each claiming support for one or more wire types (spec.md §4.I).

use sieve_ir::{FieldValue, FunctionSignature, PluginBinding, TypeIndex};

use crate::host::Operation;

/// A named extension providing operations for the wire types it
/// chooses to support. Registered once per supported type; the manager
/// tries every registered instance under a given plugin name in turn.
pub trait Plugin: 'static {
    fn name(&self) -> &str;

    /// `type_index`/`max_value` name one type this call's signature
    /// touches. Returns:
    /// - `Ok(Some(op))` if this plugin supports `type_index` and the
    ///   binding's `operation`/parameters for it,
    /// - `Ok(None)` if it simply doesn't support `type_index` (the
    ///   manager tries the next candidate type),
    /// - `Err(detail)` if it supports the type but rejects the
    ///   signature/binding outright — a sticky `PluginReject`.
    fn create(
        &self,
        type_index: TypeIndex,
        max_value: Option<FieldValue>,
        signature: &FunctionSignature,
        binding: &PluginBinding,
    ) -> Result<Option<Box<dyn Operation>>, String>;
}

/// Registry of [`Plugin`]s, keyed by plugin name.
#[derive(Default)]
pub struct PluginsManager {
    plugins: rustc_hash::FxHashMap<String, Vec<Box<dyn Plugin>>>,
}

impl PluginsManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins
            .entry(plugin.name().to_string())
            .or_default()
            .push(plugin);
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Searches the signature's inputs, then its outputs, for the first
    /// type a registered instance of `binding.name` supports, and asks
    /// it to create the operation (spec.md §4.I).
    pub fn create_operation(
        &self,
        signature: &FunctionSignature,
        binding: &PluginBinding,
        max_value_of: impl Fn(TypeIndex) -> Option<FieldValue>,
    ) -> Result<(TypeIndex, Box<dyn Operation>), String> {
        let Some(instances) = self.plugins.get(&binding.name) else {
            return Err(format!("unknown plugin `{}`", binding.name));
        };

        let mut seen = Vec::new();
        let candidate_types = signature
            .inputs
            .iter()
            .map(|p| p.ty)
            .chain(signature.outputs.iter().map(|p| p.ty));
        for ty in candidate_types {
            if seen.contains(&ty) {
                continue;
            }
            seen.push(ty);
            for instance in instances {
                match instance.create(ty, max_value_of(ty), signature, binding) {
                    Ok(Some(op)) => return Ok((ty, op)),
                    Ok(None) => continue,
                    Err(detail) => return Err(detail),
                }
            }
        }
        Err(format!(
            "plugin `{}` op `{}` supports none of the signature's types",
            binding.name, binding.operation
        ))
    }
}
