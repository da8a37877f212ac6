//! Pseudo-module registry.
//!
//! Two halves of the same mapping live here. [`BOOTSTRAP`] is the fixed
//! Python source placed in the first cell of a notebook with inlined
//! modules; it defines the runtime registry the shims talk to. The
//! [`ModuleRegistry`] is the Rust-side record of which modules one render
//! registered; it is built fresh for every render and written into the
//! document metadata, where unpack reads it back.

use crate::error::{PyjuterError, Result};
use crate::scan::is_identifier;

/// Key under which pyjuter stores its cell and document metadata.
pub const METADATA_KEY: &str = "pyjuter";

/// Registry setup cell. Never changes; compared byte-for-byte on unpack.
pub const BOOTSTRAP: &str = "\
# Module registry for modules inlined by pyjuter.
import sys as _pyjuter_sys
import types as _pyjuter_types

class _pyjuter_Registry:
    def __init__ (self):
        self.modules = {}

    def get (self, name):
        if name not in self.modules:
            module = _pyjuter_types.ModuleType (name)
            self.modules [name] = module
            _pyjuter_sys.modules [name] = module
        return self.modules [name]

    def export (self, module, *names):
        scope = globals ()
        for name in names:
            if name in scope:
                setattr (module, name, scope [name])

_pyjuter_registry = _pyjuter_Registry ()";

/// Module names one render registers, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleRegistry {
    modules: Vec<String>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module` unless it already is.
    pub fn record(&mut self, module: &str) {
        if !self.contains(module) {
            self.modules.push(module.to_string());
        }
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.iter().any(|name| name == module)
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(String::as_str)
    }

    /// Document metadata describing this registry.
    pub fn to_metadata(&self) -> serde_json::Value {
        serde_json::json!({ "modules": self.modules })
    }

    /// Module names listed in a document's pyjuter metadata section, if
    /// any were recorded. Every name must be a valid module name, since
    /// unpack turns them into file paths.
    pub fn names_from_metadata(section: Option<&serde_json::Value>) -> Result<Option<Vec<String>>> {
        let Some(list) = section.and_then(|s| s.get("modules")) else {
            return Ok(None);
        };
        let names: Vec<String> = serde_json::from_value(list.clone())
            .map_err(|e| PyjuterError::Format(format!("invalid module list: {}", e)))?;
        for name in &names {
            validate_module_name(name).map_err(|e| {
                PyjuterError::Format(format!("notebook registers a bad module name: {}", e))
            })?;
        }
        Ok(Some(names))
    }
}

/// Check that `name` can be used as an inline module name.
pub fn validate_module_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(PyjuterError::Config(
            "inline module name cannot be empty".to_string(),
        ));
    }
    if !name.split('.').all(is_identifier) || !name.is_ascii() {
        return Err(PyjuterError::Config(format!(
            "invalid inline module name '{}': expected a dotted Python identifier",
            name
        )));
    }
    if name.starts_with(crate::shim::RESERVED_PREFIX) {
        return Err(PyjuterError::Config(format!(
            "inline module name '{}' uses the reserved prefix",
            name
        )));
    }
    Ok(())
}
