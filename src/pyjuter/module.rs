//! # Modules
//!
//! A [`Module`] is the common form of a Python source file and a notebook:
//! document metadata plus an ordered list of [`Chunk`]s. It is built from
//! one representation, optionally has other modules inlined into it, and is
//! rendered to either representation.
//!
//! Rendering never mutates the module, so a module can be rendered any
//! number of times and inlined into further between renders.

use crate::chunker::split_toplevel;
use crate::error::{PyjuterError, Result};
use crate::notebook::{self, CellExt, Notebook};
use crate::registry::{validate_module_name, ModuleRegistry, BOOTSTRAP, METADATA_KEY};
use crate::scan::exported_names;
use crate::shim;
use serde_json::{json, Map, Value};

/// One unit of source; becomes one notebook cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    source: String,
    origin_module: Option<String>,
    importable: bool,
}

impl Chunk {
    /// A chunk of the primary module.
    pub fn primary(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            origin_module: None,
            importable: false,
        }
    }

    /// A chunk inlined from `module`, to be wrapped with import shims.
    pub fn importable(source: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            origin_module: Some(module.into()),
            importable: true,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn origin_module(&self) -> Option<&str> {
        self.origin_module.as_deref()
    }

    pub fn is_importable(&self) -> bool {
        self.importable
    }

    /// The names this chunk exports when wrapped.
    pub fn exports(&self) -> Vec<String> {
        exported_names(&self.source)
    }

    /// Source as it appears in output: shim-wrapped when importable.
    pub fn rendered(&self) -> String {
        self.render().0
    }

    /// Rendered source, plus the cell metadata that goes with it.
    fn render(&self) -> (String, Map<String, Value>) {
        match (&self.origin_module, self.importable) {
            (Some(module), true) => {
                let wrapped = shim::wrap(&self.source, module, &self.exports());
                let mut metadata = Map::new();
                metadata.insert(
                    METADATA_KEY.to_string(),
                    json!({ "module": module, "shims": wrapped.shims }),
                );
                (wrapped.source, metadata)
            }
            _ => (self.source.clone(), Map::new()),
        }
    }
}

/// Options that affect notebook rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit the registry setup cell even when nothing was inlined.
    pub always_bootstrap: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    metadata: Map<String, Value>,
    chunks: Vec<Chunk>,
    // Most recent first. Kept apart from the chunks so a module with no
    // chunks still counts as inlined.
    inlined: Vec<String>,
}

impl Module {
    /// Build from Python source.
    pub fn from_source(source: &str) -> Self {
        let chunks: Vec<Chunk> = split_toplevel(source).map(Chunk::primary).collect();
        tracing::debug!(chunks = chunks.len(), "split source into chunks");
        Self {
            metadata: default_metadata(),
            chunks,
            inlined: Vec::new(),
        }
    }

    /// Build from a notebook: one chunk per code cell, in cell order.
    ///
    /// Markdown and raw cells carry no code and are skipped with a warning.
    pub fn from_document(doc: &Notebook) -> Result<Self> {
        notebook::validate(doc)?;

        let mut chunks = Vec::with_capacity(doc.cells.len());
        for (i, cell) in doc.cells.iter().enumerate() {
            if !cell.is_code() {
                tracing::warn!(cell = i, cell_type = cell.cell_type(), "skipping non-code cell");
                continue;
            }
            chunks.push(Chunk::primary(cell.text()));
        }
        tracing::debug!(chunks = chunks.len(), "read notebook cells");

        Ok(Self {
            metadata: notebook::metadata_map(doc)?,
            chunks,
            inlined: Vec::new(),
        })
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.metadata
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Names of the modules inlined so far, most recent first.
    pub fn inlined_modules(&self) -> Vec<&str> {
        self.inlined.iter().map(String::as_str).collect()
    }

    /// The modules a render registers: those with at least one chunk.
    pub fn registry(&self) -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        for chunk in self.chunks.iter().filter(|c| c.is_importable()) {
            if let Some(module) = chunk.origin_module() {
                registry.record(module);
            }
        }
        registry
    }

    /// Inline `other` as pseudo-module `name`.
    ///
    /// `other`'s chunks keep their order and are placed before this
    /// module's chunks, so they run first.
    pub fn inline(&mut self, other: Module, name: &str) -> Result<()> {
        validate_module_name(name)?;
        if self.inlined.iter().any(|n| n == name) {
            return Err(PyjuterError::Config(format!(
                "module '{}' is already inlined",
                name
            )));
        }

        let mut chunks: Vec<Chunk> = other
            .chunks
            .into_iter()
            .map(|c| Chunk::importable(c.source, name))
            .collect();
        tracing::info!(module = name, chunks = chunks.len(), "inlining module");

        chunks.append(&mut self.chunks);
        self.chunks = chunks;
        self.inlined.insert(0, name.to_string());
        Ok(())
    }

    /// Render as flat Python source.
    ///
    /// Inlined chunks keep their shims (and the registry setup is placed
    /// first), so the output runs on its own but cannot be split back into
    /// separate files; only the notebook form records the shim digests.
    pub fn to_source(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.chunks.len() + 1);
        if self.chunks.iter().any(Chunk::is_importable) {
            parts.push(BOOTSTRAP.to_string());
        }
        parts.extend(self.chunks.iter().map(Chunk::rendered));
        parts.join("\n")
    }

    /// Render as a notebook with default options.
    pub fn to_document(&self) -> Result<Notebook> {
        self.to_document_with(RenderOptions::default())
    }

    /// Render as a notebook. Cell ids are numbered by position, so
    /// rendering the same module twice gives the same document.
    pub fn to_document_with(&self, options: RenderOptions) -> Result<Notebook> {
        let registry = self.registry();

        let mut metadata = self.metadata.clone();
        metadata.remove(METADATA_KEY);
        if !registry.is_empty() {
            metadata.insert(METADATA_KEY.to_string(), registry.to_metadata());
        }

        let mut doc = notebook::document(metadata)?;
        if !registry.is_empty() || options.always_bootstrap {
            let id = cell_id(doc.cells.len());
            doc.cells
                .push(notebook::code_cell(&id, BOOTSTRAP, setup_cell_metadata())?);
        }
        for chunk in &self.chunks {
            let (source, metadata) = chunk.render();
            let id = cell_id(doc.cells.len());
            doc.cells.push(notebook::code_cell(&id, &source, metadata)?);
        }
        tracing::info!(
            cells = doc.cells.len(),
            modules = registry.len(),
            "rendered notebook"
        );
        Ok(doc)
    }
}

fn cell_id(index: usize) -> String {
    format!("cell-{}", index)
}

/// Metadata of a module built from plain source.
pub fn default_metadata() -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("language_info".to_string(), json!({ "name": "python" }));
    metadata
}

fn setup_cell_metadata() -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert(METADATA_KEY.to_string(), json!({ "role": "setup" }));
    metadata
}
