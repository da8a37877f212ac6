//! Recover the original source files from a notebook produced by inlining.
//!
//! Every shim is verified against its digest before it is stripped. A
//! mismatch, or a registry setup cell that differs from [`BOOTSTRAP`], is an
//! integrity error: the notebook is refused as a whole rather than written
//! out with shim code mixed into the recovered sources.

use crate::error::{PyjuterError, Result};
use crate::notebook::{self, Cell, CellExt, Notebook};
use crate::registry::{validate_module_name, ModuleRegistry, BOOTSTRAP, METADATA_KEY};
use crate::shim::{self, ShimPair};
use serde::Deserialize;

/// Source recovered for one inlined module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackedModule {
    pub name: String,
    pub chunks: Vec<String>,
}

impl UnpackedModule {
    pub fn source(&self) -> String {
        self.chunks.join("\n")
    }
}

/// Result of splitting a notebook back into its source files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Unpacked {
    pub primary: Vec<String>,
    pub modules: Vec<UnpackedModule>,
    /// Number of non-code cells that were dropped.
    pub skipped_cells: usize,
}

impl Unpacked {
    pub fn primary_source(&self) -> String {
        self.primary.join("\n")
    }

    pub fn module(&self, name: &str) -> Option<&UnpackedModule> {
        self.modules.iter().find(|m| m.name == name)
    }
}

/// The pyjuter section of a cell's metadata.
#[derive(Debug, Deserialize)]
struct CellSection {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    shims: Option<ShimPair>,
}

enum CellKind {
    Setup,
    Shimmed { module: String, shims: ShimPair },
    Plain,
}

fn classify(index: usize, cell: &Cell) -> Result<CellKind> {
    let Some(raw) = cell.metadata_entry(METADATA_KEY) else {
        return Ok(CellKind::Plain);
    };
    let section: CellSection = serde_json::from_value(raw.clone()).map_err(|e| {
        PyjuterError::Format(format!("cell {} has malformed pyjuter metadata: {}", index, e))
    })?;

    if section.role.as_deref() == Some("setup") {
        return Ok(CellKind::Setup);
    }
    if let Some(module) = &section.module {
        validate_module_name(module).map_err(|e| {
            PyjuterError::Format(format!("cell {} names a bad module: {}", index, e))
        })?;
    }
    match (section.module, section.shims) {
        (Some(module), Some(shims)) => Ok(CellKind::Shimmed { module, shims }),
        (None, None) => Ok(CellKind::Plain),
        (Some(module), None) => Err(PyjuterError::Integrity(format!(
            "cell {} belongs to module '{}' but has no shim digests",
            index, module
        ))),
        (None, Some(_)) => Err(PyjuterError::Format(format!(
            "cell {} has shim digests but no module name",
            index
        ))),
    }
}

/// Whether a cell without pyjuter metadata still carries generated code,
/// which means its metadata was stripped.
fn looks_generated(source: &str) -> bool {
    source == BOOTSTRAP || shim::starts_with_pre(source)
}

/// Split `doc` into the primary module and each inlined module.
pub fn unpack(doc: &Notebook) -> Result<Unpacked> {
    notebook::validate(doc)?;
    let section = doc.metadata.additional.get(METADATA_KEY);
    let registered = ModuleRegistry::names_from_metadata(section)?;

    let mut out = Unpacked::default();
    if let Some(names) = &registered {
        for name in names {
            out.modules.push(UnpackedModule {
                name: name.clone(),
                chunks: Vec::new(),
            });
        }
    }

    for (i, cell) in doc.cells.iter().enumerate() {
        if !cell.is_code() {
            tracing::warn!(cell = i, cell_type = cell.cell_type(), "skipping non-code cell");
            out.skipped_cells += 1;
            continue;
        }

        let source = cell.text();
        match classify(i, cell)? {
            CellKind::Setup => {
                if source != BOOTSTRAP {
                    return Err(PyjuterError::Integrity(format!(
                        "registry setup cell {} has been modified",
                        i
                    )));
                }
                tracing::debug!(cell = i, "dropping registry setup cell");
            }
            CellKind::Shimmed { module, shims } => {
                let body = shim::unwrap(&source, &shims).map_err(|e| match e {
                    PyjuterError::Integrity(msg) => PyjuterError::Integrity(format!(
                        "cell {} (module '{}'): {}",
                        i, module, msg
                    )),
                    other => other,
                })?;
                let index = match out.modules.iter().position(|m| m.name == module) {
                    Some(index) => index,
                    None if registered.is_some() => {
                        return Err(PyjuterError::Format(format!(
                            "cell {} names module '{}' which the notebook does not register",
                            i, module
                        )));
                    }
                    None => {
                        out.modules.push(UnpackedModule {
                            name: module.clone(),
                            chunks: Vec::new(),
                        });
                        out.modules.len() - 1
                    }
                };
                tracing::debug!(cell = i, module = %module, "stripped shims");
                out.modules[index].chunks.push(body.to_string());
            }
            CellKind::Plain if looks_generated(&source) => {
                return Err(PyjuterError::Integrity(format!(
                    "cell {} holds generated shim code but no pyjuter metadata",
                    i
                )));
            }
            CellKind::Plain => out.primary.push(source),
        }
    }

    if let Some(empty) = out.modules.iter().find(|m| m.chunks.is_empty()) {
        return Err(PyjuterError::Integrity(format!(
            "module '{}' is registered but no cell belongs to it",
            empty.name
        )));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::{ShimDigest, ShimMode};
    use crate::module::Module;
    use crate::notebook::set_source;
    use serde_json::{json, Map};

    fn inlined_doc() -> Notebook {
        let mut main = Module::from_source("import util\n\nprint(util.f())\n");
        main.inline(
            Module::from_source("def f():\n    return 1\n\n\nVALUE = 2"),
            "util",
        )
        .unwrap();
        main.inline(Module::from_source("import os\n"), "pkg.paths")
            .unwrap();
        main.to_document().unwrap()
    }

    fn first_shimmed(doc: &mut Notebook) -> &mut Cell {
        doc.cells
            .iter_mut()
            .find(|c| c.metadata_entry(METADATA_KEY).is_some() && c.text() != BOOTSTRAP)
            .unwrap()
    }

    fn bare_doc(cells: Vec<Cell>) -> Notebook {
        let mut doc = notebook::document(Map::new()).unwrap();
        doc.cells = cells;
        doc
    }

    fn shimmed_cell(id: &str, module: &str) -> Cell {
        let pre = "PRE\n";
        let post = "\nPOST";
        let mut metadata = Map::new();
        metadata.insert(
            METADATA_KEY.to_string(),
            json!({
                "module": module,
                "shims": {
                    "pre": ShimDigest::compute(pre, ShimMode::Pre),
                    "post": ShimDigest::compute(post, ShimMode::Post),
                }
            }),
        );
        notebook::code_cell(id, &format!("{pre}body{post}"), metadata).unwrap()
    }

    #[test]
    fn test_unpack_recovers_every_file() {
        let doc = inlined_doc();
        let unpacked = unpack(&doc).unwrap();

        assert_eq!(unpacked.primary_source(), "import util\n\nprint(util.f())\n");
        assert_eq!(
            unpacked.module("util").unwrap().source(),
            "def f():\n    return 1\n\n\nVALUE = 2"
        );
        assert_eq!(unpacked.module("pkg.paths").unwrap().source(), "import os\n");
        let names: Vec<_> = unpacked.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["pkg.paths", "util"]);
    }

    #[test]
    fn test_unpack_survives_serialization() {
        let reparsed = notebook::parse(&notebook::serialize(inlined_doc()).unwrap()).unwrap();
        assert_eq!(unpack(&reparsed).unwrap(), unpack(&inlined_doc()).unwrap());
    }

    #[test]
    fn test_unpack_plain_notebook() {
        let doc = Module::from_source("a = 1\n\nb = 2").to_document().unwrap();
        let unpacked = unpack(&doc).unwrap();
        assert_eq!(unpacked.primary_source(), "a = 1\n\nb = 2");
        assert!(unpacked.modules.is_empty());
    }

    #[test]
    fn test_corrupted_post_shim_is_integrity_error() {
        let mut doc = inlined_doc();
        let cell = first_shimmed(&mut doc);
        // Trailing whitespace on the last line of the post shim.
        let mut source = cell.text();
        source.insert(source.len() - 1, ' ');
        set_source(cell, &source);

        let err = unpack(&doc).unwrap_err();
        assert!(matches!(err, PyjuterError::Integrity(_)), "{err}");
    }

    #[test]
    fn test_corrupted_pre_shim_is_integrity_error() {
        let mut doc = inlined_doc();
        let cell = first_shimmed(&mut doc);
        let source = format!(" {}", cell.text());
        set_source(cell, &source);
        assert!(matches!(
            unpack(&doc),
            Err(PyjuterError::Integrity(_))
        ));
    }

    #[test]
    fn test_modified_setup_cell_is_integrity_error() {
        let mut doc = inlined_doc();
        let source = format!("{} ", doc.cells[0].text());
        set_source(&mut doc.cells[0], &source);
        assert!(matches!(
            unpack(&doc),
            Err(PyjuterError::Integrity(_))
        ));
    }

    #[test]
    fn test_editing_chunk_body_is_kept() {
        let mut doc = inlined_doc();
        let cell = first_shimmed(&mut doc);
        let edited = cell.text().replace("import os", "import os, sys");
        set_source(cell, &edited);
        let unpacked = unpack(&doc).unwrap();
        assert_eq!(
            unpacked.module("pkg.paths").unwrap().source(),
            "import os, sys\n"
        );
    }

    #[test]
    fn test_unregistered_module_is_format_error() {
        let mut doc = inlined_doc();
        doc.metadata
            .additional
            .insert(METADATA_KEY.to_string(), json!({"modules": ["util"]}));
        assert!(matches!(unpack(&doc), Err(PyjuterError::Format(_))));
    }

    #[test]
    fn test_missing_registry_metadata_uses_cell_order() {
        let mut doc = inlined_doc();
        doc.metadata.additional.remove(METADATA_KEY);
        let unpacked = unpack(&doc).unwrap();
        let names: Vec<_> = unpacked.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["pkg.paths", "util"]);
    }

    #[test]
    fn test_module_without_digests_is_integrity_error() {
        let mut metadata = Map::new();
        metadata.insert(METADATA_KEY.to_string(), json!({"module": "m"}));
        let doc = bare_doc(vec![notebook::code_cell("c", "x = 1", metadata).unwrap()]);
        assert!(matches!(
            unpack(&doc),
            Err(PyjuterError::Integrity(_))
        ));
    }

    #[test]
    fn test_hand_built_shims_are_honoured() {
        let doc = bare_doc(vec![shimmed_cell("c", "m")]);
        let unpacked = unpack(&doc).unwrap();
        assert_eq!(unpacked.module("m").unwrap().source(), "body");
    }

    #[test]
    fn test_path_like_cell_module_is_format_error() {
        for bad in ["/tmp/evil", "../../etc/cron", "a/b"] {
            let doc = bare_doc(vec![shimmed_cell("c", bad)]);
            let err = unpack(&doc).unwrap_err();
            assert!(matches!(err, PyjuterError::Format(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn test_path_like_registered_module_is_format_error() {
        let mut doc = inlined_doc();
        doc.metadata.additional.insert(
            METADATA_KEY.to_string(),
            json!({"modules": ["pkg.paths", "util", "/tmp/evil"]}),
        );
        assert!(matches!(unpack(&doc), Err(PyjuterError::Format(_))));
    }

    #[test]
    fn test_stripped_cell_metadata_is_integrity_error() {
        let doc = inlined_doc();
        let stripped: Vec<Cell> = doc
            .cells
            .iter()
            .enumerate()
            .map(|(i, c)| notebook::code_cell(&format!("s{i}"), &c.text(), Map::new()).unwrap())
            .collect();
        let mut stripped_doc = bare_doc(stripped);
        stripped_doc.metadata = inlined_doc().metadata;

        let err = unpack(&stripped_doc).unwrap_err();
        assert!(matches!(err, PyjuterError::Integrity(_)), "{err}");
    }

    #[test]
    fn test_stripped_metadata_without_registry_is_integrity_error() {
        let doc = inlined_doc();
        // Keep only the setup cell's metadata; drop the shimmed cells'.
        let cells: Vec<Cell> = doc
            .cells
            .iter()
            .enumerate()
            .filter(|(i, _)| *i > 0)
            .map(|(i, c)| notebook::code_cell(&format!("s{i}"), &c.text(), Map::new()).unwrap())
            .collect();
        let err = unpack(&bare_doc(cells)).unwrap_err();
        assert!(matches!(err, PyjuterError::Integrity(_)), "{err}");
    }

    #[test]
    fn test_registered_module_without_cells_is_integrity_error() {
        let mut doc = bare_doc(vec![shimmed_cell("c", "m")]);
        doc.metadata
            .additional
            .insert(METADATA_KEY.to_string(), json!({"modules": ["m", "gone"]}));
        let err = unpack(&doc).unwrap_err();
        assert!(matches!(err, PyjuterError::Integrity(_)), "{err}");
    }

    #[test]
    fn test_markdown_cells_are_counted_and_skipped() {
        let mut text = notebook::serialize(inlined_doc()).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&text).unwrap();
        value["cells"].as_array_mut().unwrap().push(json!({
            "cell_type": "markdown", "id": "notes", "metadata": {}, "source": ["notes"]
        }));
        text = value.to_string();

        let unpacked = unpack(&notebook::parse(&text).unwrap()).unwrap();
        assert_eq!(unpacked.skipped_cells, 1);
    }
}
