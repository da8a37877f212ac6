//! Notebook documents, as modelled by the `nbformat` crate.
//!
//! Parsing, upgrading older 4.x documents and serialization all go through
//! `nbformat`; this module only adds what conversion needs on top: building
//! code cells from plain text, reading cell sources back as one string,
//! and reaching into the free-form metadata where pyjuter keeps its own
//! section.

use crate::error::{PyjuterError, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;

pub use nbformat::v4::{Cell, CellId, CellMetadata, Metadata, Notebook};

pub const NBFORMAT: i32 = 4;
pub const NBFORMAT_MINOR: i32 = 5;

/// Parse notebook JSON. Documents older than 4.5 are upgraded; anything
/// before nbformat 4 is refused.
pub fn parse(json: &str) -> Result<Notebook> {
    let parsed = nbformat::parse_notebook(json)
        .map_err(|e| PyjuterError::Format(format!("invalid notebook: {}", e)))?;
    match parsed {
        nbformat::Notebook::V4(doc) => Ok(doc),
        nbformat::Notebook::Legacy(doc) => {
            tracing::debug!(minor = doc.nbformat_minor, "upgrading notebook to 4.5");
            nbformat::upgrade_legacy_notebook(doc)
                .map_err(|e| PyjuterError::Format(format!("cannot upgrade notebook: {}", e)))
        }
        #[allow(unreachable_patterns)]
        _ => Err(PyjuterError::Format(
            "unsupported notebook version: only nbformat 4 is read".to_string(),
        )),
    }
}

/// Serialize the way Jupyter writes notebooks: one-space indent and a
/// trailing newline.
pub fn serialize(doc: Notebook) -> Result<String> {
    nbformat::serialize_notebook(&nbformat::Notebook::V4(doc))
        .map_err(|e| PyjuterError::Format(format!("cannot serialize notebook: {}", e)))
}

/// An empty 4.5 document carrying `metadata`.
pub fn document(metadata: Map<String, Value>) -> Result<Notebook> {
    let metadata: Metadata = serde_json::from_value(Value::Object(metadata))
        .map_err(|e| PyjuterError::Format(format!("invalid notebook metadata: {}", e)))?;
    Ok(Notebook {
        metadata,
        nbformat: NBFORMAT,
        nbformat_minor: NBFORMAT_MINOR,
        cells: Vec::new(),
    })
}

/// Document metadata as a JSON map, without unset fields.
pub fn metadata_map(doc: &Notebook) -> Result<Map<String, Value>> {
    match serde_json::to_value(&doc.metadata)? {
        Value::Object(mut map) => {
            map.retain(|_, v| !v.is_null());
            Ok(map)
        }
        _ => Ok(Map::new()),
    }
}

/// A code cell with no outputs.
pub fn code_cell(id: &str, source: &str, metadata: Map<String, Value>) -> Result<Cell> {
    let id = CellId::new(id)
        .map_err(|e| PyjuterError::Format(format!("invalid cell id '{}': {}", id, e)))?;
    let metadata: CellMetadata = serde_json::from_value(Value::Object(metadata))
        .map_err(|e| PyjuterError::Format(format!("invalid cell metadata: {}", e)))?;
    Ok(Cell::Code {
        id,
        metadata,
        execution_count: None,
        source: source_lines(source),
        outputs: Vec::new(),
    })
}

/// Split text into the line list notebooks store, newlines kept.
pub fn source_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_string).collect()
}

/// Read access to the parts of a cell conversion cares about.
pub trait CellExt {
    fn cell_type(&self) -> &'static str;
    fn is_code(&self) -> bool;
    fn cell_id(&self) -> &str;
    /// Source as one string.
    fn text(&self) -> String;
    /// A top-level entry of the cell's free-form metadata.
    fn metadata_entry(&self, key: &str) -> Option<&Value>;
}

impl CellExt for Cell {
    fn cell_type(&self) -> &'static str {
        match self {
            Cell::Code { .. } => "code",
            Cell::Markdown { .. } => "markdown",
            Cell::Raw { .. } => "raw",
        }
    }

    fn is_code(&self) -> bool {
        matches!(self, Cell::Code { .. })
    }

    fn cell_id(&self) -> &str {
        match self {
            Cell::Code { id, .. } | Cell::Markdown { id, .. } | Cell::Raw { id, .. } => {
                id.as_str()
            }
        }
    }

    fn text(&self) -> String {
        match self {
            Cell::Code { source, .. } | Cell::Markdown { source, .. } | Cell::Raw { source, .. } => {
                source.concat()
            }
        }
    }

    fn metadata_entry(&self, key: &str) -> Option<&Value> {
        match self {
            Cell::Code { metadata, .. }
            | Cell::Markdown { metadata, .. }
            | Cell::Raw { metadata, .. } => metadata.additional.get(key),
        }
    }
}

/// Structural checks beyond what parsing enforces.
pub fn validate(doc: &Notebook) -> Result<()> {
    if doc.nbformat != NBFORMAT {
        return Err(PyjuterError::Format(format!(
            "unsupported notebook version {}.{}",
            doc.nbformat, doc.nbformat_minor
        )));
    }

    let mut seen = HashSet::new();
    for cell in &doc.cells {
        let id = cell.cell_id();
        if !seen.insert(id) {
            return Err(PyjuterError::Format(format!("duplicate cell id '{}'", id)));
        }
    }
    Ok(())
}

/// Replace a cell's source in place.
#[cfg(test)]
pub(crate) fn set_source(cell: &mut Cell, text: &str) {
    match cell {
        Cell::Code { source, .. } | Cell::Markdown { source, .. } | Cell::Raw { source, .. } => {
            *source = source_lines(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_json() -> String {
        json!({
            "cells": [
                {"cell_type": "markdown", "id": "md1", "metadata": {}, "source": ["# Title"]},
                {
                    "cell_type": "code",
                    "execution_count": 3,
                    "id": "c1",
                    "metadata": {"tags": ["x"], "pyjuter": {"module": "m"}},
                    "outputs": [{"output_type": "stream", "name": "stdout", "text": "hi\n"}],
                    "source": ["x = 1\n", "print(x)"]
                }
            ],
            "metadata": {"language_info": {"name": "python"}},
            "nbformat": 4,
            "nbformat_minor": 5
        })
        .to_string()
    }

    #[test]
    fn test_parse_reads_cells() {
        let nb = parse(&sample_json()).unwrap();
        assert_eq!(nb.cells.len(), 2);
        assert_eq!(nb.cells[0].text(), "# Title");
        assert_eq!(nb.cells[1].text(), "x = 1\nprint(x)");
        assert!(nb.cells[1].is_code());
        assert!(!nb.cells[0].is_code());
        assert_eq!(nb.cells[0].cell_type(), "markdown");
        assert_eq!(nb.cells[1].cell_id(), "c1");
        assert_eq!(nb.cells[1].metadata_entry("pyjuter"), Some(&json!({"module": "m"})));
        assert_eq!(nb.cells[1].metadata_entry("missing"), None);
    }

    #[test]
    fn test_parse_upgrades_older_minor_versions() {
        let doc = json!({
            "cells": [{"cell_type": "code", "execution_count": null, "metadata": {},
                       "outputs": [], "source": ["x = 1"]}],
            "metadata": {}, "nbformat": 4, "nbformat_minor": 4
        })
        .to_string();
        let nb = parse(&doc).unwrap();
        assert_eq!(nb.nbformat_minor, 5);
        assert_eq!(nb.cells[0].text(), "x = 1");
        assert!(!nb.cells[0].cell_id().is_empty());
    }

    #[test]
    fn test_serialize_splits_source_into_lines() {
        let mut nb = document(Map::new()).unwrap();
        nb.cells
            .push(code_cell("cell-0", "a = 1\nb = 2\n", Map::new()).unwrap());
        let text = serialize(nb).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["cells"][0]["source"], json!(["a = 1\n", "b = 2\n"]));
        assert_eq!(value["cells"][0]["id"], "cell-0");
        assert_eq!(value["cells"][0]["outputs"], json!([]));
        assert!(text.ends_with("}\n"));
        assert!(text.starts_with("{\n "));
    }

    #[test]
    fn test_serialize_then_parse_keeps_outputs_and_metadata() {
        let text = serialize(parse(&sample_json()).unwrap()).unwrap();
        let again = serialize(parse(&text).unwrap()).unwrap();
        assert_eq!(text, again);

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["cells"][1]["outputs"].as_array().unwrap().len(), 1);
        assert_eq!(value["cells"][1]["metadata"]["tags"], json!(["x"]));
        assert_eq!(value["metadata"]["language_info"]["name"], "python");
    }

    #[test]
    fn test_empty_source_has_no_lines() {
        assert!(source_lines("").is_empty());
        assert_eq!(source_lines("a\n\nb"), vec!["a\n", "\n", "b"]);
    }

    #[test]
    fn test_cell_metadata_lands_in_free_form_section() {
        let mut metadata = Map::new();
        metadata.insert("pyjuter".into(), json!({"role": "setup"}));
        let cell = code_cell("setup", "pass", metadata).unwrap();
        assert_eq!(cell.metadata_entry("pyjuter").unwrap()["role"], "setup");
    }

    #[test]
    fn test_invalid_cell_id_is_format_error() {
        assert!(matches!(
            code_cell("has space", "", Map::new()),
            Err(PyjuterError::Format(_))
        ));
    }

    #[test]
    fn test_metadata_map_drops_unset_fields() {
        let mut metadata = Map::new();
        metadata.insert("language_info".into(), json!({"name": "python"}));
        metadata.insert("custom".into(), json!(1));
        let nb = document(metadata).unwrap();
        let map = metadata_map(&nb).unwrap();
        assert_eq!(map["language_info"]["name"], "python");
        assert_eq!(map["custom"], 1);
        assert!(!map.contains_key("kernelspec"));
    }

    #[test]
    fn test_parse_rejects_other_versions() {
        let v3 = json!({"nbformat": 3, "nbformat_minor": 0, "metadata": {}, "worksheets": []})
            .to_string();
        assert!(matches!(parse(&v3), Err(PyjuterError::Format(_))));
        let v5 = json!({"nbformat": 5, "nbformat_minor": 0, "metadata": {}, "cells": []})
            .to_string();
        assert!(matches!(parse(&v5), Err(PyjuterError::Format(_))));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse("not json"), Err(PyjuterError::Format(_))));
        let unknown = json!({
            "cells": [{"cell_type": "widget", "id": "w", "metadata": {}, "source": []}],
            "metadata": {}, "nbformat": 4, "nbformat_minor": 5
        })
        .to_string();
        assert!(matches!(parse(&unknown), Err(PyjuterError::Format(_))));
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let mut nb = document(Map::new()).unwrap();
        nb.cells.push(code_cell("same", "a", Map::new()).unwrap());
        nb.cells.push(code_cell("same", "b", Map::new()).unwrap());
        assert!(matches!(validate(&nb), Err(PyjuterError::Format(_))));
    }

    #[test]
    fn test_validate_rejects_other_major_versions() {
        let mut nb = document(Map::new()).unwrap();
        validate(&nb).unwrap();
        nb.nbformat = 3;
        assert!(validate(&nb).is_err());
    }
}
