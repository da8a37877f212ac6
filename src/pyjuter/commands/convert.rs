//! Convert between a source file and a notebook, inlining modules on the way.

use crate::commands::{load_module, CmdMessage, CmdResult, SourceFormat};
use crate::config::PyjuterConfig;
use crate::error::{PyjuterError, Result};
use crate::module::{Module, RenderOptions};
use crate::notebook::{self, CellExt, Notebook};
use crate::registry::{ModuleRegistry, METADATA_KEY};
use crate::store::SourceStore;
use serde_json::Map;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A module to inline, given on the command line as `NAME=FILE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpec {
    pub name: String,
    pub path: PathBuf,
}

impl InlineSpec {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl FromStr for InlineSpec {
    type Err = PyjuterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('=') {
            Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => {
                Ok(InlineSpec::new(name.trim(), path.trim()))
            }
            _ => Err(PyjuterError::Api(format!(
                "invalid inline '{}': expected NAME=FILE",
                s
            ))),
        }
    }
}

pub fn run<S: SourceStore>(
    store: &mut S,
    config: &PyjuterConfig,
    input: &Path,
    output: &Path,
    inlines: &[InlineSpec],
) -> Result<CmdResult> {
    let output_format = SourceFormat::from_path(output)?;
    let mut result = CmdResult::default();

    let mut module = match SourceFormat::from_path(input)? {
        // Start from empty metadata so the configured language applies.
        SourceFormat::Source => Module::from_source(&store.read(input)?).with_metadata(Map::new()),
        SourceFormat::Notebook => {
            let doc = notebook::parse(&store.read(input)?)?;
            report_input_notebook(&doc, input, &mut result)?;
            Module::from_document(&doc)?
        }
    };

    for spec in inlines {
        let other = load_module(&*store, &spec.path)?;
        module.inline(other, &spec.name)?;
    }

    let (text, summary) = match output_format {
        SourceFormat::Source => {
            let text = module.to_source();
            let summary = format!("{} chunks", module.chunks().len());
            (text, summary)
        }
        SourceFormat::Notebook => {
            config.apply_defaults(module.metadata_mut());
            let options = RenderOptions {
                always_bootstrap: config.always_bootstrap,
            };
            let doc = module.to_document_with(options)?;
            let summary = format!("{} cells", doc.cells.len());
            (notebook::serialize(doc)?, summary)
        }
    };

    store.write(output, &text)?;

    let inlined = module.inlined_modules();
    let mut message = format!("Wrote {} ({}", output.display(), summary);
    if !inlined.is_empty() {
        message.push_str(&format!(", inlined: {}", inlined.join(", ")));
    }
    message.push(')');
    result.add_message(CmdMessage::success(message));

    Ok(result.with_written_paths(vec![output.to_path_buf()]))
}

fn report_input_notebook(doc: &Notebook, input: &Path, result: &mut CmdResult) -> Result<()> {
    let skipped = doc.cells.iter().filter(|c| !c.is_code()).count();
    if skipped > 0 {
        result.add_message(CmdMessage::warning(format!(
            "Skipped {} non-code cell(s) in {}",
            skipped,
            input.display()
        )));
    }
    let section = doc.metadata.additional.get(METADATA_KEY);
    if let Some(names) = ModuleRegistry::names_from_metadata(section)? {
        if !names.is_empty() {
            result.add_message(CmdMessage::warning(format!(
                "{} already inlines {}; their shims are kept as plain code (use unpack to split them)",
                input.display(),
                names.join(", ")
            )));
        }
    }
    Ok(())
}
