use crate::commands::{load_notebook, CmdMessage, CmdResult};
use crate::error::{PyjuterError, Result};
use crate::restore;
use crate::store::SourceStore;
use std::path::{Path, PathBuf};

/// Relative file path of module `name`: `a.b` lives at `a/b.py`.
pub fn module_path(name: &str) -> PathBuf {
    let mut path: PathBuf = name.split('.').collect();
    path.set_extension("py");
    path
}

/// Default primary file for `input`: its stem with a `.py` extension.
pub fn default_main(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "main".into());
    PathBuf::from(stem).with_extension("py")
}

pub fn run<S: SourceStore>(
    store: &mut S,
    input: &Path,
    output_dir: &Path,
    main: Option<&Path>,
) -> Result<CmdResult> {
    let doc = load_notebook(&*store, input)?;
    let unpacked = restore::unpack(&doc)?;

    let main_path = match main {
        Some(path) => path.to_path_buf(),
        None => output_dir.join(default_main(input)),
    };

    let mut files: Vec<(PathBuf, String)> = vec![(main_path, unpacked.primary_source())];
    for module in &unpacked.modules {
        let path = output_dir.join(module_path(&module.name));
        if files.iter().any(|(existing, _)| *existing == path) {
            return Err(PyjuterError::Api(format!(
                "module '{}' would overwrite {}",
                module.name,
                path.display()
            )));
        }
        files.push((path, module.source()));
    }

    // Everything is verified before the first write.
    let mut result = CmdResult::default();
    let mut written = Vec::with_capacity(files.len());
    for (path, text) in files {
        store.write(&path, &text)?;
        result.add_message(CmdMessage::success(format!("Wrote {}", path.display())));
        written.push(path);
    }
    if unpacked.skipped_cells > 0 {
        result.add_message(CmdMessage::warning(format!(
            "Skipped {} non-code cell(s)",
            unpacked.skipped_cells
        )));
    }
    tracing::info!(files = written.len(), "unpacked notebook");

    Ok(result.with_written_paths(written))
}
