use super::SourceStore;
use crate::error::{PyjuterError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn ensure_parent(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(PyjuterError::Io)?;
            }
        }
        Ok(())
    }
}

impl SourceStore for FileStore {
    fn read(&self, path: &Path) -> Result<String> {
        let full = self.resolve(path);
        fs::read_to_string(&full).map_err(|e| {
            PyjuterError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", full.display(), e),
            ))
        })
    }

    fn write(&mut self, path: &Path, content: &str) -> Result<()> {
        let full = self.resolve(path);
        self.ensure_parent(&full)?;
        fs::write(&full, content).map_err(PyjuterError::Io)?;
        tracing::debug!(path = %full.display(), bytes = content.len(), "wrote file");
        Ok(())
    }
}
