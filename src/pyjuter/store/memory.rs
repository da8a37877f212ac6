use super::SourceStore;
use crate::error::{PyjuterError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// In-memory storage for testing and development.
/// Does NOT persist data.
#[derive(Default)]
pub struct InMemoryStore {
    files: HashMap<PathBuf, String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl SourceStore for InMemoryStore {
    fn read(&self, path: &Path) -> Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            PyjuterError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{}: not found", path.display()),
            ))
        })
    }

    fn write(&mut self, path: &Path, content: &str) -> Result<()> {
        self.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;

    pub const MAIN_PY: &str = "import util\n\nprint(util.double(util.BASE))\n";
    pub const UTIL_PY: &str = "BASE = 21\n\n\ndef double(x):\n    return 2 * x\n";

    /// A store holding a small program: `main.py` importing `util.py`.
    pub fn program() -> InMemoryStore {
        InMemoryStore::new()
            .with_file("main.py", MAIN_PY)
            .with_file("util.py", UTIL_PY)
    }
}
