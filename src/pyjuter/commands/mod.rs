use crate::config::PyjuterConfig;
use crate::error::{PyjuterError, Result};
use crate::module::Module;
use crate::notebook::{self, Notebook};
use crate::store::SourceStore;
use std::path::{Path, PathBuf};

pub mod config;
pub mod convert;
pub mod unpack;
pub mod verify;

/// Where a configuration file is read from or written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Project,
    Global,
}

#[derive(Debug, Clone)]
pub struct PyjuterPaths {
    pub project: Option<PathBuf>,
    pub global: PathBuf,
}

impl PyjuterPaths {
    pub fn scope_dir(&self, scope: Scope) -> Result<PathBuf> {
        match scope {
            Scope::Project => self
                .project
                .clone()
                .ok_or_else(|| PyjuterError::Api("Project scope is not available".to_string())),
            Scope::Global => Ok(self.global.clone()),
        }
    }

    /// The config in effect: project if it has one, else global, else defaults.
    pub fn effective_config(&self) -> Result<PyjuterConfig> {
        let mut dirs: Vec<&Path> = Vec::with_capacity(2);
        if let Some(project) = &self.project {
            dirs.push(project);
        }
        dirs.push(&self.global);
        PyjuterConfig::load_first(&dirs)
    }
}

/// The two representations a file can hold, told apart by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Source,
    Notebook,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("py") => Ok(SourceFormat::Source),
            Some("ipynb") => Ok(SourceFormat::Notebook),
            _ => Err(PyjuterError::Api(format!(
                "cannot tell the format of '{}': expected a .py or .ipynb file",
                path.display()
            ))),
        }
    }
}

/// Read `path` and build a module from it according to its extension.
pub(crate) fn load_module<S: SourceStore>(store: &S, path: &Path) -> Result<Module> {
    let text = store.read(path)?;
    match SourceFormat::from_path(path)? {
        SourceFormat::Source => Ok(Module::from_source(&text)),
        SourceFormat::Notebook => Module::from_document(&notebook::parse(&text)?),
    }
}

pub(crate) fn load_notebook<S: SourceStore>(store: &S, path: &Path) -> Result<Notebook> {
    if SourceFormat::from_path(path)? != SourceFormat::Notebook {
        return Err(PyjuterError::Api(format!(
            "'{}' is not a notebook",
            path.display()
        )));
    }
    notebook::parse(&store.read(path)?)
}

#[derive(Debug, Clone)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// Chunk counts of a notebook that unpacked cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub primary_chunks: usize,
    /// Module name and chunk count, in registry order.
    pub modules: Vec<(String, usize)>,
    pub skipped_cells: usize,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub written_paths: Vec<PathBuf>,
    pub report: Option<VerifyReport>,
    pub config: Option<PyjuterConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_written_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.written_paths = paths;
        self
    }

    pub fn with_report(mut self, report: VerifyReport) -> Self {
        self.report = Some(report);
        self
    }

    pub fn with_config(mut self, config: PyjuterConfig) -> Self {
        self.config = Some(config);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("a/b.py")).unwrap(),
            SourceFormat::Source
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("nb.ipynb")).unwrap(),
            SourceFormat::Notebook
        );
        assert!(matches!(
            SourceFormat::from_path(Path::new("notes.txt")),
            Err(PyjuterError::Api(_))
        ));
        assert!(SourceFormat::from_path(Path::new("Makefile")).is_err());
    }

    #[test]
    fn test_load_notebook_rejects_source_files() {
        let store = InMemoryStore::new().with_file("a.py", "x = 1");
        assert!(matches!(
            load_notebook(&store, Path::new("a.py")),
            Err(PyjuterError::Api(_))
        ));
    }

    #[test]
    fn test_effective_config_prefers_project() {
        let project = tempfile::tempdir().unwrap();
        let global = tempfile::tempdir().unwrap();
        let mut config = PyjuterConfig::default();
        config.set("always-bootstrap", "true").unwrap();
        config.save(global.path()).unwrap();

        let paths = PyjuterPaths {
            project: Some(project.path().to_path_buf()),
            global: global.path().to_path_buf(),
        };
        assert!(paths.effective_config().unwrap().always_bootstrap);

        PyjuterConfig::default().save(project.path()).unwrap();
        assert!(!paths.effective_config().unwrap().always_bootstrap);
    }

    #[test]
    fn test_project_scope_unavailable() {
        let paths = PyjuterPaths {
            project: None,
            global: PathBuf::from("/tmp/global"),
        };
        assert!(paths.scope_dir(Scope::Project).is_err());
        assert_eq!(
            paths.scope_dir(Scope::Global).unwrap(),
            PathBuf::from("/tmp/global")
        );
    }
}
