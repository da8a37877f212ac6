//! # Storage Layer
//!
//! Conversions read and write whole text files. The [`SourceStore`] trait
//! keeps that behind a seam so the command layer can be exercised without
//! touching the filesystem.
//!
//! ## Implementations
//!
//! - [`fs::FileStore`]: production storage, paths resolved against a root
//!   directory (the working directory for the CLI)
//! - [`memory::InMemoryStore`]: a path-to-text map for tests

use crate::error::Result;
use std::path::Path;

pub mod fs;
pub mod memory;

/// Abstract interface for reading and writing source documents.
pub trait SourceStore {
    /// Read the full text at `path`
    fn read(&self, path: &Path) -> Result<String>;

    /// Replace the text at `path`, creating parent directories as needed
    fn write(&mut self, path: &Path, content: &str) -> Result<()>;
}
