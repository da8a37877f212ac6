//! # API Facade
//!
//! The API layer is a thin facade over the command layer and the single
//! entry point for pyjuter operations, whatever the UI.
//!
//! It dispatches to the command functions, resolves the configuration that
//! applies to a call, and returns `Result<CmdResult>`. It does no business
//! logic of its own and never prints.
//!
//! ## Generic Over SourceStore
//!
//! `PyjuterApi<S: SourceStore>` is generic over file access:
//! - Production: `PyjuterApi<FileStore>`
//! - Testing: `PyjuterApi<InMemoryStore>`
//!
//! API tests check that calls reach the right command with the right
//! arguments; command behaviour is tested in the command modules.

use crate::commands;
use crate::error::Result;
use crate::store::SourceStore;
use std::path::Path;

/// The main API facade for pyjuter operations.
pub struct PyjuterApi<S: SourceStore> {
    store: S,
    paths: commands::PyjuterPaths,
}

impl<S: SourceStore> PyjuterApi<S> {
    pub fn new(store: S, paths: commands::PyjuterPaths) -> Self {
        Self { store, paths }
    }

    /// Convert `input` to `output`, inlining `inlines` in the given order.
    pub fn convert(
        &mut self,
        input: &Path,
        output: &Path,
        inlines: &[commands::convert::InlineSpec],
    ) -> Result<commands::CmdResult> {
        let config = self.paths.effective_config()?;
        commands::convert::run(&mut self.store, &config, input, output, inlines)
    }

    pub fn unpack(
        &mut self,
        input: &Path,
        output_dir: &Path,
        main: Option<&Path>,
    ) -> Result<commands::CmdResult> {
        commands::unpack::run(&mut self.store, input, output_dir, main)
    }

    pub fn verify(&self, input: &Path) -> Result<commands::CmdResult> {
        commands::verify::run(&self.store, input)
    }

    pub fn config(
        &self,
        scope: commands::Scope,
        action: ConfigAction,
    ) -> Result<commands::CmdResult> {
        commands::config::run(&self.paths, scope, action)
    }

    pub fn paths(&self) -> &commands::PyjuterPaths {
        &self.paths
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

pub use commands::config::ConfigAction;
pub use commands::convert::InlineSpec;
pub use commands::{
    CmdMessage, CmdResult, MessageLevel, PyjuterPaths, Scope, SourceFormat, VerifyReport,
};
