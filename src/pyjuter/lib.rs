//! # Pyjuter Architecture
//!
//! Pyjuter converts between flat Python source and Jupyter notebooks, and
//! can merge ("inline") several source files into one notebook whose cells
//! still behave as separate importable modules when run top to bottom.
//! The library knows nothing about terminals; the `pyjuter` binary is one
//! client of it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (main.rs, args.rs, cli/)                         │
//! │  - Parses arguments, prints results, sets the exit code     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands, resolves configuration        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - convert, unpack, verify, config                          │
//! │  - Reads and writes through a SourceStore                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Core                                                       │
//! │  chunker → module ← shim ← digest                           │
//! │              │        ↑                                     │
//! │              │      scan, registry                          │
//! │              ▼                                              │
//! │          notebook, restore                                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Round Trips
//!
//! Source is split into chunks at a blank line followed by an unindented
//! line ([`chunker`]); joining the chunks with `\n` gives the source back
//! byte for byte. Each chunk becomes one code cell.
//!
//! An inlined module's chunks are wrapped in a pre shim that selects the
//! pseudo-module from the runtime registry and a post shim that exports the
//! names the chunk binds globally into it ([`shim`], [`scan`]). A digest of each
//! shim is stored in the cell metadata ([`digest`]), which is what lets
//! [`restore::unpack`] strip the shims again and refuse notebooks whose
//! shims were edited.
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code takes Rust values, returns
//! `Result<CmdResult>` or domain types, and never prints or exits. Logging
//! goes through `tracing`; the binary decides where it ends up.
//!
//! ## Testing Strategy
//!
//! 1. **Core and commands**: unit tests next to the code; commands run
//!    against [`store::memory::InMemoryStore`].
//! 2. **API**: dispatch tests.
//! 3. **CLI**: end-to-end tests in `tests/` driving the built binary.

pub mod api;
pub mod chunker;
pub mod commands;
pub mod config;
pub mod digest;
pub mod error;
pub mod module;
pub mod notebook;
pub mod registry;
pub mod restore;
pub mod scan;
pub mod shim;
pub mod store;
