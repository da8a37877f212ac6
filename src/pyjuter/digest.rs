//! # Shim digests
//!
//! A digest records where a shim fragment sits inside a rendered cell
//! (its byte length and whether it was prepended or appended) and an
//! Adler-32 checksum of its bytes. Before a shim is stripped, the bytes at
//! the recorded position are checksummed again; any mismatch means the
//! shim region was edited or the cell no longer has the expected shape.
//!
//! Adler-32 is a fast corruption check. It is not a MAC and offers no
//! protection against deliberate forgery: anyone can edit a cell and
//! recompute the checksum.

use crate::error::{PyjuterError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a shim fragment is attached to the chunk it wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShimMode {
    Pre,
    Post,
}

impl ShimMode {
    /// Attach `fragment` to `source` in this position.
    pub fn attach(self, source: &str, fragment: &str) -> String {
        let mut out = String::with_capacity(source.len() + fragment.len());
        match self {
            ShimMode::Pre => {
                out.push_str(fragment);
                out.push_str(source);
            }
            ShimMode::Post => {
                out.push_str(source);
                out.push_str(fragment);
            }
        }
        out
    }
}

impl fmt::Display for ShimMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShimMode::Pre => write!(f, "pre"),
            ShimMode::Post => write!(f, "post"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShimDigest {
    /// Byte length of the fragment.
    pub len: usize,
    pub mode: ShimMode,
    /// Adler-32 of the fragment's bytes.
    pub sum: u32,
}

impl ShimDigest {
    pub fn compute(fragment: &str, mode: ShimMode) -> Self {
        Self {
            len: fragment.len(),
            mode,
            sum: checksum(fragment.as_bytes()),
        }
    }

    /// Check the shim recorded by this digest and return `source` without it.
    pub fn verify_and_strip<'a>(&self, source: &'a str) -> Result<&'a str> {
        let split = match self.mode {
            ShimMode::Pre => Some(self.len),
            ShimMode::Post => source.len().checked_sub(self.len),
        };
        let parts = split.and_then(|at| Some((source.get(..at)?, source.get(at..)?)));
        let Some((head, tail)) = parts else {
            return Err(PyjuterError::Integrity(format!(
                "{} shim of {} bytes does not fit a cell of {} bytes",
                self.mode,
                self.len,
                source.len()
            )));
        };

        let (shim, code) = match self.mode {
            ShimMode::Pre => (head, tail),
            ShimMode::Post => (tail, head),
        };

        let actual = checksum(shim.as_bytes());
        if actual != self.sum {
            return Err(PyjuterError::Integrity(format!(
                "{} shim checksum mismatch (expected {:#010x}, found {:#010x})",
                self.mode, self.sum, actual
            )));
        }
        Ok(code)
    }
}

/// Adler-32, identical to zlib's `adler32` with its default seed.
pub fn checksum(bytes: &[u8]) -> u32 {
    adler2::adler32_slice(bytes)
}
