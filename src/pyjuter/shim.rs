//! # Import shims
//!
//! An inlined chunk runs in the notebook's single global namespace. To keep
//! `import <name>` and `<name>.attr` working, its cell is rendered as
//!
//! ```text
//! <pre>   fetch (or create) the pseudo-module for <name> from the registry
//! <chunk> the chunk, unchanged
//! <post>  export the chunk's global names onto the pseudo-module
//! ```
//!
//! The names to export are found ahead of time by [`crate::scan`] and
//! written out explicitly, so nothing at runtime has to diff the global
//! scope. The registry skips listed names that are unbound when the chunk
//! finishes. Every name the shims introduce starts with [`RESERVED_PREFIX`],
//! and the scanner never exports names with that prefix.
//!
//! Both fragments are digested so that [`unwrap`] can later strip them and
//! recover the chunk exactly, or refuse if the shims were touched.

use crate::digest::{ShimDigest, ShimMode};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Prefix reserved for names introduced by generated code.
pub const RESERVED_PREFIX: &str = "_pyjuter_";

/// Digests of both fragments around one wrapped chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShimPair {
    pub pre: ShimDigest,
    pub post: ShimDigest,
}

/// A chunk rendered with its shims, plus what is needed to strip them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedChunk {
    pub source: String,
    pub shims: ShimPair,
}

fn pre_fragment_start() -> String {
    format!("{p}module = {p}registry.get (", p = RESERVED_PREFIX)
}

pub fn pre_fragment(module_name: &str) -> String {
    format!("{}'{}')\n\n", pre_fragment_start(), module_name)
}

/// Whether `source` opens with a pre fragment.
pub fn starts_with_pre(source: &str) -> bool {
    source.starts_with(&pre_fragment_start())
}

pub fn post_fragment<S: AsRef<str>>(exports: &[S]) -> String {
    let args: String = exports
        .iter()
        .map(|name| format!(", '{}'", name.as_ref()))
        .collect();
    format!(
        "\n{p}registry.export ({p}module{args})\n",
        p = RESERVED_PREFIX
    )
}

/// Wrap `source` as part of pseudo-module `module_name`, exporting `exports`.
pub fn wrap<S: AsRef<str>>(source: &str, module_name: &str, exports: &[S]) -> WrappedChunk {
    let pre = pre_fragment(module_name);
    let post = post_fragment(exports);
    let rendered = ShimMode::Post.attach(&ShimMode::Pre.attach(source, &pre), &post);
    WrappedChunk {
        source: rendered,
        shims: ShimPair {
            pre: ShimDigest::compute(&pre, ShimMode::Pre),
            post: ShimDigest::compute(&post, ShimMode::Post),
        },
    }
}

/// Strip both shims from a rendered cell, verifying each digest first.
pub fn unwrap<'a>(rendered: &'a str, shims: &ShimPair) -> Result<&'a str> {
    let without_pre = shims.pre.verify_and_strip(rendered)?;
    shims.post.verify_and_strip(without_pre)
}
