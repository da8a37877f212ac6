use clap::{Parser, Subcommand};
use once_cell::sync::Lazy;
use pyjuter::api::InlineSpec;
use std::path::PathBuf;

/// "0.3.0" for releases, "0.3.0@abc1234" for builds off a tag or with local changes.
static VERSION: Lazy<String> = Lazy::new(|| {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    if IS_RELEASE == "true" || GIT_HASH.is_empty() {
        VERSION.to_string()
    } else {
        format!("{}@{}", VERSION, GIT_HASH)
    }
});

#[derive(Parser, Debug)]
#[command(name = "pyjuter", bin_name = "pyjuter", version = VERSION.as_str())]
#[command(
    about = "Convert Python source to Jupyter notebooks and back, inlining modules as importable cells",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert between .py and .ipynb (format chosen by extension)
    Convert {
        /// File to read
        #[arg(short, long)]
        input: PathBuf,

        /// File to write
        #[arg(short, long)]
        output: PathBuf,

        /// Inline a module as NAME=FILE; repeatable, applied in order
        #[arg(long = "inline", value_name = "NAME=FILE", value_parser = parse_inline)]
        inlines: Vec<InlineSpec>,
    },

    /// Split a notebook back into its primary file and inlined modules
    Unpack {
        /// Notebook to read
        #[arg(short, long)]
        input: PathBuf,

        /// Directory module files are written under
        #[arg(short = 'd', long, default_value = ".")]
        output_dir: PathBuf,

        /// Where to write the primary module (default: <notebook stem>.py in the output dir)
        #[arg(short, long)]
        main: Option<PathBuf>,
    },

    /// Check every shim digest in a notebook without writing anything
    Verify {
        /// Notebook to check
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Get or set configuration
    Config {
        /// Configuration key (e.g. always-bootstrap)
        key: Option<String>,

        /// Value to set
        value: Option<String>,

        /// Use the global configuration instead of the project one
        #[arg(short, long)]
        global: bool,
    },
}

fn parse_inline(s: &str) -> Result<InlineSpec, String> {
    s.parse().map_err(|e: pyjuter::error::PyjuterError| e.to_string())
}
