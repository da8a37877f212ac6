use clap::Parser;
use directories::ProjectDirs;
use pyjuter::api::{ConfigAction, InlineSpec, PyjuterApi, PyjuterPaths, Scope};
use pyjuter::error::{PyjuterError, Result};
use pyjuter::store::fs::FileStore;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod args;
mod cli;
use args::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut api = init_api()?;

    match cli.command {
        Commands::Convert {
            input,
            output,
            inlines,
        } => handle_convert(&mut api, &input, &output, &inlines),
        Commands::Unpack {
            input,
            output_dir,
            main,
        } => handle_unpack(&mut api, &input, &output_dir, main.as_deref()),
        Commands::Verify { input } => handle_verify(&api, &input),
        Commands::Config { key, value, global } => handle_config(&api, key, value, global),
    }
}

/// `RUST_LOG` wins when set; otherwise warnings only, or debug with `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "pyjuter=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn init_api() -> Result<PyjuterApi<FileStore>> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let proj_dirs = ProjectDirs::from("com", "pyjuter", "pyjuter").ok_or_else(|| {
        PyjuterError::Config("Could not determine the global config directory".to_string())
    })?;

    let paths = PyjuterPaths {
        project: Some(cwd.join(".pyjuter")),
        global: proj_dirs.data_dir().to_path_buf(),
    };
    Ok(PyjuterApi::new(FileStore::new(cwd), paths))
}

fn handle_convert(
    api: &mut PyjuterApi<FileStore>,
    input: &Path,
    output: &Path,
    inlines: &[InlineSpec],
) -> Result<()> {
    let result = api.convert(input, output, inlines)?;
    cli::print_messages(&result.messages);
    Ok(())
}

fn handle_unpack(
    api: &mut PyjuterApi<FileStore>,
    input: &Path,
    output_dir: &Path,
    main: Option<&Path>,
) -> Result<()> {
    let result = api.unpack(input, output_dir, main)?;
    cli::print_messages(&result.messages);
    Ok(())
}

fn handle_verify(api: &PyjuterApi<FileStore>, input: &Path) -> Result<()> {
    let result = api.verify(input)?;
    cli::print_messages(&result.messages);
    if let Some(report) = &result.report {
        cli::print_report(report);
    }
    Ok(())
}

fn handle_config(
    api: &PyjuterApi<FileStore>,
    key: Option<String>,
    value: Option<String>,
    global: bool,
) -> Result<()> {
    let scope = if global { Scope::Global } else { Scope::Project };
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(k), None) => ConfigAction::ShowKey(k),
        (Some(k), Some(v)) => ConfigAction::Set(k, v),
    };

    let result = api.config(scope, action)?;
    if let Some(config) = &result.config {
        if result.messages.is_empty() {
            cli::print_config(config);
        }
    }
    cli::print_messages(&result.messages);

    let failed = result
        .messages
        .iter()
        .any(|m| matches!(m.level, pyjuter::api::MessageLevel::Error));
    if failed {
        std::process::exit(1);
    }
    Ok(())
}
