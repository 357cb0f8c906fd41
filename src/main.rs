mod cleanup;
mod cli;
mod discovery;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use std::path::PathBuf;
use std::process::ExitCode;
use tangle_core::Document;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "tangle=debug" } else { "tangle=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Expand the CLI's positional paths into a concrete list of document files.
/// A directory argument (or no arguments at all) is searched recursively for
/// `.org` files; a file argument is used as-is.
fn resolve_input_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    if paths.is_empty() {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        return discovery::discover(&cwd);
    }

    let mut found = Vec::new();
    for p in paths {
        if p.is_dir() {
            found.extend(discovery::discover(p));
        } else {
            found.push(p.clone());
        }
    }
    found
}

fn read_documents(paths: &[PathBuf]) -> Vec<Document> {
    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        match std::fs::read_to_string(path) {
            Ok(text) => docs.push(Document {
                path: path.clone(),
                text,
            }),
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "failed to read document, skipping");
            }
        }
    }
    docs
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match try_main(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "uncaught failure");
            ExitCode::from(1)
        }
    }
}

fn try_main(cli: Cli) -> anyhow::Result<ExitCode> {
    let input_paths = resolve_input_paths(&cli.paths);
    if input_paths.is_empty() {
        tracing::error!("no input documents discovered");
        return Ok(ExitCode::from(1));
    }

    let documents = read_documents(&input_paths);
    if documents.is_empty() {
        tracing::error!("no input documents could be read");
        return Ok(ExitCode::from(1));
    }

    let result = tangle_core::run(&documents);

    if cli.verbose {
        for (path, count) in &result.blocks_per_document {
            tracing::debug!(path = %path.display(), blocks = count, "scanned document");
        }
    }

    if cli.dry_run {
        for target in &result.targets {
            tracing::info!(
                path = %target.output_path.display(),
                bytes = target.bytes.len(),
                blocks = target.block_count,
                "would write target (dry run)"
            );
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut any_write_failed = false;
    for target in &result.targets {
        match write_target(&target.output_path, &target.bytes)
            .with_context(|| format!("writing target {}", target.output_path.display()))
        {
            Ok(()) => {
                if cli.verbose {
                    tracing::info!(path = %target.output_path.display(), bytes = target.bytes.len(), "wrote target");
                }
            }
            Err(err) => {
                any_write_failed = true;
                tracing::error!(error = %err, "failed to write target");
            }
        }
    }

    if !cli.no_clean {
        let removed = cleanup::clean(&cli.out_dir);
        if removed > 0 {
            tracing::info!(count = removed, out_dir = %cli.out_dir.display(), "removed stale cache files");
        }
    }

    Ok(if any_write_failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn write_target(path: &std::path::Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)
}
