//! Offline bulk export/import tool for an `ldif-store` backend: the
//! `entrystore-tool` binary fronting [`ldif_store::tool`]'s cursor and
//! import path.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ldif_store::backend::Backend;
use ldif_store::config::Config;
use ldif_store::dn::Dn;
use ldif_store::error::{Error, Result};
use ldif_store::hooks::EntryCodec;
use ldif_store::tool::{self, ToolCursor};

#[derive(Parser, Debug)]
#[command(name = "entrystore-tool", about = "Offline bulk export/import for an ldif-store backend")]
struct Cli {
    /// Filesystem directory the backend is rooted at.
    #[arg(long)]
    directory: PathBuf,

    /// The backend's configured suffix DN.
    #[arg(long)]
    suffix: String,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dump every entry under the suffix, blank-line separated, to a file
    /// (or stdout if `out` is omitted).
    Export {
        /// Destination file; defaults to stdout.
        out: Option<PathBuf>,
    },
    /// Load every entry from a dump file produced by `export`.
    Import {
        /// Dump file to read.
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
            .add_directive("entrystore_tool=info".parse().expect("valid log directive"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("entrystore-tool: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::from_directory(cli.directory)?;
    let suffix = Dn::parse(&cli.suffix);
    let backend = Backend::open(config, suffix)?;

    match cli.command {
        Command::Export { out } => export(&backend, out),
        Command::Import { input } => import(&backend, &input),
    }
}

/// Walk the whole backend via [`ToolCursor`] and write every entry's
/// codec-encoded form, blank-line separated, to `out` (or stdout).
fn export(backend: &Backend, out: Option<PathBuf>) -> Result<()> {
    let mut cursor = ToolCursor::open(backend);

    let mut ids = Vec::new();
    if let Some(first_id) = cursor.first()? {
        ids.push(first_id);
        while let Some(id) = cursor.next() {
            ids.push(id);
        }
    }

    let mut text = String::new();
    for (index, id) in ids.into_iter().enumerate() {
        let entry = cursor
            .get(id)
            .expect("id returned by the cursor must still be present");
        if index > 0 {
            text.push('\n');
        }
        let bytes = backend.codec().encode(&entry);
        text.push_str(&String::from_utf8_lossy(&bytes));
    }

    match out {
        Some(path) => fs::write(&path, text)
            .map_err(|e| Error::Other(format!("writing {}: {e}", path.display()))),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

/// Read `input`, split it on blank lines into entry blocks, decode each,
/// and [`tool::import`] it.
fn import(backend: &Backend, input: &PathBuf) -> Result<()> {
    let text = fs::read_to_string(input)
        .map_err(|e| Error::Other(format!("reading {}: {e}", input.display())))?;

    let mut imported = 0usize;
    for block in text.split("\n\n") {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        let entry = backend.codec().decode(block.as_bytes())?;
        tool::import(backend, entry)?;
        imported += 1;
    }
    eprintln!("imported {imported} entries");
    Ok(())
}
