// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # codafind
//!
//! Walks a directory tree, recognizes each file's product format/class/type,
//! and optionally filters the results by a boolean expression evaluated
//! against a cursor over the recognized file. A thin interface over
//! [`coda::Product::recognize_file`] and the expression engine, not the
//! upstream tool's full option surface (recursive exclude globs, custom
//! output templates) - those remain out of scope.
//!
//! ```sh
//! codafind -e 'definitionpath' data/
//! codafind --filter '/0/grib1/center == 98' data/
//! ```

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use coda::{codadef, expr, Product};

#[derive(Parser)]
#[command(name = "codafind")]
#[command(about = "Recognize and optionally filter products under a directory", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Directory (or single file) to search
    path: PathBuf,
    /// A definition-path list to load before recognizing files
    #[arg(short = 'D', long = "definitionpath")]
    definition_path: Option<String>,
    /// Only print files whose recognized product satisfies this expression
    #[arg(short = 'e', long)]
    filter: Option<String>,
    /// Install verbose (debug-level) logging
    #[arg(short = 'V', long)]
    verbose: bool,
}

fn install_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .try_init();
}

fn matches_filter(path: &Path, filter: &str) -> Result<bool> {
    let expression = expr::parse(filter).with_context(|| format!("parsing filter expression '{filter}'"))?;
    let product = Product::open(path).with_context(|| format!("opening {}", path.display()))?;
    let cursor = product.cursor();
    match expr::eval(&expression, Some(&cursor))? {
        expr::Value::Bool(value) => Ok(value),
        other => Err(anyhow::anyhow!("filter expression did not evaluate to a boolean (got {other:?})")),
    }
}

fn walk(dir: &Path, filter: Option<&str>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("{}: {e}", dir.display());
            return;
        }
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        match entry.file_type() {
            Ok(ft) if ft.is_dir() => walk(&path, filter),
            Ok(ft) if ft.is_file() => visit(&path, filter),
            _ => {}
        }
    }
}

fn visit(path: &Path, filter: Option<&str>) {
    match Product::recognize_file(path) {
        Ok(recognized) => {
            if let Some(filter) = filter {
                match matches_filter(path, filter) {
                    Ok(true) => {}
                    Ok(false) => return,
                    Err(e) => {
                        eprintln!("{}: {e:#}", path.display());
                        return;
                    }
                }
            }
            println!(
                "{}: format={} class={} type={} version={}",
                path.display(),
                recognized.format,
                recognized.class_name.as_deref().unwrap_or("-"),
                recognized.type_name.as_deref().unwrap_or("-"),
                recognized.version.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()),
            );
        }
        Err(e) => eprintln!("{}: {e}", path.display()),
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    install_logging(cli.verbose);

    if let Some(definition_path) = &cli.definition_path {
        let loaded = codadef::load_definition_path(definition_path)
            .with_context(|| format!("loading definition path '{definition_path}'"))?;
        tracing::debug!(loaded, "loaded product classes");
    }

    if cli.path.is_file() {
        visit(&cli.path, cli.filter.as_deref());
    } else {
        walk(&cli.path, cli.filter.as_deref());
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("codafind: {e:#}");
        process::exit(2);
    }
}
