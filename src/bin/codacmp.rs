// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # codacmp
//!
//! Structural comparator for two products: walks both dynamic-type trees
//! in lock-step and reports the paths where they differ (missing fields,
//! different array lengths, different scalar values). This is a thin
//! interface over the library's cursor API, not a reimplementation of the
//! upstream tool's full option surface (pattern excludes, tolerance
//! thresholds, parameter lists) - those remain out of scope.
//!
//! ```sh
//! codacmp reference.grib candidate.grib
//! ```

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use coda::core::TypeClass;
use coda::{Cursor, Product};

#[derive(Parser)]
#[command(name = "codacmp")]
#[command(about = "Compare the structure and values of two products", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// First product to compare
    reference: PathBuf,
    /// Second product to compare
    candidate: PathBuf,
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

/// Compare two cursors positioned at equivalent nodes, recursing into
/// records and arrays and reporting the path of every difference found.
fn compare(path: &str, a: &mut Cursor, b: &mut Cursor, diffs: &mut Vec<String>) -> Result<()> {
    let class_a = a.get_type_class()?;
    let class_b = b.get_type_class()?;
    if class_a != class_b {
        diffs.push(format!("{path}: type class differs ({class_a:?} vs {class_b:?})"));
        return Ok(());
    }

    match class_a {
        TypeClass::Record => {
            a.goto_first_record_field()?;
            b.goto_first_record_field()?;
            loop {
                let index = a.get_index()?;
                let field_path = format!("{path}/{index}");
                compare(&field_path, a, b, diffs)?;
                let has_next_a = a.goto_next_record_field().is_ok();
                let has_next_b = b.goto_next_record_field().is_ok();
                if !has_next_a || !has_next_b {
                    if has_next_a != has_next_b {
                        diffs.push(format!("{path}: differing number of record fields"));
                    }
                    break;
                }
            }
            a.goto_parent()?;
            b.goto_parent()?;
        }
        TypeClass::Array => {
            let num_a = a.get_num_elements()?;
            let num_b = b.get_num_elements()?;
            if num_a != num_b {
                diffs.push(format!("{path}: array length differs ({num_a} vs {num_b})"));
                return Ok(());
            }
            for index in 0..num_a {
                a.goto_array_element_by_index(index)?;
                b.goto_array_element_by_index(index)?;
                compare(&format!("{path}[{index}]"), a, b, diffs)?;
                a.goto_parent()?;
                b.goto_parent()?;
            }
        }
        _ => {
            let value_a = a.read_value()?;
            let value_b = b.read_value()?;
            if value_a != value_b {
                diffs.push(format!("{path}: {value_a:?} != {value_b:?}"));
            }
        }
    }
    Ok(())
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    install_logging(cli.verbose);

    let reference = Product::open(&cli.reference)
        .with_context(|| format!("opening {}", cli.reference.display()))?;
    let candidate = Product::open(&cli.candidate)
        .with_context(|| format!("opening {}", cli.candidate.display()))?;

    let mut a = reference.cursor();
    let mut b = candidate.cursor();
    let mut diffs = Vec::new();
    compare("", &mut a, &mut b, &mut diffs)?;

    if diffs.is_empty() {
        println!("no differences found");
    } else {
        for diff in &diffs {
            println!("{diff}");
        }
    }
    process::exit(if diffs.is_empty() { 0 } else { 1 });
}

fn main() {
    if let Err(e) = run() {
        eprintln!("codacmp: {e:#}");
        process::exit(2);
    }
}
