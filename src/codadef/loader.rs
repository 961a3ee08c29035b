// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Definition-path loading (§4.6 C6, §6 "definition-path setter").
//!
//! `coda_set_definition_path` takes a PATH-like list of codadef archives
//! and directories to scan for `*.codadef` files; this mirrors that as a
//! process-wide [`Dictionary`] filled by [`load_definition_path`]. Each
//! codadef is a ZIP archive of one XML file per product class.

use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::bitio::{ByteSource, FileSource};
use crate::core::{CodaError, Options, Result};
use crate::zip::ZipArchive;

use super::xml::{build_product_class, parse_xml_tree};
use super::Dictionary;

static DICTIONARY: OnceLock<Dictionary> = OnceLock::new();

/// The process-wide dictionary definitions are loaded into. Always present
/// (possibly empty) so native backends can consult it without every caller
/// having called [`load_definition_path`] first.
pub fn global() -> &'static Dictionary {
    DICTIONARY.get_or_init(Dictionary::new)
}

/// Parse and register every product class in one codadef ZIP archive.
pub fn load_archive(source: Arc<dyn ByteSource>) -> Result<usize> {
    let archive = ZipArchive::open(source)?;
    let mut loaded = 0;
    for entry in archive.entries() {
        if !entry.name().ends_with(".xml") {
            continue;
        }
        let data = archive.read_entry(entry)?;
        let tree = parse_xml_tree(&data)?;
        let class = build_product_class(&tree)?;
        debug!(class = %class.name, revision = class.revision, member = entry.name(), "loading product class");
        global().register(class)?;
        loaded += 1;
    }
    Ok(loaded)
}

/// Load one codadef file from disk into the global dictionary.
pub fn load_definition_file(path: &Path) -> Result<usize> {
    let source: Arc<dyn ByteSource> = Arc::new(FileSource::open(path, Options::current().use_mmap)?);
    load_archive(source)
}

/// The OS-specific separator `coda_set_definition_path`'s PATH-like list
/// uses: `:` on POSIX, `;` on Windows.
#[cfg(windows)]
const PATH_SEPARATOR: char = ';';
#[cfg(not(windows))]
const PATH_SEPARATOR: char = ':';

/// Load every codadef reachable from `path_list`: entries are files (loaded
/// directly) or directories (scanned, non-recursively, for `*.codadef`
/// members). Returns the total number of product classes registered.
pub fn load_definition_path(path_list: &str) -> Result<usize> {
    let mut total = 0;
    for entry in path_list.split(PATH_SEPARATOR).filter(|s| !s.is_empty()) {
        let path = Path::new(entry);
        if path.is_dir() {
            let read_dir = fs::read_dir(path).map_err(|e| CodaError::FileOpen {
                path: entry.to_string(),
                message: e.to_string(),
            })?;
            for dir_entry in read_dir {
                let dir_entry = dir_entry.map_err(|e| CodaError::FileOpen {
                    path: entry.to_string(),
                    message: e.to_string(),
                })?;
                let file_path = dir_entry.path();
                if file_path.extension().and_then(|ext| ext.to_str()) == Some("codadef") {
                    total += load_definition_file(&file_path)?;
                }
            }
        } else if path.is_file() {
            total += load_definition_file(path)?;
        } else {
            warn!(entry, "definition path entry is neither a file nor a directory");
        }
    }
    Ok(total)
}

/// Register a single pre-built class without touching the filesystem, used
/// by tests that construct a codadef in memory instead of as a ZIP.
#[cfg(test)]
pub fn load_bytes(data: Vec<u8>) -> Result<usize> {
    load_archive(Arc::new(crate::bitio::MemorySource::new(data)))
}
