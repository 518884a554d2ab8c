// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Shim module catalog
//!
//! Maps logical module names to the source files implementing them. A file's
//! logical name is its stem with every `.` turned into `/`, so
//! `fs.promises.js` implements `fs/promises`.
//!
//! Candidate files are sorted lexicographically before anything is resolved,
//! so the mapping never depends on the order the directory was listed in.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{BuildError, Result};

/// A shim implementing one host built-in module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimModule {
    /// Logical module name (`fs/promises`)
    pub name: String,
    /// Source file name inside the source directory (`fs.promises.js`)
    pub file: String,
}

impl ShimModule {
    /// Output file name; shims keep their source file name
    pub fn output_file(&self) -> &str {
        &self.file
    }
}

/// Derive the logical module name for a file, if it has a recognized extension
pub fn logical_name(file: &str, extensions: &[String]) -> Option<String> {
    extensions.iter().find_map(|ext| {
        let stem = file.strip_suffix(ext.as_str())?.strip_suffix('.')?;
        if stem.is_empty() {
            None
        } else {
            Some(stem.replace('.', "/"))
        }
    })
}

/// The set of shim modules in a source directory
#[derive(Debug, Clone)]
pub struct ModuleCatalog {
    source_dir: PathBuf,
    /// (logical name, file name), sorted by file name
    candidates: Vec<(String, String)>,
    modules: Vec<ShimModule>,
}

impl ModuleCatalog {
    /// Scan `source_dir` (non-recursively) for shim sources
    pub fn scan(source_dir: &Path, extensions: &[String]) -> Result<Self> {
        let entries = std::fs::read_dir(source_dir).map_err(|e| BuildError::io(source_dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BuildError::io(source_dir, e))?;
            let file_type = entry.file_type().map_err(|e| BuildError::io(entry.path(), e))?;
            if !file_type.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                files.push(name.to_string());
            }
        }

        Self::from_files(source_dir, files, extensions)
    }

    /// Build a catalog from an already-listed set of file names
    pub fn from_files<I, S>(source_dir: &Path, files: I, extensions: &[String]) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut files: Vec<String> = files.into_iter().map(Into::into).collect();
        files.sort();
        files.dedup();

        let candidates: Vec<(String, String)> = files
            .into_iter()
            .filter_map(|file| logical_name(&file, extensions).map(|name| (name, file)))
            .collect();

        let mut catalog = Self {
            source_dir: source_dir.to_path_buf(),
            candidates,
            modules: Vec::new(),
        };

        let mut names: Vec<&str> = catalog.candidates.iter().map(|(n, _)| n.as_str()).collect();
        names.sort();
        names.dedup();

        let mut modules = Vec::with_capacity(names.len());
        for name in names {
            let file = catalog.resolve(name)?;
            debug!("Catalogued shim {} -> {}", name, file);
            modules.push(ShimModule {
                name: name.to_string(),
                file: file.to_string(),
            });
        }
        catalog.modules = modules;

        Ok(catalog)
    }

    /// Resolve a logical module name to its source file name
    ///
    /// An exact match wins; otherwise the file whose logical name is the
    /// longest `/`-segment prefix of `name` serves it. Zero matches, or more
    /// than one file at the winning name, is an error.
    pub fn resolve(&self, name: &str) -> Result<&str> {
        let mut by_name: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (candidate, file) in &self.candidates {
            if is_segment_prefix(candidate, name) {
                by_name.entry(candidate.as_str()).or_default().push(file.as_str());
            }
        }

        let best = by_name
            .into_iter()
            .max_by_key(|(candidate, _)| candidate.len())
            .map(|(_, files)| files);

        match best.as_deref() {
            Some([file]) => Ok(*file),
            Some(files) if files.len() > 1 => Err(BuildError::unresolved(
                name,
                format!("ambiguous between {}", files.join(", ")),
            )),
            _ => Err(BuildError::unresolved(
                name,
                format!("no source file in {}", self.source_dir.display()),
            )),
        }
    }

    /// All catalogued shims, sorted by logical name
    pub fn modules(&self) -> &[ShimModule] {
        &self.modules
    }

    /// Logical names of all catalogued shims
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.name.as_str())
    }

    /// Directory the shim sources live in
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Path of a shim's source file
    pub fn entry_path(&self, module: &ShimModule) -> PathBuf {
        self.source_dir.join(&module.file)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn is_segment_prefix(prefix: &str, name: &str) -> bool {
    match name.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
