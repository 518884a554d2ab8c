// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bundle driver
//!
//! Builds one shim through a [`BundleEngine`]. The engine API is
//! file-oriented: it writes the bundle into the configured output directory
//! and the driver reads it back.

use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::catalog::ShimModule;
use crate::error::{BuildError, Result};
use crate::externals::ExternalSet;

/// Compile-time substitutions applied to every shim
pub const DEFINES: &[(&str, &str)] = &[
    ("process.env.NODE_DEBUG", "\"false\""),
    ("process.env.READABLE_STREAM", "'enable'"),
    ("global", "globalThis"),
];

/// Platform the engine resolves for
pub const PLATFORM: &str = "node";

/// Output module format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFormat {
    /// ES modules
    Esm,
    /// CommonJS
    Cjs,
}

impl ModuleFormat {
    /// The stream shims call `require` synchronously and need CommonJS
    pub fn for_module(name: &str) -> Self {
        if name.contains("stream") {
            Self::Cjs
        } else {
            Self::Esm
        }
    }

    /// esbuild's name for the format
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Esm => "esm",
            Self::Cjs => "cjs",
        }
    }
}

impl fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the engine needs to build one shim
#[derive(Debug, Clone)]
pub struct BuildConfiguration {
    /// The shim being built
    pub module: ShimModule,
    /// Entry source file
    pub entry: PathBuf,
    /// Directory the engine writes into
    pub outdir: PathBuf,
    /// Output module format
    pub format: ModuleFormat,
    /// Expression substitutions
    pub define: BTreeMap<String, String>,
    /// Minify syntax
    pub minify_syntax: bool,
    /// Minify whitespace; identifiers are never renamed
    pub minify_whitespace: bool,
    /// Names left as unresolved imports
    pub externals: ExternalSet,
}

impl BuildConfiguration {
    /// Configuration for `module` with the standard define map and flags
    pub fn new(module: &ShimModule, entry: PathBuf, outdir: &Path, externals: ExternalSet) -> Self {
        Self {
            module: module.clone(),
            entry,
            outdir: outdir.to_path_buf(),
            format: ModuleFormat::for_module(&module.name),
            define: DEFINES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            minify_syntax: true,
            minify_whitespace: true,
            externals,
        }
    }

    /// Where the engine leaves the bundle
    pub fn output_path(&self) -> PathBuf {
        self.outdir.join(self.module.output_file())
    }
}

/// Raw engine output for one shim
#[derive(Debug, Clone)]
pub struct BundleResult {
    /// Logical module name
    pub module: String,
    /// Bundle text as emitted
    pub text: String,
}

/// A bundling engine
#[async_trait]
pub trait BundleEngine: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Bundle `config.entry` into `config.output_path()`
    async fn build(&self, config: &BuildConfiguration) -> Result<()>;
}

/// esbuild, driven through its command-line interface
#[derive(Debug, Clone)]
pub struct Esbuild {
    executable: PathBuf,
}

impl Esbuild {
    /// Use the esbuild executable at `executable` (looked up on `PATH` if bare)
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Command-line arguments for one build
    pub fn args(config: &BuildConfiguration) -> Vec<String> {
        let mut args = vec![
            config.entry.display().to_string(),
            "--bundle".to_string(),
            format!("--outfile={}", config.output_path().display()),
            format!("--format={}", config.format),
            format!("--platform={PLATFORM}"),
            "--log-level=warning".to_string(),
        ];

        if config.minify_syntax {
            args.push("--minify-syntax".to_string());
        }
        if config.minify_whitespace {
            args.push("--minify-whitespace".to_string());
        }

        args.extend(
            config
                .define
                .iter()
                .map(|(key, value)| format!("--define:{key}={value}")),
        );
        args.extend(config.externals.iter().map(|name| format!("--external:{name}")));

        args
    }
}

impl Default for Esbuild {
    fn default() -> Self {
        Self::new("esbuild")
    }
}

#[async_trait]
impl BundleEngine for Esbuild {
    fn name(&self) -> &str {
        "esbuild"
    }

    async fn build(&self, config: &BuildConfiguration) -> Result<()> {
        let output = Command::new(&self.executable)
            .args(Self::args(config))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                BuildError::engine(
                    &config.module.name,
                    format!("failed to run {}: {}", self.executable.display(), e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BuildError::engine(
                &config.module.name,
                format!(
                    "{} exited with {}: {}",
                    self.executable.display(),
                    output.status,
                    stderr.trim()
                ),
            ));
        }

        Ok(())
    }
}

/// Run the engine for one shim and read back what it wrote
#[instrument(skip_all, fields(module = %config.module.name, format = %config.format))]
pub async fn bundle(engine: &dyn BundleEngine, config: &BuildConfiguration) -> Result<BundleResult> {
    debug!(
        "Bundling {} with {} ({} externals)",
        config.entry.display(),
        engine.name(),
        config.externals.len()
    );

    engine.build(config).await?;

    let path = config.output_path();
    let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            BuildError::engine(
                &config.module.name,
                format!("{} produced no output at {}", engine.name(), path.display()),
            )
        } else {
            BuildError::io(&path, e)
        }
    })?;

    Ok(BundleResult {
        module: config.module.name.clone(),
        text,
    })
}
