// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Build orchestration
//!
//! Every shim is bundled, sanitized and validated as one future; the futures
//! run concurrently and a failure in one does not cancel the others. Output
//! is only written once every shim has passed, so a failed build leaves the
//! output directory untouched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use crate::builtins::Builtins;
use crate::bundler::{bundle, BuildConfiguration, BundleEngine, ModuleFormat};
use crate::catalog::{ModuleCatalog, ShimModule};
use crate::error::{BuildError, Result};
use crate::externals::ExternalSet;
use crate::sanitize::sanitize;
use crate::validate::validate;

/// A shim that passed validation
#[derive(Debug, Clone)]
pub struct BuiltShim {
    /// The shim
    pub module: ShimModule,
    /// Format it was bundled in
    pub format: ModuleFormat,
    /// Sanitized, validated bundle text
    pub text: String,
}

/// Outcome of a successful build
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Directory the shims were written to
    pub out_dir: PathBuf,
    /// Built shims, sorted by logical name
    pub shims: Vec<BuiltShim>,
}

impl BuildReport {
    /// Total bytes written
    pub fn bytes_written(&self) -> usize {
        self.shims.iter().map(|s| s.text.len()).sum()
    }
}

/// Builds every shim in a catalog
pub struct ShimBuilder {
    catalog: Arc<ModuleCatalog>,
    builtins: Arc<Builtins>,
    engine: Arc<dyn BundleEngine>,
    concurrency: usize,
}

impl ShimBuilder {
    /// Create a builder
    pub fn new(catalog: ModuleCatalog, builtins: Builtins, engine: Arc<dyn BundleEngine>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            builtins: Arc::new(builtins),
            engine,
            concurrency: num_cpus::get(),
        }
    }

    /// Limit how many shims are bundled at once
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// The catalog being built
    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    /// Engine configuration for one shim, writing into `outdir`
    pub fn configuration(&self, module: &ShimModule, outdir: &Path) -> BuildConfiguration {
        let externals = ExternalSet::for_catalog(&module.name, &self.builtins, &self.catalog);
        BuildConfiguration::new(module, self.catalog.entry_path(module), outdir, externals)
    }

    /// Configurations for every shim, without building anything
    pub fn plan(&self, outdir: &Path) -> Vec<BuildConfiguration> {
        self.catalog
            .modules()
            .iter()
            .map(|module| self.configuration(module, outdir))
            .collect()
    }

    /// Bundle, sanitize and validate one shim, with raw output in `staging`
    pub async fn build_module(&self, module: &ShimModule, staging: &Path) -> Result<BuiltShim> {
        let config = self.configuration(module, staging);
        debug!(
            "{}: {} built-ins legal as imports",
            module.name,
            config.externals.legal().count()
        );

        let raw = bundle(self.engine.as_ref(), &config).await?;
        let text = sanitize(&raw.text);
        validate(&raw.module, &text)?;

        info!("Built {} ({}, {} bytes)", module.name, config.format, text.len());

        Ok(BuiltShim {
            module: module.clone(),
            format: config.format,
            text,
        })
    }

    /// Build every shim and write the results into `out_dir`
    ///
    /// Waits for all shims even after one fails, then returns the first
    /// failure observed. Nothing is written unless every shim succeeded.
    pub async fn build_all(&self, out_dir: &Path) -> Result<BuildReport> {
        if self.catalog.is_empty() {
            warn!("No shims found in {}", self.catalog.source_dir().display());
        }

        tokio::fs::create_dir_all(out_dir)
            .await
            .map_err(|e| BuildError::io(out_dir, e))?;

        let staging = tempfile::Builder::new()
            .prefix(".fallbacks-")
            .tempdir_in(out_dir)
            .map_err(|e| BuildError::io(out_dir, e))?;

        info!(
            "Building {} shims with {} (concurrency {})",
            self.catalog.len(),
            self.engine.name(),
            self.concurrency
        );

        let results: Vec<Result<BuiltShim>> = stream::iter(self.catalog.modules())
            .map(|module| self.build_module(module, staging.path()))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut shims = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(shim) => shims.push(shim),
                Err(e) => {
                    error!("{}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        shims.sort_by(|a, b| a.module.name.cmp(&b.module.name));
        persist(&shims, staging.path(), out_dir).await?;

        staging.close().map_err(|e| BuildError::io(out_dir, e))?;

        Ok(BuildReport {
            out_dir: out_dir.to_path_buf(),
            shims,
        })
    }
}

/// Write final texts into `staging`, then move them into `out_dir`
///
/// Every write and every destination check happens before the first rename,
/// so a failure leaves `out_dir` as it was.
async fn persist(shims: &[BuiltShim], staging: &Path, out_dir: &Path) -> Result<()> {
    for shim in shims {
        let staged = staging.join(shim.module.output_file());
        tokio::fs::write(&staged, &shim.text)
            .await
            .map_err(|e| BuildError::io(&staged, e))?;

        let dest = out_dir.join(shim.module.output_file());
        match tokio::fs::symlink_metadata(&dest).await {
            Ok(meta) if !meta.is_file() => {
                return Err(BuildError::io(
                    &dest,
                    std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        "output path exists and is not a regular file",
                    ),
                ));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(BuildError::io(&dest, e)),
        }
    }

    for shim in shims {
        let staged = staging.join(shim.module.output_file());
        let dest = out_dir.join(shim.module.output_file());
        tokio::fs::rename(&staged, &dest)
            .await
            .map_err(|e| BuildError::io(&dest, e))?;
    }

    Ok(())
}
