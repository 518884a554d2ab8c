// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Build configuration
//!
//! Layered: defaults, then `fallbacks.toml`, then `FALLBACKS_*` environment
//! variables. The CLI applies its own flags on top.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::builtins::Builtins;
use crate::error::{BuildError, Result};

/// Config file looked up in the source directory
pub const CONFIG_FILE: &str = "fallbacks.toml";

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "FALLBACKS_";

/// Shim build configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the shim sources
    pub source_dir: PathBuf,

    /// Recognized source extensions, without the dot
    pub extensions: Vec<String>,

    /// esbuild executable
    pub esbuild: PathBuf,

    /// Newline-delimited built-in module list; the compiled-in Node.js list
    /// when unset
    pub builtins: Option<PathBuf>,

    /// Modules bundled at once
    pub concurrency: usize,

    /// Log filter used when `RUST_LOG` is unset
    pub loglevel: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            extensions: vec!["js".to_string()],
            esbuild: PathBuf::from("esbuild"),
            builtins: None,
            concurrency: num_cpus::get(),
            loglevel: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration for shims in `source_dir`
    ///
    /// An explicit `config_file` must exist; otherwise `fallbacks.toml` in
    /// `source_dir` is used when present.
    pub fn load(source_dir: &Path, config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => {
                let discovered = source_dir.join(CONFIG_FILE);
                if discovered.is_file() {
                    Self::from_file(&discovered)?
                } else {
                    Self::default()
                }
            }
        };

        if config.source_dir == Path::new(".") {
            config.source_dir = source_dir.to_path_buf();
        }

        config.apply_env(std::env::vars())?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        Self::from_toml(&content)
            .map_err(|e| BuildError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| BuildError::Config(e.to_string()))
    }

    /// Apply `FALLBACKS_*` variables from `vars`
    pub fn apply_env<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                self.set(&config_key.to_lowercase(), &value)?;
            }
        }
        Ok(())
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "source_dir" => self.source_dir = PathBuf::from(value),
            "extensions" => {
                self.extensions = value
                    .split(',')
                    .map(|ext| ext.trim().trim_start_matches('.').to_string())
                    .filter(|ext| !ext.is_empty())
                    .collect();
            }
            "esbuild" => self.esbuild = PathBuf::from(value),
            "builtins" => self.builtins = Some(PathBuf::from(value)),
            "concurrency" => {
                self.concurrency = value.parse().map_err(|_| {
                    BuildError::Config(format!("concurrency must be a number, got '{value}'"))
                })?;
            }
            "loglevel" => self.loglevel = value.to_string(),
            _ => return Err(BuildError::Config(format!("unknown key '{key}'"))),
        }
        Ok(())
    }

    /// Check values that would otherwise fail later, mid-build
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(BuildError::Config("concurrency must be at least 1".into()));
        }
        if self.extensions.is_empty() {
            return Err(BuildError::Config("no source extensions configured".into()));
        }
        if let Some(ext) = self.extensions.iter().find(|e| e.starts_with('.')) {
            return Err(BuildError::Config(format!(
                "extension '{ext}' must be given without a leading dot"
            )));
        }
        Ok(())
    }

    /// The host built-in list this configuration names
    pub fn builtins(&self) -> Result<Builtins> {
        match &self.builtins {
            Some(path) => Builtins::from_file(path),
            None => Ok(Builtins::node()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.extensions, vec!["js"]);
        assert_eq!(config.esbuild, PathBuf::from("esbuild"));
        assert!(config.concurrency >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = Config::from_toml(
            r#"
            extensions = ["js", "mjs"]
            esbuild = "node_modules/.bin/esbuild"
            concurrency = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.extensions, vec!["js", "mjs"]);
        assert_eq!(config.esbuild, PathBuf::from("node_modules/.bin/esbuild"));
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.loglevel, "info");
    }

    #[test]
    fn test_unknown_toml_key() {
        assert!(matches!(
            Config::from_toml("minify = false"),
            Err(BuildError::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(vars(&[
                ("FALLBACKS_CONCURRENCY", "2"),
                ("FALLBACKS_EXTENSIONS", ".js, mjs"),
                ("FALLBACKS_BUILTINS", "/tmp/builtins.txt"),
                ("PATH", "/usr/bin"),
            ]))
            .unwrap();
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.extensions, vec!["js", "mjs"]);
        assert_eq!(config.builtins, Some(PathBuf::from("/tmp/builtins.txt")));
    }

    #[test]
    fn test_bad_values() {
        let mut config = Config::default();
        assert!(config.set("concurrency", "many").is_err());
        assert!(config.set("colour", "red").is_err());

        config.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_discovers_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "loglevel = \"debug\"\n").unwrap();

        let config = Config::load(dir.path(), None).unwrap();
        assert_eq!(config.loglevel, "debug");
        assert_eq!(config.source_dir, dir.path());
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::load(dir.path(), Some(&missing)),
            Err(BuildError::Io { .. })
        ));
    }
}
