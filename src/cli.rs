// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CLI argument parsing for build-fallbacks.

use clap::Parser;
use std::path::{Path, PathBuf};

use spacey_shims::Config;

/// Bundle Node.js built-in shims for hosts without native module support
#[derive(Parser, Debug)]
#[command(name = "build-fallbacks")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory the built shims are written to
    #[arg(value_name = "OUT_DIR")]
    pub out_dir: PathBuf,

    /// Directory holding the shim sources [default: .]
    #[arg(short = 'C', long, value_name = "DIR", env = "FALLBACKS_SOURCE_DIR")]
    pub source_dir: Option<PathBuf>,

    /// Config file (defaults to fallbacks.toml in the source directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// esbuild executable
    #[arg(long, value_name = "PATH", env = "ESBUILD_BINARY_PATH")]
    pub esbuild: Option<PathBuf>,

    /// Newline-delimited list of host built-in modules
    #[arg(long, value_name = "FILE")]
    pub builtins: Option<PathBuf>,

    /// Number of shims bundled at once (default: CPU count)
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Print the build plan without bundling anything
    #[arg(long)]
    pub list: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Directory searched for the config file
    pub fn source_dir(&self) -> &Path {
        self.source_dir.as_deref().unwrap_or(Path::new("."))
    }

    /// Apply command-line overrides on top of a loaded config
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref source_dir) = self.source_dir {
            config.source_dir = source_dir.clone();
        }
        if let Some(ref esbuild) = self.esbuild {
            config.esbuild = esbuild.clone();
        }
        if let Some(ref builtins) = self.builtins {
            config.builtins = Some(builtins.clone());
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if self.verbose {
            config.loglevel = "debug".to_string();
        } else if self.quiet {
            config.loglevel = "error".to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let cli = Cli::try_parse_from([
            "build-fallbacks",
            "build/fallbacks",
            "-C",
            "src/node-fallbacks",
            "-j",
            "3",
            "--list",
        ])
        .unwrap();
        assert_eq!(cli.out_dir, PathBuf::from("build/fallbacks"));
        assert_eq!(cli.source_dir, Some(PathBuf::from("src/node-fallbacks")));
        assert_eq!(cli.source_dir(), Path::new("src/node-fallbacks"));
        assert_eq!(cli.concurrency, Some(3));
        assert!(cli.list);
    }

    #[test]
    fn test_out_dir_required() {
        assert!(Cli::try_parse_from(["build-fallbacks"]).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let cli = Cli::try_parse_from([
            "build-fallbacks",
            "out",
            "--esbuild",
            "/opt/esbuild",
            "--builtins",
            "builtins.txt",
            "-v",
        ])
        .unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.esbuild, PathBuf::from("/opt/esbuild"));
        assert_eq!(config.builtins, Some(PathBuf::from("builtins.txt")));
        assert_eq!(config.loglevel, "debug");
    }

    #[test]
    fn test_source_dir_overrides_config() {
        let cli =
            Cli::try_parse_from(["build-fallbacks", "out", "-C", "src/node-fallbacks"]).unwrap();
        let mut config = Config::from_toml("source_dir = \"from-toml\"").unwrap();
        config
            .apply_env(vec![(
                "FALLBACKS_SOURCE_DIR".to_string(),
                "/from-env".to_string(),
            )])
            .unwrap();
        assert_eq!(config.source_dir, PathBuf::from("/from-env"));

        cli.apply(&mut config);
        assert_eq!(config.source_dir, PathBuf::from("src/node-fallbacks"));
    }
}
