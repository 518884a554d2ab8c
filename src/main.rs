// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! build-fallbacks - bundles the Node.js built-in shims
//!
//! Every `*.js` file in the source directory is a shim. Each one is bundled
//! with esbuild, sanitized, validated, and written to the output directory
//! under its own file name. Any failure exits non-zero and writes nothing.

mod cli;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use spacey_shims::{Config, Esbuild, ModuleCatalog, ShimBuilder};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.source_dir(), cli.config.as_deref())
        .context("Failed to load configuration")?;
    cli.apply(&mut config);
    config.validate()?;

    init_tracing(&config.loglevel);
    tracing::debug!(?config, "Configuration loaded");

    let builtins = config.builtins()?;
    let catalog = ModuleCatalog::scan(&config.source_dir, &config.extensions)
        .with_context(|| format!("Failed to catalog {}", config.source_dir.display()))?;

    let builder = ShimBuilder::new(catalog, builtins, Arc::new(Esbuild::new(&config.esbuild)))
        .with_concurrency(config.concurrency);

    if cli.list {
        print_plan(&builder, cli);
        return Ok(());
    }

    let start = Instant::now();
    let report = builder.build_all(&cli.out_dir).await?;

    if !cli.quiet {
        println!(
            "{} {} shims in {:.2}s ({} written to {})",
            "✓".green().bold(),
            report.shims.len(),
            start.elapsed().as_secs_f64(),
            format_bytes(report.bytes_written()).dimmed(),
            report.out_dir.display().cyan()
        );
    }

    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(default_filter)));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Filter directives covering both the library and this binary
fn default_directives(level: &str) -> String {
    format!("spacey_shims={level},build_fallbacks={level}")
}

fn print_plan(builder: &ShimBuilder, cli: &Cli) {
    for config in builder.plan(&cli.out_dir) {
        println!(
            "{:24} {:28} {} {}",
            config.module.name.cyan(),
            config.module.file,
            config.format.yellow(),
            format!("{} externals", config.externals.len()).dimmed()
        );
    }
    println!(
        "\n{} shims in {}",
        builder.catalog().len().to_string().bold(),
        builder.catalog().source_dir().display()
    );
}

/// Format bytes as human-readable string.
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(12), "12 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_default_directives_cover_binary() {
        let directives = default_directives("debug");
        assert_eq!(directives, "spacey_shims=debug,build_fallbacks=debug");
        assert!(directives.parse::<EnvFilter>().is_ok());
    }
}
