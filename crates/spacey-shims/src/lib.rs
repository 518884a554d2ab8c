// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # spacey-shims
//!
//! Builds the Node.js built-in fallbacks ("shims") that run in hosts without
//! native module support: no `require`, no `node:module`, no privileged
//! intrinsics.
//!
//! Each shim source is bundled on its own with esbuild. Host built-ins and
//! sibling shims stay external so the host's shim loader can wire them
//! together at runtime. The emitted bundle is then textually sanitized and
//! checked against a table of forbidden patterns; any violation fails the
//! whole build.
//!
//! ```rust,ignore
//! use std::path::Path;
//! use std::sync::Arc;
//! use spacey_shims::{Builtins, Esbuild, ModuleCatalog, ShimBuilder};
//!
//! #[tokio::main]
//! async fn main() -> spacey_shims::Result<()> {
//!     let catalog = ModuleCatalog::scan(Path::new("src/node-fallbacks"), &["js".into()])?;
//!     let builder = ShimBuilder::new(catalog, Builtins::node(), Arc::new(Esbuild::default()));
//!     builder.build_all(Path::new("build/fallbacks")).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builtins;
pub mod bundler;
pub mod catalog;
pub mod config;
pub mod error;
pub mod externals;
pub mod pipeline;
pub mod sanitize;
pub mod validate;

// Re-exports
pub use builtins::Builtins;
pub use bundler::{BuildConfiguration, BundleEngine, BundleResult, Esbuild, ModuleFormat};
pub use catalog::{ModuleCatalog, ShimModule};
pub use config::Config;
pub use error::{BuildError, Result};
pub use externals::ExternalSet;
pub use pipeline::{BuildReport, BuiltShim, ShimBuilder};
pub use sanitize::sanitize;
pub use validate::validate;

/// Version of the shim builder
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
