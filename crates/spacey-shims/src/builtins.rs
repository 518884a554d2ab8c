// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host built-in module names
//!
//! The set of names the host's own module system provides. Every one of them
//! stays external when bundling a shim.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{BuildError, Result};

/// Scheme prefix for explicitly-built-in specifiers
pub const NODE_PREFIX: &str = "node:";

/// Node.js `module.builtinModules` (v20)
pub const NODE_BUILTIN_MODULES: &[&str] = &[
    "_http_agent",
    "_http_client",
    "_http_common",
    "_http_incoming",
    "_http_outgoing",
    "_http_server",
    "_stream_duplex",
    "_stream_passthrough",
    "_stream_readable",
    "_stream_transform",
    "_stream_wrap",
    "_stream_writable",
    "_tls_common",
    "_tls_wrap",
    "assert",
    "assert/strict",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "dns/promises",
    "domain",
    "events",
    "fs",
    "fs/promises",
    "http",
    "http2",
    "https",
    "inspector",
    "inspector/promises",
    "module",
    "net",
    "os",
    "path",
    "path/posix",
    "path/win32",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "readline/promises",
    "repl",
    "stream",
    "stream/consumers",
    "stream/promises",
    "stream/web",
    "string_decoder",
    "sys",
    "timers",
    "timers/promises",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "util/types",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// The host's built-in module names, without `node:` prefixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Builtins {
    names: BTreeSet<String>,
}

impl Builtins {
    /// Build from an arbitrary list of names
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|n| {
                let n = n.as_ref().trim();
                n.strip_prefix(NODE_PREFIX).unwrap_or(n).to_string()
            })
            .filter(|n| !n.is_empty())
            .collect();
        Self { names }
    }

    /// The compiled-in Node.js list
    pub fn node() -> Self {
        Self::new(NODE_BUILTIN_MODULES)
    }

    /// Load a newline-delimited list; `#` starts a comment line
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        let builtins = Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.starts_with('#')),
        );

        if builtins.is_empty() {
            return Err(BuildError::Config(format!(
                "built-in module list {} is empty",
                path.display()
            )));
        }

        Ok(builtins)
    }

    /// Check whether `name` (optionally `node:`-prefixed) is a built-in
    pub fn contains(&self, name: &str) -> bool {
        let name = name.strip_prefix(NODE_PREFIX).unwrap_or(name);
        self.names.contains(name)
    }

    /// Iterate names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Self::node()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_node_list() {
        let builtins = Builtins::node();
        assert!(builtins.contains("fs"));
        assert!(builtins.contains("node:fs/promises"));
        assert!(builtins.contains("module"));
        assert!(!builtins.contains("lodash"));
        assert_eq!(builtins.len(), NODE_BUILTIN_MODULES.len());
    }

    #[test]
    fn test_prefix_normalized() {
        let builtins = Builtins::new(["node:fs", "path", "  "]);
        assert_eq!(builtins.iter().collect::<Vec<_>>(), vec!["fs", "path"]);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# host modules").unwrap();
        writeln!(file, "buffer").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "node:events").unwrap();

        let builtins = Builtins::from_file(file.path()).unwrap();
        assert_eq!(builtins.iter().collect::<Vec<_>>(), vec!["buffer", "events"]);
    }

    #[test]
    fn test_from_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            Builtins::from_file(file.path()),
            Err(BuildError::Config(_))
        ));
    }
}
