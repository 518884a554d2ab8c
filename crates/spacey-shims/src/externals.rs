// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! External classification
//!
//! A shim must never inline a sibling shim or a host built-in: those stay as
//! unresolved imports for the host's shim loader, otherwise `stream` would
//! carry its own private copy of `buffer`.

use std::collections::BTreeSet;

use crate::builtins::{Builtins, NODE_PREFIX};
use crate::catalog::ModuleCatalog;

/// Names kept external while bundling one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalSet {
    module: String,
    names: BTreeSet<String>,
    legal: BTreeSet<String>,
}

impl ExternalSet {
    /// Classify externals for `module` given the host built-ins and the
    /// other catalogued shims
    ///
    /// Every name is emitted bare and `node:`-prefixed. The module's own name
    /// is never external.
    pub fn classify<'a, I>(module: &str, builtins: &Builtins, shims: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut names = BTreeSet::new();
        let mut add = |name: &str| {
            if name != module {
                names.insert(name.to_string());
                names.insert(format!("{NODE_PREFIX}{name}"));
            }
        };
        builtins.iter().for_each(&mut add);
        shims.into_iter().for_each(&mut add);

        let legal = builtins
            .iter()
            .filter(|name| *name != module)
            .map(str::to_string)
            .collect();

        Self {
            module: module.to_string(),
            names,
            legal,
        }
    }

    /// Classify using every shim in `catalog`
    pub fn for_catalog(module: &str, builtins: &Builtins, catalog: &ModuleCatalog) -> Self {
        Self::classify(module, builtins, catalog.names())
    }

    /// Module these externals were computed for
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Whether `name` stays external
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Whether `name` is a built-in this module may legitimately import
    pub fn is_legal(&self, name: &str) -> bool {
        let name = name.strip_prefix(NODE_PREFIX).unwrap_or(name);
        self.legal.contains(name)
    }

    /// Built-ins this module may import, its own name excluded
    pub fn legal(&self) -> impl Iterator<Item = &str> {
        self.legal.iter().map(String::as_str)
    }

    /// Every external name, sorted
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
