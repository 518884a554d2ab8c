// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Forbidden-pattern validation of sanitized bundles

use tracing::error;

use crate::error::{BuildError, Result};

/// A construct that must never reach the restricted host
#[derive(Debug, Clone, Copy)]
pub struct ForbiddenPattern {
    /// Human-readable description, used in the build error
    pub description: &'static str,
    /// Any of these substrings triggers the pattern
    pub needles: &'static [&'static str],
    /// Log the whole offending bundle before failing
    pub dump_output: bool,
}

impl ForbiddenPattern {
    /// First needle found in `text`
    pub fn find(&self, text: &str) -> Option<&'static str> {
        self.needles.iter().copied().find(|needle| text.contains(needle))
    }
}

/// Checked in order; the first match fails the build
pub const FORBIDDEN_PATTERNS: &[ForbiddenPattern] = &[
    ForbiddenPattern {
        description: "unexpected import of \"node:module\"",
        needles: &["\"node:module\""],
        dump_output: true,
    },
    ForbiddenPattern {
        description: "unexpected import.meta",
        needles: &["import.meta"],
        dump_output: false,
    },
    ForbiddenPattern {
        description: "$apply is not supported in browsers",
        needles: &[".$apply"],
        dump_output: false,
    },
    ForbiddenPattern {
        description: "$call is not supported in browsers",
        needles: &[".$call"],
        dump_output: false,
    },
    ForbiddenPattern {
        description: "unsupported intrinsic type check",
        needles: &["$isObject(", "$isPromise(", "$isUndefinedOrNull("],
        dump_output: false,
    },
    ForbiddenPattern {
        description: "ambient global.process survived sanitization",
        needles: &["global.process"],
        dump_output: false,
    },
];

/// Validate a sanitized bundle for `module`
pub fn validate(module: &str, text: &str) -> Result<()> {
    for pattern in FORBIDDEN_PATTERNS {
        if let Some(needle) = pattern.find(text) {
            if pattern.dump_output {
                error!(module = %module, output = %text, "Rejected bundle");
            }
            return Err(BuildError::ForbiddenPattern {
                module: module.to_string(),
                pattern: format!("{} (found `{}`)", pattern.description, needle),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::sanitize;

    fn rejected(text: &str) -> String {
        match validate("events", text) {
            Err(BuildError::ForbiddenPattern { module, pattern }) => {
                assert_eq!(module, "events");
                pattern
            }
            other => panic!("expected rejection of {text:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_clean_bundle_passes() {
        assert!(validate("events", "var e=require(\"buffer\");export{e as default};").is_ok());
        assert!(validate("events", "").is_ok());
    }

    #[test]
    fn test_each_pattern_rejected() {
        assert!(rejected("import\"node:module\";").contains("node:module"));
        assert!(rejected("var u=import.meta.dirname;").contains("import.meta"));
        assert!(rejected("f.$apply(this,a)").contains("$apply"));
        assert!(rejected("f.$call(this)").contains("$call"));
        assert!(rejected("$isObject(x)").contains("$isObject("));
        assert!(rejected("if($isPromise(p))").contains("$isPromise("));
        assert!(rejected("$isUndefinedOrNull(v)").contains("$isUndefinedOrNull("));
        assert!(rejected("var p=global.process;").contains("global.process"));
    }

    #[test]
    fn test_first_match_in_table_order() {
        let pattern = rejected("f.$call(x);import.meta;");
        assert!(pattern.starts_with("unexpected import.meta"));
    }

    #[test]
    fn test_unquoted_module_name_allowed() {
        // Only the quoted specifier counts as an import
        assert!(validate("events", "var node_module=1;").is_ok());
        assert!(validate("events", "// node:module").is_ok());
    }

    #[test]
    fn test_sanitized_output_passes() {
        let raw = "import{createRequire}from\"module\";\
                   var __require=createRequire(import.meta.url);\
                   var p=global.process;export{p};";
        assert!(validate("process", &sanitize(raw)).is_ok());
    }

    #[test]
    fn test_node_module_survives_sanitization() {
        let out = sanitize("var m=require(\"node:module\");export{m};");
        assert!(rejected(&out).contains("node:module"));
    }
}
