// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bundle sanitization
//!
//! Plain text rewrites over esbuild output, applied in a fixed order. None of
//! them parse JavaScript; they rely on the bundle being minified
//! machine output. Later rewrites assume the earlier ones already ran.

use tracing::trace;

/// One named text rewrite
#[derive(Clone, Copy)]
pub struct Rewrite {
    /// Short name used in logs
    pub name: &'static str,
    /// The transform
    pub apply: fn(&str) -> String,
}

impl std::fmt::Debug for Rewrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Rewrite").field(&self.name).finish()
    }
}

/// The rewrite pipeline, in application order
pub const REWRITES: &[Rewrite] = &[
    Rewrite {
        name: "unwrap-require",
        apply: unwrap_require,
    },
    Rewrite {
        name: "erase-module-url",
        apply: erase_module_url,
    },
    Rewrite {
        name: "strip-create-require",
        apply: strip_create_require,
    },
    Rewrite {
        name: "require-process",
        apply: require_process,
    },
    Rewrite {
        name: "trim",
        apply: trim,
    },
    Rewrite {
        name: "strip-circular-imports",
        apply: strip_circular_imports,
    },
];

/// esbuild renames `require` to `__require` in ESM output; the host needs
/// the real name.
pub fn unwrap_require(text: &str) -> String {
    text.replace("__require(", "require(")
}

/// `import.meta.url` has no meaning in the host.
pub fn erase_module_url(text: &str) -> String {
    text.replace("import.meta.url", "''")
}

/// Deletes the `createRequire` identifier, leaving its call in place.
pub fn strip_create_require(text: &str) -> String {
    text.replace("createRequire", "")
}

/// The process object comes through the host's `require`, never a global.
pub fn require_process(text: &str) -> String {
    text.replace("global.process", "require('process')")
}

/// Leading and trailing whitespace never matters to the host.
pub fn trim(text: &str) -> String {
    text.trim().to_string()
}

/// Drops the hoisted `import{...}` bindings esbuild emits for circular
/// imports, one statement at a time, for as long as the text opens with one.
/// Whitespace between dropped statements is trimmed too, so the result never
/// opens with a fresh `import{` that a second pass would strip.
pub fn strip_circular_imports(text: &str) -> String {
    let mut rest = text;
    while rest.starts_with("import{") {
        rest = match rest.find(';') {
            Some(end) => rest[end + 1..].trim_start(),
            None => "",
        };
    }
    rest.trim_end().to_string()
}

/// Run the whole pipeline once
pub fn apply_rewrites(text: &str) -> String {
    REWRITES.iter().fold(text.to_string(), |text, rewrite| {
        let next = (rewrite.apply)(&text);
        if next != text {
            trace!("Rewrite {} changed {} -> {} bytes", rewrite.name, text.len(), next.len());
        }
        next
    })
}

/// Sanitize a raw bundle
///
/// A deletion can splice a fresh match together, so the pipeline reruns until
/// the text stops changing. The result is a fixed point of this function.
pub fn sanitize(raw: &str) -> String {
    let mut text = apply_rewrites(raw);
    loop {
        let next = apply_rewrites(&text);
        if next == text {
            return text;
        }
        text = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_order() {
        let names: Vec<_> = REWRITES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "unwrap-require",
                "erase-module-url",
                "strip-create-require",
                "require-process",
                "trim",
                "strip-circular-imports",
            ]
        );
    }

    #[test]
    fn test_unwrap_require() {
        assert_eq!(
            unwrap_require("var a=__require(\"buffer\"),b=__require(\"events\");"),
            "var a=require(\"buffer\"),b=require(\"events\");"
        );
        assert_eq!(unwrap_require("__require.cache"), "__require.cache");
    }

    #[test]
    fn test_erase_module_url() {
        assert_eq!(
            erase_module_url("var r=createRequire(import.meta.url);"),
            "var r=createRequire('');"
        );
    }

    #[test]
    fn test_strip_create_require() {
        assert_eq!(
            strip_create_require("import{createRequire}from\"module\";var r=createRequire('');"),
            "import{}from\"module\";var r=('');"
        );
    }

    #[test]
    fn test_require_process() {
        assert_eq!(
            require_process("var p=global.process;p.nextTick(f);"),
            "var p=require('process');p.nextTick(f);"
        );
    }

    #[test]
    fn test_strip_circular_imports() {
        assert_eq!(
            strip_circular_imports("import{a as b}from\"events\";import{c}from\"buffer\";var x=1;"),
            "var x=1;"
        );
        assert_eq!(
            strip_circular_imports("import{a}from\"x\"; import{b}from\"y\";\nvar z;"),
            "var z;"
        );
        assert_eq!(strip_circular_imports("import*as a from\"x\";"), "import*as a from\"x\";");
        assert_eq!(strip_circular_imports("var y=1;import{a}from\"x\";"), "var y=1;import{a}from\"x\";");
    }

    #[test]
    fn test_unterminated_import_dropped() {
        assert_eq!(strip_circular_imports("import{a}from\"x\""), "");
    }

    #[test]
    fn test_module_url_becomes_empty_string() {
        let out = sanitize("var u=import.meta.url;export{u};");
        assert_eq!(out, "var u='';export{u};");
        assert!(!out.contains("import.meta"));
    }

    #[test]
    fn test_global_process_rewritten() {
        let out = sanitize("  var p=global.process.env;\n");
        assert_eq!(out, "var p=require('process').env;");
    }

    #[test]
    fn test_esbuild_shaped_output() {
        let raw = "import{createRequire}from\"module\";\
                   var __require=createRequire(import.meta.url);\
                   var b=__require(\"buffer\");export{b as default};\n";
        assert_eq!(
            sanitize(raw),
            "var __require=('');var b=require(\"buffer\");export{b as default};"
        );
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "import{createRequire}from\"module\";var r=createRequire(import.meta.url);",
            "var a=__require(\"x\"),p=global.process;",
            "__createRequirerequire(\"y\")",
            "global.createRequireprocess",
            "import{a}from\"b\";  import{c}from\"d\";",
            "plain text",
            "",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not a fixed point for {input:?}");
        }
    }

    #[test]
    fn test_spliced_matches_resolved() {
        assert_eq!(sanitize("__createRequirerequire(\"y\")"), "require(\"y\")");
        assert_eq!(sanitize("global.createRequireprocess"), "require('process')");
    }
}
