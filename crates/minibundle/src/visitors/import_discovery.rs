//! Discovery of static import specifiers
//!
//! Only top-level `import` declarations contribute dependencies. Dynamic
//! `import()` calls, `require()` calls and re-exports are not inspected.

use swc_core::ecma::ast::{Module, ModuleDecl, ModuleItem};

/// Collect the source specifier of every top-level `import` declaration in
/// document order. Duplicates are kept positionally.
pub fn collect_import_specifiers(module: &Module) -> Vec<String> {
    module
        .body
        .iter()
        .filter_map(|item| match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) if !import.type_only => {
                Some(import.src.value.to_string())
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::transpiler::{SourceParser, SwcParser};

    fn specifiers(source: &str) -> Vec<String> {
        let tree = SwcParser.parse(Path::new("/t/mod.js"), source).unwrap();
        collect_import_specifiers(&tree.module)
    }

    #[test]
    fn test_document_order_and_duplicates() {
        let source = r#"
import a from "./a.js";
import "./side-effect.js";
import { b } from "./b.js";
import * as again from "./a.js";
"#;
        assert_eq!(
            specifiers(source),
            vec!["./a.js", "./side-effect.js", "./b.js", "./a.js"]
        );
    }

    #[test]
    fn test_ignores_dynamic_and_require() {
        let source = r#"
const lazy = import("./lazy.js");
const cjs = require("./cjs.js");
export const x = 1;
"#;
        assert!(specifiers(source).is_empty());
    }

    #[test]
    fn test_ignores_nested_strings_that_look_like_imports() {
        let source = r#"
function f() { return "import x from './nope.js'"; }
import real from "./real.js";
"#;
        assert_eq!(specifiers(source), vec!["./real.js"]);
    }
}
