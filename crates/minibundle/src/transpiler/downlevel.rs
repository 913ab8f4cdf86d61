use log::trace;
use swc_core::{
    common::{
        FileName, GLOBALS, Globals, Mark, SourceMap, comments::SingleThreadedComments, sync::Lrc,
    },
    ecma::{
        ast::{Module, Program},
        codegen::{self, Emitter, text_writer::JsWriter},
        preset_env::{self, preset_env},
        transforms::base::{
            assumptions::Assumptions,
            feature::FeatureFlag,
            fixer::fixer,
            helpers::{HELPERS, Helpers, inject_helpers},
            hygiene::hygiene,
            resolver,
        },
        visit::VisitMutWith,
    },
};

use super::{Downleveler, SyntaxTree, TargetPreset, TransformFailure, parser::parse_module};
use crate::visitors::esm_to_cjs::{EsmToCjs, INTEROP_HELPER_SOURCE, is_directive};

/// Lowers ES modules to ES5 CommonJS bodies with swc
#[derive(Debug, Default, Clone, Copy)]
pub struct SwcDownleveler;

impl TargetPreset {
    /// preset-env options for this target
    fn env_config(self) -> Result<preset_env::Config, TransformFailure> {
        let options = match self {
            Self::Es5 => serde_json::json!({ "forceAllTransforms": true }),
        };
        serde_json::from_value(options)
            .map_err(|err| TransformFailure::new(format!("invalid preset-env options: {err}")))
    }
}

impl Downleveler for SwcDownleveler {
    fn downlevel(&self, tree: SyntaxTree, preset: TargetPreset) -> Result<String, TransformFailure> {
        let SyntaxTree {
            mut module,
            source_map,
        } = tree;
        let env_config = preset.env_config()?;

        GLOBALS.set(&Globals::new(), || {
            HELPERS.set(&Helpers::new(false), || {
                let unresolved_mark = Mark::new();
                let top_level_mark = Mark::new();
                module.visit_mut_with(&mut resolver(unresolved_mark, top_level_mark, false));

                let mut converter = EsmToCjs::new(unresolved_mark);
                module.visit_mut_with(&mut converter);
                if let Some(message) = converter.errors().first() {
                    return Err(TransformFailure::new(message.clone()));
                }
                if converter.needs_interop() {
                    prepend_interop_helper(&source_map, &mut module)?;
                }

                let mut feature_flag = FeatureFlag::empty();
                let program = Program::Module(module).apply((
                    preset_env(
                        unresolved_mark,
                        None::<SingleThreadedComments>,
                        env_config,
                        Assumptions::default(),
                        &mut feature_flag,
                    ),
                    inject_helpers(unresolved_mark),
                    hygiene(),
                    fixer(None),
                ));

                let Program::Module(module) = program else {
                    return Err(TransformFailure::new("lowering produced a script"));
                };
                print_module(&source_map, &module)
            })
        })
    }
}

fn prepend_interop_helper(
    source_map: &Lrc<SourceMap>,
    module: &mut Module,
) -> Result<(), TransformFailure> {
    let helper = parse_module(
        source_map,
        FileName::Internal("minibundle-interop".to_owned()),
        INTEROP_HELPER_SOURCE,
    )
    .map_err(|err| TransformFailure::new(format!("invalid interop helper: {err}")))?;

    let at = module.body.iter().take_while(|item| is_directive(item)).count();
    module.body.splice(at..at, helper.body);
    Ok(())
}

fn print_module(source_map: &Lrc<SourceMap>, module: &Module) -> Result<String, TransformFailure> {
    let mut output = Vec::new();
    {
        let writer = JsWriter::new(source_map.clone(), "\n", &mut output, None);
        let mut emitter = Emitter {
            cfg: codegen::Config::default(),
            cm: source_map.clone(),
            comments: None,
            wr: writer,
        };
        emitter
            .emit_module(module)
            .map_err(|err| TransformFailure::new(format!("code generation failed: {err}")))?;
    }

    let code = String::from_utf8(output)
        .map_err(|err| TransformFailure::new(format!("generated code is not UTF-8: {err}")))?;
    trace!("Generated {} bytes of lowered code", code.len());
    Ok(code)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::transpiler::{SourceParser, SwcParser};

    fn lower(source: &str) -> Result<String, TransformFailure> {
        let tree = SwcParser.parse(Path::new("/t/mod.js"), source).unwrap();
        SwcDownleveler.downlevel(tree, TargetPreset::Es5)
    }

    #[test]
    fn test_imports_become_requires() {
        let code = lower("import { greet } from './greet.js';\ngreet('x');\n").unwrap();
        assert!(code.contains("require(\"./greet.js\")"), "{code}");
        assert!(!code.contains("import "), "{code}");
        assert!(code.contains(".greet)("), "{code}");
    }

    #[test]
    fn test_default_import_uses_interop() {
        let code = lower("import message from './message.js';\nconsole.log(message);\n").unwrap();
        assert!(code.contains("function _interopRequireDefault("), "{code}");
        assert!(code.contains(".default"), "{code}");
    }

    #[test]
    fn test_exports_are_getters() {
        let code = lower(
            "export let name = 'world';\nexport default function hello() { return name; }\n",
        )
        .unwrap();
        assert!(code.contains("__esModule"), "{code}");
        assert!(code.contains("Object.defineProperty(exports, \"name\""), "{code}");
        assert!(code.contains("Object.defineProperty(exports, \"default\""), "{code}");
        assert!(code.contains("return name;"), "{code}");
        assert!(code.contains("return hello;"), "{code}");
        assert!(!code.contains("exports.name ="), "{code}");
    }

    #[test]
    fn test_anonymous_default_is_assigned() {
        let code = lower("export default function () { return 1; }\n").unwrap();
        assert!(code.contains("exports.default = function"), "{code}");
    }

    #[test]
    fn test_module_body_is_strict() {
        let code = lower("export const self = this;\nexport function own() { return this; }\n")
            .unwrap();
        assert!(code.starts_with("\"use strict\";\n"), "{code}");
        assert!(code.contains("void 0"), "{code}");
        assert_eq!(code.matches("this").count(), 1, "{code}");
    }

    #[test]
    fn test_existing_directive_stays_first() {
        let code = lower(
            "'use strict';\nimport value from './value.js';\nconsole.log(value);\n",
        )
        .unwrap();
        assert!(code.starts_with("'use strict';\n"), "{code}");
        assert_eq!(code.matches("use strict").count(), 1, "{code}");
        let marker = code.find("__esModule").unwrap();
        let helper = code.find("function _interopRequireDefault(").unwrap();
        assert!(helper < marker, "{code}");
    }

    #[test]
    fn test_syntax_is_lowered() {
        let code = lower("const double = (x) => x * 2;\nlet y = `${double(2)}`;\n").unwrap();
        assert!(!code.contains("=>"), "{code}");
        assert!(!code.contains("const "), "{code}");
        assert!(!code.contains("let "), "{code}");
        assert!(!code.contains('`'), "{code}");
    }

    #[test]
    fn test_plain_script_has_no_marker() {
        let code = lower("module.exports = 42;\n").unwrap();
        assert!(!code.contains("__esModule"), "{code}");
        assert!(code.contains("module.exports = 42"), "{code}");
    }

    #[test]
    fn test_reexport_from_source_is_rejected() {
        let err = lower("export { a } from './a.js';\n").unwrap_err();
        assert!(err.message.contains("./a.js"), "{}", err.message);
    }

    #[test]
    fn test_lowering_is_deterministic() {
        let source = "import a from './a.js';\nexport class Box { constructor(v) { this.v = a(v); } }\n";
        assert_eq!(lower(source).unwrap(), lower(source).unwrap());
    }
}
