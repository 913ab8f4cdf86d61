use std::path::Path;

use log::trace;
use swc_core::{
    common::{FileName, SourceMap, Spanned, input::StringInput, sync::Lrc},
    ecma::{
        ast::{EsVersion, Module},
        parser::{Parser, Syntax, error::Error as SwcParseError, lexer::Lexer},
    },
};

use super::{ParseFailure, SourceParser, SyntaxTree};

/// Parses ES module source with swc
#[derive(Debug, Default, Clone, Copy)]
pub struct SwcParser;

impl SourceParser for SwcParser {
    fn parse(&self, path: &Path, source: &str) -> Result<SyntaxTree, ParseFailure> {
        let source_map = Lrc::new(SourceMap::default());
        let module = parse_module(&source_map, FileName::Real(path.to_path_buf()), source)?;
        trace!(
            "Parsed {} into {} top-level items",
            path.display(),
            module.body.len()
        );
        Ok(SyntaxTree { module, source_map })
    }
}

/// Parse `source` as an ES module into `source_map`
///
/// Recoverable diagnostics are treated like fatal ones; the first is reported.
pub(crate) fn parse_module(
    source_map: &Lrc<SourceMap>,
    file_name: FileName,
    source: &str,
) -> Result<Module, ParseFailure> {
    let source_file = source_map.new_source_file(Lrc::new(file_name), source.to_owned().into());

    let lexer = Lexer::new(
        Syntax::default(),
        EsVersion::latest(),
        StringInput::from(&*source_file),
        None,
    );
    let mut parser = Parser::new_from(lexer);

    let module = parser
        .parse_module()
        .map_err(|err| to_failure(source_map, &err))?;

    if let Some(err) = parser.take_errors().first() {
        return Err(to_failure(source_map, err));
    }

    Ok(module)
}

fn to_failure(source_map: &SourceMap, err: &SwcParseError) -> ParseFailure {
    let loc = source_map.lookup_char_pos(err.span().lo);
    ParseFailure {
        message: err.kind().msg().into_owned(),
        line: loc.line,
        column: loc.col_display + 1,
    }
}

#[cfg(test)]
mod tests {
    use swc_core::ecma::ast::{ModuleDecl, ModuleItem};

    use super::*;

    #[test]
    fn test_parses_module_syntax() {
        let tree = SwcParser
            .parse(
                Path::new("/src/entry.js"),
                "import a from './a.js';\nexport const b = a + 1;\n",
            )
            .unwrap();

        assert_eq!(tree.module.body.len(), 2);
        assert!(matches!(
            tree.module.body[0],
            ModuleItem::ModuleDecl(ModuleDecl::Import(_))
        ));
    }

    #[test]
    fn test_reports_error_position() {
        let err = SwcParser
            .parse(Path::new("/src/bad.js"), "const ok = 1;\nconst = ;\n")
            .unwrap_err();

        assert_eq!(err.line, 2);
        assert!(err.column >= 1);
        assert!(!err.message.is_empty());
    }
}
