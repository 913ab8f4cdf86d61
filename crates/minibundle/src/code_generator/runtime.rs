//! The loader embedded once at the top of every bundle
//!
//! The loader is plain ES5 so it runs wherever the lowered module bodies run.
//! It receives the module table as its only argument: `modules[id]` is a pair
//! of the wrapped module body and that module's specifier → id mapping.

/// Opens the bundle IIFE and defines `require`
const LOADER_HEAD: &str = r#"(function (modules) {
  var hasOwn = Object.prototype.hasOwnProperty;
"#;

const CACHE_DECLARATION: &str = "  var cache = {};\n";

const REQUIRE_HEAD: &str = r#"
  function require(id) {
"#;

const CACHE_LOOKUP: &str = r#"    if (hasOwn.call(cache, id)) {
      return cache[id].exports;
    }
"#;

const REQUIRE_BODY: &str = r#"    if (!hasOwn.call(modules, id)) {
      throw new Error("minibundle: unknown module id " + id);
    }
    var factory = modules[id][0];
    var mapping = modules[id][1];

    function localRequire(specifier) {
      if (!hasOwn.call(mapping, specifier)) {
        var err = new Error("Cannot find module '" + specifier + "'");
        err.code = "MODULE_NOT_FOUND";
        throw err;
      }
      return require(mapping[specifier]);
    }

    var module = { exports: {} };
"#;

const CACHE_STORE: &str = "    cache[id] = module;\n";

const REQUIRE_TAIL: &str = r#"    factory(localRequire, module, module.exports);
    return module.exports;
  }

  require(0);
})(["#;

/// Closes the module table and the IIFE
pub const LOADER_TAIL: &str = "]);\n";

/// Everything up to the opening bracket of the module table
///
/// With `module_cache` each module body runs at most once per bundle
/// execution and its exports object is registered before the body runs, so
/// circular requires see the partially filled exports. Without it every
/// `require` call instantiates the module again.
pub fn loader_head(module_cache: bool) -> String {
    let mut head = String::from(LOADER_HEAD);
    if module_cache {
        head.push_str(CACHE_DECLARATION);
    }
    head.push_str(REQUIRE_HEAD);
    if module_cache {
        head.push_str(CACHE_LOOKUP);
    }
    head.push_str(REQUIRE_BODY);
    if module_cache {
        head.push_str(CACHE_STORE);
    }
    head.push_str(REQUIRE_TAIL);
    head
}
