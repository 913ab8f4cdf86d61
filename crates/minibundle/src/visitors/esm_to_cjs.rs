//! Rewrites ES module syntax into the `require`/`module`/`exports` contract
//! the bundle runtime hands to every module body.
//!
//! Must run after swc's `resolver` so imported bindings can be matched by
//! `Id` rather than by name.
//!
//! Exported local bindings are published as getters on `exports`, so
//! importers observe later reassignments. Converted bodies are strict and
//! see `this` as `undefined` at the top level.

use rustc_hash::FxHashMap;
use swc_core::{
    common::{DUMMY_SP, Mark, SyntaxContext},
    ecma::{
        ast::{
            AssignExpr, AssignOp, AssignTarget, BlockStmt, Bool, CallExpr, Callee, Class,
            ClassDecl, ClassExpr, ComputedPropName, Decl, DefaultDecl, ExportDecl,
            ExportDefaultDecl, ExportSpecifier, Expr, ExprOrSpread, ExprStmt, FnDecl, FnExpr,
            Function, GetterProp, Id, Ident, IdentName, ImportDecl, ImportSpecifier, KeyValueProp,
            Lit, MemberExpr, MemberProp, Module, ModuleDecl, ModuleExportName, ModuleItem,
            NamedExport, Number, ObjectLit, ParenExpr, Pat, Prop, PropName, PropOrSpread,
            ReturnStmt, SeqExpr, SetterProp, SimpleAssignTarget, Stmt, Str, VarDecl, VarDeclKind,
            VarDeclarator,
        },
        atoms::Atom,
        utils::find_pat_ids,
        visit::{VisitMut, VisitMutWith},
    },
};

/// Name of the helper that wraps CommonJS values for default imports
pub const INTEROP_HELPER_NAME: &str = "_interopRequireDefault";

/// Source of the default-import interop helper, prepended when needed
pub const INTEROP_HELPER_SOURCE: &str = "function _interopRequireDefault(obj) {\n    return obj && obj.__esModule ? obj : { default: obj };\n}\n";

/// What an imported local binding is rewritten to
#[derive(Debug, Clone)]
struct ImportBinding {
    object: Ident,
    property: Option<Atom>,
}

impl ImportBinding {
    fn to_expr(&self) -> Expr {
        let object = Expr::Ident(self.object.clone());
        match &self.property {
            Some(property) => Expr::Member(member(object, property.clone())),
            None => object,
        }
    }
}

#[derive(Debug)]
pub struct EsmToCjs {
    unresolved_mark: Mark,
    /// Imported local binding → its replacement
    imports: FxHashMap<Id, ImportBinding>,
    /// Import source → identifier holding its `require` result
    require_names: FxHashMap<Atom, Ident>,
    /// Import source → identifier holding its default-interop wrapper
    interop_names: FxHashMap<Atom, Ident>,
    has_module_syntax: bool,
    needs_interop: bool,
    errors: Vec<String>,
}

impl EsmToCjs {
    pub fn new(unresolved_mark: Mark) -> Self {
        Self {
            unresolved_mark,
            imports: FxHashMap::default(),
            require_names: FxHashMap::default(),
            interop_names: FxHashMap::default(),
            has_module_syntax: false,
            needs_interop: false,
            errors: Vec::new(),
        }
    }

    /// Whether the converted module references `_interopRequireDefault`
    pub fn needs_interop(&self) -> bool {
        self.needs_interop
    }

    /// Module syntax that could not be expressed with the bundle runtime
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    fn global(&self, name: &str) -> Ident {
        Ident::new(
            name.into(),
            DUMMY_SP,
            SyntaxContext::empty().apply_mark(self.unresolved_mark),
        )
    }

    fn exports_assignment(&self, exported: Atom, value: Expr) -> ModuleItem {
        let target = member(Expr::Ident(self.global("exports")), exported);
        ModuleItem::Stmt(Stmt::Expr(ExprStmt {
            span: DUMMY_SP,
            expr: Box::new(Expr::Assign(AssignExpr {
                span: DUMMY_SP,
                op: AssignOp::Assign,
                left: AssignTarget::Simple(SimpleAssignTarget::Member(target)),
                right: Box::new(value),
            })),
        }))
    }

    /// `Object.defineProperty(exports, "<name>", <descriptor>);`
    fn define_export_property(&self, name: Atom, descriptor: Vec<(&str, Expr)>) -> ModuleItem {
        let define_property = member(
            Expr::Ident(self.global("Object")),
            "defineProperty".into(),
        );
        let descriptor = Expr::Object(ObjectLit {
            span: DUMMY_SP,
            props: descriptor
                .into_iter()
                .map(|(key, value)| {
                    PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
                        key: PropName::Ident(IdentName::new(key.into(), DUMMY_SP)),
                        value: Box::new(value),
                    })))
                })
                .collect(),
        });

        ModuleItem::Stmt(Stmt::Expr(ExprStmt {
            span: DUMMY_SP,
            expr: Box::new(call(
                Expr::Member(define_property),
                vec![
                    Expr::Ident(self.global("exports")),
                    Expr::Lit(Lit::Str(Str::from(name))),
                    descriptor,
                ],
            )),
        }))
    }

    fn es_module_marker(&self) -> ModuleItem {
        self.define_export_property("__esModule".into(), vec![("value", bool_lit(true))])
    }

    /// Getter export reading `local` on every access
    fn live_export(&self, exported: Atom, local: Ident) -> ModuleItem {
        let getter = Expr::Fn(FnExpr {
            ident: None,
            function: Box::new(Function {
                span: DUMMY_SP,
                ctxt: SyntaxContext::empty(),
                body: Some(BlockStmt {
                    span: DUMMY_SP,
                    ctxt: SyntaxContext::empty(),
                    stmts: vec![Stmt::Return(ReturnStmt {
                        span: DUMMY_SP,
                        arg: Some(Box::new(Expr::Ident(local))),
                    })],
                }),
                ..Function::default()
            }),
        });

        self.define_export_property(
            exported,
            vec![("enumerable", bool_lit(true)), ("get", getter)],
        )
    }

    /// Identifier bound to `require(src)`, emitting the declaration the first
    /// time a source is seen.
    fn require_for(&mut self, src: &Atom, body: &mut Vec<ModuleItem>) -> Ident {
        if let Some(ident) = self.require_names.get(src) {
            return ident.clone();
        }

        let ident = fresh_ident(local_name_for_src(src));
        let require = call(
            Expr::Ident(self.global("require")),
            vec![Expr::Lit(Lit::Str(Str::from(src.clone())))],
        );
        body.push(var_declaration(ident.clone(), require));
        self.require_names.insert(src.clone(), ident.clone());
        ident
    }

    /// Identifier bound to `_interopRequireDefault(<require ident>)`
    fn interop_for(&mut self, src: &Atom, body: &mut Vec<ModuleItem>) -> Ident {
        if let Some(ident) = self.interop_names.get(src) {
            return ident.clone();
        }

        let namespace = self.require_for(src, body);
        let ident = fresh_ident(format!("{}Default", namespace.sym).into());
        let helper = Ident::new_no_ctxt(INTEROP_HELPER_NAME.into(), DUMMY_SP);
        body.push(var_declaration(
            ident.clone(),
            call(Expr::Ident(helper), vec![Expr::Ident(namespace)]),
        ));
        self.needs_interop = true;
        self.interop_names.insert(src.clone(), ident.clone());
        ident
    }

    fn convert_import(&mut self, import: ImportDecl, body: &mut Vec<ModuleItem>) {
        if import.type_only {
            return;
        }

        let src = import.src.value.clone();
        let namespace = self.require_for(&src, body);

        for specifier in import.specifiers {
            match specifier {
                ImportSpecifier::Default(default) => {
                    let object = self.interop_for(&src, body);
                    self.imports.insert(
                        default.local.to_id(),
                        ImportBinding {
                            object,
                            property: Some("default".into()),
                        },
                    );
                }
                ImportSpecifier::Named(named) => {
                    if named.is_type_only {
                        continue;
                    }
                    let imported = match &named.imported {
                        Some(ModuleExportName::Ident(ident)) => ident.sym.clone(),
                        Some(ModuleExportName::Str(name)) => name.value.clone(),
                        None => named.local.sym.clone(),
                    };
                    let object = if &*imported == "default" {
                        self.interop_for(&src, body)
                    } else {
                        namespace.clone()
                    };
                    self.imports.insert(
                        named.local.to_id(),
                        ImportBinding {
                            object,
                            property: Some(imported),
                        },
                    );
                }
                ImportSpecifier::Namespace(star) => {
                    self.imports.insert(
                        star.local.to_id(),
                        ImportBinding {
                            object: namespace.clone(),
                            property: None,
                        },
                    );
                }
            }
        }
    }

    fn convert_export_decl(
        &mut self,
        export: ExportDecl,
        body: &mut Vec<ModuleItem>,
        hoisted: &mut Vec<ModuleItem>,
    ) {
        let names: Vec<Ident> = match &export.decl {
            Decl::Fn(function) => vec![function.ident.clone()],
            Decl::Class(class) => vec![class.ident.clone()],
            Decl::Var(var) => find_pat_ids(&var.decls),
            _ => Vec::new(),
        };
        for name in names {
            hoisted.push(self.live_export(name.sym.clone(), name));
        }
        body.push(ModuleItem::Stmt(Stmt::Decl(export.decl)));
    }

    fn convert_export_default_decl(
        &mut self,
        export: ExportDefaultDecl,
        body: &mut Vec<ModuleItem>,
        hoisted: &mut Vec<ModuleItem>,
    ) {
        match export.decl {
            DefaultDecl::Fn(FnExpr {
                ident: Some(ident),
                function,
            }) => {
                hoisted.push(self.live_export("default".into(), ident.clone()));
                body.push(ModuleItem::Stmt(Stmt::Decl(Decl::Fn(FnDecl {
                    ident,
                    declare: false,
                    function,
                }))));
            }
            DefaultDecl::Fn(function) => {
                body.push(self.exports_assignment("default".into(), Expr::Fn(function)));
            }
            DefaultDecl::Class(ClassExpr {
                ident: Some(ident),
                class,
            }) => {
                hoisted.push(self.live_export("default".into(), ident.clone()));
                body.push(ModuleItem::Stmt(Stmt::Decl(Decl::Class(ClassDecl {
                    ident,
                    declare: false,
                    class,
                }))));
            }
            DefaultDecl::Class(class) => {
                body.push(self.exports_assignment("default".into(), Expr::Class(class)));
            }
            DefaultDecl::TsInterfaceDecl(_) => {}
        }
    }

    fn convert_named_export(&mut self, export: NamedExport, hoisted: &mut Vec<ModuleItem>) {
        if let Some(src) = &export.src {
            self.errors.push(format!(
                "re-exporting from '{}' is not supported; import the bindings first and export \
                 them locally",
                src.value
            ));
            return;
        }
        if export.type_only {
            return;
        }

        for specifier in export.specifiers {
            let ExportSpecifier::Named(named) = specifier else {
                self.errors
                    .push("namespace and default re-exports require a source module".to_owned());
                continue;
            };
            if named.is_type_only {
                continue;
            }

            let local = match named.orig {
                ModuleExportName::Ident(ident) => ident,
                ModuleExportName::Str(name) => {
                    self.errors.push(format!(
                        "cannot export string-named binding '{}' without a source module",
                        name.value
                    ));
                    continue;
                }
            };
            let exported = match named.exported {
                Some(ModuleExportName::Ident(ident)) => ident.sym,
                Some(ModuleExportName::Str(name)) => name.value,
                None => local.sym.clone(),
            };
            hoisted.push(self.live_export(exported, local));
        }
    }

    fn convert_module_decl(
        &mut self,
        decl: ModuleDecl,
        body: &mut Vec<ModuleItem>,
        hoisted: &mut Vec<ModuleItem>,
    ) {
        match decl {
            ModuleDecl::Import(import) => self.convert_import(import, body),
            ModuleDecl::ExportDecl(export) => self.convert_export_decl(export, body, hoisted),
            ModuleDecl::ExportDefaultDecl(export) => {
                self.convert_export_default_decl(export, body, hoisted);
            }
            ModuleDecl::ExportDefaultExpr(export) => {
                body.push(self.exports_assignment("default".into(), *export.expr));
            }
            ModuleDecl::ExportNamed(export) => self.convert_named_export(export, hoisted),
            ModuleDecl::ExportAll(export) => self.errors.push(format!(
                "re-exporting everything from '{}' is not supported",
                export.src.value
            )),
            _ => self
                .errors
                .push("TypeScript module syntax is not supported".to_owned()),
        }
    }
}

impl VisitMut for EsmToCjs {
    fn visit_mut_module(&mut self, module: &mut Module) {
        let items = std::mem::take(&mut module.body);
        let mut body = Vec::with_capacity(items.len());
        let mut hoisted = Vec::new();

        for item in items {
            match item {
                ModuleItem::Stmt(stmt) => body.push(ModuleItem::Stmt(stmt)),
                ModuleItem::ModuleDecl(decl) => {
                    self.has_module_syntax = true;
                    self.convert_module_decl(decl, &mut body, &mut hoisted);
                }
            }
        }

        if !self.has_module_syntax {
            module.body = body;
            return;
        }

        for item in &mut body {
            item.visit_mut_with(&mut TopLevelThis);
        }
        // Imports are hoisted in ESM, so every reference is rewritten, including
        // ones that textually precede the import declaration.
        for item in body.iter_mut().chain(&mut hoisted) {
            item.visit_mut_with(self);
        }

        let prologue_len = body.iter().take_while(|item| is_directive(item)).count();
        let mut rest = body.split_off(prologue_len);
        let mut converted = Vec::with_capacity(body.len() + hoisted.len() + rest.len() + 2);
        if !body.iter().any(is_use_strict) {
            converted.push(use_strict());
        }
        converted.append(&mut body);
        converted.push(self.es_module_marker());
        converted.extend(hoisted);
        converted.append(&mut rest);
        module.body = converted;
    }

    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        if let Expr::Ident(ident) = expr
            && let Some(binding) = self.imports.get(&ident.to_id())
        {
            *expr = binding.to_expr();
            return;
        }

        expr.visit_mut_children_with(self);
    }

    fn visit_mut_call_expr(&mut self, call: &mut CallExpr) {
        // `(0, _dep.fn)()` so the namespace object is not passed as `this`
        if let Callee::Expr(callee) = &mut call.callee
            && let Expr::Ident(ident) = &**callee
            && let Some(binding) = self.imports.get(&ident.to_id())
            && binding.property.is_some()
        {
            let target = binding.to_expr();
            **callee = Expr::Paren(ParenExpr {
                span: DUMMY_SP,
                expr: Box::new(Expr::Seq(SeqExpr {
                    span: DUMMY_SP,
                    exprs: vec![
                        Box::new(Expr::Lit(Lit::Num(Number {
                            span: DUMMY_SP,
                            value: 0.0,
                            raw: None,
                        }))),
                        Box::new(target),
                    ],
                })),
            });
        }

        call.visit_mut_children_with(self);
    }

    fn visit_mut_prop(&mut self, prop: &mut Prop) {
        if let Prop::Shorthand(ident) = prop
            && let Some(binding) = self.imports.get(&ident.to_id())
        {
            *prop = Prop::KeyValue(KeyValueProp {
                key: PropName::Ident(IdentName::new(ident.sym.clone(), ident.span)),
                value: Box::new(binding.to_expr()),
            });
            return;
        }

        prop.visit_mut_children_with(self);
    }
}

/// Replaces `this` outside functions and class bodies with `void 0`
struct TopLevelThis;

impl VisitMut for TopLevelThis {
    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        if let Expr::This(this) = expr {
            let span = this.span;
            *expr = *Expr::undefined(span);
            return;
        }

        expr.visit_mut_children_with(self);
    }

    fn visit_mut_function(&mut self, _: &mut Function) {}

    fn visit_mut_getter_prop(&mut self, _: &mut GetterProp) {}

    fn visit_mut_setter_prop(&mut self, _: &mut SetterProp) {}

    fn visit_mut_class(&mut self, class: &mut Class) {
        if let Some(super_class) = &mut class.super_class {
            super_class.visit_mut_with(self);
        }
    }
}

/// A string-literal statement in the directive prologue
pub fn is_directive(item: &ModuleItem) -> bool {
    item.as_stmt().is_some_and(Stmt::can_precede_directive)
}

fn is_use_strict(item: &ModuleItem) -> bool {
    item.as_stmt().is_some_and(Stmt::is_use_strict)
}

fn use_strict() -> ModuleItem {
    ModuleItem::Stmt(Stmt::Expr(ExprStmt {
        span: DUMMY_SP,
        expr: Box::new(Expr::Lit(Lit::Str(Str {
            span: DUMMY_SP,
            value: "use strict".into(),
            raw: Some("\"use strict\"".into()),
        }))),
    }))
}

fn bool_lit(value: bool) -> Expr {
    Expr::Lit(Lit::Bool(Bool {
        span: DUMMY_SP,
        value,
    }))
}

fn fresh_ident(name: Atom) -> Ident {
    Ident::new(
        name,
        DUMMY_SP,
        SyntaxContext::empty().apply_mark(Mark::fresh(Mark::root())),
    )
}

fn var_declaration(name: Ident, init: Expr) -> ModuleItem {
    ModuleItem::Stmt(Stmt::Decl(Decl::Var(Box::new(VarDecl {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        kind: VarDeclKind::Var,
        declare: false,
        decls: vec![VarDeclarator {
            span: DUMMY_SP,
            name: Pat::Ident(name.into()),
            init: Some(Box::new(init)),
            definite: false,
        }],
    }))))
}

fn call(callee: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call(CallExpr {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        callee: Callee::Expr(Box::new(callee)),
        args: args
            .into_iter()
            .map(|arg| ExprOrSpread {
                spread: None,
                expr: Box::new(arg),
            })
            .collect(),
        type_args: None,
    })
}

fn member(object: Expr, property: Atom) -> MemberExpr {
    let prop = if is_identifier_name(&property) {
        MemberProp::Ident(IdentName::new(property, DUMMY_SP))
    } else {
        MemberProp::Computed(ComputedPropName {
            span: DUMMY_SP,
            expr: Box::new(Expr::Lit(Lit::Str(Str::from(property)))),
        })
    };

    MemberExpr {
        span: DUMMY_SP,
        obj: Box::new(object),
        prop,
    }
}

fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// `./utils/string-helpers.js` → `_stringHelpers`
fn local_name_for_src(src: &str) -> Atom {
    let file = src.rsplit('/').find(|s| !s.is_empty() && *s != "." && *s != "..");
    let stem = file
        .map(|f| f.split('.').next().unwrap_or(f))
        .filter(|s| !s.is_empty())
        .unwrap_or("dep");

    let mut name = String::from("_");
    let mut upper = false;
    for c in stem.chars() {
        if c.is_alphanumeric() || c == '$' {
            if upper {
                name.extend(c.to_uppercase());
            } else {
                name.push(c);
            }
            upper = false;
        } else {
            upper = name.len() > 1;
        }
    }
    if name.len() == 1 {
        name.push_str("dep");
    }
    name.into()
}
