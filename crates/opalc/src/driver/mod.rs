//! Compilation pipeline orchestration
//!
//! The driver wires the stages together: it registers the package root,
//! loads every imported module through the host-provided loader, computes a
//! safe processing order (or fails on a cycle), and runs the two analysis
//! passes. Fatal errors abort between stages; semantic diagnostics
//! accumulate and are returned with the analysis.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

use crate::ast::{AccessModifier, Decl, SourceModule};
use crate::common::{CompileError, CompileResult, Diagnostics};
use crate::depgraph::DepGraph;
use crate::sema::{Analyzer, ScopeId, SymbolId, SymbolTable};

/// Loads the parsed tree of an imported module on behalf of the pipeline.
///
/// Module discovery and parsing belong to the host tool; the pipeline only
/// hands over the raw import name and the importing module's directory.
pub trait ModuleLoader {
    fn load(&mut self, name: &str, from_dir: &Path) -> Result<SourceModule, LoadError>;
}

/// Why a module could not be loaded. Both cases are pipeline-fatal.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    #[error("module not found")]
    NotFound,
    #[error("missing entry file")]
    MissingEntryFile,
}

/// In-memory loader over already-parsed module trees, keyed by module name.
#[derive(Debug, Default)]
pub struct StaticLoader {
    modules: FxHashMap<String, SourceModule>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module: SourceModule) {
        self.modules.insert(module.name.clone(), module);
    }

    pub fn with(mut self, module: SourceModule) -> Self {
        self.insert(module);
        self
    }
}

impl ModuleLoader for StaticLoader {
    fn load(&mut self, name: &str, _from_dir: &Path) -> Result<SourceModule, LoadError> {
        self.modules.get(name).cloned().ok_or(LoadError::NotFound)
    }
}

/// Pipeline options.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Log the resolved dependency graph
    pub dump_graph: bool,
}

/// The compilation pipeline: import loading, dependency resolution and
/// semantic analysis over a root module tree.
pub struct Pipeline<L> {
    loader: L,
    config: PipelineConfig,
}

impl<L: ModuleLoader> Pipeline<L> {
    pub fn new(loader: L, config: PipelineConfig) -> Self {
        Self { loader, config }
    }

    /// Run the full front end over `root`, the package's entry module.
    ///
    /// Fatal conditions (unresolved import, duplicate module, import cycle)
    /// return an error immediately; everything else accumulates in the
    /// returned [`Analysis`], whose [`has_errors`](Analysis::has_errors)
    /// the caller must consult before handing the result to a backend.
    pub fn compile(mut self, root: SourceModule) -> CompileResult<Analysis> {
        let mut table = SymbolTable::new();
        let mut diags = Diagnostics::new();

        // Register the package root in the universe.
        let universe = table.universe();
        let root_scope = table.new_scope(Some(universe), true);
        let root_sym = table.new_module(
            AccessModifier::Public,
            &root.name,
            root_scope,
            true,
            false,
            None,
        );
        if table.insert(universe, root_sym).is_err() {
            return Err(CompileError::DuplicateModule { name: root.name.clone() });
        }

        let mut root = root;
        root.sym = Some(root_sym);
        let mut modules = vec![root];
        let mut deps: Vec<Vec<String>> = vec![Vec::new()];
        // Loaded modules by import name: importing the same module twice
        // references one symbol instead of loading a second copy.
        let mut registry: FxHashMap<String, SymbolId> = FxHashMap::default();
        registry.insert(modules[0].name.clone(), root_sym);

        // Worklist over the growing module list, in load order.
        let mut index = 0;
        while index < modules.len() {
            let Some(importer_sym) = modules[index].sym else {
                index += 1;
                continue;
            };
            let Some(importer_scope) = table.symbol(importer_sym).owned_scope() else {
                index += 1;
                continue;
            };
            let dir = Path::new(&modules[index].file)
                .parent()
                .map(PathBuf::from)
                .unwrap_or_default();
            let imports: Vec<String> = modules[index]
                .imports()
                .into_iter()
                .map(|(name, _)| name.to_string())
                .collect();

            let mut module_deps = Vec::new();
            for name in &imports {
                let dep_sym = match registry.get(name) {
                    Some(&existing) => {
                        if table.insert_ref(importer_scope, existing).is_err() {
                            return Err(CompileError::DuplicateModule { name: name.clone() });
                        }
                        existing
                    }
                    None => {
                        let tree = match self.loader.load(name, &dir) {
                            Ok(tree) => tree,
                            Err(LoadError::NotFound) => {
                                return Err(CompileError::ModuleNotFound { name: name.clone() });
                            }
                            Err(LoadError::MissingEntryFile) => {
                                return Err(CompileError::MissingEntryFile { name: name.clone() });
                            }
                        };
                        let scope = table.new_scope(Some(universe), true);
                        let sym = table.new_module(
                            AccessModifier::Public,
                            name,
                            scope,
                            false,
                            false,
                            None,
                        );
                        if table.insert(importer_scope, sym).is_err() {
                            return Err(CompileError::DuplicateModule { name: name.clone() });
                        }
                        registry.insert(name.clone(), sym);
                        let mut tree = tree;
                        tree.sym = Some(sym);
                        modules.push(tree);
                        deps.push(Vec::new());
                        sym
                    }
                };
                module_deps.push(table.qualified_name(dep_sym, "::"));
            }
            deps[index] = module_deps;
            assign_import_syms(&mut modules[index].decls, &table, importer_scope);
            index += 1;
        }

        // Dependency resolution.
        let mut graph = DepGraph::new();
        for (module, module_deps) in modules.iter().zip(&deps) {
            let Some(sym) = module.sym else { continue };
            graph.add(table.qualified_name(sym, "::"), module_deps.clone());
        }
        let resolved = graph.resolve();
        if self.config.dump_graph {
            debug!("resolved dependency graph:\n{}", resolved.display());
        }
        if !resolved.acyclic {
            return Err(CompileError::ImportCycle { chain: resolved.display_cycles() });
        }

        // Reorder the module list to the resolved order.
        let order: Vec<String> = resolved.nodes().iter().map(|node| node.name.clone()).collect();
        let mut remaining = modules;
        let mut modules = Vec::with_capacity(remaining.len());
        for name in &order {
            let found = remaining.iter().position(|module| {
                module
                    .sym
                    .is_some_and(|sym| table.qualified_name(sym, "::") == *name)
            });
            if let Some(position) = found {
                modules.push(remaining.remove(position));
            }
        }
        debug!(?order, "module processing order");

        // Pass 1 for every module, then pass 2.
        Analyzer::new(&mut table, &mut diags).check_modules(&mut modules);

        Ok(Analysis { modules, table, order, diagnostics: diags })
    }
}

/// Point non-inline module declarations at the loaded modules' symbols.
fn assign_import_syms(decls: &mut [Decl], table: &SymbolTable, scope: ScopeId) {
    for decl in decls {
        if let Decl::Module(module) = decl {
            if module.is_inline {
                assign_import_syms(&mut module.decls, table, scope);
            } else {
                module.sym = table.find(scope, &module.name);
            }
        }
    }
}

/// Everything the front end hands to its consumers: the annotated module
/// trees in processing order, the symbol forest, the order itself and the
/// accumulated diagnostics.
#[derive(Debug)]
pub struct Analysis {
    pub modules: Vec<SourceModule>,
    pub table: SymbolTable,
    pub order: Vec<String>,
    pub diagnostics: Diagnostics,
}

impl Analysis {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Query the symbol forest by qualified name.
    pub fn symbol(&self, qualified: &str) -> Option<SymbolId> {
        self.table.resolve_qualified(qualified, "::")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ConstDecl, Expr, ExprKind, ModuleDecl};
    use crate::common::Pos;
    use pretty_assertions::assert_eq;

    fn pos(file: &str, line: u32) -> Pos {
        Pos::new(file, line, 1, 1, 0)
    }

    fn import(name: &str, file: &str, line: u32) -> Decl {
        Decl::Module(ModuleDecl {
            access: AccessModifier::Private,
            name: name.to_string(),
            is_inline: false,
            decls: Vec::new(),
            pos: pos(file, line),
            sym: None,
        })
    }

    fn const_decl(name: &str, access: AccessModifier, init: Expr, file: &str, line: u32) -> Decl {
        Decl::Const(ConstDecl {
            access,
            name: name.to_string(),
            ty: None,
            init,
            pos: pos(file, line),
            sym: None,
        })
    }

    fn number(value: &str, file: &str, line: u32) -> Expr {
        Expr::new(ExprKind::Number(value.to_string()), pos(file, line))
    }

    fn path(module: &str, member: &str, file: &str, line: u32) -> Expr {
        Expr::new(
            ExprKind::Path {
                left: Box::new(Expr::new(
                    ExprKind::Ident { name: module.to_string(), sym: None },
                    pos(file, line),
                )),
                name: member.to_string(),
                sym: None,
            },
            pos(file, line),
        )
    }

    #[test]
    fn test_modules_are_processed_in_dependency_order() {
        let loader = StaticLoader::new()
            .with(SourceModule::new(
                "b.opal",
                "b",
                vec![import("d", "b.opal", 1)],
            ))
            .with(SourceModule::new("c.opal", "c", vec![]))
            .with(SourceModule::new("d.opal", "d", vec![]));
        let root = SourceModule::new(
            "app.opal",
            "app",
            vec![import("b", "app.opal", 1), import("c", "app.opal", 2)],
        );

        let analysis = Pipeline::new(loader, PipelineConfig::default())
            .compile(root)
            .unwrap();
        assert!(!analysis.has_errors());
        assert_eq!(analysis.order, vec!["app::c", "app::b::d", "app::b", "app"]);
        let processed: Vec<&str> = analysis.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(processed, vec!["c", "d", "b", "app"]);
    }

    #[test]
    fn test_import_cycle_is_fatal_and_analysis_does_not_run() {
        let loader = StaticLoader::new().with(SourceModule::new(
            "b.opal",
            "b",
            vec![import("a", "b.opal", 1)],
        ));
        let root = SourceModule::new("a.opal", "a", vec![import("b", "a.opal", 1)]);

        let err = Pipeline::new(loader, PipelineConfig::default())
            .compile(root)
            .unwrap_err();
        let CompileError::ImportCycle { chain } = err else {
            panic!("expected an import cycle");
        };
        let chain = chain.trim_start_matches(" > ");
        let segments: Vec<&str> = chain.split(" -> ").collect();
        assert_eq!(segments.first(), segments.last());
        assert!(segments.contains(&"a"));
        assert!(segments.contains(&"a::b"));
    }

    #[test]
    fn test_unresolved_import_is_fatal() {
        let root = SourceModule::new("a.opal", "a", vec![import("missing", "a.opal", 1)]);

        let err = Pipeline::new(StaticLoader::new(), PipelineConfig::default())
            .compile(root)
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::ModuleNotFound { name } if name == "missing"
        ));
    }

    #[test]
    fn test_duplicate_import_is_fatal() {
        let loader = StaticLoader::new().with(SourceModule::new("b.opal", "b", vec![]));
        let root = SourceModule::new(
            "a.opal",
            "a",
            vec![import("b", "a.opal", 1), import("b", "a.opal", 2)],
        );

        let err = Pipeline::new(loader, PipelineConfig::default())
            .compile(root)
            .unwrap_err();
        assert!(matches!(err, CompileError::DuplicateModule { name } if name == "b"));
    }

    #[test]
    fn test_private_cross_module_access_is_reported_once_with_type_assigned() {
        // Module x declares a private constant; module y reads it as x::k.
        let loader = StaticLoader::new().with(SourceModule::new(
            "x.opal",
            "x",
            vec![const_decl(
                "k",
                AccessModifier::Private,
                number("1", "x.opal", 1),
                "x.opal",
                1,
            )],
        ));
        let root = SourceModule::new(
            "y.opal",
            "y",
            vec![
                import("x", "y.opal", 1),
                const_decl(
                    "c",
                    AccessModifier::Private,
                    path("x", "k", "y.opal", 2),
                    "y.opal",
                    2,
                ),
            ],
        );

        let analysis = Pipeline::new(loader, PipelineConfig::default())
            .compile(root)
            .unwrap();
        assert!(analysis.has_errors());
        assert_eq!(analysis.diagnostics.error_count(), 1);
        let message = analysis
            .diagnostics
            .iter()
            .next()
            .map(|d| d.message.clone())
            .unwrap_or_default();
        assert_eq!(message, "constant `y::x::k` is private");
        // The constant's type is still assigned, so nothing cascades.
        let c = analysis.symbol("y::c").unwrap();
        assert_eq!(analysis.table.type_of(c), Some(analysis.table.builtins().int));
    }

    #[test]
    fn test_public_cross_module_access_resolves() {
        let loader = StaticLoader::new().with(SourceModule::new(
            "x.opal",
            "x",
            vec![const_decl(
                "k",
                AccessModifier::Public,
                number("1.5", "x.opal", 1),
                "x.opal",
                1,
            )],
        ));
        let root = SourceModule::new(
            "y.opal",
            "y",
            vec![
                import("x", "y.opal", 1),
                const_decl(
                    "c",
                    AccessModifier::Private,
                    path("x", "k", "y.opal", 2),
                    "y.opal",
                    2,
                ),
            ],
        );

        let analysis = Pipeline::new(loader, PipelineConfig::default())
            .compile(root)
            .unwrap();
        assert!(!analysis.has_errors());
        let c = analysis.symbol("y::c").unwrap();
        assert_eq!(analysis.table.type_of(c), Some(analysis.table.builtins().float));
    }

    #[test]
    fn test_internal_access_within_one_package() {
        // y is the package root; x lives under it, so y and x share the
        // enclosing package and `pub(pkg)` symbols are visible both ways.
        let loader = StaticLoader::new().with(SourceModule::new(
            "x.opal",
            "x",
            vec![const_decl(
                "k",
                AccessModifier::Internal,
                number("1", "x.opal", 1),
                "x.opal",
                1,
            )],
        ));
        let root = SourceModule::new(
            "y.opal",
            "y",
            vec![
                import("x", "y.opal", 1),
                const_decl(
                    "c",
                    AccessModifier::Private,
                    path("x", "k", "y.opal", 2),
                    "y.opal",
                    2,
                ),
            ],
        );

        let analysis = Pipeline::new(loader, PipelineConfig::default())
            .compile(root)
            .unwrap();
        assert!(!analysis.has_errors());
    }

    #[test]
    fn test_import_decl_is_annotated_with_the_loaded_symbol() {
        let loader = StaticLoader::new().with(SourceModule::new("b.opal", "b", vec![]));
        let root = SourceModule::new("a.opal", "a", vec![import("b", "a.opal", 1)]);

        let analysis = Pipeline::new(loader, PipelineConfig::default())
            .compile(root)
            .unwrap();
        let root_tree = analysis
            .modules
            .iter()
            .find(|m| m.name == "a")
            .expect("root module present");
        let Decl::Module(decl) = &root_tree.decls[0] else {
            panic!("expected the import declaration");
        };
        assert_eq!(decl.sym, analysis.symbol("a::b"));
    }

    #[test]
    fn test_diamond_import_shares_one_module() {
        // app imports both b and c; each of them imports shared.
        let loader = StaticLoader::new()
            .with(SourceModule::new(
                "b.opal",
                "b",
                vec![import("shared", "b.opal", 1)],
            ))
            .with(SourceModule::new(
                "c.opal",
                "c",
                vec![import("shared", "c.opal", 1)],
            ))
            .with(SourceModule::new("shared.opal", "shared", vec![]));
        let root = SourceModule::new(
            "app.opal",
            "app",
            vec![import("b", "app.opal", 1), import("c", "app.opal", 2)],
        );

        let analysis = Pipeline::new(loader, PipelineConfig::default())
            .compile(root)
            .unwrap();
        assert!(!analysis.has_errors());
        // One `shared` tree was analyzed, owned by its first importer.
        let count = analysis.modules.iter().filter(|m| m.name == "shared").count();
        assert_eq!(count, 1);
        assert!(analysis.symbol("app::b::shared").is_some());
    }
}
