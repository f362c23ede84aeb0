//! Abstract syntax tree consumed by the semantic analyzer.
//!
//! The tree is produced by an external parser and handed to the pipeline as
//! one [`SourceModule`] per file. Nodes are closed sum types so every
//! analyzer operation matches exhaustively; annotation slots (`sym`, `ty`,
//! `scope`) start out empty and are filled in by the two analysis passes.

mod decl;
mod expr;
mod stmt;
mod ty;

pub use decl::{
    AccessModifier, ConstDecl, Decl, EnumDecl, EnumFieldDecl, FnArg, FnDecl, ModuleDecl, VarDecl,
    VarIdent,
};
pub use expr::{AssignOp, BinaryOp, Block, Expr, ExprKind, IfBranch, UnaryOp};
pub use stmt::{Stmt, WhileStmt};
pub use ty::{TypeExpr, TypeExprKind};

use crate::common::Pos;
use crate::sema::SymbolId;

/// One parsed module tree: a file's declarations plus its identity.
///
/// `sym` is the module's symbol, registered by the driver before analysis.
#[derive(Debug, Clone)]
pub struct SourceModule {
    pub file: String,
    pub name: String,
    pub decls: Vec<Decl>,
    pub sym: Option<SymbolId>,
}

impl SourceModule {
    pub fn new(file: impl Into<String>, name: impl Into<String>, decls: Vec<Decl>) -> Self {
        Self {
            file: file.into(),
            name: name.into(),
            decls,
            sym: None,
        }
    }

    /// The raw import names this module declares: every non-inline module
    /// declaration, including those nested in inline module bodies (inline
    /// modules import on behalf of the file).
    pub fn imports(&self) -> Vec<(&str, &Pos)> {
        let mut out = Vec::new();
        collect_imports(&self.decls, &mut out);
        out
    }
}

fn collect_imports<'a>(decls: &'a [Decl], out: &mut Vec<(&'a str, &'a Pos)>) {
    for decl in decls {
        if let Decl::Module(m) = decl {
            if m.is_inline {
                collect_imports(&m.decls, out);
            } else {
                out.push((&m.name, &m.pos));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32) -> Pos {
        Pos::new("main.opal", line, 1, 1, 0)
    }

    #[test]
    fn test_imports_skip_inline_bodies_but_collect_nested() {
        let module = SourceModule::new(
            "main.opal",
            "main",
            vec![
                Decl::Module(ModuleDecl {
                    access: AccessModifier::Public,
                    name: "util".to_string(),
                    is_inline: false,
                    decls: Vec::new(),
                    pos: pos(1),
                    sym: None,
                }),
                Decl::Module(ModuleDecl {
                    access: AccessModifier::Private,
                    name: "inner".to_string(),
                    is_inline: true,
                    decls: vec![Decl::Module(ModuleDecl {
                        access: AccessModifier::Private,
                        name: "net".to_string(),
                        is_inline: false,
                        decls: Vec::new(),
                        pos: pos(3),
                        sym: None,
                    })],
                    pos: pos(2),
                    sym: None,
                }),
            ],
        );

        let names: Vec<&str> = module.imports().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["util", "net"]);
    }
}
