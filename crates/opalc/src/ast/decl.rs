//! Declaration nodes

use std::fmt;

use crate::common::Pos;
use crate::sema::SymbolId;

use super::expr::Expr;
use super::stmt::Stmt;
use super::ty::TypeExpr;

/// Access modifier attached to a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessModifier {
    #[default]
    Private,
    /// Visible anywhere inside the enclosing package
    Internal,
    Public,
    /// Parsed and stored, but grants no visibility beyond `Private`
    Protected,
}

impl fmt::Display for AccessModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessModifier::Private => write!(f, "<priv>"),
            AccessModifier::Internal => write!(f, "pub(pkg)"),
            AccessModifier::Public => write!(f, "pub"),
            AccessModifier::Protected => write!(f, "prot"),
        }
    }
}

/// A top-level or nested declaration.
#[derive(Debug, Clone)]
pub enum Decl {
    Module(ModuleDecl),
    Enum(EnumDecl),
    Fn(FnDecl),
    Const(ConstDecl),
    Var(VarDecl),
}

/// A module declaration.
///
/// Inline modules carry their body in `decls`; non-inline declarations are
/// imports whose body lives in a separately loaded tree, and `sym` is filled
/// in by the driver when that tree is loaded.
#[derive(Debug, Clone)]
pub struct ModuleDecl {
    pub access: AccessModifier,
    pub name: String,
    pub is_inline: bool,
    pub decls: Vec<Decl>,
    pub pos: Pos,
    pub sym: Option<SymbolId>,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub access: AccessModifier,
    pub name: String,
    pub fields: Vec<EnumFieldDecl>,
    /// Declarations nested in the enum body (constants, methods)
    pub decls: Vec<Decl>,
    pub pos: Pos,
    pub sym: Option<SymbolId>,
}

#[derive(Debug, Clone)]
pub struct EnumFieldDecl {
    pub name: String,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct FnDecl {
    pub access: AccessModifier,
    pub name: String,
    pub args: Vec<FnArg>,
    pub ret: Option<TypeExpr>,
    /// `None` for bodyless declarations
    pub body: Option<Vec<Stmt>>,
    pub pos: Pos,
    pub sym: Option<SymbolId>,
}

#[derive(Debug, Clone)]
pub struct FnArg {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub default: Option<Expr>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct ConstDecl {
    pub access: AccessModifier,
    pub name: String,
    /// Explicit annotation; unannotated constants adopt the initializer type
    pub ty: Option<TypeExpr>,
    pub init: Expr,
    pub pos: Pos,
    pub sym: Option<SymbolId>,
}

/// A variable declaration; multiple bindings may share one initializer.
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub access: AccessModifier,
    pub lefts: Vec<VarIdent>,
    pub init: Option<Expr>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct VarIdent {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub pos: Pos,
    pub sym: Option<SymbolId>,
}
