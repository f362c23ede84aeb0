//! Statement nodes

use crate::common::Pos;

use super::decl::{ConstDecl, VarDecl};
use super::expr::Expr;

/// A statement inside a function body or block.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// An expression evaluated for its effect
    Expr(Expr),
    /// A local constant declaration
    Const(ConstDecl),
    /// A local variable declaration
    Var(VarDecl),
    While(WhileStmt),
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Vec<Stmt>,
    pub pos: Pos,
}
