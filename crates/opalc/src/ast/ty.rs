//! Type annotation nodes

use std::fmt;

use crate::common::Pos;

/// A type annotation as written in the source.
///
/// Annotations are resolved to semantic [`Ty`](crate::sema::Ty) handles
/// during pass 2; the node itself stays purely syntactic.
#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub pos: Pos,
}

impl TypeExpr {
    pub fn new(kind: TypeExprKind, pos: Pos) -> Self {
        Self { kind, pos }
    }

    pub fn named(name: impl Into<String>, pos: Pos) -> Self {
        Self::new(TypeExprKind::Named(name.into()), pos)
    }
}

#[derive(Debug, Clone)]
pub enum TypeExprKind {
    /// A plain type name: `int`, `Color`
    Named(String),
    /// A qualified type name: `colors::Color`
    Path(Vec<String>),
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeExprKind::Named(name) => write!(f, "{name}"),
            TypeExprKind::Path(segments) => write!(f, "{}", segments.join("::")),
        }
    }
}
