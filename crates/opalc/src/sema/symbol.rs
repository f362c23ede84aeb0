//! Symbol model
//!
//! Symbols and scopes live in the [`SymbolTable`](super::SymbolTable) arena
//! and reference each other through plain index handles, so the
//! parent/owner back-links form no ownership cycles.

use std::fmt;

use crate::ast::AccessModifier;
use crate::common::Pos;

/// Interned symbol name.
pub type NameId = string_interner::DefaultSymbol;

/// Handle to a symbol in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub(crate) u32);

impl SymbolId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a scope in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub(crate) u32);

impl ScopeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A resolved semantic type: the identity of its defining type symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ty(pub SymbolId);

/// Where a variable lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectLevel {
    /// Module-level static
    Static,
    /// Function argument
    Argument,
    /// Function-local binding
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Void,
    Never,
    Nil,
    Any,
    Bool,
    Int,
    Float,
    String,
    Enum,
    /// Class-like user type
    Record,
}

impl TypeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeKind::Void => "void",
            TypeKind::Never => "never",
            TypeKind::Nil => "nil",
            TypeKind::Any => "any",
            TypeKind::Bool => "bool",
            TypeKind::Int => "int",
            TypeKind::Float => "float",
            TypeKind::String => "string",
            TypeKind::Enum => "enum",
            TypeKind::Record => "record",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind-specific payload of a type symbol.
#[derive(Debug, Clone)]
pub enum TypeInfo {
    None,
    Enum(EnumInfo),
}

#[derive(Debug, Clone)]
pub struct EnumInfo {
    pub fields: Vec<EnumField>,
}

/// An enum field and its zero-based ordinal.
#[derive(Debug, Clone)]
pub struct EnumField {
    pub name: NameId,
    pub ordinal: usize,
}

/// A field of a class-like type.
#[derive(Debug, Clone)]
pub struct TypeField {
    pub access: AccessModifier,
    pub name: NameId,
    pub ty: Option<Ty>,
    pub has_default: bool,
}

/// A function parameter as recorded on the function symbol.
///
/// The default-value expression itself stays on the declaration node; the
/// symbol only records that one exists.
#[derive(Debug, Clone)]
pub struct FunctionArg {
    pub name: NameId,
    pub ty: Option<Ty>,
    pub has_default: bool,
}

/// A named, positioned program entity.
///
/// `parent` is the owning symbol of the scope this symbol was inserted
/// into; it backs qualified-name construction and visibility checks.
/// `pos` is `None` for built-ins and file-level module symbols.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: NameId,
    pub access: AccessModifier,
    pub parent: Option<SymbolId>,
    pub pos: Option<Pos>,
    pub kind: SymbolKind,
}

#[derive(Debug, Clone)]
pub enum SymbolKind {
    Module {
        scope: ScopeId,
        is_pkg: bool,
        is_inline: bool,
    },
    Type {
        kind: TypeKind,
        scope: ScopeId,
        fields: Vec<TypeField>,
        info: TypeInfo,
    },
    Function {
        args: Vec<FunctionArg>,
        scope: ScopeId,
        ret: Option<Ty>,
    },
    Const {
        ty: Option<Ty>,
        is_local: bool,
    },
    Object {
        level: ObjectLevel,
        ty: Option<Ty>,
    },
}

impl Symbol {
    /// Human-readable kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            SymbolKind::Module { is_pkg: true, .. } => "package",
            SymbolKind::Module { .. } => "module",
            SymbolKind::Type { kind, .. } => kind.as_str(),
            SymbolKind::Function { .. } => "function",
            SymbolKind::Const { .. } => "constant",
            SymbolKind::Object { .. } => "variable",
        }
    }

    /// The scope this symbol owns, if its kind owns one.
    pub fn owned_scope(&self) -> Option<ScopeId> {
        match &self.kind {
            SymbolKind::Module { scope, .. }
            | SymbolKind::Type { scope, .. }
            | SymbolKind::Function { scope, .. } => Some(*scope),
            SymbolKind::Const { .. } | SymbolKind::Object { .. } => None,
        }
    }

    /// Local bindings render as their bare name; everything else as its
    /// qualified name.
    pub fn is_local_binding(&self) -> bool {
        match &self.kind {
            SymbolKind::Object { level, .. } => *level != ObjectLevel::Static,
            SymbolKind::Const { is_local, .. } => *is_local,
            _ => false,
        }
    }
}
