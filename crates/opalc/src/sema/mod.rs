//! Semantic analysis: the symbol/scope model and the two-pass analyzer

mod analyzer;
mod scope;
mod symbol;

pub use analyzer::Analyzer;
pub use scope::{Builtins, DuplicateSymbol, Scope, SymbolTable};
pub use symbol::{
    EnumField, EnumInfo, FunctionArg, NameId, ObjectLevel, ScopeId, Symbol, SymbolId, SymbolKind,
    Ty, TypeField, TypeInfo, TypeKind,
};
