//! Opal compiler front end
//!
//! This library is the semantic core of the Opal ahead-of-time compiler:
//! it takes already-parsed module trees, builds the global symbol table,
//! resolves every name, enforces visibility and declaration-order rules,
//! types expressions, and determines a safe module processing order.
//!
//! ## Architecture
//!
//! The front end is organized into:
//! - **AST** (`ast/`): the parsed module trees handed in by the external
//!   parser, with annotation slots filled during analysis
//! - **Sema** (`sema/`): the symbol/scope arena and the two-pass analyzer
//! - **Depgraph** (`depgraph/`): import graph resolution and cycle reporting
//! - **Driver** (`driver/`): pipeline orchestration and the module loader
//!   boundary
//! - **Common** (`common/`): shared infrastructure (positions, diagnostics,
//!   fatal errors)
//!
//! Lexing, parsing, code generation and command-line handling are external
//! collaborators: the boundary in is [`ast::SourceModule`] plus a
//! [`driver::ModuleLoader`], the boundary out is [`driver::Analysis`].

pub mod ast;
pub mod common;
pub mod depgraph;
pub mod driver;
pub mod sema;

// Re-exports for convenience
pub use ast::SourceModule;
pub use common::{
    CompileError, CompileResult, Diagnostic, DiagnosticReporter, Diagnostics, Pos, Severity,
};
pub use driver::{Analysis, LoadError, ModuleLoader, Pipeline, PipelineConfig, StaticLoader};
pub use sema::{Analyzer, SymbolId, SymbolTable, Ty};
