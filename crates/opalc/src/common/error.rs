//! Fatal pipeline errors

use thiserror::Error;

/// Errors that stop the pipeline between stages.
///
/// Unlike accumulated [`Diagnostics`](super::Diagnostics), these abort
/// compilation immediately: an unresolved or cyclic module graph leaves
/// nothing meaningful for semantic analysis to work on.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("module `{name}` not found")]
    ModuleNotFound { name: String },

    #[error("cannot load module `{name}`, because it does not contain an entry file")]
    MissingEntryFile { name: String },

    #[error("duplicate module `{name}`")]
    DuplicateModule { name: String },

    #[error("import cycle detected between the following modules:\n{chain}")]
    ImportCycle { chain: String },
}

pub type CompileResult<T> = Result<T, CompileError>;
