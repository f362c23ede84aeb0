//! Diagnostic accumulation and reporting

use codespan_reporting::diagnostic::{Diagnostic as TermDiagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use rustc_hash::FxHashMap;
use std::fmt;

use super::Pos;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single diagnostic: message, severity, optional source position and
/// trailing notes.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub pos: Option<Pos>,
    pub notes: Vec<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pos {
            Some(pos) => write!(f, "{}: {}: {}", pos, self.severity, self.message)?,
            None => write!(f, "{}: {}", self.severity, self.message)?,
        }
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}

/// Accumulating diagnostics sink, threaded through every pipeline stage.
///
/// Non-fatal diagnostics never abort the traversal that produced them; the
/// driver inspects the sink between stages instead.
#[derive(Debug, Default)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, message: impl Into<String>, pos: Pos) {
        self.push(Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            pos: Some(pos),
            notes: Vec::new(),
        });
    }

    pub fn error_with_notes(&mut self, message: impl Into<String>, pos: Pos, notes: Vec<String>) {
        self.push(Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            pos: Some(pos),
            notes,
        });
    }

    pub fn warn(&mut self, message: impl Into<String>, pos: Pos) {
        self.push(Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
            pos: Some(pos),
            notes: Vec::new(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

/// Terminal reporter for accumulated diagnostics.
///
/// Diagnostics whose file has been registered with [`add_file`] are rendered
/// with source labels; the rest fall back to the plain
/// `file:line:column: severity: message` form.
///
/// [`add_file`]: DiagnosticReporter::add_file
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    ids: FxHashMap<String, usize>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            ids: FxHashMap::default(),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        let name = name.into();
        let id = self.files.add(name.clone(), source.into());
        self.ids.insert(name, id);
        id
    }

    pub fn emit(&self, diagnostic: &Diagnostic) {
        let file_id = diagnostic
            .pos
            .as_ref()
            .and_then(|pos| self.ids.get(&pos.file).copied());
        let (Some(pos), Some(file_id)) = (&diagnostic.pos, file_id) else {
            eprintln!("{diagnostic}");
            return;
        };

        let rendered = match diagnostic.severity {
            Severity::Error => TermDiagnostic::error(),
            Severity::Warning => TermDiagnostic::warning(),
        }
        .with_message(&diagnostic.message)
        .with_labels(vec![Label::primary(file_id, pos.span())])
        .with_notes(diagnostic.notes.clone());

        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &rendered);
    }

    pub fn emit_all(&self, diagnostics: &Diagnostics) {
        for diagnostic in diagnostics {
            self.emit(diagnostic);
        }
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}
