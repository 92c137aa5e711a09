//! Diagnostic construction helpers
//!
//! This module provides the constructors the analysis core uses to build LSP
//! diagnostics. Every diagnostic is anchored inside a single line and tagged
//! with the fixed source string so editors can tell this engine's output
//! apart from diagnostics published by other tools.

use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticSeverity, NumberOrString, Position as LspPosition, Range as LspRange,
};

/// Source tag attached to every diagnostic produced by this engine.
pub const DIAGNOSTIC_SOURCE: &str = "slimlsp";

/// A range spanning `start..end` (byte columns) on a single line.
pub fn line_range(line: usize, start: usize, end: usize) -> LspRange {
    LspRange::new(
        LspPosition::new(line as u32, start.min(end) as u32),
        LspPosition::new(line as u32, end.max(start) as u32),
    )
}

fn diagnostic(severity: DiagnosticSeverity, range: LspRange, message: String) -> Diagnostic {
    Diagnostic {
        range,
        severity: Some(severity),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message,
        ..Default::default()
    }
}

pub fn error(range: LspRange, message: String) -> Diagnostic {
    diagnostic(DiagnosticSeverity::ERROR, range, message)
}

pub fn warning(range: LspRange, message: String) -> Diagnostic {
    diagnostic(DiagnosticSeverity::WARNING, range, message)
}

pub fn info(range: LspRange, message: String) -> Diagnostic {
    diagnostic(DiagnosticSeverity::INFORMATION, range, message)
}

/// A warning carrying a lint code, so hosts can suppress the lint wholesale.
pub fn warning_with_code(range: LspRange, code: &str, message: String) -> Diagnostic {
    let mut diag = warning(range, message);
    diag.code = Some(NumberOrString::String(code.to_string()));
    diag
}

/// Create a unique identity tuple for a diagnostic
///
/// Used for deduplication - two diagnostics with the same identity are
/// considered duplicates. The identity includes the range (start/end
/// line/character) and the message text.
pub fn diagnostic_identity(diag: &Diagnostic) -> (u32, u32, u32, u32, String) {
    (
        diag.range.start.line,
        diag.range.start.character,
        diag.range.end.line,
        diag.range.end.character,
        diag.message.clone(),
    )
}
