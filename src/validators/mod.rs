//! Concrete diagnostic rules and the document orchestrator
//!
//! `validate_document` runs the tracker once, sanitizes each line once, and
//! feeds both to the individual validators: the whole-document passes
//! (structure, interaction ordering) first, then the per-line checks.
//! Diagnostics are concatenated, deduplicated, and returned wholesale;
//! nothing is cached between calls. Malformed or partially-typed input
//! never aborts a run; a validator that cannot verify something produces no
//! diagnostic.

use std::collections::HashSet;

use tower_lsp::lsp_types::Diagnostic;

use crate::lexer::{self, ParseState, ScannedLine};
use crate::tracker::{self, TrackingState};
use crate::types::diagnostic_identity;

pub mod calls;
pub mod context;
pub mod definitions;
pub mod members;
pub mod nullability;
pub mod ordering;
pub mod references;
pub mod semicolons;
pub mod structure;

/// Everything a per-line validator needs about one line.
pub struct LineContext<'a> {
    pub index: usize,
    pub raw: &'a str,
    pub scan: &'a ScannedLine,
    pub tracking: &'a TrackingState,
}

/// Validate a whole document and return its diagnostics.
pub fn validate_document(text: &str) -> Vec<Diagnostic> {
    let tracking = tracker::track(text);
    let lines: Vec<&str> = text.split('\n').collect();

    let mut parse = ParseState::default();
    let scans: Vec<ScannedLine> = lines
        .iter()
        .map(|line| lexer::scan_line(line, &mut parse))
        .collect();

    let mut diagnostics = Vec::new();

    structure::validate(text, &lines, &scans, &mut diagnostics);
    ordering::validate(&scans, &mut diagnostics);

    let mut definitions = definitions::DefinitionTracker::default();
    let mut semicolons = semicolons::SemicolonTracker::default();
    let references = references::ReferenceScan::new(&lines, &scans);

    for index in 0..lines.len() {
        let ctx = LineContext {
            index,
            raw: lines[index],
            scan: &scans[index],
            tracking: &tracking,
        };
        definitions.check_line(&ctx, &mut diagnostics);
        semicolons.check_line(&ctx, &mut diagnostics);
        references.check_line(&ctx, &mut diagnostics);
        members::check_line(&ctx, &mut diagnostics);
        calls::check_line(&ctx, &mut diagnostics);
        nullability::check_line(&ctx, &mut diagnostics);
        context::check_line(&ctx, &mut diagnostics);
    }

    // Different producers can flag the same span; keep one squiggle each.
    let mut seen = HashSet::new();
    diagnostics.retain(|d| seen.insert(diagnostic_identity(d)));

    diagnostics
}
