//! Script structure checks
//!
//! Whole-document pass covering: unterminated string literals (reported at
//! the opening quote), unclosed braces (reported at the last unmatched
//! open, unless the document's last line is a lone `}`, which is treated as
//! an in-progress edit), the missing top-level event check, deprecated
//! bare-tick block syntax, and event headers declared with parameters.

use tower_lsp::lsp_types::Diagnostic;

use crate::lexer::{self, ScannedLine};
use crate::patterns;
use crate::types;

pub fn validate(
    text: &str,
    lines: &[&str],
    scans: &[ScannedLine],
    diagnostics: &mut Vec<Diagnostic>,
) {
    check_unclosed_string(text, diagnostics);
    check_braces(lines, scans, diagnostics);
    check_top_level_event(lines, scans, diagnostics);
    check_headers(scans, diagnostics);
}

fn check_unclosed_string(text: &str, diagnostics: &mut Vec<Diagnostic>) {
    if let Some((line, column)) = lexer::find_unclosed_string(text) {
        diagnostics.push(types::error(
            types::line_range(line, column, column + 1),
            "Unclosed string literal".to_string(),
        ));
    }
}

fn check_braces(lines: &[&str], scans: &[ScannedLine], diagnostics: &mut Vec<Diagnostic>) {
    // Stack of open-brace positions; an unmatched close on a header line is
    // tolerated as a likely multi-line header artifact.
    let mut opens: Vec<(usize, usize)> = Vec::new();

    for (index, scan) in scans.iter().enumerate() {
        for (column, c) in scan.sanitized.char_indices() {
            match c {
                '{' => opens.push((index, column)),
                '}' => {
                    opens.pop();
                }
                _ => {}
            }
        }
    }

    if let Some(&(line, column)) = opens.last() {
        let last_is_lone_close = lines.last().map_or(false, |l| l.trim() == "}");
        if !last_is_lone_close {
            diagnostics.push(types::error(
                types::line_range(line, column, column + 1),
                "Unclosed brace".to_string(),
            ));
        }
    }
}

fn check_top_level_event(lines: &[&str], scans: &[ScannedLine], diagnostics: &mut Vec<Diagnostic>) {
    let mut has_initialize = false;
    let mut has_event = false;

    for scan in scans {
        if let Some(caps) = patterns::CALLBACK_HEADER.captures(&scan.sanitized) {
            match caps.get(3).map_or("", |m| m.as_str()) {
                "initialize" => has_initialize = true,
                "first" | "early" | "late" => has_event = true,
                _ => {}
            }
        }
    }

    // A script with no initialize() is assumed incomplete by design; only
    // complain once initialization exists but nothing will ever run.
    if has_initialize && !has_event {
        let end = lines.first().map_or(0, |l| l.len().max(1));
        diagnostics.push(types::error(
            types::line_range(0, 0, end),
            "Script has no first(), early(), or late() event; the simulation will not run"
                .to_string(),
        ));
    }
}

fn check_headers(scans: &[ScannedLine], diagnostics: &mut Vec<Diagnostic>) {
    for (index, scan) in scans.iter().enumerate() {
        let sanitized = scan.sanitized.as_str();

        if let Some(caps) = patterns::BARE_TICK_BLOCK.captures(sanitized) {
            // `1000 { ... }` with no event type is the old block syntax.
            if patterns::CALLBACK_HEADER.captures(sanitized).is_none() {
                let tick = caps.get(1).unwrap();
                diagnostics.push(types::error(
                    types::line_range(index, tick.start(), tick.end()),
                    format!(
                        "Deprecated block syntax; declare an event type, e.g. '{} early() {{'",
                        tick.as_str()
                    ),
                ));
            }
        }

        if let Some(caps) = patterns::EVENT_HEADER.captures(sanitized) {
            let params = caps.get(2).map_or("", |m| m.as_str());
            if !params.trim().is_empty() {
                let name = caps.get(1).unwrap();
                let span = caps.get(2).unwrap();
                diagnostics.push(types::error(
                    types::line_range(index, span.start(), span.end()),
                    format!("{}() events do not take parameters", name.as_str()),
                ));
            }
        }
    }
}
