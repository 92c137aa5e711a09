//! Interaction evaluate-before-query ordering
//!
//! Interaction queries are only answerable after `evaluate()` has cached
//! positions, so a query appearing in a callback block before that block's
//! first `evaluate()` call (or in a block with none at all) is flagged.
//! Blocks are re-derived here by brace counting, independent of the
//! tracker's line map, for stronger locality on malformed input.

use tower_lsp::lsp_types::Diagnostic;

use crate::lexer::{self, ScannedLine};
use crate::patterns;
use crate::types;

pub fn validate(scans: &[ScannedLine], diagnostics: &mut Vec<Diagnostic>) {
    let mut i = 0;
    while i < scans.len() {
        let sanitized = scans[i].sanitized.as_str();
        let is_header = patterns::CALLBACK_HEADER.is_match(sanitized)
            || patterns::BARE_TICK_BLOCK.is_match(sanitized);
        if !is_header {
            i += 1;
            continue;
        }

        // The opening brace is usually on the header line, but a header
        // split across lines still starts a block.
        let open_line = (i..scans.len().min(i + 3))
            .find(|&j| scans[j].sanitized.contains('{'));
        let Some(open) = open_line else {
            i += 1;
            continue;
        };

        let end = block_end(scans, open);
        check_block(scans, i, end, diagnostics);
        i = end + 1;
    }
}

/// The line on which the block opened at `start` closes (inclusive), or the
/// last line if it never does.
fn block_end(scans: &[ScannedLine], start: usize) -> usize {
    let mut depth = 0i32;
    let mut opened = false;
    for (offset, scan) in scans[start..].iter().enumerate() {
        let (opens, closes) = lexer::brace_counts(&scan.sanitized);
        depth += opens as i32 - closes as i32;
        if opens > 0 {
            opened = true;
        }
        if opened && depth <= 0 && closes > 0 {
            return start + offset;
        }
    }
    scans.len() - 1
}

fn check_block(
    scans: &[ScannedLine],
    start: usize,
    end: usize,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // Position of the block's first evaluate() call, if any.
    let mut evaluate_at: Option<(usize, usize)> = None;
    for (index, scan) in scans[start..=end].iter().enumerate() {
        if let Some(caps) = patterns::EVALUATE_CALL.captures(&scan.sanitized) {
            evaluate_at = Some((start + index, caps.get(1).unwrap().start()));
            break;
        }
    }

    for (offset, scan) in scans[start..=end].iter().enumerate() {
        let index = start + offset;
        for caps in patterns::INTERACTION_QUERY_CALL.captures_iter(&scan.sanitized) {
            let name = caps.get(1).unwrap();
            let before_evaluate = match evaluate_at {
                None => true,
                Some((eval_line, eval_column)) => {
                    index < eval_line || (index == eval_line && name.start() < eval_column)
                }
            };
            if !before_evaluate {
                continue;
            }
            let message = match evaluate_at {
                None => format!(
                    "{}() requires a prior call to evaluate() in this callback",
                    name.as_str()
                ),
                Some(_) => format!(
                    "{}() is called before evaluate() in this callback",
                    name.as_str()
                ),
            };
            diagnostics.push(types::error(
                types::line_range(index, name.start(), name.end()),
                message,
            ));
        }
    }
}
