//! Missing-semicolon heuristic
//!
//! A statement line gets a warning only when nothing marks it as safe:
//! it does not end with `;`, `{`, or `}` after sanitizing, the running
//! parenthesis balance (carried across lines) has returned to zero on this
//! line, and it is not a control-flow, callback, or event header. A line
//! ending inside a still-open parenthesis never warns; the statement simply
//! has not ended yet.

use tower_lsp::lsp_types::Diagnostic;

use crate::lexer;
use crate::patterns;
use crate::types;
use crate::validators::LineContext;

pub const LINT_MISSING_SEMICOLON: &str = "missing-semicolon";

/// Parenthesis balance carried from line to line.
#[derive(Default)]
pub struct SemicolonTracker {
    balance: i64,
}

impl SemicolonTracker {
    pub fn check_line(&mut self, ctx: &LineContext, diagnostics: &mut Vec<Diagnostic>) {
        let sanitized = ctx.scan.sanitized.as_str();
        let (opens, closes) = lexer::paren_counts(sanitized);
        let after = (self.balance + opens as i64 - closes as i64).max(0);
        let balance_closed_here = after == 0;
        self.balance = after;

        let trimmed = sanitized.trim_end();
        if trimmed.trim_start().is_empty() {
            return;
        }
        if trimmed.ends_with(';') || trimmed.ends_with('{') || trimmed.ends_with('}') {
            return;
        }
        if !balance_closed_here {
            return;
        }
        if patterns::CONTROL_FLOW_HEADER.is_match(sanitized)
            || patterns::CALLBACK_HEADER.is_match(sanitized)
            || patterns::BARE_TICK_BLOCK.is_match(sanitized)
        {
            return;
        }

        let end = trimmed.len();
        diagnostics.push(types::warning_with_code(
            types::line_range(ctx.index, end.saturating_sub(1), end),
            LINT_MISSING_SEMICOLON,
            "Statement may be missing a terminating ';'".to_string(),
        ));
    }
}
