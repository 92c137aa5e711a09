//! Function-call existence checks
//!
//! Flags a bare `name(` call only when the name carries one of the
//! simulation API's name prefixes and the documentation does not know it.
//! The prefix gate keeps arbitrary user-defined functions out of scope;
//! method calls, constructor calls, control-flow keywords, and callback
//! headers are skipped outright.

use regex::Regex;
use tower_lsp::lsp_types::Diagnostic;

use crate::docs::{self, CALLBACK_KEYS, CONTROL_KEYWORDS, FUNCTION_NAME_PREFIXES};
use crate::patterns;
use crate::types;
use crate::validation::{run_rule, MatchContext, Rule};
use crate::validators::LineContext;

pub fn check_line(ctx: &LineContext, diagnostics: &mut Vec<Diagnostic>) {
    diagnostics.extend(run_rule(
        &ctx.scan.sanitized,
        ctx.index,
        &CallRule,
        ctx.tracking,
    ));
}

struct CallRule;

impl Rule for CallRule {
    fn pattern(&self) -> &Regex {
        &patterns::BARE_CALL
    }

    fn should_skip(&self, ctx: &MatchContext) -> bool {
        // Method calls resolve against their receiver's class instead.
        ctx.before.trim_end().ends_with('.')
    }

    fn should_validate(&self, identifier: &str, _ctx: &MatchContext) -> bool {
        if CONTROL_KEYWORDS.contains(identifier) || CALLBACK_KEYS.contains_key(identifier) {
            return false;
        }
        let docs = docs::docs();
        if docs.is_constructor(identifier) {
            return false;
        }
        if !FUNCTION_NAME_PREFIXES
            .iter()
            .any(|prefix| identifier.starts_with(prefix))
        {
            return false;
        }
        docs.function(identifier).is_none()
    }

    fn make_diagnostic(&self, identifier: &str, ctx: &MatchContext) -> Option<Diagnostic> {
        let name_start = ctx.start + ctx.matched.find(identifier)?;
        Some(types::warning(
            types::line_range(ctx.line_index, name_start, name_start + identifier.len()),
            format!("Unknown function '{identifier}()'"),
        ))
    }
}
