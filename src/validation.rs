//! The generic rule-application framework
//!
//! A validation rule is a regex plus four pure functions: identifier
//! extraction, a skip predicate for matches that are syntactically
//! irrelevant, a validation predicate that decides whether the match is
//! semantically wrong, and a diagnostic builder. The distinction between
//! skipping and validating matters for testability: `should_skip` encodes
//! "this match is not the construct we check", `should_validate` encodes
//! "this construct looks fine".
//!
//! Rules are pure given the line and the shared tracking state; the runner
//! iterates a fresh match iterator per call, so no matcher state leaks
//! between lines or documents.

use regex::{Captures, Regex};
use tower_lsp::lsp_types::Diagnostic;

use crate::tracker::TrackingState;

/// Context handed to a rule for one regex match on one line.
pub struct MatchContext<'a> {
    /// The full line the rule ran against.
    pub line: &'a str,
    pub line_index: usize,
    /// The matched text.
    pub matched: &'a str,
    /// Text before and after the match on the same line.
    pub before: &'a str,
    pub after: &'a str,
    /// Byte offsets of the match within the line.
    pub start: usize,
    pub end: usize,
    /// The shared per-document model.
    pub tracking: &'a TrackingState,
}

/// A declarative validation rule. Implementations must be side-effect-free.
pub trait Rule {
    fn pattern(&self) -> &Regex;

    /// Pull the identifier under scrutiny out of the captures. Returning
    /// `None` discards the match.
    fn extract_identifier(&self, caps: &Captures) -> Option<String> {
        caps.get(1).map(|m| m.as_str().to_string())
    }

    /// Whether this match is syntactically irrelevant to the rule.
    fn should_skip(&self, _ctx: &MatchContext) -> bool {
        false
    }

    /// Whether the identifier is actually in violation. `false` is the
    /// "looks fine" branch, not a skip.
    fn should_validate(&self, _identifier: &str, _ctx: &MatchContext) -> bool {
        true
    }

    fn make_diagnostic(&self, identifier: &str, ctx: &MatchContext) -> Option<Diagnostic>;
}

/// Apply one rule to every match on a line.
pub fn run_rule(
    line: &str,
    line_index: usize,
    rule: &dyn Rule,
    tracking: &TrackingState,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for caps in rule.pattern().captures_iter(line) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        let ctx = MatchContext {
            line,
            line_index,
            matched: whole.as_str(),
            before: &line[..whole.start()],
            after: &line[whole.end()..],
            start: whole.start(),
            end: whole.end(),
            tracking,
        };
        if rule.should_skip(&ctx) {
            continue;
        }
        let Some(identifier) = rule.extract_identifier(&caps) else {
            continue;
        };
        if !rule.should_validate(&identifier, &ctx) {
            continue;
        }
        if let Some(diagnostic) = rule.make_diagnostic(&identifier, &ctx) {
            diagnostics.push(diagnostic);
        }
    }
    diagnostics
}

/// Apply several rules to the same line in one combined pass.
pub fn run_rules(
    line: &str,
    line_index: usize,
    rules: &[&dyn Rule],
    tracking: &TrackingState,
) -> Vec<Diagnostic> {
    rules
        .iter()
        .flat_map(|rule| run_rule(line, line_index, *rule, tracking))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types;
    use regex::Regex;
    use std::sync::LazyLock;

    static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\w+)\b").unwrap());

    struct FlagBadWords;

    impl Rule for FlagBadWords {
        fn pattern(&self) -> &Regex {
            &WORD
        }

        fn should_skip(&self, ctx: &MatchContext) -> bool {
            ctx.before.ends_with('.')
        }

        fn should_validate(&self, identifier: &str, _ctx: &MatchContext) -> bool {
            identifier == "bad"
        }

        fn make_diagnostic(&self, identifier: &str, ctx: &MatchContext) -> Option<Diagnostic> {
            Some(types::error(
                types::line_range(ctx.line_index, ctx.start, ctx.end),
                format!("found '{identifier}'"),
            ))
        }
    }

    #[test]
    fn matches_are_skipped_validated_and_reported() {
        let tracking = TrackingState::default();
        let diags = run_rule("ok bad x.bad bad", 3, &FlagBadWords, &tracking);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].range.start.line, 3);
        assert_eq!(diags[0].range.start.character, 3);
        assert_eq!(diags[1].range.start.character, 13);
    }

    #[test]
    fn rules_concatenate() {
        let tracking = TrackingState::default();
        let rules: [&dyn Rule; 2] = [&FlagBadWords, &FlagBadWords];
        let diags = run_rules("bad", 0, &rules, &tracking);
        assert_eq!(diags.len(), 2);
    }
}
