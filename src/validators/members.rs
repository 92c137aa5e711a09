//! Method and property existence checks
//!
//! For each `instance.member` access, resolves the instance's class through
//! the tracker (with the fixed-instance naming conventions as a fallback)
//! and checks the member against that class's documented methods and
//! properties, plus the universal base class. Unresolved instances produce
//! no diagnostic; limited inference must not turn into false positives.

use regex::{Captures, Regex};
use tower_lsp::lsp_types::Diagnostic;

use crate::docs;
use crate::patterns;
use crate::types;
use crate::validation::{run_rule, MatchContext, Rule};
use crate::validators::LineContext;

pub fn check_line(ctx: &LineContext, diagnostics: &mut Vec<Diagnostic>) {
    diagnostics.extend(run_rule(
        &ctx.scan.sanitized,
        ctx.index,
        &MemberRule,
        ctx.tracking,
    ));
}

struct MemberRule;

impl Rule for MemberRule {
    fn pattern(&self) -> &Regex {
        &patterns::MEMBER_ACCESS
    }

    /// Identifier is `instance.member`, joined so both halves reach the
    /// diagnostic builder.
    fn extract_identifier(&self, caps: &Captures) -> Option<String> {
        let instance = caps.get(1)?.as_str();
        let member = caps.get(2)?.as_str();
        Some(format!("{instance}.{member}"))
    }

    fn should_skip(&self, ctx: &MatchContext) -> bool {
        // A chained access (`a.b.c`) starts at a member, not an instance;
        // resolution through the first segment alone would be wrong.
        ctx.before.trim_end().ends_with('.')
    }

    fn should_validate(&self, identifier: &str, ctx: &MatchContext) -> bool {
        let Some((instance, member)) = identifier.split_once('.') else {
            return false;
        };
        let Some(class) = ctx.tracking.class_of(instance) else {
            return false;
        };
        let docs = docs::docs();
        if docs.class(class).is_none() {
            return false;
        }
        !docs.has_member(class, member)
    }

    fn make_diagnostic(&self, identifier: &str, ctx: &MatchContext) -> Option<Diagnostic> {
        let (instance, member) = identifier.split_once('.')?;
        let class = ctx.tracking.class_of(instance)?.to_string();
        let kind = if ctx.after.trim_start().starts_with('(') {
            "method"
        } else {
            "property"
        };
        let member_offset = ctx.start + ctx.matched.rfind(member)?;
        Some(types::error(
            types::line_range(ctx.line_index, member_offset, member_offset + member.len()),
            format!("Class {class} has no {kind} named '{member}'"),
        ))
    }
}
