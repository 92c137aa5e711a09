//! Context-restricted API checks
//!
//! Uses the tracker's per-line callback context and detected model type to
//! flag: initialization functions called outside `initialize()`, offspring
//! generation outside `reproduction()` (or under the WF model at all),
//! nonWF-only methods under the WF model, callback declarations that the
//! model type forbids, pseudo-parameters used outside the callbacks that
//! define them, and `evaluate()` called from a callback that forbids it.
//! When the model type is unknown, model-dependent checks stand down.

use std::sync::LazyLock;

use regex::Regex;
use tower_lsp::lsp_types::Diagnostic;

use crate::docs::{
    self, CALLBACK_KEYS, EVALUATE_FORBIDDEN_CONTEXTS, NONWF_FORBIDDEN_CALLBACKS,
    PSEUDO_PARAMETER_HOMES, WF_FORBIDDEN_CALLBACKS,
};
use crate::patterns;
use crate::tracker::ModelType;
use crate::types;
use crate::validators::LineContext;

/// Any pseudo-parameter name, matched as a standalone word.
static PSEUDO_PARAM_REF: LazyLock<Regex> = LazyLock::new(|| {
    let mut names: Vec<&str> = docs::PSEUDO_PARAMETERS
        .values()
        .flat_map(|params| params.iter().map(|(name, _)| *name))
        .collect();
    names.sort_unstable();
    names.dedup();
    // Longest first so alternation cannot stop at a prefix.
    names.sort_unstable_by_key(|name| std::cmp::Reverse(name.len()));
    Regex::new(&format!(r"\b({})\b", names.join("|"))).unwrap()
});

/// The callback in effect for checks on this line. The tracker snapshot is
/// taken after brace bookkeeping, so a one-line block has already closed;
/// the header on the line itself still provides the context.
fn effective_context(ctx: &LineContext) -> Option<&'static str> {
    if let Some(current) = ctx.tracking.callback_at(ctx.index) {
        return Some(current);
    }
    let caps = patterns::CALLBACK_HEADER.captures(&ctx.scan.sanitized)?;
    if !ctx.scan.sanitized.contains('{') {
        return None;
    }
    CALLBACK_KEYS.get(caps.get(3)?.as_str()).copied()
}

pub fn check_line(ctx: &LineContext, diagnostics: &mut Vec<Diagnostic>) {
    let sanitized = ctx.scan.sanitized.as_str();
    let current = effective_context(ctx);
    let model = ctx.tracking.model_type;

    check_callback_declaration(ctx, model, diagnostics);

    // Initialization API outside initialize().
    if current != Some("initialize()") {
        for caps in patterns::INITIALIZE_CALL.captures_iter(sanitized) {
            let name = caps.get(1).unwrap();
            if sanitized[..name.start()].trim_end().ends_with('.') {
                continue;
            }
            if docs::docs().function(name.as_str()).is_none() {
                continue;
            }
            diagnostics.push(types::error(
                types::line_range(ctx.index, name.start(), name.end()),
                format!(
                    "{}() may only be called from an initialize() callback",
                    name.as_str()
                ),
            ));
        }
    }

    // Offspring generation: reproduction() only, and never under WF.
    for caps in patterns::REPRODUCTION_ONLY_CALL.captures_iter(sanitized) {
        let name = caps.get(1).unwrap();
        let range = types::line_range(ctx.index, name.start(), name.end());
        if current != Some("reproduction()") {
            diagnostics.push(types::error(
                range,
                format!(
                    "{}() may only be called from a reproduction() callback",
                    name.as_str()
                ),
            ));
        } else if model == ModelType::Wf {
            diagnostics.push(types::error(
                range,
                format!("{}() is not available in WF models", name.as_str()),
            ));
        }
    }

    if model == ModelType::Wf {
        for caps in patterns::NONWF_ONLY_CALL.captures_iter(sanitized) {
            let name = caps.get(1).unwrap();
            diagnostics.push(types::error(
                types::line_range(ctx.index, name.start(), name.end()),
                format!("{}() is not available in WF models", name.as_str()),
            ));
        }
    }

    check_pseudo_parameters(ctx, current, diagnostics);

    // evaluate() from a context that forbids it.
    if let Some(context) = current {
        if EVALUATE_FORBIDDEN_CONTEXTS.contains(context) {
            for caps in patterns::EVALUATE_CALL.captures_iter(sanitized) {
                let name = caps.get(1).unwrap();
                diagnostics.push(types::error(
                    types::line_range(ctx.index, name.start(), name.end()),
                    format!("evaluate() may not be called from {context} callbacks"),
                ));
            }
        }
    }
}

fn check_callback_declaration(
    ctx: &LineContext,
    model: ModelType,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(caps) = patterns::CALLBACK_HEADER.captures(&ctx.scan.sanitized) else {
        return;
    };
    let Some(name) = caps.get(3) else { return };
    if !ctx.scan.sanitized.contains('{') {
        return;
    }

    let incompatible = match model {
        ModelType::Wf => WF_FORBIDDEN_CALLBACKS.contains(name.as_str()),
        ModelType::NonWf => NONWF_FORBIDDEN_CALLBACKS.contains(name.as_str()),
        ModelType::Unknown => false,
    };
    if incompatible {
        let model_name = if model == ModelType::Wf { "WF" } else { "nonWF" };
        diagnostics.push(types::error(
            types::line_range(ctx.index, name.start(), name.end()),
            format!(
                "{}() callbacks cannot be used in {} models",
                name.as_str(),
                model_name
            ),
        ));
    }
}

fn check_pseudo_parameters(
    ctx: &LineContext,
    current: Option<&'static str>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let sanitized = ctx.scan.sanitized.as_str();
    for caps in PSEUDO_PARAM_REF.captures_iter(sanitized) {
        let name = caps.get(1).unwrap();
        let before = sanitized[..name.start()].trim_end();
        let after = sanitized[name.end()..].trim_start();

        // Member access, call position, and named-argument position are
        // not uses of the pseudo-parameter.
        if before.ends_with('.') {
            continue;
        }
        if after.starts_with('(') {
            continue;
        }
        if after.starts_with('=') && !after.starts_with("==") {
            continue;
        }

        let Some(homes) = PSEUDO_PARAMETER_HOMES.get(name.as_str()) else {
            continue;
        };
        if current.map_or(false, |context| homes.contains(&context)) {
            continue;
        }
        diagnostics.push(types::error(
            types::line_range(ctx.index, name.start(), name.end()),
            format!(
                "'{}' is only defined inside {} callbacks",
                name.as_str(),
                homes.join(" and ")
            ),
        ));
    }
}
