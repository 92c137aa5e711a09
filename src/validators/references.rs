//! Possibly-undefined numbered-identifier references
//!
//! Flags use of `pN` / `mN` / `gN` references that no declaration call in
//! the document accounts for. Tracking is purely static, so the check
//! stands down for a whole category as soon as the document constructs
//! identifiers of that category dynamically (a non-literal id argument);
//! subpopulation checks additionally stand down when a population file is
//! loaded, since the file can define any number of subpopulations.

use std::collections::HashMap;

use regex::{Captures, Regex};
use tower_lsp::lsp_types::Diagnostic;

use crate::lexer::ScannedLine;
use crate::patterns;
use crate::types;
use crate::validation::{run_rule, MatchContext, Rule};
use crate::validators::LineContext;

pub const LINT_UNDEFINED_REFERENCE: &str = "undefined-reference";

fn category_label(prefix: char) -> &'static str {
    match prefix {
        'm' => "Mutation type",
        'g' => "Genomic element type",
        _ => "Subpopulation",
    }
}

/// Document-wide reference facts gathered before the per-line pass.
pub struct ReferenceScan {
    /// Earliest declaration line per identifier.
    declaration_lines: HashMap<String, usize>,
    suppress_mutation_types: bool,
    suppress_element_types: bool,
    suppress_subpopulations: bool,
}

impl ReferenceScan {
    pub fn new(lines: &[&str], scans: &[ScannedLine]) -> Self {
        let mut declaration_lines = HashMap::new();
        let mut scan_decls = |pattern: &Regex, prefix: char| {
            for (index, raw) in lines.iter().enumerate() {
                for caps in pattern.captures_iter(raw) {
                    if !scans[index].is_code(caps.get(0).unwrap().start()) {
                        continue;
                    }
                    let mut id = caps[1].to_string();
                    if id.chars().next().map_or(false, |c| c.is_ascii_digit()) {
                        id = format!("{prefix}{id}");
                    }
                    declaration_lines.entry(id).or_insert(index);
                }
            }
        };
        scan_decls(&patterns::MUTATION_TYPE_DECL, 'm');
        scan_decls(&patterns::ELEMENT_TYPE_DECL, 'g');
        scan_decls(&patterns::SUBPOP_DECL, 'p');

        let dynamic = |pattern: &Regex| {
            lines.iter().enumerate().any(|(index, raw)| {
                pattern.captures_iter(raw).any(|caps| {
                    scans[index].is_code(caps.get(0).unwrap().start())
                        && !patterns::LITERAL_ID_ARGUMENT.is_match(caps[1].trim())
                })
            })
        };

        let loads_population_file = lines.iter().enumerate().any(|(index, raw)| {
            patterns::POPULATION_FILE_LOAD
                .find_iter(raw)
                .any(|m| scans[index].is_code(m.start()))
        });

        ReferenceScan {
            declaration_lines,
            suppress_mutation_types: dynamic(&patterns::MUTATION_TYPE_DYNAMIC),
            suppress_element_types: dynamic(&patterns::ELEMENT_TYPE_DYNAMIC),
            suppress_subpopulations: dynamic(&patterns::SUBPOP_DYNAMIC) || loads_population_file,
        }
    }

    fn suppressed(&self, prefix: char) -> bool {
        match prefix {
            'm' => self.suppress_mutation_types,
            'g' => self.suppress_element_types,
            _ => self.suppress_subpopulations,
        }
    }

    pub fn check_line(&self, ctx: &LineContext, diagnostics: &mut Vec<Diagnostic>) {
        let rule = ReferenceRule { scan: self };
        diagnostics.extend(run_rule(
            &ctx.scan.sanitized,
            ctx.index,
            &rule,
            ctx.tracking,
        ));
    }
}

struct ReferenceRule<'a> {
    scan: &'a ReferenceScan,
}

impl Rule for ReferenceRule<'_> {
    fn pattern(&self) -> &Regex {
        &patterns::NUMBERED_REF
    }

    fn extract_identifier(&self, caps: &Captures) -> Option<String> {
        caps.get(1).map(|m| m.as_str().to_string())
    }

    fn should_skip(&self, ctx: &MatchContext) -> bool {
        // Member position (`x.p1`) is not a reference to the identifier.
        if ctx.before.trim_end().ends_with('.') {
            return true;
        }
        let prefix = ctx.matched.chars().next().unwrap_or('p');
        self.scan.suppressed(prefix)
    }

    fn should_validate(&self, identifier: &str, ctx: &MatchContext) -> bool {
        // Undefined means: no declaration on this line or any earlier line.
        match self.scan.declaration_lines.get(identifier) {
            Some(&line) => line > ctx.line_index,
            None => true,
        }
    }

    fn make_diagnostic(&self, identifier: &str, ctx: &MatchContext) -> Option<Diagnostic> {
        let prefix = identifier.chars().next()?;
        Some(types::warning_with_code(
            types::line_range(ctx.line_index, ctx.start, ctx.end),
            LINT_UNDEFINED_REFERENCE,
            format!(
                "{} '{}' may not be defined at this point",
                category_label(prefix),
                identifier
            ),
        ))
    }
}
