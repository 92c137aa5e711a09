//! Duplicate and reserved-identifier definition checks
//!
//! Walks declaration calls line by line, remembering the first line each
//! identifier was declared on. A later identical declaration is an error
//! citing the first line (1-based in messages, as editors display them).
//! Binding a reserved identifier as a constant or species name is its own
//! error and never counts as a definition.

use std::collections::HashMap;

use regex::Regex;
use tower_lsp::lsp_types::Diagnostic;

use crate::docs::RESERVED_IDENTIFIERS;
use crate::patterns;
use crate::types;
use crate::validators::LineContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Category {
    Constant,
    MutationType,
    GenomicElementType,
    InteractionType,
    Subpopulation,
    Species,
}

impl Category {
    fn label(self) -> &'static str {
        match self {
            Category::Constant => "Constant",
            Category::MutationType => "Mutation type",
            Category::GenomicElementType => "Genomic element type",
            Category::InteractionType => "Interaction type",
            Category::Subpopulation => "Subpopulation",
            Category::Species => "Species",
        }
    }
}

/// First-seen declaration lines, carried across the per-line pass.
#[derive(Default)]
pub struct DefinitionTracker {
    first_seen: HashMap<(Category, String), usize>,
}

impl DefinitionTracker {
    pub fn check_line(&mut self, ctx: &LineContext, diagnostics: &mut Vec<Diagnostic>) {
        self.check_pattern(ctx, &patterns::CONSTANT_DECL, Category::Constant, None, diagnostics);
        self.check_pattern(
            ctx,
            &patterns::MUTATION_TYPE_DECL,
            Category::MutationType,
            Some('m'),
            diagnostics,
        );
        self.check_pattern(
            ctx,
            &patterns::ELEMENT_TYPE_DECL,
            Category::GenomicElementType,
            Some('g'),
            diagnostics,
        );
        self.check_pattern(
            ctx,
            &patterns::INTERACTION_TYPE_DECL,
            Category::InteractionType,
            Some('i'),
            diagnostics,
        );
        self.check_pattern(
            ctx,
            &patterns::SUBPOP_DECL,
            Category::Subpopulation,
            Some('p'),
            diagnostics,
        );
        self.check_species_header(ctx, diagnostics);
    }

    fn check_pattern(
        &mut self,
        ctx: &LineContext,
        pattern: &Regex,
        category: Category,
        prefix: Option<char>,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        for caps in pattern.captures_iter(ctx.raw) {
            let whole = caps.get(0).unwrap();
            if !ctx.scan.is_code(whole.start()) {
                continue;
            }
            let Some(id_match) = caps.get(1) else {
                continue;
            };
            let mut name = id_match.as_str().to_string();
            if let Some(prefix) = prefix {
                if name.chars().next().map_or(false, |c| c.is_ascii_digit()) {
                    name = format!("{prefix}{name}");
                }
            }

            let range = types::line_range(ctx.index, id_match.start(), id_match.end());
            self.record(category, name, ctx.index, range, diagnostics);
        }
    }

    fn check_species_header(&mut self, ctx: &LineContext, diagnostics: &mut Vec<Diagnostic>) {
        let Some(caps) = patterns::CALLBACK_HEADER.captures(&ctx.scan.sanitized) else {
            return;
        };
        // Only the initializing header declares the species; later blocks
        // for the same species are references, not redeclarations.
        if caps.get(3).map_or(true, |m| m.as_str() != "initialize") {
            return;
        }
        let Some(species) = caps.get(2) else {
            return;
        };
        let range = types::line_range(ctx.index, species.start(), species.end());
        self.record(
            Category::Species,
            species.as_str().to_string(),
            ctx.index,
            range,
            diagnostics,
        );
    }

    fn record(
        &mut self,
        category: Category,
        name: String,
        line: usize,
        range: tower_lsp::lsp_types::Range,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let reserved_relevant =
            matches!(category, Category::Constant | Category::Species);
        if reserved_relevant && RESERVED_IDENTIFIERS.contains(name.as_str()) {
            diagnostics.push(types::error(
                range,
                format!(
                    "'{}' is a reserved identifier and cannot be used as a {} name",
                    name,
                    category.label().to_lowercase()
                ),
            ));
            return;
        }

        match self.first_seen.entry((category, name)) {
            std::collections::hash_map::Entry::Occupied(entry) => {
                let first_line = *entry.get();
                let name = &entry.key().1;
                diagnostics.push(types::error(
                    range,
                    format!(
                        "{} '{}' is already defined on line {}",
                        category.label(),
                        name,
                        first_line + 1
                    ),
                ));
            }
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(line);
            }
        }
    }
}
