//! Expression class inference
//!
//! Maps an expression substring to the class of the object it produces, via
//! ordered pattern precedence. Result-type checks run before call-shape
//! checks: `sum(individuals.age)` is numeric no matter what method calls
//! appear inside it, so the numeric and logical gates must win over the
//! accessor table. Inference failure returns `None`, which callers treat as
//! "unknown", never as an error.

use std::sync::LazyLock;

use regex::Regex;

use crate::docs::{LOGICAL_FUNCTIONS, NUMERIC_FUNCTIONS};

/// Accessor patterns keyed on class-revealing method and property names.
/// First match against the original (untrimmed) expression wins.
static CLASS_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (
            r"\.addSubpop(Split)?\s*\(|\.subpopulations\b|\.subpopulationsWithIDs\s*\(|\.allSubpopulations\b|\.subpopulation\b",
            "Subpopulation",
        ),
        (
            r"\.individuals\b|\.sampleIndividuals\s*\(|\.subsetIndividuals\s*\(|\.nearestNeighbors\s*\(|\.nearestInteractingNeighbors\s*\(|\.drawByStrength\s*\(",
            "Individual",
        ),
        (
            r"\.genomes\b|\.genome1\b|\.genome2\b",
            "Genome",
        ),
        (
            r"\.mutations\b|\.mutationsOfType\s*\(|\.uniqueMutationsOfType\s*\(|\.uniqueMutations\b",
            "Mutation",
        ),
        (
            r"\.mutationTypes\b|\.mutationType\b|\binitializeMutationType(Nuc)?\s*\(",
            "MutationType",
        ),
        (
            r"\.genomicElementTypes\b|\.genomicElementType\b|\binitializeGenomicElementType\s*\(",
            "GenomicElementType",
        ),
        (
            r"\binitializeInteractionType\s*\(",
            "InteractionType",
        ),
        (r"\.chromosomes\b|\.chromosome\b", "Chromosome"),
        (r"\.createLogFile\s*\(", "LogFile"),
        (
            r"\.registerFirstEvent\s*\(|\.registerEarlyEvent\s*\(|\.registerLateEvent\s*\(|\.rescheduleScriptBlock\s*\(",
            "SLiMEidosBlock",
        ),
    ]
    .iter()
    .map(|(pattern, class)| (Regex::new(pattern).unwrap(), *class))
    .collect()
});

fn starts_with_call(text: &str, name: &str) -> bool {
    text.strip_prefix(name)
        .map_or(false, |rest| rest.trim_start().starts_with('('))
}

/// Infer the object class produced by an expression, or `None` when the
/// result is non-object or unknown.
pub fn infer_class(expr: &str) -> Option<&'static str> {
    let trimmed = expr.trim_start();

    // Numeric results never carry an object class.
    if NUMERIC_FUNCTIONS
        .iter()
        .any(|name| starts_with_call(trimmed, name))
    {
        return None;
    }
    if expr
        .chars()
        .any(|c| matches!(c, '+' | '-' | '*' | '/' | '%' | '^'))
    {
        return None;
    }

    // Logical results likewise.
    if trimmed.starts_with('!') {
        return None;
    }
    if LOGICAL_FUNCTIONS
        .iter()
        .any(|name| starts_with_call(trimmed, name))
    {
        return None;
    }

    for (pattern, class) in CLASS_PATTERNS.iter() {
        if pattern.is_match(expr) {
            return Some(class);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_reveal_classes() {
        assert_eq!(infer_class("sim.addSubpop(\"p1\", 500)"), Some("Subpopulation"));
        assert_eq!(infer_class("p1.individuals"), Some("Individual"));
        assert_eq!(infer_class("p1.sampleIndividuals(10)"), Some("Individual"));
        assert_eq!(infer_class("individual.genome1"), Some("Genome"));
        assert_eq!(infer_class("sim.mutationsOfType(m1)"), Some("Mutation"));
        assert_eq!(infer_class("sim.chromosome"), Some("Chromosome"));
        assert_eq!(
            infer_class("community.createLogFile(\"out.csv\")"),
            Some("LogFile")
        );
    }

    #[test]
    fn numeric_results_win_over_inner_calls() {
        assert_eq!(infer_class("sum(p1.individuals.age)"), None);
        assert_eq!(infer_class("mean(sim.mutationsOfType(m1).selectionCoeff)"), None);
        assert_eq!(infer_class("size(p1.individuals)"), None);
    }

    #[test]
    fn arithmetic_never_infers_an_object() {
        assert_eq!(infer_class("p1.individualCount / 2"), None);
        assert_eq!(infer_class("x - 1"), None);
    }

    #[test]
    fn logical_results_never_infer_an_object() {
        assert_eq!(infer_class("!p1.individuals.migrant"), None);
        assert_eq!(infer_class("any(sim.mutations.selectionCoeff)"), None);
    }

    #[test]
    fn unknown_expressions_infer_nothing() {
        assert_eq!(infer_class("5"), None);
        assert_eq!(infer_class("\"a string\""), None);
        assert_eq!(infer_class("someVariable"), None);
    }
}
