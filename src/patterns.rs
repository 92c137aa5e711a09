//! Compiled regular-expression tables
//!
//! Every pattern the engine matches against script lines lives here,
//! compiled once. Callers always iterate fresh matches (`captures_iter`);
//! no mutable regex state is ever shared between calls.

use std::sync::LazyLock;

use regex::Regex;

const CALLBACK_NAMES: &str = "initialize|first|early|late|fitnessEffect|mutationEffect|\
                              interaction|mateChoice|modifyChild|recombination|mutation|\
                              reproduction|survival";

/// A script-block header: optional `sN` id, optional `species`/`ticks`
/// specifier, optional tick or tick range, then a callback name and its
/// parameter list. The opening `{` is checked separately by callers.
pub static CALLBACK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*(?:(s\d+)\s+)?(?:species\s+([A-Za-z_]\w*)\s+)?(?:ticks\s+[A-Za-z_]\w*\s+)?(?:\d+(?::\d+)?\s+)?({CALLBACK_NAMES})\s*\(([^)]*)\)"
    ))
    .unwrap()
});

/// A top-level event header (`first()`, `early()`, `late()` only).
pub static EVENT_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:s\d+\s+)?(?:species\s+[A-Za-z_]\w*\s+)?(?:ticks\s+[A-Za-z_]\w*\s+)?(?:\d+(?::\d+)?\s+)?(first|early|late)\s*\(([^)]*)\)",
    )
    .unwrap()
});

/// Old-style tick block with no event type: `1000 { ... }`.
pub static BARE_TICK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:s\d+\s+)?(\d+(?::\d+)?)\s*\{").unwrap());

pub static CONTROL_FLOW_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\}?\s*(?:if|else|for|while|do)\b").unwrap());

pub static MODEL_TYPE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\binitializeSLiMModelType\s*\(\s*"(WF|nonWF)""#).unwrap()
});

pub static CONSTANT_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bdefineConstant\s*\(\s*"([A-Za-z_]\w*)""#).unwrap());

pub static MUTATION_TYPE_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\binitializeMutationType(?:Nuc)?\s*\(\s*"?(m?\d+)"?"#).unwrap());

pub static ELEMENT_TYPE_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\binitializeGenomicElementType\s*\(\s*"?(g?\d+)"?"#).unwrap());

pub static INTERACTION_TYPE_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\binitializeInteractionType\s*\(\s*"?(i?\d+)"?"#).unwrap());

pub static SUBPOP_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\baddSubpop(?:Split)?\s*\(\s*"?(p?\d+)"?"#).unwrap());

/// The script-block registration call shapes. Only the first pattern that
/// matches a line is applied; the shapes are mutually exclusive by
/// construction, the stop-at-first-hit is a safety net.
pub static SCRIPT_BLOCK_REGISTRATIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        "registerFirstEvent",
        "registerEarlyEvent",
        "registerLateEvent",
        "registerFitnessEffectCallback",
        "registerMutationEffectCallback",
        "registerInteractionCallback",
        "registerMateChoiceCallback",
        "registerModifyChildCallback",
        "registerRecombinationCallback",
        "registerMutationCallback",
        "registerReproductionCallback",
        "registerSurvivalCallback",
    ]
    .iter()
    .map(|name| Regex::new(&format!(r#"\b{name}\s*\(\s*"(s\d+)""#)).unwrap())
    .collect()
});

/// `name = ClassName(...)` - a constructor call assignment.
pub static CONSTRUCTOR_ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z_]\w*)\s*=\s*([A-Z]\w*)\s*\(").unwrap());

/// `name = expr` - a plain assignment whose right-hand side feeds class
/// inference. Comparison (`==`) is rejected by the caller.
pub static ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z_]\w*)\s*=\s*(.+)$").unwrap());

/// A numbered-identifier reference: subpopulation, mutation type, or
/// genomic element type.
pub static NUMBERED_REF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b([mgp]\d+)\b").unwrap());

/// `instance.member`, optionally followed by `(`.
pub static MEMBER_ACCESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z_]\w*)\s*\.\s*([A-Za-z_]\w*)").unwrap());

/// A call through a bare name. Method calls are excluded by checking the
/// text before the match.
pub static BARE_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z_]\w*)\s*\(").unwrap());

/// Calls to the initialization API.
pub static INITIALIZE_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(initialize[A-Za-z0-9]+)\s*\(").unwrap());

pub static EVALUATE_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\s*(evaluate)\s*\(").unwrap());

/// Interaction queries that require a prior `evaluate()` in their block.
pub static INTERACTION_QUERY_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\.\s*(nearestNeighbors|nearestNeighborsOfPoint|nearestInteractingNeighbors|neighborCount|neighborCountOfPoint|interactingNeighborCount|totalOfNeighborStrengths|localPopulationDensity|interactionDistance|drawByStrength|clippedIntegral|strength|distance)\s*\(",
    )
    .unwrap()
});

/// Offspring-generating methods, legal only inside `reproduction()`.
pub static REPRODUCTION_ONLY_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.\s*(addCrossed|addSelfed|addCloned|addEmpty|addRecombinant|addMultiRecombinant)\s*\(")
        .unwrap()
});

/// Methods that have no meaning under the WF model.
pub static NONWF_ONLY_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\s*(takeMigrants|killIndividuals)\s*\(").unwrap());

pub static POPULATION_FILE_LOAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\breadFromPopulationFile\s*\(").unwrap());

/// First argument of a category-creating call, used to spot dynamic
/// (non-literal) identifier construction.
pub static MUTATION_TYPE_DYNAMIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\binitializeMutationType(?:Nuc)?\s*\(\s*([^,)]+)").unwrap());

pub static ELEMENT_TYPE_DYNAMIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\binitializeGenomicElementType\s*\(\s*([^,)]+)").unwrap());

pub static SUBPOP_DYNAMIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\baddSubpop(?:Split)?\s*\(\s*([^,)]+)").unwrap());

/// A literal numbered-identifier argument: `"p1"`, `p1`, or a bare number.
pub static LITERAL_ID_ARGUMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"?[a-z]?\d+"?$"#).unwrap());
