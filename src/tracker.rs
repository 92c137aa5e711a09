//! The symbol & context tracker
//!
//! One forward pass over the document's lines builds the shared model that
//! every validator and editor-feature provider consumes: which identifiers
//! are declared in each category, what class each tracked variable holds,
//! which callback is active on each line, and which execution model the
//! script selected. Re-running the pass on identical text produces identical
//! state.

use std::collections::{HashMap, HashSet};

use crate::docs::{self, CALLBACK_KEYS};
use crate::inference::infer_class;
use crate::lexer::{self, ParseState, ScannedLine};
use crate::patterns;

/// The execution model selected by the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelType {
    Wf,
    NonWf,
    #[default]
    Unknown,
}

/// The per-document model built by [`track`]. Immutable once returned; it
/// does not outlive one validation request.
#[derive(Debug, Default)]
pub struct TrackingState {
    /// Variable/parameter name -> inferred class. Re-assignment overwrites;
    /// failed inference leaves any earlier entry untouched.
    pub instance_definitions: HashMap<String, String>,
    pub defined_constants: HashSet<String>,
    pub defined_mutation_types: HashSet<String>,
    pub defined_genomic_element_types: HashSet<String>,
    pub defined_interaction_types: HashSet<String>,
    pub defined_subpopulations: HashSet<String>,
    pub defined_script_blocks: HashSet<String>,
    pub defined_species: HashSet<String>,
    /// Set by the first model-type declaration found; later declarations
    /// are ignored.
    pub model_type: ModelType,
    /// The callback active on each line, or `None` at top level. Indexed by
    /// line; the snapshot is taken after header detection and brace
    /// bookkeeping, so a closing-brace line is already top level.
    pub callback_context_by_line: Vec<Option<&'static str>>,
}

impl TrackingState {
    /// The callback key active at `line`, if any.
    pub fn callback_at(&self, line: usize) -> Option<&'static str> {
        self.callback_context_by_line.get(line).copied().flatten()
    }

    /// Resolve the class of an identifier, consulting tracked definitions
    /// first and the fixed instance conventions second.
    pub fn class_of(&self, name: &str) -> Option<&str> {
        if let Some(class) = self.instance_definitions.get(name) {
            return Some(class);
        }
        docs::static_instance_class(name)
    }
}

/// Scan state folded line by line while walking callback blocks.
/// `brace_depth` is only meaningful while `current` is set; it resets
/// whenever a new callback header with an opening brace is recognized, even
/// if a previous callback's block was still open (best-effort recovery from
/// malformed input).
struct CallbackScanState {
    current: Option<&'static str>,
    brace_depth: i32,
}

/// How many subsequent lines the constant tracker inspects for a value
/// spanning multiple lines. Constants whose value starts later than this
/// simply get no inferred class.
const CONSTANT_LOOKAHEAD_LINES: usize = 5;

/// Prefix a bare numeric id with its category letter: `7` -> `m7`.
fn normalize_id(captured: &str, prefix: char) -> String {
    if captured.chars().next().map_or(false, |c| c.is_ascii_digit()) {
        format!("{prefix}{captured}")
    } else {
        captured.to_string()
    }
}

/// Run the tracking pass over a whole document.
pub fn track(text: &str) -> TrackingState {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut parse = ParseState::default();
    let scans: Vec<ScannedLine> = lines
        .iter()
        .map(|line| lexer::scan_line(line, &mut parse))
        .collect();

    let mut state = TrackingState::default();
    let mut callback = CallbackScanState {
        current: None,
        brace_depth: 0,
    };

    for (i, raw) in lines.iter().enumerate() {
        let scan = &scans[i];
        let sanitized = scan.sanitized.as_str();

        // Callback headers open a new context and seed the callback's
        // pseudo-parameters.
        if let Some(caps) = patterns::CALLBACK_HEADER.captures(sanitized) {
            if sanitized.contains('{') {
                let name = caps.get(3).map_or("", |m| m.as_str());
                if let Some(&key) = CALLBACK_KEYS.get(name) {
                    callback.current = Some(key);
                    callback.brace_depth = 0;
                    if let Some(params) = docs::PSEUDO_PARAMETERS.get(key) {
                        for (param, class) in params.iter() {
                            state
                                .instance_definitions
                                .insert((*param).to_string(), (*class).to_string());
                        }
                    }
                    if let Some(id) = caps.get(1) {
                        state.defined_script_blocks.insert(id.as_str().to_string());
                        state
                            .instance_definitions
                            .insert(id.as_str().to_string(), "SLiMEidosBlock".to_string());
                    }
                    if let Some(species) = caps.get(2) {
                        if name == "initialize" {
                            state.defined_species.insert(species.as_str().to_string());
                        }
                    }
                }
            }
        }

        if callback.current.is_some() {
            let (opens, closes) = lexer::brace_counts(sanitized);
            callback.brace_depth += opens as i32 - closes as i32;
            if callback.brace_depth <= 0 && closes > 0 {
                callback.current = None;
            }
        }

        state.callback_context_by_line.push(callback.current);

        // Model type: first declaration wins.
        if state.model_type == ModelType::Unknown {
            if let Some(caps) = patterns::MODEL_TYPE_DECL.captures(raw) {
                if scan.is_code(caps.get(0).map_or(0, |m| m.start())) {
                    state.model_type = match &caps[1] {
                        "WF" => ModelType::Wf,
                        _ => ModelType::NonWf,
                    };
                }
            }
        }

        // Constants, with bounded look-ahead for values on later lines.
        for caps in patterns::CONSTANT_DECL.captures_iter(raw) {
            let whole = caps.get(0).unwrap();
            if !scan.is_code(whole.start()) {
                continue;
            }
            let name = caps[1].to_string();
            state.defined_constants.insert(name.clone());

            let after = &raw[whole.end()..];
            let value = after
                .find(',')
                .map(|comma| after[comma + 1..].trim())
                .unwrap_or("");
            if !value.is_empty() {
                if let Some(class) = infer_class(value) {
                    state
                        .instance_definitions
                        .insert(name, class.to_string());
                }
                continue;
            }

            let mut inspected = 0;
            for later in lines.iter().skip(i + 1) {
                if inspected >= CONSTANT_LOOKAHEAD_LINES {
                    break;
                }
                if later.trim().is_empty() || later.trim_start().starts_with("//") {
                    continue;
                }
                inspected += 1;
                let has_close = later.contains(')');
                let candidate = match later.find(')') {
                    Some(pos) => &later[..pos],
                    None => later,
                };
                if let Some(class) = infer_class(candidate) {
                    state
                        .instance_definitions
                        .insert(name.clone(), class.to_string());
                    break;
                }
                if has_close {
                    break;
                }
            }
        }

        // Per-category declarations.
        for caps in patterns::MUTATION_TYPE_DECL.captures_iter(raw) {
            if scan.is_code(caps.get(0).unwrap().start()) {
                state
                    .defined_mutation_types
                    .insert(normalize_id(&caps[1], 'm'));
            }
        }
        for caps in patterns::ELEMENT_TYPE_DECL.captures_iter(raw) {
            if scan.is_code(caps.get(0).unwrap().start()) {
                state
                    .defined_genomic_element_types
                    .insert(normalize_id(&caps[1], 'g'));
            }
        }
        for caps in patterns::INTERACTION_TYPE_DECL.captures_iter(raw) {
            if scan.is_code(caps.get(0).unwrap().start()) {
                state
                    .defined_interaction_types
                    .insert(normalize_id(&caps[1], 'i'));
            }
        }
        for caps in patterns::SUBPOP_DECL.captures_iter(raw) {
            if scan.is_code(caps.get(0).unwrap().start()) {
                let id = normalize_id(&caps[1], 'p');
                state
                    .instance_definitions
                    .insert(id.clone(), "Subpopulation".to_string());
                state.defined_subpopulations.insert(id);
            }
        }

        // Script-block registrations; only the first matching shape applies.
        for registration in patterns::SCRIPT_BLOCK_REGISTRATIONS.iter() {
            if let Some(caps) = registration.captures(raw) {
                if scan.is_code(caps.get(0).unwrap().start()) {
                    let id = caps[1].to_string();
                    state
                        .instance_definitions
                        .insert(id.clone(), "SLiMEidosBlock".to_string());
                    state.defined_script_blocks.insert(id);
                }
                break;
            }
        }

        // Assignments: constructor calls bind the class directly, anything
        // else goes through expression inference.
        if let Some(caps) = patterns::CONSTRUCTOR_ASSIGNMENT.captures(sanitized) {
            let class = &caps[2];
            if docs::docs().is_constructor(class) {
                state
                    .instance_definitions
                    .insert(caps[1].to_string(), class.to_string());
                continue;
            }
        }
        if let Some(caps) = patterns::ASSIGNMENT.captures(sanitized) {
            let rhs = caps[2].trim();
            if !rhs.starts_with('=') {
                if let Some(class) = infer_class(rhs) {
                    state
                        .instance_definitions
                        .insert(caps[1].to_string(), class.to_string());
                }
            }
        }
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_context_covers_nested_blocks() {
        let text = "initialize() {\n\tinitializeMutationRate(1e-7);\n}\n\
                    1 early() {\n\tif (T) {\n\t\tx = 1;\n\t}\n}\n";
        let state = track(text);
        assert_eq!(state.callback_at(0), Some("initialize()"));
        assert_eq!(state.callback_at(1), Some("initialize()"));
        assert_eq!(state.callback_at(2), None);
        assert_eq!(state.callback_at(3), Some("early()"));
        assert_eq!(state.callback_at(5), Some("early()"));
        assert_eq!(state.callback_at(7), None);
    }

    #[test]
    fn one_line_callback_closes_on_its_own_line() {
        // The context snapshot is taken after brace bookkeeping, so a
        // header whose block also closes on the same line is already back
        // at top level.
        let state = track("1 early() { sim.outputFull(); }\nx = 1;\n");
        assert_eq!(state.callback_at(0), None);
        assert_eq!(state.callback_at(1), None);
    }

    #[test]
    fn model_type_first_declaration_wins() {
        let text = "initialize() {\n\
                    \tinitializeSLiMModelType(\"nonWF\");\n\
                    \tinitializeSLiMModelType(\"WF\");\n}\n";
        let state = track(text);
        assert_eq!(state.model_type, ModelType::NonWf);
    }

    #[test]
    fn declarations_are_recorded_per_category() {
        let text = "initialize() {\n\
                    \tinitializeMutationType(\"m1\", 0.5, \"f\", 0.0);\n\
                    \tinitializeGenomicElementType(\"g1\", m1, 1.0);\n\
                    \tinitializeInteractionType(1, \"xy\", maxDistance=1.0);\n}\n\
                    1 early() {\n\tsim.addSubpop(\"p1\", 500);\n}\n";
        let state = track(text);
        assert!(state.defined_mutation_types.contains("m1"));
        assert!(state.defined_genomic_element_types.contains("g1"));
        assert!(state.defined_interaction_types.contains("i1"));
        assert!(state.defined_subpopulations.contains("p1"));
        assert_eq!(
            state.instance_definitions.get("p1").map(String::as_str),
            Some("Subpopulation")
        );
    }

    #[test]
    fn declarations_inside_strings_are_ignored() {
        let state = track("x = \"initializeMutationType(\\\"m1\\\", 0.5, \\\"f\\\", 0.0)\";\n");
        assert!(state.defined_mutation_types.is_empty());
    }

    #[test]
    fn pseudo_parameters_are_seeded_by_headers() {
        let state = track("mutationEffect(m1) {\n\treturn effect;\n}\n");
        assert_eq!(
            state.instance_definitions.get("mut").map(String::as_str),
            Some("Mutation")
        );
        assert_eq!(
            state
                .instance_definitions
                .get("individual")
                .map(String::as_str),
            Some("Individual")
        );
    }

    #[test]
    fn script_block_ids_are_tracked_from_headers_and_registrations() {
        let text = "s1 1000 late() {\n\tsim.outputFull();\n}\n\
                    1 early() {\n\tcommunity.registerLateEvent(\"s2\", \"{ x = 1; }\", 10, 10);\n}\n";
        let state = track(text);
        assert!(state.defined_script_blocks.contains("s1"));
        assert!(state.defined_script_blocks.contains("s2"));
        assert_eq!(
            state.instance_definitions.get("s2").map(String::as_str),
            Some("SLiMEidosBlock")
        );
    }

    #[test]
    fn assignment_inference_records_and_preserves() {
        let text = "inds = p1.individuals;\ninds = unknownCall(inds);\n";
        let state = track(text);
        assert_eq!(
            state.instance_definitions.get("inds").map(String::as_str),
            Some("Individual")
        );
    }

    #[test]
    fn constructor_assignment_binds_class_directly() {
        let state = track("d = Dictionary(\"k\", 1);\n");
        assert_eq!(
            state.instance_definitions.get("d").map(String::as_str),
            Some("Dictionary")
        );
    }

    #[test]
    fn constant_class_inferred_on_same_line() {
        let state = track("defineConstant(\"POP\", sim.addSubpop(\"p1\", 100));\n");
        assert!(state.defined_constants.contains("POP"));
        assert_eq!(
            state.instance_definitions.get("POP").map(String::as_str),
            Some("Subpopulation")
        );
    }

    #[test]
    fn constant_class_inferred_within_lookahead() {
        let text = "defineConstant(\"POP\",\n\n\tsim.addSubpop(\"p1\", 100));\n";
        let state = track(text);
        assert_eq!(
            state.instance_definitions.get("POP").map(String::as_str),
            Some("Subpopulation")
        );
    }

    #[test]
    fn constant_lookahead_is_bounded() {
        let text = "defineConstant(\"POP\",\n\tc(\n\t1,\n\t2,\n\t3,\n\t4,\n\tsim.addSubpop(\"p1\", 100)));\n";
        let state = track(text);
        assert!(state.defined_constants.contains("POP"));
        assert!(!state.instance_definitions.contains_key("POP"));
    }

    #[test]
    fn species_names_come_from_initialize_headers() {
        let text = "species mouse initialize() {\n\tinitializeMutationRate(1e-7);\n}\n";
        let state = track(text);
        assert!(state.defined_species.contains("mouse"));
    }
}
