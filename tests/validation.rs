//! Document-level validation behavior.

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity};

use slimlsp::validators::validate_document;

fn matching<'a>(diagnostics: &'a [Diagnostic], needle: &str) -> Vec<&'a Diagnostic> {
    diagnostics
        .iter()
        .filter(|d| d.message.contains(needle))
        .collect()
}

#[test]
fn validation_is_idempotent() {
    let script = "initialize() {\n\
                  \tinitializeMutationType(\"m1\", 0.5, \"f\", 0.0);\n\
                  \tinitializeMutationType(\"m1\", 0.5, \"f\", 0.0)\n\
                  }\n\
                  1 early() {\n\
                  \tx = p9\n\
                  }\n";
    let first = validate_document(script);
    let second = validate_document(script);
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn code_shaped_text_in_strings_and_comments_is_inert() {
    let script = "x = \"initializeMutationType(\\\"m1\\\", 0.5, \\\"f\\\", 0.0)\";\n\
                  // initializeMutationType(\"m1\", 0.5, \"f\", 0.0);\n\
                  /* defineConstant(\"function\", 1); p9.setMigrationRates(p8, 0.5); */\n\
                  y = \"p9 m9 g9\";\n";
    let diagnostics = validate_document(script);
    assert!(matching(&diagnostics, "already defined").is_empty());
    assert!(matching(&diagnostics, "reserved identifier").is_empty());
    assert!(matching(&diagnostics, "may not be defined").is_empty());
    assert!(matching(&diagnostics, "may only be called").is_empty());
}

#[test]
fn duplicate_mutation_type_reports_once_at_second_occurrence() {
    let script = "initialize() {\n\
                  \tinitializeMutationType(\"m1\", 0.5, \"f\", 0.0);\n\
                  \tinitializeMutationType(\"m1\", 0.5, \"f\", 0.0);\n\
                  }\n\
                  1 early() {\n\
                  \tsim.addSubpop(\"p1\", 500);\n\
                  }\n";
    let diagnostics = validate_document(script);
    let duplicates = matching(&diagnostics, "already defined");
    assert_eq!(duplicates.len(), 1);
    let duplicate = duplicates[0];
    assert_eq!(duplicate.severity, Some(DiagnosticSeverity::ERROR));
    assert_eq!(duplicate.range.start.line, 2);
    assert!(duplicate.message.contains("'m1'"));
    assert!(duplicate.message.contains("line 2"));
}

#[test]
fn reserved_constant_name_is_not_a_duplicate() {
    let script = "initialize() {\n\
                  \tdefineConstant(\"function\", 10);\n\
                  \tdefineConstant(\"function\", 10);\n\
                  }\n\
                  1 early() {\n\
                  \tsim.addSubpop(\"p1\", 500);\n\
                  }\n";
    let diagnostics = validate_document(script);
    assert_eq!(matching(&diagnostics, "reserved identifier").len(), 2);
    assert!(matching(&diagnostics, "already defined").is_empty());
}

#[test]
fn null_argument_is_flagged_at_the_null_token() {
    let line = "\tsim.registerMutationEffectCallback(\"s1\", \"{ return effect; }\", NULL);";
    let script = format!(
        "initialize() {{\n\tinitializeMutationType(\"m1\", 0.5, \"f\", 0.0);\n}}\n\
         1 early() {{\n{line}\n\tsim.addSubpop(\"p1\", 500);\n}}\n"
    );
    let diagnostics = validate_document(&script);
    let nulls = matching(&diagnostics, "NULL is not a legal value");
    assert_eq!(nulls.len(), 1);
    let null = nulls[0];
    assert!(null.message.contains("'mutType'"));
    assert_eq!(null.range.start.line, 4);
    assert_eq!(
        null.range.start.character as usize,
        line.find("NULL").unwrap()
    );
    assert_eq!(null.range.end.character as usize, line.find("NULL").unwrap() + 4);
}

#[test]
fn nullable_parameters_accept_null() {
    let script = "initialize() {\n\
                  \tinitializeMutationRate(1e-7, NULL);\n\
                  }\n\
                  1 early() {\n\
                  \tsim.addSubpop(\"p1\", 500);\n\
                  }\n";
    let diagnostics = validate_document(script);
    assert!(matching(&diagnostics, "NULL is not a legal value").is_empty());
}

#[test]
fn reproduction_methods_are_context_and_model_checked() {
    // Top level (no callback): context violation.
    let top_level = "x = p1.addCrossed(a, b);\n";
    let diagnostics = validate_document(top_level);
    assert_eq!(
        matching(&diagnostics, "may only be called from a reproduction()").len(),
        1
    );

    // Inside reproduction() under nonWF: legal.
    let non_wf = "initialize() {\n\
                  \tinitializeSLiMModelType(\"nonWF\");\n\
                  }\n\
                  reproduction() {\n\
                  \tsubpop.addCrossed(individual, individual);\n\
                  }\n";
    let diagnostics = validate_document(non_wf);
    assert!(matching(&diagnostics, "addCrossed").is_empty());

    // Inside reproduction() under WF: model violation even though the
    // context is right.
    let wf = non_wf.replace("nonWF", "WF");
    let diagnostics = validate_document(&wf);
    assert_eq!(
        matching(&diagnostics, "addCrossed() is not available in WF models").len(),
        1
    );
    assert_eq!(
        matching(&diagnostics, "reproduction() callbacks cannot be used in WF models").len(),
        1
    );
}

#[test]
fn nonwf_methods_are_flagged_under_wf() {
    let script = "initialize() {\n\
                  \tinitializeSLiMModelType(\"WF\");\n\
                  }\n\
                  1 early() {\n\
                  \tp1.takeMigrants(p2.individuals);\n\
                  }\n";
    let diagnostics = validate_document(script);
    assert_eq!(
        matching(&diagnostics, "takeMigrants() is not available in WF models").len(),
        1
    );
}

#[test]
fn initialize_api_outside_initialize_is_flagged() {
    let script = "initialize() {\n\
                  \tinitializeMutationRate(1e-7);\n\
                  }\n\
                  1 early() {\n\
                  \tinitializeMutationRate(1e-7);\n\
                  }\n";
    let diagnostics = validate_document(script);
    let flagged = matching(&diagnostics, "may only be called from an initialize()");
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].range.start.line, 4);
}

#[test]
fn dynamic_creation_suppresses_undefined_reference_warnings() {
    let script = "initialize() {\n\
                  \tfor (i in 1:5)\n\
                  \t\tinitializeMutationType(\"m\" + i, 0.5, \"f\", 0.0);\n\
                  }\n\
                  1 early() {\n\
                  \tx = sim.countOfMutationsOfType(m42);\n\
                  }\n";
    let diagnostics = validate_document(script);
    assert!(matching(&diagnostics, "'m42'").is_empty());
}

#[test]
fn undefined_numbered_references_warn_without_suppression() {
    let script = "initialize() {\n\
                  \tinitializeMutationType(\"m1\", 0.5, \"f\", 0.0);\n\
                  }\n\
                  1 early() {\n\
                  \tx = sim.countOfMutationsOfType(m42);\n\
                  }\n";
    let diagnostics = validate_document(script);
    let warnings = matching(&diagnostics, "'m42' may not be defined");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity, Some(DiagnosticSeverity::WARNING));
}

#[test]
fn population_file_load_suppresses_subpopulation_warnings() {
    let script = "1 early() {\n\
                  \tsim.readFromPopulationFile(\"state.txt\");\n\
                  }\n\
                  2 late() {\n\
                  \tx = p7.individualCount;\n\
                  }\n";
    let diagnostics = validate_document(script);
    assert!(matching(&diagnostics, "'p7'").is_empty());
}

#[test]
fn interaction_queries_require_prior_evaluate_in_the_block() {
    let script = "1 late() {\n\
                  \tn = i1.nearestNeighbors(x, 3);\n\
                  \ti1.evaluate(p1);\n\
                  \tm = i1.nearestNeighbors(x, 3);\n\
                  }\n\
                  2 late() {\n\
                  \tk = i1.totalOfNeighborStrengths(x);\n\
                  }\n";
    let diagnostics = validate_document(script);
    let before = matching(&diagnostics, "is called before evaluate()");
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].range.start.line, 1);
    let missing = matching(&diagnostics, "requires a prior call to evaluate()");
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].range.start.line, 6);
}

#[test]
fn open_parenthesis_lines_never_warn_about_semicolons() {
    let script = "initialize() {\n\
                  \tinitializeMutationRate(\n\
                  \t\t1e-7);\n\
                  }\n\
                  1 early() {\n\
                  \tsim.addSubpop(\"p1\", 500);\n\
                  }\n";
    let diagnostics = validate_document(script);
    assert!(matching(&diagnostics, "missing a terminating").is_empty());
}

#[test]
fn statement_without_semicolon_warns_once() {
    let script = "1 early() {\n\
                  \tx = 5\n\
                  }\n";
    let diagnostics = validate_document(script);
    let warnings = matching(&diagnostics, "missing a terminating");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].range.start.line, 1);
}

#[test]
fn unclosed_string_is_reported_at_the_opening_quote() {
    let script = "1 early() {\n\tcat(\"unterminated);\n}\n";
    let diagnostics = validate_document(script);
    let unclosed = matching(&diagnostics, "Unclosed string literal");
    assert_eq!(unclosed.len(), 1);
    assert_eq!(unclosed[0].range.start.line, 1);
    assert_eq!(unclosed[0].range.start.character, 5);
}

#[test]
fn unclosed_brace_is_reported_unless_still_typing_the_close() {
    let script = "1 early() {\n\tx = 1;\n";
    let diagnostics = validate_document(script);
    assert_eq!(matching(&diagnostics, "Unclosed brace").len(), 1);

    // A document whose last line is a lone close brace is an edit in
    // progress, not a structural error.
    let in_progress = "1 early() {\n2 late() {\n\tx = 1;\n}";
    let diagnostics = validate_document(in_progress);
    assert!(matching(&diagnostics, "Unclosed brace").is_empty());
}

#[test]
fn deprecated_bare_tick_blocks_are_flagged() {
    let script = "1000 {\n\tsim.outputFull();\n}\n";
    let diagnostics = validate_document(script);
    assert_eq!(matching(&diagnostics, "Deprecated block syntax").len(), 1);
}

#[test]
fn event_headers_with_parameters_are_flagged() {
    let script = "1 early(p1) {\n\tx = 1;\n}\n";
    let diagnostics = validate_document(script);
    assert_eq!(
        matching(&diagnostics, "early() events do not take parameters").len(),
        1
    );
}

#[test]
fn initialize_without_events_is_flagged() {
    let script = "initialize() {\n\tinitializeMutationRate(1e-7);\n}\n";
    let diagnostics = validate_document(script);
    assert_eq!(
        matching(&diagnostics, "no first(), early(), or late() event").len(),
        1
    );

    let with_event = "initialize() {\n\tinitializeMutationRate(1e-7);\n}\n\
                      1 early() {\n\tsim.addSubpop(\"p1\", 500);\n}\n";
    let diagnostics = validate_document(with_event);
    assert!(matching(&diagnostics, "no first(), early(), or late() event").is_empty());
}

#[test]
fn unknown_members_are_flagged_only_when_the_class_resolves() {
    let script = "1 early() {\n\
                  \tsim.addSubpop(\"p1\", 500);\n\
                  }\n\
                  2 late() {\n\
                  \tp1.setMigrationRate(p1, 0.1);\n\
                  \tmystery.setMigrationRate(p1, 0.1);\n\
                  }\n";
    let diagnostics = validate_document(script);
    let unknown = matching(&diagnostics, "has no method named 'setMigrationRate'");
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].range.start.line, 4);
}

#[test]
fn unknown_functions_warn_only_for_api_prefixes() {
    let script = "initialize() {\n\
                  \tinitializeMutationTpye(\"m1\", 0.5, \"f\", 0.0);\n\
                  \tmyHelper(5);\n\
                  }\n\
                  1 early() {\n\
                  \tsim.addSubpop(\"p1\", 500);\n\
                  }\n";
    let diagnostics = validate_document(script);
    let unknown = matching(&diagnostics, "Unknown function");
    assert_eq!(unknown.len(), 1);
    assert!(unknown[0].message.contains("initializeMutationTpye"));
}

#[test]
fn pseudo_parameters_are_restricted_to_their_callbacks() {
    let script = "1 early() {\n\
                  \tx = homozygous;\n\
                  }\n\
                  mutationEffect(m1) {\n\
                  \treturn effect * 2.0;\n\
                  }\n";
    let diagnostics = validate_document(script);
    let outside = matching(&diagnostics, "'homozygous' is only defined inside");
    assert_eq!(outside.len(), 1);
    assert_eq!(outside[0].range.start.line, 1);
    assert!(matching(&diagnostics, "'effect' is only defined inside").is_empty());
}

#[test]
fn evaluate_is_rejected_inside_interaction_callbacks() {
    let script = "interaction(i1) {\n\
                  \ti1.evaluate(p1);\n\
                  \treturn 1.0;\n\
                  }\n";
    let diagnostics = validate_document(script);
    assert_eq!(
        matching(&diagnostics, "evaluate() may not be called from interaction()").len(),
        1
    );
}
