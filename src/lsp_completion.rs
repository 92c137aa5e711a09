//! # Completion Handler Module
//!
//! Completion for SLiM scripts. After a `.`, the receiver's class is
//! resolved through the tracker and its documented methods and properties
//! (plus the universal base class) are offered; anywhere else the
//! documented functions, callback names, language keywords and constants,
//! and every identifier the tracker knows about for this document are
//! offered. An unresolvable receiver offers nothing rather than guessing.

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionParams, CompletionResponse, Documentation,
};

use slimlsp::docs::{self, CALLBACK_KEYS, CONTROL_KEYWORDS};

use crate::Backend;

pub async fn handle_completion(
    backend: &Backend,
    params: CompletionParams,
) -> Result<Option<CompletionResponse>> {
    let uri = params.text_document_position.text_document.uri;
    let position = params.text_document_position.position;

    let Some(file) = backend.files.get(&uri) else {
        return Ok(None);
    };

    let line = file
        .content
        .split('\n')
        .nth(position.line as usize)
        .unwrap_or("");
    let cursor = (position.character as usize).min(line.len());
    let prefix = &line[..cursor];

    if let Some(receiver) = member_receiver(prefix) {
        let Some(class) = file.tracking.class_of(receiver) else {
            return Ok(None);
        };
        return Ok(Some(CompletionResponse::Array(member_items(class))));
    }

    let mut items = Vec::new();
    let docs = docs::docs();

    for (name, function) in &docs.functions {
        items.push(CompletionItem {
            label: name.clone(),
            kind: Some(CompletionItemKind::FUNCTION),
            detail: Some(function.signature.clone()),
            documentation: Some(Documentation::String(function.description.clone())),
            ..Default::default()
        });
    }
    for (key, callback) in &docs.callbacks {
        items.push(CompletionItem {
            label: key.clone(),
            kind: Some(CompletionItemKind::EVENT),
            detail: Some(callback.signature.clone()),
            documentation: Some(Documentation::String(callback.description.clone())),
            ..Default::default()
        });
    }
    for keyword in CONTROL_KEYWORDS.iter() {
        items.push(CompletionItem {
            label: (*keyword).to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            ..Default::default()
        });
    }
    for constant in ["T", "F", "NULL", "NAN", "INF", "PI", "E", "sim", "community"] {
        items.push(CompletionItem {
            label: constant.to_string(),
            kind: Some(CompletionItemKind::CONSTANT),
            ..Default::default()
        });
    }

    for (name, class) in &file.tracking.instance_definitions {
        items.push(CompletionItem {
            label: name.clone(),
            kind: Some(CompletionItemKind::VARIABLE),
            detail: Some(class.clone()),
            ..Default::default()
        });
    }
    let tracked_sets = [
        &file.tracking.defined_constants,
        &file.tracking.defined_mutation_types,
        &file.tracking.defined_genomic_element_types,
        &file.tracking.defined_interaction_types,
        &file.tracking.defined_subpopulations,
        &file.tracking.defined_script_blocks,
        &file.tracking.defined_species,
    ];
    for set in tracked_sets {
        for name in set.iter() {
            if file.tracking.instance_definitions.contains_key(name) {
                continue;
            }
            items.push(CompletionItem {
                label: name.clone(),
                kind: Some(CompletionItemKind::VARIABLE),
                ..Default::default()
            });
        }
    }

    Ok(Some(CompletionResponse::Array(items)))
}

/// If the cursor sits in member position (`receiver.partialWord?`), the
/// receiver identifier.
fn member_receiver(prefix: &str) -> Option<&str> {
    let bytes = prefix.as_bytes();
    let mut i = prefix.len();
    while i > 0 && (bytes[i - 1].is_ascii_alphanumeric() || bytes[i - 1] == b'_') {
        i -= 1;
    }
    if i == 0 || bytes[i - 1] != b'.' {
        return None;
    }
    let mut start = i - 1;
    while start > 0 && (bytes[start - 1].is_ascii_alphanumeric() || bytes[start - 1] == b'_') {
        start -= 1;
    }
    let receiver = &prefix[start..i - 1];
    if receiver.is_empty() {
        None
    } else {
        Some(receiver)
    }
}

fn member_items(class: &str) -> Vec<CompletionItem> {
    let docs = docs::docs();
    let mut items = Vec::new();

    let mut classes = vec![class];
    if class != docs::BASE_CLASS {
        classes.push(docs::BASE_CLASS);
    }
    for class_name in classes {
        let Some(class_doc) = docs.class(class_name) else {
            continue;
        };
        for (name, method) in &class_doc.methods {
            items.push(CompletionItem {
                label: name.clone(),
                kind: Some(CompletionItemKind::METHOD),
                detail: Some(method.signature.clone()),
                documentation: Some(Documentation::String(method.description.clone())),
                ..Default::default()
            });
        }
        for (name, property) in &class_doc.properties {
            items.push(CompletionItem {
                label: name.clone(),
                kind: Some(CompletionItemKind::FIELD),
                detail: Some(property.value_type.clone()),
                documentation: Some(Documentation::String(property.description.clone())),
                ..Default::default()
            });
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_receiver_is_extracted_from_the_prefix() {
        assert_eq!(member_receiver("x = p1."), Some("p1"));
        assert_eq!(member_receiver("x = p1.ind"), Some("p1"));
        assert_eq!(member_receiver("x = p1"), None);
        assert_eq!(member_receiver(""), None);
    }

    #[test]
    fn member_items_include_base_class_members() {
        let items = member_items("Mutation");
        assert!(items.iter().any(|i| i.label == "setSelectionCoeff"));
        assert!(items.iter().any(|i| i.label == "str"));
    }
}
