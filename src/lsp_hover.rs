//! LSP Hover Module
//!
//! Hover documentation for the word under the cursor, resolved in order
//! against: tracked instance definitions (showing the inferred class),
//! documented functions, callback blocks, value types, and constants
//! declared by the script itself.

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    Hover, HoverContents, HoverParams, LanguageString, MarkedString, Position, Range,
};

use slimlsp::docs;

use crate::lsp_handlers::word_at;
use crate::Backend;

pub async fn handle_hover(backend: &Backend, params: HoverParams) -> Result<Option<Hover>> {
    let uri = params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;

    let Some(file) = backend.files.get(&uri) else {
        return Ok(None);
    };

    let line = file
        .content
        .split('\n')
        .nth(position.line as usize)
        .unwrap_or("");
    let Some((start, end)) = word_at(line, position.character as usize) else {
        return Ok(None);
    };
    let word = &line[start..end];
    let range = Range::new(
        Position::new(position.line, start as u32),
        Position::new(position.line, end as u32),
    );

    let docs = docs::docs();
    let mut parts: Vec<MarkedString> = Vec::new();

    if let Some(class) = file.tracking.class_of(word) {
        parts.push(MarkedString::LanguageString(LanguageString {
            language: "slim".to_string(),
            value: format!("{word}: {class}"),
        }));
        if let Some(class_doc) = docs.class(class) {
            if !class_doc.description.is_empty() {
                parts.push(MarkedString::String(class_doc.description.clone()));
            }
        }
    } else if let Some(function) = docs.function(word) {
        parts.push(MarkedString::LanguageString(LanguageString {
            language: "slim".to_string(),
            value: function.signature.clone(),
        }));
        let mut md = function.description.clone();
        if let Some(source) = &function.source {
            md.push_str(&format!("\n\n_{source} function_"));
        }
        parts.push(MarkedString::String(md));
    } else if let Some(callback) = docs.callback(&format!("{word}()")) {
        parts.push(MarkedString::LanguageString(LanguageString {
            language: "slim".to_string(),
            value: callback.signature.clone(),
        }));
        parts.push(MarkedString::String(callback.description.clone()));
    } else if let Some(type_doc) = docs.types.get(word) {
        parts.push(MarkedString::String(format!(
            "# `{}` (type)\n{}",
            word, type_doc.description
        )));
    } else if file.tracking.defined_constants.contains(word) {
        parts.push(MarkedString::LanguageString(LanguageString {
            language: "slim".to_string(),
            value: format!("defineConstant(\"{word}\", ...)"),
        }));
        parts.push(MarkedString::String(
            "Constant defined by this script.".to_string(),
        ));
    }

    if parts.is_empty() {
        return Ok(None);
    }
    Ok(Some(Hover {
        contents: HoverContents::Array(parts),
        range: Some(range),
    }))
}
