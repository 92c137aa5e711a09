//! Rename handler and shared position utilities
//!
//! Rename is textual: every word-boundary occurrence of the symbol outside
//! strings and comments is edited. Reserved identifiers and documented API
//! names are refused; renaming those would change what the script means
//! without changing what it does.

use regex::Regex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{Position, Range, RenameParams, TextEdit, WorkspaceEdit};

use slimlsp::docs::{self, RESERVED_IDENTIFIERS};
use slimlsp::lexer::{self, ParseState};

use crate::Backend;

/// The byte span of the identifier covering `character` on `line`, if any.
pub(crate) fn word_at(line: &str, character: usize) -> Option<(usize, usize)> {
    let bytes = line.as_bytes();
    if character > bytes.len() {
        return None;
    }
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';

    let mut start = character.min(bytes.len());
    while start > 0 && is_word(bytes[start - 1]) {
        start -= 1;
    }
    let mut end = character;
    while end < bytes.len() && is_word(bytes[end]) {
        end += 1;
    }
    if start == end || bytes[start].is_ascii_digit() {
        return None;
    }
    Some((start, end))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub async fn handle_rename(
    backend: &Backend,
    params: RenameParams,
) -> Result<Option<WorkspaceEdit>> {
    let uri = params.text_document_position.text_document.uri.clone();
    let position = params.text_document_position.position;
    let new_name = params.new_name;

    if !is_identifier(&new_name) {
        return Ok(None);
    }

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
    let old_name = line[start..end].to_string();

    // The language's own names are not the user's to rename.
    let docs = docs::docs();
    if RESERVED_IDENTIFIERS.contains(old_name.as_str())
        || docs.function(&old_name).is_some()
        || docs.class(&old_name).is_some()
        || docs::CALLBACK_KEYS.contains_key(old_name.as_str())
    {
        return Ok(None);
    }

    let edits = occurrence_edits(&file.content, &old_name, &new_name);
    if edits.is_empty() {
        return Ok(None);
    }

    let mut changes = std::collections::HashMap::new();
    changes.insert(uri, edits);
    Ok(Some(WorkspaceEdit {
        changes: Some(changes),
        ..Default::default()
    }))
}

/// Word-boundary occurrences of `old_name` in code (strings and comments
/// excluded), each mapped to a replacement edit.
fn occurrence_edits(content: &str, old_name: &str, new_name: &str) -> Vec<TextEdit> {
    let pattern = match Regex::new(&format!(r"\b{}\b", regex::escape(old_name))) {
        Ok(pattern) => pattern,
        Err(_) => return Vec::new(),
    };

    let mut edits = Vec::new();
    let mut parse = ParseState::default();
    for (index, line) in content.split('\n').enumerate() {
        let scan = lexer::scan_line(line, &mut parse);
        for m in pattern.find_iter(line) {
            if !scan.is_code(m.start()) {
                continue;
            }
            edits.push(TextEdit {
                range: Range::new(
                    Position::new(index as u32, m.start() as u32),
                    Position::new(index as u32, m.end() as u32),
                ),
                new_text: new_name.to_string(),
            });
        }
    }
    edits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_at_finds_identifier_spans() {
        assert_eq!(word_at("sim.addSubpop", 1), Some((0, 3)));
        assert_eq!(word_at("sim.addSubpop", 6), Some((4, 13)));
        assert_eq!(word_at("x = 12;", 4), None);
        assert_eq!(word_at("", 0), None);
    }

    #[test]
    fn rename_edits_skip_strings_and_comments() {
        let content = "inds = p1.individuals;\n// inds here\nx = \"inds\";\ny = inds;\n";
        let edits = occurrence_edits(content, "inds", "adults");
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].range.start.line, 0);
        assert_eq!(edits[1].range.start.line, 3);
    }
}
