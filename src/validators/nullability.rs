//! NULL-to-non-nullable argument checks
//!
//! Parses each call's argument list (depth-aware across parentheses and
//! angle brackets; string contents are already blanked by sanitizing, so
//! literal commas cannot split arguments) and matches arguments against the
//! callee's documented parameters, positionally or by name. A literal
//! `NULL` against a parameter whose type code does not allow NULL is an
//! error anchored at the NULL token. Unresolvable callees are skipped.

use tower_lsp::lsp_types::Diagnostic;

use crate::docs::{self, signature_parameters, Parameter};
use crate::patterns;
use crate::types;
use crate::validators::LineContext;

pub fn check_line(ctx: &LineContext, diagnostics: &mut Vec<Diagnostic>) {
    let sanitized = ctx.scan.sanitized.as_str();
    if !sanitized.contains("NULL") && !sanitized.contains("null") {
        return;
    }

    for caps in patterns::BARE_CALL.captures_iter(sanitized) {
        let name = caps.get(1).unwrap();
        let open = caps.get(0).unwrap().end();
        let before = &sanitized[..name.start()];

        let Some(parameters) = resolve_parameters(ctx, before, name.as_str()) else {
            continue;
        };
        if parameters.is_empty() {
            continue;
        }

        for argument in split_arguments(sanitized, open) {
            let trimmed = argument.text.trim();
            let (param, null_offset) = if let Some(rest) = named_null_argument(trimmed) {
                let Some(p) = parameters.iter().find(|p| p.name == rest) else {
                    continue;
                };
                let offset = argument.text.rfind("NULL").or_else(|| argument.text.rfind("null"));
                (p, offset)
            } else if trimmed == "NULL" || trimmed == "null" {
                let Some(p) = parameters.get(argument.index) else {
                    continue;
                };
                let offset = argument.text.find("NULL").or_else(|| argument.text.find("null"));
                (p, offset)
            } else {
                continue;
            };

            if param.nullable {
                continue;
            }
            let Some(offset) = null_offset else { continue };
            let start = argument.start + offset;
            diagnostics.push(types::error(
                types::line_range(ctx.index, start, start + 4),
                format!(
                    "NULL is not a legal value for parameter '{}' of {}()",
                    param.name,
                    name.as_str()
                ),
            ));
        }
    }
}

/// Resolve the documented parameters of the callee: a bare function, or a
/// method on the receiver written immediately before the call.
fn resolve_parameters(ctx: &LineContext, before: &str, name: &str) -> Option<Vec<Parameter>> {
    let docs = docs::docs();
    let receiver = receiver_of(before);

    if let Some(receiver) = receiver {
        let class = ctx.tracking.class_of(receiver)?.to_string();
        let method = docs.method(&class, name)?;
        return Some(signature_parameters(&method.signature));
    }

    let function = docs.function(name)?;
    Some(signature_parameters(&function.signature))
}

/// The identifier before a trailing `.`, if the call is a method call.
fn receiver_of(before: &str) -> Option<&str> {
    let trimmed = before.trim_end();
    let rest = trimmed.strip_suffix('.')?;
    let rest = rest.trim_end();
    let start = rest
        .rfind(|c: char| !c.is_alphanumeric() && c != '_')
        .map_or(0, |i| i + c_len(rest, i));
    let receiver = &rest[start..];
    if receiver.is_empty() {
        None
    } else {
        Some(receiver)
    }
}

fn c_len(s: &str, i: usize) -> usize {
    s[i..].chars().next().map_or(1, |c| c.len_utf8())
}

/// `param = NULL` (named-argument form); returns the parameter name.
fn named_null_argument(trimmed: &str) -> Option<&str> {
    let (name, value) = trimmed.split_once('=')?;
    let value = value.trim();
    if value != "NULL" && value != "null" {
        return None;
    }
    let name = name.trim();
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some(name)
}

struct Argument<'a> {
    index: usize,
    text: &'a str,
    /// Byte offset of `text` within the line.
    start: usize,
}

/// Split the argument list starting at `open` (the byte just past `(`) on
/// top-level commas, tracking nesting across `()` and `<>`. Parsing stops
/// at the matching close paren or the end of the line; a trailing partial
/// argument on an unclosed call is still yielded so its NULL can be
/// checked.
fn split_arguments(line: &str, open: usize) -> Vec<Argument<'_>> {
    let bytes = line.as_bytes();
    let mut arguments = Vec::new();
    let mut depth = 0i32;
    let mut index = 0;
    let mut start = open;

    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'<' => depth += 1,
            b'>' => depth -= 1,
            b')' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            b',' if depth == 0 => {
                arguments.push(Argument {
                    index,
                    text: &line[start..i],
                    start,
                });
                index += 1;
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < i {
        arguments.push(Argument {
            index,
            text: &line[start..i],
            start,
        });
    }
    arguments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_split_on_top_level_commas_only() {
        let line = "foo(a, bar(b, c), d)";
        let args = split_arguments(line, 4);
        let texts: Vec<&str> = args.iter().map(|a| a.text.trim()).collect();
        assert_eq!(texts, vec!["a", "bar(b, c)", "d"]);
    }

    #[test]
    fn unclosed_calls_yield_their_partial_arguments() {
        let line = "foo(a, NULL";
        let args = split_arguments(line, 4);
        assert_eq!(args.len(), 2);
        assert_eq!(args[1].text.trim(), "NULL");
    }

    #[test]
    fn named_arguments_are_recognized() {
        assert_eq!(named_null_argument("subpop = NULL"), Some("subpop"));
        assert_eq!(named_null_argument("subpop == NULL"), None);
        assert_eq!(named_null_argument("x = 5"), None);
    }

    #[test]
    fn receivers_are_extracted() {
        assert_eq!(receiver_of("x = sim."), Some("sim"));
        assert_eq!(receiver_of("  p1."), Some("p1"));
        assert_eq!(receiver_of("x = "), None);
    }
}
