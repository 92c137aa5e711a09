//! String/comment-aware lexical scanning
//!
//! Eidos scripts are analyzed line by line with regular expressions, which
//! means code-shaped text inside string literals and comments would corrupt
//! every downstream check. This module provides the character-level state
//! machine that classifies "are we inside a string / `//` comment / `/* */`
//! comment", and the line sanitizers built on top of it.
//!
//! The machine is restartable: `ParseState` is carried from line to line so
//! that multi-line comments and unterminated strings keep masking text on
//! following lines. A string or comment left open at end-of-document is a
//! valid end state, consumed by the structure validator; it is never an
//! internal error.

/// Scanner state carried across characters (and across lines).
///
/// At most one of the three "inside" flags drives behavior at a time; a
/// character inside a string is never reinterpreted as starting a comment.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseState {
    pub in_string: bool,
    pub string_char: Option<char>,
    pub in_single_line_comment: bool,
    pub in_multi_line_comment: bool,
}

/// One line run through the scanner.
pub struct ScannedLine {
    /// The input line with string/comment contents blanked to spaces.
    /// Quote characters are retained; character count matches the input.
    pub sanitized: String,
    /// Byte-indexed map over the *raw* line: `true` where the byte belongs
    /// to code rather than a string or comment.
    mask: Vec<bool>,
}

impl ScannedLine {
    /// Whether the raw-line byte offset falls on code (outside any string
    /// or comment). Out-of-range offsets are never code.
    pub fn is_code(&self, byte_offset: usize) -> bool {
        self.mask.get(byte_offset).copied().unwrap_or(false)
    }
}

/// A quote is escaped when preceded by an odd number of backslashes.
fn is_escaped(chars: &[char], index: usize) -> bool {
    let mut backslashes = 0;
    let mut i = index;
    while i > 0 && chars[i - 1] == '\\' {
        backslashes += 1;
        i -= 1;
    }
    backslashes % 2 == 1
}

/// Replay the state machine over one line, producing the sanitized text and
/// the code mask. `state` is updated in place; single-line comments always
/// end at the newline, strings and `/* */` comments carry over.
pub fn scan_line(line: &str, state: &mut ParseState) -> ScannedLine {
    let chars: Vec<char> = line.chars().collect();
    let mut sanitized = String::with_capacity(line.len());
    let mut mask = Vec::with_capacity(line.len());

    state.in_single_line_comment = false;

    let mut push = |c: char, keep: char, code: bool, mask: &mut Vec<bool>, out: &mut String| {
        out.push(keep);
        for _ in 0..c.len_utf8() {
            mask.push(code);
        }
    };

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        if state.in_multi_line_comment {
            if c == '*' && chars.get(i + 1) == Some(&'/') {
                state.in_multi_line_comment = false;
                push(c, ' ', false, &mut mask, &mut sanitized);
                push('/', ' ', false, &mut mask, &mut sanitized);
                i += 2;
                continue;
            }
            push(c, ' ', false, &mut mask, &mut sanitized);
            i += 1;
            continue;
        }

        if state.in_single_line_comment {
            push(c, ' ', false, &mut mask, &mut sanitized);
            i += 1;
            continue;
        }

        if state.in_string {
            if Some(c) == state.string_char && !is_escaped(&chars, i) {
                state.in_string = false;
                state.string_char = None;
                push(c, c, false, &mut mask, &mut sanitized);
            } else {
                push(c, ' ', false, &mut mask, &mut sanitized);
            }
            i += 1;
            continue;
        }

        match c {
            '"' | '\'' => {
                state.in_string = true;
                state.string_char = Some(c);
                push(c, c, false, &mut mask, &mut sanitized);
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                state.in_single_line_comment = true;
                push(c, ' ', false, &mut mask, &mut sanitized);
                push('/', ' ', false, &mut mask, &mut sanitized);
                i += 2;
                continue;
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                state.in_multi_line_comment = true;
                push(c, ' ', false, &mut mask, &mut sanitized);
                push('*', ' ', false, &mut mask, &mut sanitized);
                i += 2;
                continue;
            }
            _ => push(c, c, true, &mut mask, &mut sanitized),
        }
        i += 1;
    }

    ScannedLine { sanitized, mask }
}

/// Strip strings and comments from a line, preserving column alignment.
pub fn remove_comments_and_strings(line: &str, state: &mut ParseState) -> String {
    scan_line(line, state).sanitized
}

/// Count `{` and `}` on an already-sanitized line. Returns (opens, closes),
/// not a net value; callers combine the counts with a running balance.
pub fn brace_counts(sanitized: &str) -> (usize, usize) {
    delimiter_counts(sanitized, '{', '}')
}

/// Count `(` and `)` on an already-sanitized line.
pub fn paren_counts(sanitized: &str) -> (usize, usize) {
    delimiter_counts(sanitized, '(', ')')
}

fn delimiter_counts(sanitized: &str, open: char, close: char) -> (usize, usize) {
    let mut opens = 0;
    let mut closes = 0;
    for c in sanitized.chars() {
        if c == open {
            opens += 1;
        } else if c == close {
            closes += 1;
        }
    }
    (opens, closes)
}

/// Replay the scanner over the whole document and report the opening
/// position `(line, byte column)` of a string still open at end-of-document.
pub fn find_unclosed_string(text: &str) -> Option<(usize, usize)> {
    let mut state = ParseState::default();
    let mut open_at = None;

    for (line_index, line) in text.split('\n').enumerate() {
        let chars: Vec<char> = line.chars().collect();
        state.in_single_line_comment = false;

        let mut byte = 0;
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if state.in_multi_line_comment {
                if c == '*' && chars.get(i + 1) == Some(&'/') {
                    state.in_multi_line_comment = false;
                    byte += 2;
                    i += 2;
                    continue;
                }
            } else if state.in_single_line_comment {
                // swallowed until the newline
            } else if state.in_string {
                if Some(c) == state.string_char && !is_escaped(&chars, i) {
                    state.in_string = false;
                    state.string_char = None;
                    open_at = None;
                }
            } else {
                match c {
                    '"' | '\'' => {
                        state.in_string = true;
                        state.string_char = Some(c);
                        open_at = Some((line_index, byte));
                    }
                    '/' if chars.get(i + 1) == Some(&'/') => {
                        state.in_single_line_comment = true;
                        byte += 2;
                        i += 2;
                        continue;
                    }
                    '/' if chars.get(i + 1) == Some(&'*') => {
                        state.in_multi_line_comment = true;
                        byte += 2;
                        i += 2;
                        continue;
                    }
                    _ => {}
                }
            }
            byte += c.len_utf8();
            i += 1;
        }
    }

    if state.in_string {
        open_at
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitize(line: &str) -> String {
        remove_comments_and_strings(line, &mut ParseState::default())
    }

    #[test]
    fn strings_are_blanked() {
        assert_eq!(sanitize(r#"x = "p1 } {";"#), r#"x = "       ";"#);
    }

    #[test]
    fn single_line_comment_is_blanked() {
        assert_eq!(sanitize("x = 1; // set { x"), "x = 1;          ");
    }

    #[test]
    fn comment_start_inside_string_is_ignored() {
        let out = sanitize(r#"s = "a // b";"#);
        assert_eq!(out, r#"s = "      ";"#);
    }

    #[test]
    fn quote_inside_comment_does_not_open_string() {
        let mut state = ParseState::default();
        scan_line(r#"// say "hi"#, &mut state);
        assert!(!state.in_string);
    }

    #[test]
    fn escaped_quote_does_not_close() {
        // "a\" stays open at the escaped quote
        let mut state = ParseState::default();
        scan_line(r#"x = "a\";"#, &mut state);
        assert!(state.in_string);

        // "a\\" closes: the backslash is itself escaped
        let mut state = ParseState::default();
        scan_line(r#"x = "a\\";"#, &mut state);
        assert!(!state.in_string);
    }

    #[test]
    fn multi_line_comment_spans_lines() {
        let mut state = ParseState::default();
        scan_line("x = 1; /* start", &mut state);
        assert!(state.in_multi_line_comment);
        let scan = scan_line("still { masked */ y = 2;", &mut state);
        assert!(!state.in_multi_line_comment);
        assert_eq!(scan.sanitized, "                  y = 2;");
        let (opens, _) = brace_counts(&scan.sanitized);
        assert_eq!(opens, 0);
    }

    #[test]
    fn delimiter_counts_ignore_masked_text() {
        let mut state = ParseState::default();
        let scan = scan_line(r#"foo("(((", bar());"#, &mut state);
        assert_eq!(paren_counts(&scan.sanitized), (2, 2));
    }

    #[test]
    fn mask_tracks_code_positions() {
        let mut state = ParseState::default();
        let line = r#"defineConstant("K", 500);"#;
        let scan = scan_line(line, &mut state);
        assert!(scan.is_code(0));
        assert!(!scan.is_code(line.find('K').unwrap()));
        assert!(scan.is_code(line.find("500").unwrap()));
    }

    #[test]
    fn unclosed_string_reports_opening_position() {
        let text = "x = 1;\ny = \"oops;\nz = 2;";
        assert_eq!(find_unclosed_string(text), Some((1, 4)));
        assert_eq!(find_unclosed_string("x = \"done\";"), None);
    }
}
