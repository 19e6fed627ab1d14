//! Cross-checks a token stream against its source text (spec.md §4.5).
//!
//! A free function with no shared state, grounded on the donor's
//! `verify_positions` pass over its own token stream — same shape, new
//! checks, and a sanitizing formatter so a corrupted token's stolen content
//! never reaches an error string (spec.md §8, scenario 10).

use crate::keywords::lookup_plain;
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn new() -> Self {
        ValidationReport {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn push_error(&mut self, message: String) {
        self.valid = false;
        self.errors.push(message);
    }

    fn push_warning(&mut self, message: String) {
        self.warnings.push(message);
    }
}

/// Validates that `tokens` (as produced by [`crate::scanner::Scanner`] for
/// `source`) are positionally consistent with `source`. Never panics; a
/// malformed token list is reported, not unwound.
pub fn validate_positions(source: &str, tokens: &[Token]) -> ValidationReport {
    let mut report = ValidationReport::new();
    let bytes = source.as_bytes();

    for (i, tok) in tokens.iter().enumerate() {
        if tok.start_offset > tok.end_offset
            || tok.end_offset > bytes.len()
            || tok.start_offset > bytes.len()
        {
            report.push_error(format!(
                "token {i} ({:?}) at {}:{}: span out of bounds [content sanitized]",
                tok.kind, tok.line, tok.column
            ));
            continue;
        }
        let slice = &source[tok.start_offset..tok.end_offset];
        check_value(&mut report, i, tok, slice);

        if let Some(next) = tokens.get(i + 1) {
            if tok.end_offset > next.start_offset {
                report.push_error(format!(
                    "token {i} ({:?}) at {}:{}: overlaps following token [content sanitized]",
                    tok.kind, tok.line, tok.column
                ));
            } else if tok.end_offset < next.start_offset {
                check_gap(
                    &mut report,
                    &source[tok.end_offset..next.start_offset],
                    tok.line,
                    tok.column,
                );
            }
        }
    }

    match tokens.last() {
        Some(last) if last.kind == TokenKind::Eof && last.start_offset == bytes.len() => {}
        Some(last) => report.push_error(format!(
            "EOF token at {}:{} does not sit at end of source [content sanitized]",
            last.line, last.column
        )),
        None => report.push_error("token stream is empty; expected a trailing EOF token".into()),
    }

    report
}

fn check_value(report: &mut ValidationReport, index: usize, tok: &Token, slice: &str) {
    match tok.kind {
        TokenKind::String => {
            let Some(expected) = decode_quoted(slice, '\'', true) else {
                report.push_error(format!(
                    "token {index} (String) at {}:{}: malformed quoting [content sanitized: {} chars]",
                    tok.line,
                    tok.column,
                    slice.chars().count()
                ));
                return;
            };
            if expected != tok.value {
                report.push_error(format!(
                    "token {index} (String) at {}:{}: [token value mismatch: expected {} chars, got {} chars]",
                    tok.line,
                    tok.column,
                    expected.chars().count(),
                    tok.value.chars().count()
                ));
            }
        }
        TokenKind::QuotedIdentifier => {
            let Some(expected) = decode_quoted(slice, '"', false) else {
                report.push_error(format!(
                    "token {index} (QuotedIdentifier) at {}:{}: malformed quoting [content sanitized: {} chars]",
                    tok.line,
                    tok.column,
                    slice.chars().count()
                ));
                return;
            };
            if expected != tok.value {
                report.push_error(format!(
                    "token {index} (QuotedIdentifier) at {}:{}: [token value mismatch: expected {} chars, got {} chars]",
                    tok.line,
                    tok.column,
                    expected.chars().count(),
                    tok.value.chars().count()
                ));
            }
        }
        TokenKind::Unknown => {
            // Unknown tokens may carry either their literal span text (a
            // stray byte) or a synthesized opener for an unterminated
            // comment/string; neither has a fixed relationship to `value`.
        }
        _ => {
            if slice != tok.value {
                report.push_error(format!(
                    "token {index} ({:?}) at {}:{}: [token value mismatch: expected {} chars, got {} chars]",
                    tok.kind,
                    tok.line,
                    tok.column,
                    slice.chars().count(),
                    tok.value.chars().count()
                ));
            }
        }
    }
}

/// Strips the surrounding quote char and, for strings, collapses `''` to `'`.
fn decode_quoted(slice: &str, quote: char, collapse_doubled: bool) -> Option<String> {
    let mut chars = slice.chars();
    if chars.next()? != quote {
        return None;
    }
    let body: Vec<char> = chars.collect();
    if body.last().copied() != Some(quote) {
        return None;
    }
    let body = &body[..body.len() - 1];
    if !collapse_doubled {
        return Some(body.iter().collect());
    }
    let mut out = String::new();
    let mut i = 0;
    while i < body.len() {
        if body[i] == quote {
            if i + 1 < body.len() && body[i + 1] == quote {
                out.push(quote);
                i += 2;
                continue;
            }
            return None; // a lone, unescaped quote inside the body
        }
        out.push(body[i]);
        i += 1;
    }
    Some(out)
}

/// Verifies a trivia gap between two tokens decomposes entirely into
/// whitespace and recognized comment forms, emitting a warning for brace
/// comments that look like they contain live code.
fn check_gap(report: &mut ValidationReport, gap: &str, line: usize, column: usize) {
    let bytes = gap.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if gap[i..].starts_with("//") {
            let rest = &gap[i..];
            i += rest.find('\n').unwrap_or(rest.len());
            continue;
        }
        if gap[i..].starts_with("/*") {
            if let Some(end) = gap[i + 2..].find("*/") {
                i += 2 + end + 2;
                continue;
            }
            report.push_error(format!(
                "unterminated block comment in trivia gap near {line}:{column} [content sanitized: {} chars]",
                gap.len() - i
            ));
            return;
        }
        if c == '{' {
            if let Some(end) = gap[i + 1..].find('}') {
                let body = &gap[i + 1..i + 1 + end];
                if looks_like_code(body) {
                    report.push_warning(format!(
                        "brace comment near {line}:{column} looks like code [content sanitized: {} chars]",
                        body.len()
                    ));
                }
                i += 1 + end + 1;
                continue;
            }
            report.push_error(format!(
                "unterminated brace comment in trivia gap near {line}:{column} [content sanitized: {} chars]",
                gap.len() - i
            ));
            return;
        }
        report.push_error(format!(
            "non-trivia byte in gap near {line}:{column} [content sanitized: 1 chars]"
        ));
        return;
    }
}

fn looks_like_code(body: &str) -> bool {
    if body.contains(":=") {
        return true;
    }
    body.split_whitespace()
        .any(|w| lookup_plain(w).is_some() || w.eq_ignore_ascii_case("begin") || w.eq_ignore_ascii_case("end"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    #[test]
    fn well_formed_stream_is_valid() {
        let src = "OBJECT Table 50000 Customer\n{\n  PROPERTIES\n  {\n    CaptionML=ENU=Customer;\n  }\n}\n";
        let tokens = Scanner::new(src).tokenize();
        let report = validate_positions(src, &tokens);
        assert!(report.valid, "errors: {:?}", report.errors);
    }

    #[test]
    fn corrupted_value_never_leaks_into_message() {
        let src = "VAR x : Integer;";
        let mut tokens = Scanner::new(src).tokenize();
        for tok in tokens.iter_mut() {
            if tok.kind == TokenKind::Identifier && tok.value == "x" {
                tok.value = "PROPRIETARY_X".to_string();
            }
        }
        let report = validate_positions(src, &tokens);
        assert!(!report.valid);
        for message in report.errors.iter().chain(report.warnings.iter()) {
            assert!(!message.contains("PROPRIETARY_X"));
        }
    }

    #[test]
    fn string_with_escaped_quote_round_trips() {
        let src = "'it''s'";
        let tokens = Scanner::new(src).tokenize();
        let report = validate_positions(src, &tokens);
        assert!(report.valid, "errors: {:?}", report.errors);
    }

    #[test]
    fn brace_comment_with_code_like_content_warns() {
        let src = "BEGIN { x := 1 } END";
        let tokens = Scanner::new(src).tokenize();
        let report = validate_positions(src, &tokens);
        assert!(report.valid);
        assert!(!report.warnings.is_empty());
    }
}
