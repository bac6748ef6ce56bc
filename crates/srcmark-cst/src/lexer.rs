// Copyright (c) srcmark contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Token-boundary resolver for C source.
//!
//! Syntax nodes record where their last token *begins*. To place text after
//! a node, the end of that token has to be found with a lexical lookup. This
//! module measures exactly one token starting at a given offset; it is not a
//! full tokenizer and keeps no state between calls.
//!
//! Recognized tokens:
//!
//! - identifiers and keywords (ASCII letters, digits, `_`, `$`, and any
//!   non-ASCII character)
//! - preprocessing numbers (`42`, `0x1fUL`, `1.5e-3`, `.5`, `1'000`)
//! - string and character literals, with escapes and the `L`, `u`, `U`,
//!   `u8` prefixes
//! - punctuators, longest match first
//!
//! Whitespace, comments and stray bytes do not start a token.

use thiserror::Error;

/// Errors from measuring a token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// The offset is at or past the end of the source.
    #[error("offset {offset} is out of range for source of length {len}")]
    OutOfRange { offset: usize, len: usize },

    /// No token starts at the offset.
    #[error("no token starts at offset {offset} (found {found:?})")]
    Unlexable { offset: usize, found: char },
}

/// Punctuators, longest first so the first match is the longest match.
const PUNCTUATORS: &[&str] = &[
    "...", "<<=", ">>=", "->", "++", "--", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||",
    "*=", "/=", "%=", "+=", "-=", "&=", "^=", "|=", "##", "::", "[", "]", "(", ")", "{",
    "}", ".", "&", "*", "+", "-", "~", "!", "/", "%", "<", ">", "^", "|", "?", ":", ";",
    "=", ",", "#",
];

/// Encoding prefixes that may precede a string or character literal.
const LITERAL_PREFIXES: &[&str] = &["u8", "u", "U", "L"];

/// Offset one past the end of the token starting at `offset`.
pub fn end_of_token(source: &str, offset: usize) -> Result<usize, LexError> {
    token_len(source, offset).map(|len| offset + len)
}

/// Byte length of the token starting at `offset`.
pub fn token_len(source: &str, offset: usize) -> Result<usize, LexError> {
    let bytes = source.as_bytes();
    if offset >= bytes.len() {
        return Err(LexError::OutOfRange {
            offset,
            len: bytes.len(),
        });
    }
    let unlexable = || LexError::Unlexable {
        offset,
        found: found_char(source, offset),
    };
    if !source.is_char_boundary(offset) {
        return Err(unlexable());
    }

    let rest = &bytes[offset..];
    let first = rest[0];

    if is_ident_start(first) {
        let ident = scan_while(rest, is_ident_continue);
        let word = &rest[..ident];
        let is_prefix = LITERAL_PREFIXES.iter().any(|p| p.as_bytes() == word);
        if is_prefix && matches!(rest.get(ident), Some(b'"' | b'\'')) {
            return quoted_len(&rest[ident..])
                .map(|len| ident + len)
                .ok_or_else(unlexable);
        }
        return Ok(ident);
    }

    if first.is_ascii_digit() || (first == b'.' && rest.get(1).is_some_and(u8::is_ascii_digit)) {
        return Ok(pp_number_len(rest));
    }

    if first == b'"' || first == b'\'' {
        return quoted_len(rest).ok_or_else(unlexable);
    }

    // A slash that opens a comment is not a token
    if rest.starts_with(b"//") || rest.starts_with(b"/*") {
        return Err(unlexable());
    }

    PUNCTUATORS
        .iter()
        .find(|p| rest.starts_with(p.as_bytes()))
        .map(|p| p.len())
        .ok_or_else(unlexable)
}

fn found_char(source: &str, offset: usize) -> char {
    source
        .get(offset..)
        .and_then(|s| s.chars().next())
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

fn scan_while(bytes: &[u8], pred: impl Fn(u8) -> bool) -> usize {
    bytes.iter().position(|&b| !pred(b)).unwrap_or(bytes.len())
}

/// Length of a preprocessing number.
///
/// `pp-number` grows over identifier characters and dots, takes a sign only
/// right after an exponent letter, and accepts `'` digit separators between
/// digits.
fn pp_number_len(bytes: &[u8]) -> usize {
    let mut i = 1;
    while i < bytes.len() {
        let b = bytes[i];
        let prev = bytes[i - 1];
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' {
            i += 1;
        } else if (b == b'+' || b == b'-') && matches!(prev, b'e' | b'E' | b'p' | b'P') {
            i += 1;
        } else if b == b'\'' && bytes.get(i + 1).is_some_and(u8::is_ascii_alphanumeric) {
            i += 2;
        } else {
            break;
        }
    }
    i
}

/// Length of a quoted literal, quotes included.
///
/// `None` when the literal is not closed before a newline or the end of
/// input.
fn quoted_len(bytes: &[u8]) -> Option<usize> {
    let quote = bytes[0];
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                // Escape, including a backslash-newline continuation
                if bytes.get(i + 1) == Some(&b'\r') && bytes.get(i + 2) == Some(&b'\n') {
                    i += 3;
                } else {
                    i += 2;
                }
            }
            b'\n' => return None,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_at(source: &str, offset: usize) -> &str {
        let end = end_of_token(source, offset).unwrap();
        &source[offset..end]
    }

    #[test]
    fn identifiers_and_keywords() {
        assert_eq!(token_at("return x;", 0), "return");
        assert_eq!(token_at("__attribute__((x))", 0), "__attribute__");
        assert_eq!(token_at("a1_b2+", 0), "a1_b2");
        assert_eq!(token_at("größe = 1", 0), "größe");
    }

    #[test]
    fn numbers() {
        assert_eq!(token_at("42;", 0), "42");
        assert_eq!(token_at("0x1fUL)", 0), "0x1fUL");
        assert_eq!(token_at("1.5e-3 ", 0), "1.5e-3");
        assert_eq!(token_at("0x1p+4;", 0), "0x1p+4");
        assert_eq!(token_at(".5f,", 0), ".5f");
        assert_eq!(token_at("1'000'000;", 0), "1'000'000");
        assert_eq!(token_at("1+2", 0), "1");
    }

    #[test]
    fn string_and_char_literals() {
        assert_eq!(token_at(r#""a\"b" x"#, 0), r#""a\"b""#);
        assert_eq!(token_at(r"'\'';", 0), r"'\''");
        assert_eq!(token_at(r#"L"wide";"#, 0), r#"L"wide""#);
        assert_eq!(token_at(r#"u8"utf";"#, 0), r#"u8"utf""#);
        assert_eq!(token_at("U'x')", 0), "U'x'");
    }

    #[test]
    fn prefix_identifier_without_quote_is_identifier() {
        assert_eq!(token_at("u8 + 1", 0), "u8");
        assert_eq!(token_at("L;", 0), "L");
    }

    #[test]
    fn punctuators_longest_match() {
        assert_eq!(token_at("}", 0), "}");
        assert_eq!(token_at("...)", 0), "...");
        assert_eq!(token_at("<<= 2", 0), "<<=");
        assert_eq!(token_at("->x", 0), "->");
        assert_eq!(token_at("&&b", 0), "&&");
        assert_eq!(token_at("##x", 0), "##");
        assert_eq!(token_at(". x", 0), ".");
    }

    #[test]
    fn token_in_middle_of_source() {
        let source = "if (x) { y(); } else { z(); }";
        assert_eq!(end_of_token(source, 14), Ok(15));
        assert_eq!(end_of_token(source, 16), Ok(20));
    }

    #[test]
    fn whitespace_is_unlexable() {
        assert_eq!(
            token_len("a b", 1),
            Err(LexError::Unlexable {
                offset: 1,
                found: ' '
            })
        );
    }

    #[test]
    fn comment_opener_is_unlexable() {
        assert!(matches!(
            token_len("x // c", 2),
            Err(LexError::Unlexable { found: '/', .. })
        ));
        assert!(matches!(
            token_len("/* c */", 0),
            Err(LexError::Unlexable { .. })
        ));
        assert_eq!(token_at("a / b", 2), "/");
    }

    #[test]
    fn unterminated_literal_is_unlexable() {
        assert!(matches!(
            token_len("\"abc\nx\"", 0),
            Err(LexError::Unlexable { found: '"', .. })
        ));
        assert!(matches!(token_len("'a", 0), Err(LexError::Unlexable { .. })));
    }

    #[test]
    fn stray_byte_is_unlexable() {
        assert!(matches!(
            token_len("@x", 0),
            Err(LexError::Unlexable { found: '@', .. })
        ));
        assert!(matches!(
            token_len("`", 0),
            Err(LexError::Unlexable { .. })
        ));
    }

    #[test]
    fn offset_at_end_is_out_of_range() {
        assert_eq!(
            token_len("abc", 3),
            Err(LexError::OutOfRange { offset: 3, len: 3 })
        );
        assert_eq!(
            token_len("", 0),
            Err(LexError::OutOfRange { offset: 0, len: 0 })
        );
    }

    #[test]
    fn offset_inside_multibyte_char_is_unlexable() {
        assert!(matches!(token_len("é", 1), Err(LexError::Unlexable { .. })));
    }
}
