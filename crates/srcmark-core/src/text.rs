//! Text utilities: line:column positions, indentation and whitespace.
//!
//! Every offset the engine records is a 0-indexed byte offset into the
//! original source. Reports and error messages show 1-indexed line and column
//! numbers instead, computed here. Columns count Unicode scalar values, which
//! is what editors display.

/// Convert a byte offset to 1-indexed line and column, counting chars.
///
/// An offset that falls inside a multi-byte character reports the column of
/// that character.
pub fn byte_offset_to_position_str(content: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 1u32;

    for (i, ch) in content.char_indices() {
        if i >= offset {
            break;
        }
        if i + ch.len_utf8() > offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Leading horizontal whitespace of the line containing `offset`.
///
/// Returns `""` for an offset past the end or off a char boundary.
pub fn line_indent(content: &str, offset: usize) -> &str {
    let Some(before) = content.get(..offset) else {
        return "";
    };
    let line_start = before.rfind('\n').map_or(0, |nl| nl + 1);
    let line = &content[line_start..];
    let width = line
        .find(|c: char| !matches!(c, ' ' | '\t' | '\x0b' | '\x0c'))
        .unwrap_or(line.len());
    &line[..width]
}

/// Follow every newline in `text` with `indent`.
///
/// A trailing newline is indented too, so the source text after an inserted
/// block stays at its column.
pub fn indent_new_lines(text: &str, indent: &str) -> String {
    if indent.is_empty() {
        return text.to_string();
    }
    text.replace('\n', &format!("\n{indent}"))
}

/// Collapse every run of whitespace to a single space and trim the ends.
///
/// Used to print type and declarator text that spans several lines in the
/// source, e.g. `unsigned\n    long` becomes `unsigned long`.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
