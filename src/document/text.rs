//! Conversions between the protocol's line/character grid and byte offsets
//!
//! `character` counts UTF-16 code units, the position encoding negotiated at
//! initialize. Client positions end a line at `\n`, `\r\n` or a lone `\r`.
//! Analyzer rows come from tree-sitter, which only counts `\n`, so
//! [`line_at`] splits on `\n` alone.

use tower_lsp::lsp_types::Position;

/// Byte offset of `position` within `text`.
///
/// A line past the end of the document clamps to the end of the text, and a
/// character past the end of its line clamps to the line end.
pub fn offset_at(text: &str, position: Position) -> usize {
    let mut line_start = 0;
    for _ in 0..position.line {
        match line_break(&text[line_start..]) {
            Some((content, terminator)) => line_start += content + terminator,
            None => return text.len(),
        }
    }

    let rest = &text[line_start..];
    let line = match line_break(rest) {
        Some((content, _)) => &rest[..content],
        None => rest,
    };

    line_start + utf16_to_byte(line, position.character)
}

/// Length of the first line of `text` and of its terminator, or `None` when
/// `text` holds no line break.
fn line_break(text: &str) -> Option<(usize, usize)> {
    let index = text.find(|c: char| c == '\r' || c == '\n')?;
    let terminator = if text[index..].starts_with("\r\n") { 2 } else { 1 };
    Some((index, terminator))
}

/// Byte index within `line` of the given UTF-16 column
pub fn utf16_to_byte(line: &str, character: u32) -> usize {
    let target = character as usize;
    let mut units = 0;
    for (index, ch) in line.char_indices() {
        if units >= target {
            return index;
        }
        units += ch.len_utf16();
    }
    line.len()
}

/// UTF-16 column of a byte index within `line`
pub fn byte_to_utf16(line: &str, byte_column: usize) -> u32 {
    let units = match line.get(..byte_column) {
        Some(prefix) => prefix.encode_utf16().count(),
        None => byte_column,
    };
    units as u32
}

/// Text of line `row`, without its terminator. Empty when out of range.
pub fn line_at(text: &str, row: usize) -> &str {
    text.split('\n').nth(row).unwrap_or("")
}
