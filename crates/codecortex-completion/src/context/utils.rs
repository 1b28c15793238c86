// Position and offset conversion utilities

use crate::types::Position;

pub fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Convert a Position to a byte offset in the code
///
/// Characters past the end of a line clamp to the line end; lines past the
/// end of the text clamp to the text end.
pub fn position_to_byte_offset(code: &str, position: Position) -> usize {
    let mut byte_offset = 0;
    let mut current_line = 0;
    let mut current_char = 0;

    for ch in code.chars() {
        if current_line == position.line
            && (current_char == position.character || ch == '\n')
        {
            return byte_offset;
        }

        byte_offset += ch.len_utf8();

        if ch == '\n' {
            current_line += 1;
            current_char = 0;
        } else {
            current_char += 1;
        }
    }

    byte_offset
}

/// Convert a byte offset to a Position in the code
pub fn byte_offset_to_position(code: &str, byte_offset: usize) -> Position {
    let mut current_line = 0;
    let mut current_char = 0;
    let mut current_byte = 0;

    for ch in code.chars() {
        if current_byte >= byte_offset {
            return Position::new(current_line, current_char);
        }

        current_byte += ch.len_utf8();

        if ch == '\n' {
            current_line += 1;
            current_char = 0;
        } else {
            current_char += 1;
        }
    }

    Position::new(current_line, current_char)
}

/// Extract the prefix (partial identifier) at the cursor position
pub fn extract_prefix(code: &str, position: Position) -> String {
    let byte_offset = position_to_byte_offset(code, position);
    let start = code[..byte_offset]
        .char_indices()
        .rev()
        .take_while(|(_, ch)| is_identifier_char(*ch))
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(byte_offset);

    code[start..byte_offset].to_string()
}

/// Text of the cursor line up to the cursor
pub fn line_before_cursor(code: &str, byte_offset: usize) -> &str {
    let before = &code[..byte_offset];
    match before.rfind('\n') {
        Some(idx) => &before[idx + 1..],
        None => before,
    }
}

/// Lines `[line - radius, line + radius]` joined with newlines
pub fn surrounding_lines(code: &str, line: u32, radius: usize) -> String {
    let line = line as usize;
    let start = line.saturating_sub(radius);
    let end = line.saturating_add(radius);

    code.lines()
        .enumerate()
        .filter(|(idx, _)| *idx >= start && *idx <= end)
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Indentation depth: each tab counts as one level, spaces count in fours
pub fn indentation_level(line: &str) -> usize {
    let mut tabs = 0;
    let mut spaces = 0;
    for ch in line.chars() {
        match ch {
            '\t' => tabs += 1,
            ' ' => spaces += 1,
            _ => break,
        }
    }
    tabs + spaces / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_to_byte_offset() {
        let code = "hello\nworld";
        let pos = Position::new(1, 2);
        let offset = position_to_byte_offset(code, pos);
        assert_eq!(offset, 8); // "hello\nwo"
    }

    #[test]
    fn test_position_past_line_end_clamps() {
        let code = "ab\ncd";
        assert_eq!(position_to_byte_offset(code, Position::new(0, 40)), 2);
        assert_eq!(position_to_byte_offset(code, Position::new(9, 0)), code.len());
    }

    #[test]
    fn test_byte_offset_to_position() {
        let code = "hello\nworld";
        let pos = byte_offset_to_position(code, 8);
        assert_eq!(pos, Position::new(1, 2));
    }

    #[test]
    fn test_multibyte_offsets() {
        let code = "let é = 1;\nx";
        let offset = position_to_byte_offset(code, Position::new(0, 5));
        assert_eq!(&code[offset..offset + 1], " ");
        assert_eq!(byte_offset_to_position(code, offset), Position::new(0, 5));
    }

    #[test]
    fn test_extract_prefix() {
        let code = "let my_var = ";
        let pos = Position::new(0, 13);
        let prefix = extract_prefix(code, pos);
        assert_eq!(prefix, "");
    }

    #[test]
    fn test_extract_prefix_with_word() {
        let code = "let my_var = my";
        let pos = Position::new(0, 15);
        let prefix = extract_prefix(code, pos);
        assert_eq!(prefix, "my");
    }

    #[test]
    fn test_surrounding_lines_window() {
        let code = "a\nb\nc\nd\ne";
        assert_eq!(surrounding_lines(code, 2, 1), "b\nc\nd");
        assert_eq!(surrounding_lines(code, 0, 1), "a\nb");
    }

    #[test]
    fn test_indentation_level() {
        assert_eq!(indentation_level("        x"), 2);
        assert_eq!(indentation_level("\t\tx"), 2);
        assert_eq!(indentation_level("\t    x"), 2);
        assert_eq!(indentation_level("   x"), 0);
    }
}
