//! Word wrapping and line clamping for card text.

use super::font::Typeface;

/// Appended to the last visible line when a field is clamped.
pub const ELLIPSIS: &str = "...";

/// Result of laying out one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedText {
    pub lines: Vec<String>,
    pub truncated: bool,
}

/// Wrap `text` to `max_width` and apply an optional line limit.
///
/// Empty text yields a single empty line so the slot is still reserved.
pub fn layout_text(
    text: &str,
    max_width: f32,
    px: f32,
    face: &Typeface,
    max_lines: Option<usize>,
) -> WrappedText {
    let lines = wrap(text, max_width, px, face);
    match max_lines {
        Some(limit) if lines.len() > limit => WrappedText {
            lines: clamp(lines, limit, max_width, px, face),
            truncated: true,
        },
        _ => WrappedText {
            lines,
            truncated: false,
        },
    }
}

/// Greedy word wrap. Words wider than the line are broken by character.
pub fn wrap(text: &str, max_width: f32, px: f32, face: &Typeface) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0.0f32;
        let space = face.advance(' ', px);

        for word in paragraph.split_whitespace() {
            let word_width = face.text_width(word, px);

            if !current.is_empty() && current_width + space + word_width <= max_width {
                current.push(' ');
                current.push_str(word);
                current_width += space + word_width;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
            }

            if word_width <= max_width {
                current.push_str(word);
                current_width = word_width;
            } else {
                // Hard-break an overlong word; the tail continues the next line.
                for ch in word.chars() {
                    let w = face.advance(ch, px);
                    if !current.is_empty() && current_width + w > max_width {
                        lines.push(std::mem::take(&mut current));
                        current_width = 0.0;
                    }
                    current.push(ch);
                    current_width += w;
                }
            }
        }

        lines.push(current);
    }

    // A leading/trailing blank paragraph should not consume a line when the
    // field has other content.
    if lines.len() > 1 {
        lines.retain(|l| !l.is_empty());
        if lines.is_empty() {
            lines.push(String::new());
        }
    }

    lines
}

/// Keep the first `limit` lines, ending the last kept line with an ellipsis.
fn clamp(mut lines: Vec<String>, limit: usize, max_width: f32, px: f32, face: &Typeface) -> Vec<String> {
    lines.truncate(limit);

    if let Some(last) = lines.last_mut() {
        let budget = max_width - face.text_width(ELLIPSIS, px);
        while !last.is_empty() && face.text_width(last, px) > budget {
            last.pop();
        }
        let trimmed_len = last.trim_end().len();
        last.truncate(trimmed_len);
        last.push_str(ELLIPSIS);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PX: f32 = 10.0; // Spleen: 5px per character

    fn face() -> Typeface {
        Typeface::Spleen
    }

    #[test]
    fn test_empty_text_reserves_one_line() {
        let out = layout_text("", 100.0, PX, &face(), Some(2));
        assert_eq!(out.lines, vec![String::new()]);
        assert!(!out.truncated);
    }

    #[test]
    fn test_short_text_single_line() {
        assert_eq!(wrap("Ada Lovelace", 100.0, PX, &face()), vec!["Ada Lovelace"]);
    }

    #[test]
    fn test_wraps_on_word_boundaries() {
        // 50px = 10 characters per line
        let lines = wrap("the quick brown fox jumps", 50.0, PX, &face());
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn test_long_word_breaks_by_character() {
        let lines = wrap("abcdefghijklmnop", 25.0, PX, &face());
        assert_eq!(lines, vec!["abcde", "fghij", "klmno", "p"]);
    }

    #[test]
    fn test_explicit_newlines_start_new_lines() {
        let lines = wrap("Flat 3\nThe Old Rectory", 200.0, PX, &face());
        assert_eq!(lines, vec!["Flat 3", "The Old Rectory"]);
    }

    #[test]
    fn test_clamp_truncates_with_ellipsis() {
        let out = layout_text("the quick brown fox jumps over", 50.0, PX, &face(), Some(2));
        assert!(out.truncated);
        assert_eq!(out.lines.len(), 2);
        assert_eq!(out.lines[0], "the quick");
        assert!(out.lines[1].ends_with(ELLIPSIS));
        assert!(face().text_width(&out.lines[1], PX) <= 50.0);
    }

    #[test]
    fn test_no_clamp_keeps_everything() {
        let out = layout_text("the quick brown fox jumps over", 50.0, PX, &face(), None);
        assert!(!out.truncated);
        assert_eq!(out.lines, vec!["the quick", "brown fox", "jumps over"]);
    }

    #[test]
    fn test_fitting_text_is_not_marked_truncated() {
        let out = layout_text("the quick", 50.0, PX, &face(), Some(1));
        assert_eq!(out.lines, vec!["the quick"]);
        assert!(!out.truncated);
    }

    #[test]
    fn test_unicode_wraps_by_char_not_byte() {
        let lines = wrap("ÅÅÅÅÅÅ", 15.0, PX, &face());
        assert_eq!(lines, vec!["ÅÅÅ", "ÅÅÅ"]);
    }
}
