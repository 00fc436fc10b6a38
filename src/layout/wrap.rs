//! Line breaking for multiline values.

/// Split `text` into lines no wider than `max_width`.
///
/// Explicit `\n` always breaks. Within a paragraph the only break
/// opportunity is a space; a single word wider than `max_width` stays on its
/// own line rather than being split. Trailing spaces at a break are dropped.
pub fn wrap_lines<F>(text: &str, max_width: f64, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f64,
{
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
        wrap_paragraph(paragraph, max_width, &measure, &mut lines);
    }
    lines
}

fn wrap_paragraph<F>(paragraph: &str, max_width: f64, measure: &F, lines: &mut Vec<String>)
where
    F: Fn(&str) -> f64,
{
    let mut line = String::new();
    for word in paragraph.split_inclusive(' ') {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{}{}", line, word);
        if measure(candidate.trim_end_matches(' ')) <= max_width {
            line = candidate;
        } else {
            lines.push(line.trim_end_matches(' ').to_string());
            line = word.to_string();
        }
    }
    lines.push(line.trim_end_matches(' ').to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    // one unit per character
    fn chars(s: &str) -> f64 {
        s.chars().count() as f64
    }

    #[test]
    fn test_breaks_at_spaces() {
        let lines = wrap_lines("the quick brown fox", 10.0, chars);
        assert_eq!(lines, vec!["the quick", "brown fox"]);
    }

    #[test]
    fn test_keeps_explicit_breaks_and_blank_lines() {
        let lines = wrap_lines("one\n\ntwo", 10.0, chars);
        assert_eq!(lines, vec!["one", "", "two"]);
    }

    #[test]
    fn test_long_word_is_not_split() {
        let lines = wrap_lines("a supercalifragilistic word", 8.0, chars);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "word"]);
    }

    #[test]
    fn test_hyphen_is_not_a_break() {
        let lines = wrap_lines("well-known", 5.0, chars);
        assert_eq!(lines, vec!["well-known"]);
    }

    #[test]
    fn test_empty_text_is_one_empty_line() {
        assert_eq!(wrap_lines("", 10.0, chars), vec![String::new()]);
    }
}
