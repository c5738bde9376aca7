use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::typing_policy::InputMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Correct,
    Incorrect,
    Pending,
    /// unscored whitespace in copy mode; `passed` once typing moved beyond it
    Whitespace { passed: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkedChar {
    pub ch: char,
    pub mark: Mark,
}

fn is_unscored(mode: InputMode, c: char) -> bool {
    mode.strips_horizontal_whitespace() && matches!(c, ' ' | '\t')
}

/// Marks each prompt character against the typed text. In copy mode the typed
/// characters line up with the prompt's scored characters only, so
/// indentation width never shifts the comparison.
pub fn mark_prompt(prompt: &str, typed: &str, mode: InputMode) -> Vec<MarkedChar> {
    let typed: Vec<char> = typed.chars().filter(|c| !is_unscored(mode, *c)).collect();
    let mut scored = 0usize;

    prompt
        .chars()
        .map(|ch| {
            let mark = if is_unscored(mode, ch) {
                Mark::Whitespace {
                    passed: scored < typed.len(),
                }
            } else {
                let mark = match typed.get(scored) {
                    Some(t) if *t == ch => Mark::Correct,
                    Some(_) => Mark::Incorrect,
                    None => Mark::Pending,
                };
                scored += 1;
                mark
            };
            MarkedChar { ch, mark }
        })
        .collect()
}

/// Position of the next character to type.
pub fn cursor_index(marks: &[MarkedChar]) -> Option<usize> {
    marks.iter().position(|m| m.mark == Mark::Pending)
}

/// Styled lines of the prompt, split at newlines.
pub fn prompt_lines(marks: &[MarkedChar]) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let correct = bold.fg(Color::Green);
    let incorrect = bold.fg(Color::Red);
    let pending = bold.add_modifier(Modifier::DIM);
    let cursor = pending.add_modifier(Modifier::UNDERLINED);
    let whitespace = Style::default().fg(Color::DarkGray);
    let whitespace_passed = Style::default().fg(Color::Green).add_modifier(Modifier::DIM);

    let cursor_at = cursor_index(marks);
    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();

    for (idx, marked) in marks.iter().enumerate() {
        let style = match marked.mark {
            Mark::Correct => correct,
            Mark::Incorrect => incorrect,
            Mark::Pending if Some(idx) == cursor_at => cursor,
            Mark::Pending => pending,
            Mark::Whitespace { passed: true } => whitespace_passed,
            Mark::Whitespace { passed: false } => whitespace,
        };
        let shown = match (marked.ch, marked.mark) {
            ('\n', _) => {
                if Some(idx) == cursor_at {
                    spans.push(Span::styled("↵".to_string(), cursor));
                }
                lines.push(Line::from(std::mem::take(&mut spans)));
                continue;
            }
            ('\t', Mark::Whitespace { .. }) => "··".to_string(),
            (_, Mark::Whitespace { .. }) => "·".to_string(),
            (' ', Mark::Incorrect) => "·".to_string(),
            (c, _) => c.to_string(),
        };
        spans.push(Span::styled(shown, style));
    }
    lines.push(Line::from(spans));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marks_of(prompt: &str, typed: &str, mode: InputMode) -> Vec<Mark> {
        mark_prompt(prompt, typed, mode)
            .into_iter()
            .map(|m| m.mark)
            .collect()
    }

    #[test]
    fn positional_marks_for_english() {
        assert_eq!(
            marks_of("cat", "cx", InputMode::English),
            vec![Mark::Correct, Mark::Incorrect, Mark::Pending]
        );
    }

    #[test]
    fn copy_mode_skips_prompt_whitespace() {
        let marks = marks_of("a  b", "ab", InputMode::Copy);
        assert_eq!(
            marks,
            vec![
                Mark::Correct,
                Mark::Whitespace { passed: true },
                Mark::Whitespace { passed: true },
                Mark::Correct,
            ]
        );
    }

    #[test]
    fn copy_mode_whitespace_turns_passed_with_the_cursor() {
        let marks = marks_of("  x\n  y", "x\n", InputMode::Copy);
        assert_eq!(marks[0], Mark::Whitespace { passed: true });
        assert_eq!(marks[2], Mark::Correct);
        assert_eq!(marks[3], Mark::Correct);
        assert_eq!(marks[4], Mark::Whitespace { passed: false });
        assert_eq!(marks[6], Mark::Pending);
    }

    #[test]
    fn typed_indentation_does_not_shift_copy_marks() {
        let marks = marks_of("if x {\n    y", "if x {\n\ty", InputMode::Copy);
        assert!(marks
            .iter()
            .all(|m| matches!(m, Mark::Correct | Mark::Whitespace { passed: true })));
    }

    #[test]
    fn english_spaces_are_scored() {
        assert_eq!(
            marks_of("a b", "a", InputMode::English)[1],
            Mark::Pending
        );
    }

    #[test]
    fn lines_split_at_newlines() {
        let marks = mark_prompt("ab\ncd", "", InputMode::Copy);
        assert_eq!(cursor_index(&marks), Some(0));
        assert_eq!(prompt_lines(&marks).len(), 2);
    }
}
