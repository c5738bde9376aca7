pub mod prompt_view;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, SelectionField};
use crate::result::Rank;
use crate::typing_policy::InputMode;
use crate::util::format_clock;

use self::prompt_view::{mark_prompt, prompt_lines};
use self::screen::current_screen;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        current_screen(&self.state).render(self, area, buf);
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn help_line(text: &str) -> Paragraph<'_> {
    Paragraph::new(Span::styled(
        text,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
}

pub(crate) fn render_selection(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(5),
            Constraint::Min(3),
            Constraint::Length(2),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(Span::styled(
        "flowtype",
        bold().fg(Color::Magenta),
    ))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    let selection = &app.selection;
    let theme = app.selected_theme();
    let theme_label = match (theme, app.bank()) {
        (Some(theme), _) => theme.label_for(selection.language).to_string(),
        (None, Some(_)) => "no themes for this mode".to_string(),
        (None, None) => "-".to_string(),
    };
    let fields = [
        (SelectionField::Mode, "Mode", selection.language.label().to_string()),
        (SelectionField::Theme, "Theme", theme_label),
        (SelectionField::Length, "Length", selection.length.label().to_string()),
    ];
    let lines: Vec<Line> = fields
        .into_iter()
        .map(|(field, name, value)| {
            let focused = field == selection.focus;
            let style = if focused {
                bold().fg(Color::Yellow)
            } else {
                Style::default()
            };
            let marker = if focused { "▶ " } else { "  " };
            Line::from(vec![
                Span::styled(format!("{marker}{name:<7}"), style),
                Span::styled(format!("< {value} >"), style),
            ])
        })
        .collect();
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("New game"))
        .render(chunks[1], buf);

    let mut details: Vec<Line> = Vec::new();
    if let Some(description) = theme.and_then(|t| t.description.as_deref()) {
        details.push(Line::from(Span::styled(
            description.to_string(),
            Style::default().add_modifier(Modifier::ITALIC),
        )));
    }
    if selection.language == InputMode::Copy {
        details.push(Line::from(
            "Copy mode: spaces and tabs are not scored; Tab inserts a two-space indent, Enter a new line.",
        ));
    }
    Paragraph::new(details)
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    let status = match (app.catalog_error(), app.notice()) {
        (Some(err), _) => Some(Line::from(Span::styled(
            format!("Could not load questions: {err} (F5 to retry)"),
            bold().fg(Color::Red),
        ))),
        (None, Some(notice)) => Some(Line::from(Span::styled(
            notice.to_string(),
            Style::default().fg(Color::Red),
        ))),
        (None, None) => None,
    };
    if let Some(status) = status {
        Paragraph::new(status)
            .wrap(Wrap { trim: true })
            .render(chunks[3], buf);
    }

    help_line("↑/↓ field   ←/→ change   (enter) start   (F5) reload   (esc) quit")
        .render(chunks[4], buf);
}

fn completion_flash(app: &App) -> Option<Line<'static>> {
    let completion = app.last_completion()?;
    let session = app.session()?;
    let line = if completion.flow.bonus_secs > 0 {
        let labels: Vec<&str> = session
            .policy()
            .flow_thresholds
            .iter()
            .filter(|t| completion.flow.claimed.contains(&t.streak))
            .map(|t| t.label.as_str())
            .collect();
        Line::from(Span::styled(
            format!(
                "{} x{}  +{}s  +{} skill",
                labels.join(" / "),
                completion.flow.streak,
                completion.flow.bonus_secs,
                completion.flow.skill_points
            ),
            bold().fg(Color::Cyan),
        ))
    } else if completion.had_mistake {
        Line::from(Span::styled(
            format!("+{} points, flow reset", completion.base_points),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::from(Span::styled(
            format!(
                "+{} points  flow {}",
                completion.base_points + completion.precision_bonus,
                completion.flow.streak
            ),
            Style::default().fg(Color::Green),
        ))
    };
    Some(line)
}

/// Input box contents: committed text, pending romaji at the cursor, and a
/// cursor bar, split at newlines.
fn input_lines(app: &App) -> Vec<Line<'static>> {
    let value = app.input().value();
    let cursor = app.input().cursor();
    let before: String = value.chars().take(cursor).collect();
    let after: String = value.chars().skip(cursor).collect();

    let segments = [
        (before, Style::default()),
        (
            app.composer().pending().to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::UNDERLINED),
        ),
        ("▏".to_string(), Style::default().fg(Color::Gray)),
        (after, Style::default()),
    ];

    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    for (text, style) in segments {
        let mut parts = text.split('\n').peekable();
        while let Some(part) = parts.next() {
            if !part.is_empty() {
                spans.push(Span::styled(part.to_string(), style));
            }
            if parts.peek().is_some() {
                lines.push(Line::from(std::mem::take(&mut spans)));
            }
        }
    }
    lines.push(Line::from(spans));
    lines
}

pub(crate) fn render_play(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(session) = app.session() else {
        return;
    };
    let prompt = session.current_prompt();
    let mode = session.mode();
    let explanation = prompt
        .filter(|_| mode == InputMode::Copy)
        .and_then(|p| p.explanation.as_deref());
    let input = input_lines(app);
    let input_height = (input.len() as u16 + 2).clamp(3, 12);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(if explanation.is_some() { 4 } else { 0 }),
            Constraint::Length(input_height),
            Constraint::Length(1),
        ])
        .split(area);

    let stats = session.live_stats();
    let time_style = if stats.remaining_secs <= 10 {
        bold().fg(Color::Red)
    } else {
        bold()
    };
    Paragraph::new(Line::from(vec![
        Span::styled(format!("Time {}", format_clock(stats.remaining_secs)), time_style),
        Span::raw(format!(
            "   CPM {}   Acc {}%   Flow {}   Skill {}   Max flow {}   Bonus +{}s",
            stats.cpm,
            stats.accuracy,
            stats.flow_streak,
            stats.skill_points,
            stats.max_flow_streak,
            stats.bonus_secs
        )),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    let mut progress = vec![Span::styled(
        format!(
            "Prompt {}/{}   ",
            (session.prompt_position() + 1).min(session.prompt_count()),
            session.prompt_count()
        ),
        Style::default().add_modifier(Modifier::DIM),
    )];
    if let Some(flash) = completion_flash(app) {
        progress.extend(flash.spans);
    }
    Paragraph::new(Line::from(progress))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    if let Some(prompt) = prompt {
        let marks = mark_prompt(&prompt.text, app.input().value(), mode);
        let single_line = !prompt.text.contains('\n')
            && prompt.text.width() <= chunks[2].width.saturating_sub(2) as usize;
        Paragraph::new(prompt_lines(&marks))
            .block(Block::default().borders(Borders::ALL).title(mode.to_string()))
            .alignment(if single_line && mode != InputMode::Copy {
                Alignment::Center
            } else {
                Alignment::Left
            })
            .wrap(Wrap { trim: false })
            .render(chunks[2], buf);
    }

    if let Some(explanation) = explanation {
        Paragraph::new(explanation.to_string())
            .block(Block::default().borders(Borders::ALL).title("What it does"))
            .style(Style::default().fg(Color::Gray))
            .wrap(Wrap { trim: true })
            .render(chunks[3], buf);
    }

    let input_title = if session.has_mistake() {
        Span::styled("Input (mistake)", bold().fg(Color::Red))
    } else {
        Span::raw("Input")
    };
    Paragraph::new(input)
        .block(Block::default().borders(Borders::ALL).title(input_title))
        .render(chunks[4], buf);

    let help = match mode {
        InputMode::Japanese => "type romaji   (enter) commit   (esc) back to selection",
        InputMode::English => "(esc) back to selection",
        InputMode::Copy => "(tab) indent   (enter) new line   (esc) back to selection",
    };
    help_line(help).render(chunks[5], buf);
}

pub(crate) fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(result) = app.result() else {
        return;
    };
    let rank = Rank::evaluate(result);
    let rank_color = match rank {
        Rank::S => Color::Magenta,
        Rank::A => Color::Green,
        Rank::B => Color::Cyan,
        Rank::C => Color::Yellow,
        Rank::D => Color::Gray,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(vec![
        Line::from(Span::styled(format!("Rank {rank}"), bold().fg(rank_color))),
        Line::from(Span::styled(
            rank.message(),
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ])
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    let rows = [
        ("CPM", result.cpm.to_string()),
        ("Accuracy", format!("{}%", result.accuracy)),
        ("Correct characters", result.correct_count.to_string()),
        ("Typed characters", result.total_typed.to_string()),
        ("Time", format!("{}s", result.elapsed_seconds)),
        ("Skill points", result.flow.skill_points.to_string()),
        ("Max flow", result.flow.max_flow_streak.to_string()),
        ("Bonus time", format!("+{}s", result.flow.bonus_time_earned)),
    ];
    let lines: Vec<Line> = rows
        .into_iter()
        .map(|(name, value)| {
            Line::from(vec![
                Span::raw(format!("{name:<20}")),
                Span::styled(value, bold()),
            ])
        })
        .collect();
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Result"))
        .render(chunks[1], buf);

    help_line("(r)etry from selection / (esc)ape").render(chunks[2], buf);
}
