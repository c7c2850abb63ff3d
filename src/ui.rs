use examsim::{
    content::{Answer, Question, SectionSlot, Subject, SubjectContent},
    session::{EndReason, SectionSession, SessionState},
    timer::{format_clock, AlertLevel},
};
use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{App, AppState, StatusLevel};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // tabs + clock
                Constraint::Length(1),
                Constraint::Min(3),    // body
                Constraint::Length(1), // status
                Constraint::Length(1), // legend
            ])
            .split(area);

        render_header(self, chunks[0], buf);
        match self.state {
            AppState::Browse => render_browse(self, chunks[2], buf),
            AppState::Exam => render_exam(self.session(), self.question_cursor, chunks[2], buf),
        }

        if let Some(status) = &self.status {
            let color = match status.level {
                StatusLevel::Info => Color::Cyan,
                StatusLevel::Warn => Color::Yellow,
                StatusLevel::Error => Color::Red,
            };
            Paragraph::new(Span::styled(
                status.text.as_str(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
            .render(chunks[3], buf);
        }

        Paragraph::new(Span::styled(
            legend(self),
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[4], buf);
    }
}

pub fn slot_title(slot: SectionSlot) -> &'static str {
    match slot {
        SectionSlot::Listening => "Listening",
        SectionSlot::Reading => "Reading",
        SectionSlot::Task1 => "Task 1",
        SectionSlot::Task2 => "Task 2",
    }
}

fn state_marker(state: SessionState) -> &'static str {
    match state {
        SessionState::Idle => "",
        SessionState::Running => " ●",
        SessionState::Ended(_) => " ✓",
    }
}

pub fn clock_style(level: AlertLevel) -> Style {
    let style = Style::default().add_modifier(Modifier::BOLD);
    match level {
        AlertLevel::Normal => style,
        AlertLevel::Caution => style.fg(Color::Rgb(255, 165, 0)),
        AlertLevel::Urgent => style.fg(Color::Red),
    }
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let mut spans = vec![Span::styled(format!("IELTS {}  ", app.exam.module()), bold)];
    let tabs = SectionSlot::ALL.into_iter().map(|slot| {
        let label = format!(
            "{}{}",
            slot_title(slot),
            state_marker(app.exam.session(slot).state())
        );
        if slot == app.slot {
            Span::styled(label, bold.add_modifier(Modifier::UNDERLINED))
        } else {
            Span::styled(label, dim)
        }
    });
    spans.extend(Itertools::intersperse(tabs, Span::styled(" | ", dim)));
    Paragraph::new(Line::from(spans)).render(area, buf);

    let timer = app.session().timer();
    let clock = match app.session().state() {
        SessionState::Idle => String::new(),
        _ => timer.clock(),
    };
    Paragraph::new(Span::styled(clock, clock_style(timer.alert_level())))
        .alignment(Alignment::Right)
        .render(area, buf);
}

fn render_browse(app: &App, area: Rect, buf: &mut Buffer) {
    let session = app.session();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", session.key().label()));
    let inner = block.inner(area);
    block.render(area, buf);

    let subjects = app.subjects();
    if subjects.is_empty() {
        Paragraph::new("No subjects available for this section.")
            .style(Style::default().fg(Color::Gray))
            .render(inner, buf);
        return;
    }

    let active = session.subject().map(|s| s.id.as_str());
    let width = inner.width.saturating_sub(4) as usize;
    let lines = subjects
        .iter()
        .enumerate()
        .map(|(idx, subject)| {
            let marker = if Some(subject.id.as_str()) == active {
                "* "
            } else {
                "  "
            };
            let text = truncate_to_width(&format!("{marker}{}", subject.title), width);
            if idx == app.subject_cursor {
                Line::from(Span::styled(
                    format!("> {text}"),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(format!("  {text}"))
            }
        })
        .collect::<Vec<_>>();

    let scroll = scroll_offset(app.subject_cursor, 1, inner.height);
    Paragraph::new(lines).scroll((scroll, 0)).render(inner, buf);
}

/// First visible row so that `rows` lines starting at `cursor_row` fit in `height`.
fn scroll_offset(cursor_row: usize, rows: usize, height: u16) -> u16 {
    let top = (cursor_row + rows).saturating_sub(height as usize);
    u16::try_from(top).unwrap_or(u16::MAX)
}

fn render_exam(session: &SectionSession, cursor: usize, area: Rect, buf: &mut Buffer) {
    let Some(subject) = session.subject() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(info_line(session)).render(chunks[0], buf);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    Paragraph::new(subject.body.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", subject.title)),
        )
        .wrap(Wrap { trim: false })
        .render(panes[0], buf);

    match &subject.content {
        SubjectContent::Questions(questions) => {
            render_questions(session, questions, cursor, panes[1], buf)
        }
        SubjectContent::Task(_) => render_editor(session, subject, panes[1], buf),
    }

    let summary = session.summary();
    let color = if summary.is_complete() {
        Color::Green
    } else {
        Color::Blue
    };
    Gauge::default()
        .gauge_style(Style::default().fg(color))
        .ratio(summary.progress_ratio())
        .label(summary.label())
        .render(chunks[2], buf);
}

fn info_line(session: &SectionSession) -> Line<'static> {
    let timer = session.timer();
    match session.state() {
        SessionState::Idle => {
            Line::from(format!(
                "Press enter to start ({} minutes)",
                session.planned_duration().as_secs() / 60
            ))
        }
        SessionState::Running => {
            let mut spans = vec![Span::styled(
                format!("Time remaining {}", timer.clock()),
                clock_style(timer.alert_level()),
            )];
            if let Some(playback) = session.playback() {
                let icon = if playback.is_playing() { "▶" } else { "⏸" };
                spans.push(Span::raw(format!(
                    "   {icon} Part {}/{}  {}",
                    playback.part(),
                    playback.parts(),
                    playback.clock()
                )));
            }
            Line::from(spans)
        }
        SessionState::Ended(reason) => {
            let why = match reason {
                EndReason::UserEnded => "Section ended",
                EndReason::TimedOut => "Time is up",
            };
            Line::from(Span::styled(
                format!("{why}. Time used {}", format_clock(timer.elapsed())),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ))
        }
    }
}

fn render_questions(
    session: &SectionSession,
    questions: &[Question],
    cursor: usize,
    area: Rect,
    buf: &mut Buffer,
) {
    let block = Block::default().borders(Borders::ALL).title(" Questions ");
    let inner = block.inner(area);
    block.render(area, buf);

    let highlight = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let mut lines = Vec::new();
    let mut cursor_line = 0;
    for (idx, question) in questions.iter().enumerate() {
        if idx == cursor {
            cursor_line = lines.len();
        }
        let prompt = format!("{}. {}", question.id, question.prompt);
        lines.push(Line::from(Span::styled(
            prompt,
            if idx == cursor { highlight } else { Style::default() },
        )));
        lines.push(Line::from(Span::styled(
            format!("   {}", answer_text(question, session.answer(&question.id))),
            dim,
        )));
    }

    // keep the current question and its answer line on screen
    let scroll = scroll_offset(cursor_line, 2, inner.height);
    Paragraph::new(lines).scroll((scroll, 0)).render(inner, buf);
}

/// One-line rendering of an answer, with the options for choice questions.
pub fn answer_text(question: &Question, answer: Option<&Answer>) -> String {
    let labels = question.kind.option_labels();
    if labels.is_empty() {
        return match answer.and_then(Answer::as_text) {
            Some(text) => format!("> {text}"),
            None => "> ...".to_string(),
        };
    }
    let picked = |i: usize| match answer {
        Some(Answer::Choice(c)) => *c == i,
        Some(Answer::Choices(set)) => set.contains(&i),
        _ => false,
    };
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let mark = if picked(i) { "x" } else { " " };
            format!("[{mark}] {} {label}", i + 1)
        })
        .join("  ")
}

fn render_editor(session: &SectionSession, subject: &Subject, area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Your response ");
    let inner = block.inner(area);
    block.render(area, buf);

    let text = session
        .answer(&subject.id)
        .and_then(Answer::as_text)
        .unwrap_or_default();
    let mut shown = text.to_string();
    if session.accepts_answers() {
        shown.push('_');
    }

    let used = wrapped_height(&shown, inner.width);
    let scroll = used.saturating_sub(inner.height);
    Paragraph::new(shown)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .render(inner, buf);
}

/// Rows `text` occupies when wrapped at `width` columns.
pub fn wrapped_height(text: &str, width: u16) -> u16 {
    let width = width.max(1) as usize;
    text.split('\n')
        .map(|line| line.width().div_ceil(width).max(1))
        .sum::<usize>()
        .min(u16::MAX as usize) as u16
}

fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

fn legend(app: &App) -> &'static str {
    match app.state {
        AppState::Browse => {
            "(tab) section / (m)odule / (enter) open / (ctrl+l) reload / (esc)ape"
        }
        AppState::Exam => match app.session().state() {
            SessionState::Idle => "(enter) start / (esc) back",
            SessionState::Running if app.session().playback().is_some() => {
                "(tab) next / (1-9) choose / (ctrl+p) play-pause / (ctrl+e) end / (esc) back"
            }
            SessionState::Running => {
                "(tab) next / (1-9) choose / (ctrl+e) end / (esc) back"
            }
            SessionState::Ended(_) => "(ctrl+r) reset / (esc) back",
        },
    }
}
