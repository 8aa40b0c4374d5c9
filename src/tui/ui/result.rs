//! Result view: outcome, confidence and probability.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::domain::{Outcome, ScreeningResult};
use crate::tui::styles::MedicalTheme;

use super::{render_header, render_key_hints};

/// Result screen state
#[derive(Debug, Clone, Default)]
pub enum ResultState {
    /// Nothing submitted yet
    #[default]
    Idle,
    Complete(ScreeningResult),
    /// Inference failed; the session stays usable
    Error(String),
}

/// Render the result view
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(2), // Footer
        ])
        .split(area);

    render_header(f, chunks[0], "Screening Result", "AQ-10");

    match state {
        ResultState::Idle => render_idle(f, chunks[1]),
        ResultState::Complete(result) => render_outcome(f, chunks[1], result),
        ResultState::Error(message) => render_error(f, chunks[1], message),
    }

    let hints: &[(&str, &str)] = match state {
        ResultState::Error(_) => &[("Enter", "Back to Form"), ("Esc", "Home")],
        _ => &[("N", "New Screening"), ("Esc", "Home")],
    };
    render_key_hints(f, chunks[2], hints, None);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(Line::from(Span::styled(
        "No screening submitted yet",
        MedicalTheme::text_muted(),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(content, area);
}

fn render_outcome(f: &mut Frame, area: Rect, result: &ScreeningResult) {
    let outcome = result.outcome();
    let style = MedicalTheme::outcome(outcome);

    let block = Block::default()
        .title(Span::styled(" Result ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Outcome
            Constraint::Length(3), // Probability
            Constraint::Length(2), // Confidence
            Constraint::Min(0),    // Guidance
        ])
        .margin(1)
        .split(inner);

    let detail = match outcome {
        Outcome::IndicatorsDetected => {
            "The answers share patterns with people who have an ASD diagnosis."
        }
        Outcome::NoIndicatorsDetected => {
            "The answers do not show the patterns the model associates with ASD."
        }
    };
    let headline = Paragraph::new(vec![
        Line::from(Span::styled(
            outcome.headline(),
            style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(detail, MedicalTheme::text_secondary())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    f.render_widget(headline, chunks[0]);

    let percent = result.probability_percent();
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" Probability of ASD indicators ", MedicalTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(MedicalTheme::probability_gauge(result.positive_probability))
        .ratio(result.positive_probability.clamp(0.0, 1.0))
        .label(format!("{percent:.1}%"));
    f.render_widget(gauge, chunks[1]);

    let confidence = Paragraph::new(Line::from(vec![
        Span::styled("Confidence: ", MedicalTheme::text_secondary()),
        Span::styled(
            format!("{:.1}%", result.confidence() * 100.0),
            MedicalTheme::text(),
        ),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(confidence, chunks[2]);

    if outcome == Outcome::IndicatorsDetected {
        let guidance = Paragraph::new(Line::from(Span::styled(
            "Consider discussing these results with a healthcare professional.",
            MedicalTheme::info(),
        )))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        f.render_widget(guidance, chunks[3]);
    }
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Screening failed", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}
