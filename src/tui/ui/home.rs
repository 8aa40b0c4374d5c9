//! Home view: model status and entry point.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::application::SessionState;
use crate::tui::styles::MedicalTheme;

use super::{render_header, render_key_hints};

/// Home screen state for rendering.
#[derive(Debug, Clone)]
pub struct HomeState {
    pub session: SessionState,
    pub model_description: Option<String>,
}

impl Default for HomeState {
    fn default() -> Self {
        Self {
            session: SessionState::Unloaded,
            model_description: None,
        }
    }
}

/// Render the home view.
pub fn render_home(f: &mut Frame, area: Rect, state: &HomeState) {
    let banner_height = if matches!(state.session, SessionState::LoadFailed(_)) {
        5
    } else {
        0
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // Header
            Constraint::Length(banner_height), // Load failure banner
            Constraint::Min(0),                // Main content
            Constraint::Length(2),             // Key hints
        ])
        .split(area);

    render_header(f, chunks[0], "AQ-10 Screening", "Autism Spectrum Quotient");

    if let SessionState::LoadFailed(reason) = &state.session {
        render_load_failed(f, chunks[1], reason);
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .margin(1)
        .split(chunks[2]);

    render_status(f, columns[0], state);
    render_about(f, columns[1]);

    let hints: &[(&str, &str)] = if matches!(state.session, SessionState::Ready) {
        &[("N", "New Screening"), ("Q", "Quit")]
    } else {
        &[("Q", "Quit")]
    };
    render_key_hints(f, chunks[3], hints, None);
}

fn render_load_failed(f: &mut Frame, area: Rect, reason: &str) {
    let banner = Paragraph::new(vec![
        Line::from(Span::styled(
            "! Screening unavailable: the model could not be loaded.",
            MedicalTheme::danger(),
        )),
        Line::from(Span::styled(reason.to_string(), MedicalTheme::text_secondary())),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(banner, area);
}

fn render_status(f: &mut Frame, area: Rect, state: &HomeState) {
    let (label, style) = match &state.session {
        SessionState::Ready => ("Ready", MedicalTheme::success()),
        SessionState::Unloaded => ("Not loaded", MedicalTheme::text_muted()),
        SessionState::LoadFailed(_) => ("Load failed", MedicalTheme::danger()),
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("  Model: ", MedicalTheme::text_secondary()),
            Span::styled(label, style),
        ]),
        Line::from(vec![
            Span::styled("  Type:  ", MedicalTheme::text_secondary()),
            Span::styled(
                state.model_description.clone().unwrap_or_else(|| "-".into()),
                MedicalTheme::text(),
            ),
        ]),
    ];

    let block = Block::default()
        .title(Span::styled(" Status ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }).block(block), area);
}

fn render_about(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "Answer ten short questions about behavior and a few background details.",
            MedicalTheme::text(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "A pre-trained model estimates whether the answers show indicators of \
             autism spectrum disorder. Answers are not stored.",
            MedicalTheme::text_secondary(),
        )),
    ];

    let block = Block::default()
        .title(Span::styled(" About ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }).block(block), area);
}
