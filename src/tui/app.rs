//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Submitting responses to the screening service

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::application::{ScreeningService, SessionState};
use crate::domain::CategoricalField;
use crate::ScreeningError;

use super::ui::{
    home::{render_home, HomeState},
    questionnaire::{render_questionnaire, QuestionnaireState},
    render_disclaimer,
    result::{render_result, ResultState},
};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Questionnaire,
    Result,
}

/// Main application state
pub struct App<'a> {
    screen: Screen,
    should_quit: bool,
    service: &'a ScreeningService,
    home_state: HomeState,
    questionnaire_state: QuestionnaireState,
    result_state: ResultState,
}

impl<'a> App<'a> {
    /// Create the application over a loaded (or failed) screening service.
    pub fn new(service: &'a ScreeningService) -> Self {
        let home_state = HomeState {
            session: service.state(),
            model_description: service.model_description(),
        };

        Self {
            screen: Screen::Home,
            should_quit: false,
            service,
            home_state,
            questionnaire_state: Self::empty_form(service),
            result_state: ResultState::default(),
        }
    }

    fn empty_form(service: &ScreeningService) -> QuestionnaireState {
        let labels = |field| service.known_labels(field).to_vec();
        QuestionnaireState::new(
            labels(CategoricalField::Country),
            labels(CategoricalField::Ethnicity),
            labels(CategoricalField::Relation),
        )
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                match self.screen {
                    Screen::Home => render_home(f, chunks[0], &self.home_state),
                    Screen::Questionnaire => {
                        render_questionnaire(f, chunks[0], &self.questionnaire_state)
                    }
                    Screen::Result => render_result(f, chunks[0], &self.result_state),
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Home => self.handle_home_key(key),
            Screen::Questionnaire => self.handle_questionnaire_key(key, modifiers),
            Screen::Result => self.handle_result_key(key),
        }
    }

    fn handle_home_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('n') | KeyCode::Char('N') => {
                // LoadFailed is terminal; the form is never offered.
                if self.home_state.session == SessionState::Ready {
                    self.start_questionnaire();
                }
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn handle_questionnaire_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        let form = &mut self.questionnaire_state;
        match key {
            KeyCode::Esc => {
                form.clear_sensitive();
                self.screen = Screen::Home;
            }
            KeyCode::Up | KeyCode::BackTab => form.prev_field(),
            KeyCode::Down | KeyCode::Tab => form.next_field(),
            KeyCode::Left => form.cycle(false),
            KeyCode::Right | KeyCode::Char(' ') => form.cycle(true),
            KeyCode::Char('s') if modifiers.contains(KeyModifiers::CONTROL) => {
                form.load_sample_data();
            }
            KeyCode::Char(c) => form.input_char(c),
            KeyCode::Backspace => form.delete_char(),
            KeyCode::Enter => self.submit_questionnaire(),
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        let failed = matches!(self.result_state, ResultState::Error(_));
        match key {
            KeyCode::Enter if failed => {
                self.screen = Screen::Questionnaire;
            }
            KeyCode::Char('n') | KeyCode::Char('N') => self.start_questionnaire(),
            KeyCode::Esc | KeyCode::Enter => {
                self.screen = Screen::Home;
            }
            _ => {}
        }
    }

    fn start_questionnaire(&mut self) {
        self.questionnaire_state.clear_sensitive();
        self.screen = Screen::Questionnaire;
    }

    fn submit_questionnaire(&mut self) {
        let response = match self.questionnaire_state.to_raw_response() {
            Ok(response) => response,
            Err(message) => {
                self.questionnaire_state.error_message = Some(message);
                return;
            }
        };

        match self.service.submit(&response) {
            Ok(result) => {
                self.result_state = ResultState::Complete(result);
                self.screen = Screen::Result;
                self.questionnaire_state.clear_sensitive();
            }
            // Fixable in the form: keep the entered values.
            Err(e @ (ScreeningError::Validation(_) | ScreeningError::Encode(_))) => {
                self.questionnaire_state.error_message = Some(e.to_string());
            }
            Err(e) => {
                tracing::warn!("Screening failed: {}", e);
                self.result_state = ResultState::Error(e.to_string());
                self.screen = Screen::Result;
            }
        }
    }
}
