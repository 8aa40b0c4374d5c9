//! Questionnaire form: ten AQ-10 items plus background details.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{Answer, CategoricalField, Gender, RawResponse, QUESTIONS, QUESTION_COUNT};
use crate::tui::styles::MedicalTheme;

use super::{render_header, render_key_hints};

/// A focusable form field, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Question(usize),
    Age,
    Gender,
    Jaundice,
    FamilyHistory,
    Country,
    Ethnicity,
    UsedAppBefore,
    Relation,
}

impl FormField {
    /// Number of focusable fields.
    pub const COUNT: usize = QUESTION_COUNT + 8;

    fn at(index: usize) -> Self {
        match index {
            i if i < QUESTION_COUNT => Self::Question(i),
            10 => Self::Age,
            11 => Self::Gender,
            12 => Self::Jaundice,
            13 => Self::FamilyHistory,
            14 => Self::Country,
            15 => Self::Ethnicity,
            16 => Self::UsedAppBefore,
            _ => Self::Relation,
        }
    }

    fn label(self) -> String {
        match self {
            Self::Question(i) => format!("A{}", i + 1),
            Self::Age => "Age".into(),
            Self::Gender => "Gender".into(),
            Self::Jaundice => "Born with jaundice".into(),
            Self::FamilyHistory => "Family member with ASD".into(),
            Self::Country => "Country of residence".into(),
            Self::Ethnicity => "Ethnicity".into(),
            Self::UsedAppBefore => "Used a screening app before".into(),
            Self::Relation => "Who is completing the test".into(),
        }
    }
}

/// Picker over a fixed label list; `None` until the user chooses.
#[derive(Debug, Clone, Default)]
pub struct Picker {
    pub labels: Vec<String>,
    pub selected: Option<usize>,
}

impl Picker {
    fn new(labels: Vec<String>) -> Self {
        Self {
            labels,
            selected: None,
        }
    }

    fn next(&mut self) {
        if self.labels.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) => (i + 1) % self.labels.len(),
            None => 0,
        });
    }

    fn prev(&mut self) {
        if self.labels.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(0) | None => self.labels.len() - 1,
            Some(i) => i - 1,
        });
    }

    /// Jump to the next label starting with `c` (case-insensitive).
    fn jump_to(&mut self, c: char) {
        let start = self.selected.map_or(0, |i| i + 1);
        let n = self.labels.len();
        let hit = (0..n).map(|k| (start + k) % n).find(|&i| {
            self.labels[i]
                .chars()
                .next()
                .is_some_and(|first| first.eq_ignore_ascii_case(&c))
        });
        if hit.is_some() {
            self.selected = hit;
        }
    }

    fn select_label(&mut self, label: &str) {
        self.selected = self.labels.iter().position(|l| l == label);
    }

    pub fn value(&self) -> Option<&str> {
        self.selected.map(|i| self.labels[i].as_str())
    }
}

/// Questionnaire form state
pub struct QuestionnaireState {
    pub answers: [Answer; QUESTION_COUNT],
    pub age: String,
    pub gender: Gender,
    pub jaundice: Answer,
    pub family_history: Answer,
    pub used_app_before: Answer,
    pub country: Picker,
    pub ethnicity: Picker,
    pub relation: Picker,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl QuestionnaireState {
    /// Empty form with pickers over the given label sets (in code order).
    pub fn new(countries: Vec<String>, ethnicities: Vec<String>, relations: Vec<String>) -> Self {
        Self {
            answers: [Answer::No; QUESTION_COUNT],
            age: String::new(),
            gender: Gender::default(),
            jaundice: Answer::No,
            family_history: Answer::No,
            used_app_before: Answer::No,
            country: Picker::new(countries),
            ethnicity: Picker::new(ethnicities),
            relation: Picker::new(relations),
            selected_field: 0,
            error_message: None,
        }
    }

    pub fn field(&self) -> FormField {
        FormField::at(self.selected_field)
    }

    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % FormField::COUNT;
    }

    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = FormField::COUNT - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    fn picker_mut(&mut self, field: FormField) -> Option<&mut Picker> {
        match field {
            FormField::Country => Some(&mut self.country),
            FormField::Ethnicity => Some(&mut self.ethnicity),
            FormField::Relation => Some(&mut self.relation),
            _ => None,
        }
    }

    fn answer_mut(&mut self, field: FormField) -> Option<&mut Answer> {
        match field {
            FormField::Question(i) => Some(&mut self.answers[i]),
            FormField::Jaundice => Some(&mut self.jaundice),
            FormField::FamilyHistory => Some(&mut self.family_history),
            FormField::UsedAppBefore => Some(&mut self.used_app_before),
            _ => None,
        }
    }

    /// Change the current choice (Left/Right, Space).
    pub fn cycle(&mut self, forward: bool) {
        let field = self.field();
        self.error_message = None;
        if let Some(answer) = self.answer_mut(field) {
            *answer = answer.toggled();
        } else if let Some(picker) = self.picker_mut(field) {
            if forward {
                picker.next();
            } else {
                picker.prev();
            }
        } else if field == FormField::Gender {
            let all = Gender::ALL;
            let i = all.iter().position(|g| *g == self.gender).unwrap_or(0);
            let next = if forward {
                (i + 1) % all.len()
            } else {
                (i + all.len() - 1) % all.len()
            };
            self.gender = all[next];
        }
    }

    /// Typed character for the current field.
    pub fn input_char(&mut self, c: char) {
        let field = self.field();
        self.error_message = None;
        if let Some(answer) = self.answer_mut(field) {
            match c {
                'y' | 'Y' => *answer = Answer::Yes,
                'n' | 'N' => *answer = Answer::No,
                _ => {}
            }
            return;
        }
        match field {
            FormField::Age => {
                if c.is_ascii_digit() && self.age.len() < 3 {
                    self.age.push(c);
                }
            }
            FormField::Gender => match c.to_ascii_lowercase() {
                'm' => self.gender = Gender::Male,
                'f' => self.gender = Gender::Female,
                'o' => self.gender = Gender::Other,
                _ => {}
            },
            _ => {
                if let Some(picker) = self.picker_mut(field) {
                    picker.jump_to(c);
                }
            }
        }
    }

    pub fn delete_char(&mut self) {
        if self.field() == FormField::Age {
            self.age.pop();
        }
    }

    /// Build a response from the form.
    ///
    /// # Errors
    /// Returns a message for the first incomplete field.
    pub fn to_raw_response(&self) -> Result<RawResponse, String> {
        let age: u8 = self
            .age
            .parse()
            .map_err(|_| "Age: enter a number between 1 and 100".to_string())?;

        let pick = |picker: &Picker, field: CategoricalField| {
            picker
                .value()
                .map(str::to_string)
                .ok_or_else(|| format!("Select a {field}"))
        };

        Ok(RawResponse {
            answers: self.answers,
            age,
            gender: self.gender,
            jaundice_history: self.jaundice,
            family_autism_history: self.family_history,
            country: pick(&self.country, CategoricalField::Country)?,
            ethnicity: pick(&self.ethnicity, CategoricalField::Ethnicity)?,
            used_app_before: self.used_app_before,
            relation: pick(&self.relation, CategoricalField::Relation)?,
        })
    }

    /// Wipe entered values once a response has been submitted.
    pub fn clear_sensitive(&mut self) {
        self.age.zeroize();
        self.answers = [Answer::No; QUESTION_COUNT];
        self.gender = Gender::default();
        self.jaundice = Answer::No;
        self.family_history = Answer::No;
        self.used_app_before = Answer::No;
        self.country.selected = None;
        self.ethnicity.selected = None;
        self.relation.selected = None;
        self.error_message = None;
        self.selected_field = 0;
    }

    /// Fill the form with a demonstration response.
    pub fn load_sample_data(&mut self) {
        for (i, answer) in self.answers.iter_mut().enumerate() {
            *answer = Answer::from(i % 2 == 0);
        }
        self.age = "25".into();
        self.gender = Gender::Male;
        self.jaundice = Answer::No;
        self.family_history = Answer::No;
        self.used_app_before = Answer::No;
        self.country.select_label("Brazil");
        self.ethnicity.select_label("Asian");
        self.relation.select_label("Self");
        self.error_message = None;
    }
}

/// Render the questionnaire
pub fn render_questionnaire(f: &mut Frame, area: Rect, state: &QuestionnaireState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(4), // Current question
            Constraint::Min(0),    // Fields
            Constraint::Length(2), // Footer/error
        ])
        .split(area);

    render_header(f, chunks[0], "Questionnaire", "AQ-10 items and background");
    render_prompt(f, chunks[1], state);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .margin(1)
        .split(chunks[2]);

    let rows: Vec<Line> = (0..FormField::COUNT)
        .map(|i| field_line(state, FormField::at(i), i == state.selected_field))
        .collect();
    let (left, right) = rows.split_at(QUESTION_COUNT);

    let block = |title: &'static str| {
        Block::default()
            .title(Span::styled(title, MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border())
    };
    f.render_widget(Paragraph::new(left.to_vec()).block(block(" Behavior ")), columns[0]);
    f.render_widget(Paragraph::new(right.to_vec()).block(block(" Background ")), columns[1]);

    render_key_hints(
        f,
        chunks[3],
        &[
            ("↑↓", "Navigate"),
            ("←→/Space", "Change"),
            ("Y/N", "Answer"),
            ("Enter", "Submit"),
            ("Ctrl+S", "Sample"),
            ("Esc", "Cancel"),
        ],
        state.error_message.as_deref(),
    );
}

fn render_prompt(f: &mut Frame, area: Rect, state: &QuestionnaireState) {
    let text = match state.field() {
        FormField::Question(i) => QUESTIONS[i].to_string(),
        FormField::Age => "Age in years (1-100).".to_string(),
        FormField::Country | FormField::Ethnicity | FormField::Relation => {
            "Use ←/→ to browse, or type a letter to jump.".to_string()
        }
        other => other.label(),
    };

    let prompt = Paragraph::new(Line::from(Span::styled(text, MedicalTheme::text())))
        .wrap(ratatui::widgets::Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border_focused()),
        );
    f.render_widget(prompt, area);
}

fn field_line(state: &QuestionnaireState, field: FormField, focused: bool) -> Line<'static> {
    let value = match field {
        FormField::Question(i) => state.answers[i].to_string(),
        FormField::Age if state.age.is_empty() => "-".to_string(),
        FormField::Age => state.age.clone(),
        FormField::Gender => state.gender.to_string(),
        FormField::Jaundice => state.jaundice.to_string(),
        FormField::FamilyHistory => state.family_history.to_string(),
        FormField::UsedAppBefore => state.used_app_before.to_string(),
        FormField::Country => state.country.value().unwrap_or("-").to_string(),
        FormField::Ethnicity => state.ethnicity.value().unwrap_or("-").to_string(),
        FormField::Relation => state.relation.value().unwrap_or("-").to_string(),
    };

    let (label_style, value_style) = if focused {
        (MedicalTheme::focused(), MedicalTheme::selected())
    } else {
        (MedicalTheme::text_secondary(), MedicalTheme::text())
    };

    Line::from(vec![
        Span::styled(if focused { "▌" } else { " " }, MedicalTheme::cursor()),
        Span::styled(format!("{}: ", field.label()), label_style),
        Span::styled(value, value_style),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn form() -> QuestionnaireState {
        QuestionnaireState::new(
            labels(&["Brazil", "Canada", "India"]),
            labels(&["Asian", "Black", "White-European"]),
            labels(&["Parent", "Self"]),
        )
    }

    fn focus(state: &mut QuestionnaireState, field: FormField) {
        state.selected_field = (0..FormField::COUNT)
            .find(|&i| FormField::at(i) == field)
            .expect("field exists");
    }

    #[test]
    fn test_navigation_wraps() {
        let mut state = form();
        state.prev_field();
        assert_eq!(state.field(), FormField::Relation);
        state.next_field();
        assert_eq!(state.field(), FormField::Question(0));
    }

    #[test]
    fn test_incomplete_form_is_rejected() {
        let state = form();
        let err = state.to_raw_response().expect_err("no age");
        assert!(err.contains("Age"));

        let mut state = form();
        state.age = "30".into();
        let err = state.to_raw_response().expect_err("no country");
        assert!(err.contains("country"));
    }

    #[test]
    fn test_sample_data_builds_response() {
        let mut state = form();
        state.load_sample_data();
        let response = state.to_raw_response().expect("sample response");

        assert_eq!(response.behavioral_score(), 5);
        assert_eq!(response.answers[0], Answer::Yes);
        assert_eq!(response.answers[1], Answer::No);
        assert_eq!(response.age, 25);
        assert_eq!(response.gender, Gender::Male);
        assert_eq!(response.country, "Brazil");
        assert_eq!(response.ethnicity, "Asian");
        assert_eq!(response.relation, "Self");
    }

    #[test]
    fn test_editing_fields() {
        let mut state = form();

        focus(&mut state, FormField::Question(2));
        state.input_char('y');
        assert_eq!(state.answers[2], Answer::Yes);
        state.cycle(true);
        assert_eq!(state.answers[2], Answer::No);

        focus(&mut state, FormField::Age);
        for c in ['4', 'x', '2', '7', '9'] {
            state.input_char(c);
        }
        assert_eq!(state.age, "427");
        state.delete_char();
        assert_eq!(state.age, "42");

        focus(&mut state, FormField::Gender);
        state.cycle(false);
        assert_eq!(state.gender, Gender::Other);
        state.input_char('f');
        assert_eq!(state.gender, Gender::Female);

        focus(&mut state, FormField::Country);
        state.cycle(false);
        assert_eq!(state.country.value(), Some("India"));
        state.input_char('c');
        assert_eq!(state.country.value(), Some("Canada"));
    }

    #[test]
    fn test_clear_sensitive_resets_form() {
        let mut state = form();
        state.load_sample_data();
        state.clear_sensitive();

        assert!(state.age.is_empty());
        assert!(state.answers.iter().all(|a| *a == Answer::No));
        assert!(state.country.value().is_none());
        // Label sets survive for the next submission.
        assert_eq!(state.country.labels.len(), 3);
    }
}
