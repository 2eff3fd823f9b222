use crate::errors::CoreError;
use crate::models::question::Question;

/// Maximum number of questions a learner may pick for one stock.
pub const MAX_SELECTED_QUESTIONS: usize = 2;

/// Result of a successful toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Selected,
    Deselected,
}

/// The questions picked for the stock being studied.
///
/// Holds 0..=2 distinct questions in selection order. The first one is the
/// primary question and is the only one that shapes the learning content;
/// a second pick is recorded only.
#[derive(Debug, Clone, Default)]
pub struct QuestionSelection {
    stock_id: Option<i64>,
    available: Vec<Question>,
    selected: Vec<Question>,
}

impl QuestionSelection {
    pub fn new(stock_id: i64, available: Vec<Question>) -> Self {
        Self {
            stock_id: Some(stock_id),
            available,
            selected: Vec::new(),
        }
    }

    pub fn stock_id(&self) -> Option<i64> {
        self.stock_id
    }

    pub fn available(&self) -> &[Question] {
        &self.available
    }

    pub fn selected(&self) -> &[Question] {
        &self.selected
    }

    pub fn is_selected(&self, question_id: i64) -> bool {
        self.selected.iter().any(|q| q.id == question_id)
    }

    /// Select or deselect a question.
    ///
    /// Selecting a third question fails with `SelectionLimit` and leaves the
    /// selection untouched.
    pub fn toggle(&mut self, question_id: i64) -> Result<ToggleOutcome, CoreError> {
        if let Some(pos) = self.selected.iter().position(|q| q.id == question_id) {
            self.selected.remove(pos);
            return Ok(ToggleOutcome::Deselected);
        }

        if self.selected.len() >= MAX_SELECTED_QUESTIONS {
            return Err(CoreError::SelectionLimit {
                limit: MAX_SELECTED_QUESTIONS,
            });
        }

        let question = self
            .available
            .iter()
            .find(|q| q.id == question_id)
            .cloned()
            .ok_or_else(|| CoreError::ValidationError(format!("unknown question id {question_id}")))?;
        self.selected.push(question);
        Ok(ToggleOutcome::Selected)
    }

    /// Confirm the selection and return the primary question.
    pub fn confirm(&self) -> Result<&Question, CoreError> {
        self.selected.first().ok_or(CoreError::NoQuestionSelected)
    }

    pub fn primary(&self) -> Option<&Question> {
        self.selected.first()
    }

    pub fn secondary(&self) -> Option<&Question> {
        self.selected.get(1)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}
