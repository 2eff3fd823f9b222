use std::collections::BTreeSet;

use crate::errors::CoreError;
use crate::models::quiz::{Answer, CorrectAnswer, QuizItem};
use crate::models::reward::{QuizOutcome, RewardSchedule};

/// Evaluates quiz answers and applies a reward schedule.
///
/// Pure business logic: no I/O, no state.
pub struct QuizService;

impl QuizService {
    pub fn new() -> Self {
        Self
    }

    /// Check an answer against the item.
    ///
    /// - single / true-false: exact index
    /// - multiple: equal as sets, order irrelevant
    /// - sort: identical ordering
    ///
    /// An answer of the wrong shape (e.g., a list for a single-choice item)
    /// or one naming a non-existent option is rejected, not graded.
    pub fn evaluate(&self, item: &QuizItem, answer: &Answer) -> Result<bool, CoreError> {
        let n = item.options.len();
        match (&item.correct, answer) {
            (CorrectAnswer::Index(expected), Answer::Choice(given)) => {
                if *given >= n {
                    return Err(option_missing(item, *given));
                }
                Ok(given == expected)
            }
            (CorrectAnswer::AnyOf(accepted), Answer::Choice(given)) => {
                if *given >= n {
                    return Err(option_missing(item, *given));
                }
                Ok(accepted.contains(given))
            }
            (CorrectAnswer::Set(expected), Answer::Choices(given)) => {
                if let Some(bad) = given.iter().find(|&&i| i >= n) {
                    return Err(option_missing(item, *bad));
                }
                let given: BTreeSet<usize> = given.iter().copied().collect();
                Ok(&given == expected)
            }
            (CorrectAnswer::Order(expected), Answer::Order(given)) => {
                if let Some(bad) = given.iter().find(|&&i| i >= n) {
                    return Err(option_missing(item, *bad));
                }
                Ok(given == expected)
            }
            _ => Err(CoreError::AnswerMismatch(format!(
                "{} question '{}' cannot take {answer:?}",
                item.kind, item.id
            ))),
        }
    }

    /// Evaluate and attach the points the schedule awards.
    pub fn grade(
        &self,
        item: &QuizItem,
        answer: &Answer,
        schedule: RewardSchedule,
    ) -> Result<QuizOutcome, CoreError> {
        let correct = self.evaluate(item, answer)?;
        Ok(QuizOutcome {
            quiz_id: item.id.clone(),
            correct,
            points: schedule.points(correct),
            explanation: item.explanation.clone(),
        })
    }
}

impl Default for QuizService {
    fn default() -> Self {
        Self::new()
    }
}

fn option_missing(item: &QuizItem, index: usize) -> CoreError {
    CoreError::AnswerMismatch(format!(
        "option {index} does not exist on question '{}' ({} options)",
        item.id,
        item.options.len()
    ))
}
