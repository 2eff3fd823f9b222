use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::content::{LearningContent, Section, SECTION_COUNT};
use crate::models::difficulty::Difficulty;
use crate::models::question::Question;
use crate::models::quiz::{Answer, QuizItem};
use crate::models::reward::{
    CollectionReceipt, CompletionRequest, LearningCompletion, QuizOutcome, RewardSchedule,
};
use crate::models::stock::Stock;
use crate::services::quiz_service::QuizService;

/// Where the learner is in the full flow.
///
/// Order: `QuestionAnalysis` → `Section(1)` → `SectionQuiz(1)` → … →
/// `SectionQuiz(4)` → `Section(5)` → `Complete`. There is no quiz after section 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "phase", content = "section", rename_all = "snake_case")]
pub enum Phase {
    QuestionAnalysis,
    Section(u8),
    SectionQuiz(u8),
    Complete,
}

impl Phase {
    /// Position in the ten-step sequence (0..=9); `Complete` is 10.
    pub fn step_index(&self) -> u8 {
        match self {
            Phase::QuestionAnalysis => 0,
            Phase::Section(n) => 2 * n - 1,
            Phase::SectionQuiz(n) => 2 * n,
            Phase::Complete => 2 * SECTION_COUNT,
        }
    }

    /// Legacy numeric cursor: 0, section N as N, its quiz as N + 0.5.
    /// Kept for hosts that still key their views off it.
    pub fn cursor(&self) -> f32 {
        match self {
            Phase::QuestionAnalysis => 0.0,
            Phase::Section(n) => f32::from(*n),
            Phase::SectionQuiz(n) => f32::from(*n) + 0.5,
            Phase::Complete => f32::from(SECTION_COUNT) + 1.0,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Phase::Complete)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::QuestionAnalysis => write!(f, "question analysis"),
            Phase::Section(n) => write!(f, "section {n}"),
            Phase::SectionQuiz(n) => write!(f, "section {n} quiz"),
            Phase::Complete => write!(f, "completion"),
        }
    }
}

/// Result of a forward step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Moved(Phase),
    /// The learner finished section 5. Report the completion, then call
    /// [`LearningSession::complete`]; the phase does not change until then.
    ReadyToComplete(CompletionRequest),
}

/// An answered section-quiz item and where it left the learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionAnswer {
    pub outcome: QuizOutcome,
    pub phase: Phase,
    /// Items left in this section's quiz set
    pub remaining: usize,
}

/// Render-ready snapshot of the learner's progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningProgress {
    pub phase: Phase,
    pub step: u8,
    pub total_steps: u8,
    pub percent: f64,
    pub answered_count: u32,
    pub correct_count: u32,
    pub total_points: u32,
}

/// One learner studying one stock at one difficulty.
///
/// Moves strictly forward except through [`LearningSession::previous`].
/// Operations that fail leave the session exactly as it was.
#[derive(Debug, Clone)]
pub struct LearningSession {
    id: Uuid,
    user_id: String,
    stock: Stock,
    selected_questions: Vec<Question>,
    difficulty: Difficulty,
    content: LearningContent,
    phase: Phase,
    quiz_progress: BTreeMap<u8, usize>,
    analysis_progress: usize,
    correct_count: u32,
    answered_count: u32,
    total_points: u32,
    started_at: DateTime<Utc>,
}

impl LearningSession {
    /// Start at the question-analysis phase.
    ///
    /// `selected_questions` holds one or two questions; the first is primary.
    pub fn new(
        user_id: impl Into<String>,
        stock: Stock,
        selected_questions: Vec<Question>,
        difficulty: Difficulty,
        content: LearningContent,
    ) -> Result<Self, CoreError> {
        if selected_questions.is_empty() {
            return Err(CoreError::NoQuestionSelected);
        }
        if !content.is_unlocked(difficulty) {
            return Err(CoreError::DifficultyLocked(difficulty.to_string()));
        }

        let session = Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            stock,
            selected_questions,
            difficulty,
            content,
            phase: Phase::QuestionAnalysis,
            quiz_progress: BTreeMap::new(),
            analysis_progress: 0,
            correct_count: 0,
            answered_count: 0,
            total_points: 0,
            started_at: Utc::now(),
        };
        tracing::info!(
            session = %session.id,
            stock_id = session.stock.id,
            difficulty = %difficulty,
            "learning session started"
        );
        Ok(session)
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stock(&self) -> &Stock {
        &self.stock
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn content(&self) -> &LearningContent {
        &self.content
    }

    pub fn selected_questions(&self) -> &[Question] {
        &self.selected_questions
    }

    /// The question that drives the content.
    pub fn primary_question(&self) -> Option<&Question> {
        self.selected_questions.first()
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn total_points(&self) -> u32 {
        self.total_points
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Content section being read, if the learner is in one.
    pub fn current_section(&self) -> Option<&Section> {
        match self.phase {
            Phase::Section(n) => self.content.section(n),
            _ => None,
        }
    }

    /// Next unanswered item of the current section quiz.
    pub fn current_quiz(&self) -> Option<&QuizItem> {
        match self.phase {
            Phase::SectionQuiz(n) => self.content.quizzes_for(n).get(self.quiz_index(n)),
            _ => None,
        }
    }

    /// Next unanswered item of the question-analysis quiz.
    pub fn current_analysis_quiz(&self) -> Option<&QuizItem> {
        match self.phase {
            Phase::QuestionAnalysis => self.content.analysis_quiz.get(self.analysis_progress),
            _ => None,
        }
    }

    pub fn quiz_index(&self, section: u8) -> usize {
        self.quiz_progress.get(&section).copied().unwrap_or(0)
    }

    pub fn quiz_remaining(&self, section: u8) -> usize {
        self.content
            .quizzes_for(section)
            .len()
            .saturating_sub(self.quiz_index(section))
    }

    pub fn progress(&self) -> LearningProgress {
        let step = self.phase.step_index();
        let total_steps = 2 * SECTION_COUNT;
        LearningProgress {
            phase: self.phase,
            step,
            total_steps,
            percent: f64::from(step.min(total_steps)) / f64::from(total_steps) * 100.0,
            answered_count: self.answered_count,
            correct_count: self.correct_count,
            total_points: self.total_points,
        }
    }

    // ── Transitions ─────────────────────────────────────────────────

    /// Advance one phase.
    pub fn next(&mut self) -> Result<Step, CoreError> {
        let target = match self.phase {
            Phase::QuestionAnalysis => Phase::Section(1),
            Phase::Section(n) if n < SECTION_COUNT => Phase::SectionQuiz(n),
            Phase::Section(_) => {
                return Ok(Step::ReadyToComplete(self.completion_request()));
            }
            Phase::SectionQuiz(n) => {
                let remaining = self.quiz_remaining(n);
                if remaining > 0 {
                    return Err(CoreError::QuizPending {
                        section: n,
                        remaining,
                    });
                }
                Phase::Section(n + 1)
            }
            Phase::Complete => return Err(self.invalid("go forward")),
        };
        self.move_to(target);
        Ok(Step::Moved(target))
    }

    /// Step back: a quiz returns to its section, a section returns to the
    /// previous quiz, section 1 returns to the question analysis.
    pub fn previous(&mut self) -> Result<Phase, CoreError> {
        let target = match self.phase {
            Phase::SectionQuiz(n) => Phase::Section(n),
            Phase::Section(1) => Phase::QuestionAnalysis,
            Phase::Section(n) => Phase::SectionQuiz(n - 1),
            Phase::QuestionAnalysis | Phase::Complete => return Err(self.invalid("go back")),
        };
        self.move_to(target);
        Ok(target)
    }

    /// Answer the current section-quiz item. The last item of a set moves
    /// the learner on to the next section.
    pub fn answer(&mut self, answer: &Answer) -> Result<SectionAnswer, CoreError> {
        let section = match self.phase {
            Phase::SectionQuiz(n) => n,
            _ => return Err(self.invalid("answer a section quiz")),
        };
        let item = self
            .current_quiz()
            .ok_or(CoreError::AlreadyAnswered)?;
        let outcome = QuizService::new().grade(item, answer, RewardSchedule::SectionQuiz)?;

        *self.quiz_progress.entry(section).or_insert(0) += 1;
        self.record(&outcome);

        let remaining = self.quiz_remaining(section);
        if remaining == 0 {
            self.move_to(Phase::Section(section + 1));
        }

        Ok(SectionAnswer {
            outcome,
            phase: self.phase,
            remaining,
        })
    }

    /// Answer the current question-analysis quiz item. Wrong answers still
    /// earn points on this schedule.
    pub fn answer_analysis(&mut self, answer: &Answer) -> Result<QuizOutcome, CoreError> {
        if self.phase != Phase::QuestionAnalysis {
            return Err(self.invalid("answer the question quiz"));
        }
        let item = self
            .current_analysis_quiz()
            .ok_or(CoreError::AlreadyAnswered)?;
        let outcome = QuizService::new().grade(item, answer, RewardSchedule::QuestionQuiz)?;
        self.analysis_progress += 1;
        self.record(&outcome);
        Ok(outcome)
    }

    /// Payload for `POST /collection/complete`.
    pub fn completion_request(&self) -> CompletionRequest {
        CompletionRequest {
            user_id: self.user_id.clone(),
            stock_id: self.stock.id,
            difficulty: self.difficulty,
        }
    }

    /// Enter the terminal phase once the collection has accepted the completion.
    pub fn complete(&mut self, receipt: CollectionReceipt) -> Result<LearningCompletion, CoreError> {
        if self.phase != Phase::Section(SECTION_COUNT) {
            return Err(self.invalid("complete"));
        }
        self.move_to(Phase::Complete);
        tracing::info!(
            session = %self.id,
            stock_id = self.stock.id,
            points = self.total_points,
            newly_unlocked = receipt.newly_unlocked,
            "learning session completed"
        );
        Ok(LearningCompletion {
            stock_id: self.stock.id,
            difficulty: self.difficulty,
            correct_count: self.correct_count,
            answered_count: self.answered_count,
            total_points: self.total_points,
            completed_at: Utc::now(),
            receipt,
        })
    }

    fn record(&mut self, outcome: &QuizOutcome) {
        self.answered_count += 1;
        if outcome.correct {
            self.correct_count += 1;
        }
        self.total_points += outcome.points;
    }

    fn move_to(&mut self, target: Phase) {
        tracing::debug!(session = %self.id, from = %self.phase, to = %target, "phase change");
        self.phase = target;
    }

    fn invalid(&self, action: &str) -> CoreError {
        CoreError::InvalidTransition {
            from: self.phase.to_string(),
            action: action.to_string(),
        }
    }
}
