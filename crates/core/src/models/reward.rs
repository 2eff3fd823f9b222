use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::difficulty::Difficulty;

/// Point schedules. Each flow keeps its own; they are deliberately not unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardSchedule {
    /// Quiz attached to the selected question: wrong answers still earn a little
    QuestionQuiz,
    /// Quiz following a content section
    SectionQuiz,
    /// Quick-learn items
    QuickLearn,
}

impl RewardSchedule {
    pub fn points(&self, correct: bool) -> u32 {
        match (self, correct) {
            (_, true) => 10,
            (RewardSchedule::QuestionQuiz, false) => 3,
            (RewardSchedule::SectionQuiz | RewardSchedule::QuickLearn, false) => 0,
        }
    }
}

/// Result of evaluating one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOutcome {
    pub quiz_id: String,
    pub correct: bool,
    pub points: u32,
    pub explanation: String,
}

/// Star rating for a finished quick-learn run (0..=3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StarRating(pub u8);

impl StarRating {
    /// ≥ 90% → 3, ≥ 60% → 2, anything else → 1. Zero when nothing was attempted.
    pub fn from_accuracy(accuracy_pct: f64, attempted: usize) -> Self {
        if attempted == 0 {
            StarRating(0)
        } else if accuracy_pct >= 90.0 {
            StarRating(3)
        } else if accuracy_pct >= 60.0 {
            StarRating(2)
        } else {
            StarRating(1)
        }
    }

    pub fn stars(&self) -> u8 {
        self.0
    }
}

/// Body of `POST /collection/complete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub user_id: String,
    pub stock_id: i64,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
}

/// Response of `POST /collection/complete`, surfaced to the host as-is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CollectionReceipt {
    pub success: bool,
    #[serde(default)]
    pub newly_unlocked: bool,
    #[serde(default)]
    pub next_difficulty: Option<Difficulty>,
    #[serde(default)]
    pub new_badges: Vec<Badge>,
    #[serde(default)]
    pub completed_difficulty: Option<Difficulty>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Summary emitted when the full learning flow completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningCompletion {
    pub stock_id: i64,
    pub difficulty: Difficulty,
    pub correct_count: u32,
    pub answered_count: u32,
    pub total_points: u32,
    pub completed_at: DateTime<Utc>,
    pub receipt: CollectionReceipt,
}

/// Summary emitted when a quick-learn run reaches its end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickLearnSummary {
    pub stock_id: i64,
    pub total: usize,
    pub attempted: usize,
    pub correct_count: usize,
    /// correct_count / total × 100
    pub accuracy_pct: f64,
    pub stars: StarRating,
    pub points: u32,
}

/// A finished quick-learn run after it has been reported to the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickLearnCompletion {
    pub summary: QuickLearnSummary,
    pub difficulty: Difficulty,
    pub receipt: CollectionReceipt,
}
