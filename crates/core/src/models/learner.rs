use serde::{Deserialize, Serialize};

use super::difficulty::Difficulty;

/// Per-learner state that outlives individual sessions: identity, points
/// and completed (stock, difficulty) pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LearnerContext {
    pub user_id: String,
    pub total_points: u32,
    pub completed: Vec<CompletedStock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedStock {
    pub stock_id: i64,
    pub difficulty: Difficulty,
}

impl LearnerContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            total_points: 0,
            completed: Vec::new(),
        }
    }

    pub fn credit(&mut self, points: u32) {
        self.total_points = self.total_points.saturating_add(points);
    }

    /// Record a completion once; repeats are ignored.
    pub fn record_completion(&mut self, stock_id: i64, difficulty: Difficulty) {
        let entry = CompletedStock { stock_id, difficulty };
        if !self.completed.contains(&entry) {
            self.completed.push(entry);
        }
    }

    pub fn has_completed(&self, stock_id: i64, difficulty: Difficulty) -> bool {
        self.completed
            .iter()
            .any(|c| c.stock_id == stock_id && c.difficulty == difficulty)
    }
}
