use serde::{Deserialize, Serialize};

/// A learning question the learner can pick for a stock
/// (e.g., "为什么茅台能保持高毛利?").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub title: String,

    #[serde(default)]
    pub desc: String,

    /// Flagged as popular by the backend
    #[serde(default)]
    pub hot: bool,
}

impl Question {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            desc: String::new(),
            hot: false,
        }
    }
}
