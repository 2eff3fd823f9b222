use serde::{Deserialize, Serialize};

/// Difficulty tier gating content depth. Tiers unlock one after another
/// as the learner completes a stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Simple,
    Advanced,
    Expert,
    Master,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Simple,
        Difficulty::Advanced,
        Difficulty::Expert,
        Difficulty::Master,
    ];

    /// Wire name used in query strings and request bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Simple => "simple",
            Difficulty::Advanced => "advanced",
            Difficulty::Expert => "expert",
            Difficulty::Master => "master",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Simple => "入门",
            Difficulty::Advanced => "进阶",
            Difficulty::Expert => "专家",
            Difficulty::Master => "大师",
        }
    }

    /// The tier unlocked by completing this one. `None` for master.
    pub fn next(&self) -> Option<Difficulty> {
        match self {
            Difficulty::Simple => Some(Difficulty::Advanced),
            Difficulty::Advanced => Some(Difficulty::Expert),
            Difficulty::Expert => Some(Difficulty::Master),
            Difficulty::Master => None,
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Simple
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(Difficulty::Simple),
            "advanced" => Ok(Difficulty::Advanced),
            "expert" => Ok(Difficulty::Expert),
            "master" => Ok(Difficulty::Master),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}
