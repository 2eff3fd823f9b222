use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::stock::{InvestStyle, RiskLevel};

/// Counts over the liked stocks that produced a profile.
///
/// `by_style` and `by_risk` always contain every variant (zero-filled).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileStats {
    pub by_sector: BTreeMap<String, usize>,
    pub by_style: BTreeMap<InvestStyle, usize>,
    pub by_risk: BTreeMap<RiskLevel, usize>,
}

impl ProfileStats {
    pub fn total(&self) -> usize {
        self.by_style.values().sum()
    }
}

/// MBTI-style investor profile derived from swipe choices. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestorProfile {
    /// Four letters from {E,I}×{S,N}×{T,F}×{J,P}
    #[serde(rename = "type")]
    pub type_code: String,
    pub name: String,
    pub description: String,
    pub traits: Vec<String>,
    pub strategy: String,
    pub icon: String,
    pub stats: ProfileStats,
    /// True when built from an empty selection
    #[serde(default)]
    pub is_fallback: bool,
}

/// The four presentation clusters of the sixteen types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeCluster {
    /// NT
    Analyst,
    /// NF
    Diplomat,
    /// SJ
    Sentinel,
    /// SP
    Explorer,
}

/// Colour theme used when rendering a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProfileTheme {
    pub cluster: ThemeCluster,
    pub color: &'static str,
    pub label: &'static str,
}

impl ThemeCluster {
    pub fn theme(&self) -> ProfileTheme {
        let (color, label) = match self {
            ThemeCluster::Analyst => ("purple", "分析家"),
            ThemeCluster::Diplomat => ("green", "外交家"),
            ThemeCluster::Sentinel => ("blue", "守护者"),
            ThemeCluster::Explorer => ("orange", "探险家"),
        };
        ProfileTheme {
            cluster: *self,
            color,
            label,
        }
    }
}
