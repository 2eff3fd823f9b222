use serde::{Deserialize, Serialize};

/// Investment style of a stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestStyle {
    Value,
    Growth,
    Balanced,
}

impl InvestStyle {
    pub const ALL: [InvestStyle; 3] = [InvestStyle::Value, InvestStyle::Growth, InvestStyle::Balanced];
}

impl std::fmt::Display for InvestStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvestStyle::Value => write!(f, "value"),
            InvestStyle::Growth => write!(f, "growth"),
            InvestStyle::Balanced => write!(f, "balanced"),
        }
    }
}

/// Risk level of a stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// Broad sector families that drive the style/risk defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectorFamily {
    Consumer,
    Finance,
    NewEnergy,
    Tech,
    Other,
}

impl SectorFamily {
    fn classify(sector: &str) -> Self {
        let lower = sector.trim().to_lowercase();
        // New energy first: "新能源" would otherwise never be reached by a looser match.
        if lower.contains("新能源") || lower.contains("new energy") || lower.contains("new-energy") {
            SectorFamily::NewEnergy
        } else if lower.contains("消费") || lower.contains("consumer") {
            SectorFamily::Consumer
        } else if lower.contains("金融") || lower.contains("finance") || lower.contains("bank") {
            SectorFamily::Finance
        } else if lower.contains("科技") || lower.contains("tech") {
            SectorFamily::Tech
        } else {
            SectorFamily::Other
        }
    }
}

/// A stock as delivered by `GET /stocks`.
///
/// `style` and `risk` are optional on the wire. Call [`Stock::normalize`]
/// (or [`normalize_stocks`]) once after fetching; afterwards both are always set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    /// Backend identifier
    pub id: i64,

    /// Display name (e.g., "贵州茅台")
    pub name: String,

    /// Exchange code (e.g., "600519")
    pub code: String,

    #[serde(default)]
    pub description: String,

    /// Sector label (e.g., "消费", "新能源")
    #[serde(default)]
    pub sector: String,

    /// Industry within the sector (e.g., "白酒", "电池")
    #[serde(default)]
    pub industry: String,

    #[serde(default)]
    pub style: Option<InvestStyle>,

    #[serde(default)]
    pub risk: Option<RiskLevel>,
}

impl Stock {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        code: impl Into<String>,
        sector: impl Into<String>,
        industry: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            code: code.into(),
            description: String::new(),
            sector: sector.into(),
            industry: industry.into(),
            style: None,
            risk: None,
        }
    }

    pub fn with_style(mut self, style: InvestStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.risk = Some(risk);
        self
    }

    /// Fill in missing style/risk from the sector.
    ///
    /// - consumer / finance → value, low risk
    /// - tech → growth, medium risk
    /// - new energy → growth, high risk
    /// - anything else → balanced, medium risk
    ///
    /// Values that are already present are never overwritten.
    pub fn normalize(mut self) -> Self {
        let family = SectorFamily::classify(&self.sector);
        if self.style.is_none() {
            self.style = Some(match family {
                SectorFamily::Consumer | SectorFamily::Finance => InvestStyle::Value,
                SectorFamily::NewEnergy | SectorFamily::Tech => InvestStyle::Growth,
                SectorFamily::Other => InvestStyle::Balanced,
            });
        }
        if self.risk.is_none() {
            self.risk = Some(match family {
                SectorFamily::Consumer | SectorFamily::Finance => RiskLevel::Low,
                SectorFamily::NewEnergy => RiskLevel::High,
                SectorFamily::Tech | SectorFamily::Other => RiskLevel::Medium,
            });
        }
        self
    }

    /// Style after normalization. Un-normalized stocks read as balanced.
    pub fn style(&self) -> InvestStyle {
        self.style.unwrap_or(InvestStyle::Balanced)
    }

    /// Risk after normalization. Un-normalized stocks read as medium.
    pub fn risk(&self) -> RiskLevel {
        self.risk.unwrap_or(RiskLevel::Medium)
    }
}

/// Normalize a freshly fetched stock list.
pub fn normalize_stocks(stocks: Vec<Stock>) -> Vec<Stock> {
    stocks.into_iter().map(Stock::normalize).collect()
}
