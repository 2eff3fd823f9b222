use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::errors::{ContentError, CoreError};

use super::difficulty::Difficulty;
use super::question::Question;
use super::quiz::{QuizItem, RawQuizItem};

/// Number of content sections in the full learning flow.
pub const SECTION_COUNT: u8 = 5;

/// Sections followed by a quiz phase. Section 5 is terminal.
pub const QUIZ_SECTIONS: std::ops::RangeInclusive<u8> = 1..=4;

/// The fixed topic of each content section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionTopic {
    CompanyBasics,
    Operations,
    Valuation,
    Strategy,
    Summary,
}

impl SectionTopic {
    pub fn for_section(number: u8) -> Option<Self> {
        match number {
            1 => Some(SectionTopic::CompanyBasics),
            2 => Some(SectionTopic::Operations),
            3 => Some(SectionTopic::Valuation),
            4 => Some(SectionTopic::Strategy),
            5 => Some(SectionTopic::Summary),
            _ => None,
        }
    }

    /// Key used by the topic-keyed payload layout.
    pub fn wire_key(&self) -> &'static str {
        match self {
            SectionTopic::CompanyBasics => "company_info",
            SectionTopic::Operations => "operation",
            SectionTopic::Valuation => "valuation",
            SectionTopic::Strategy => "investment_strategy",
            SectionTopic::Summary => "summary",
        }
    }

    pub fn default_title(&self) -> &'static str {
        match self {
            SectionTopic::CompanyBasics => "公司基本面",
            SectionTopic::Operations => "经营分析",
            SectionTopic::Valuation => "估值分析",
            SectionTopic::Strategy => "投资策略",
            SectionTopic::Summary => "总结回顾",
        }
    }
}

/// One validated content section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// 1..=5
    pub number: u8,
    pub topic: SectionTopic,
    pub title: String,
    /// Markdown body; rendering is up to the host.
    pub body: String,
}

/// Learning material for one (stock, difficulty), validated at the API boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningContent {
    pub question_analysis: String,
    pub selected_question: Option<String>,
    /// Always exactly five, ordered by number
    pub sections: Vec<Section>,
    /// Quiz sets for sections 1..=4, each non-empty
    pub section_quizzes: BTreeMap<u8, Vec<QuizItem>>,
    /// Optional quiz answered during the question-analysis phase
    pub analysis_quiz: Vec<QuizItem>,
    pub unlocked_difficulties: Vec<Difficulty>,
}

impl LearningContent {
    pub fn section(&self, number: u8) -> Option<&Section> {
        self.sections.iter().find(|s| s.number == number)
    }

    pub fn quizzes_for(&self, number: u8) -> &[QuizItem] {
        self.section_quizzes
            .get(&number)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// An empty unlock list means the backend did not report one.
    pub fn is_unlocked(&self, difficulty: Difficulty) -> bool {
        self.unlocked_difficulties.is_empty() || self.unlocked_difficulties.contains(&difficulty)
    }
}

// ── Wire format ─────────────────────────────────────────────────────

/// A section body: either bare markdown or an object with a title.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawSection {
    Text(String),
    Titled {
        #[serde(default)]
        title: Option<String>,
        #[serde(alias = "body", alias = "text")]
        content: String,
    },
}

/// `selected_question` is either the full question or just its title.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawSelectedQuestion {
    Full(Question),
    Title(String),
}

/// Raw `GET /learning/content` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentResponse {
    pub success: bool,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub content: Option<HashMap<String, RawSection>>,

    #[serde(default)]
    pub section_quizzes: Option<HashMap<String, Vec<RawQuizItem>>>,

    #[serde(default)]
    pub question_analysis: Option<RawSection>,

    #[serde(default)]
    pub selected_question: Option<RawSelectedQuestion>,

    #[serde(default)]
    pub analysis_quiz: Vec<RawQuizItem>,

    #[serde(default, deserialize_with = "known_difficulties")]
    pub unlocked_difficulties: Vec<Difficulty>,
}

/// Unlock list with unknown or malformed tiers skipped.
fn known_difficulties<'de, D>(deserializer: D) -> Result<Vec<Difficulty>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .iter()
        .filter_map(|v| v.as_str())
        .filter_map(|s| match s.parse::<Difficulty>() {
            Ok(d) => Some(d),
            Err(_) => {
                tracing::debug!(tier = s, "ignoring unknown difficulty tier");
                None
            }
        })
        .collect())
}

impl ContentResponse {
    /// Validate into [`LearningContent`].
    ///
    /// `success: false` is an API error; anything missing after a successful
    /// response is a [`ContentError`].
    pub fn into_content(self) -> Result<LearningContent, CoreError> {
        if !self.success {
            return Err(CoreError::Api {
                endpoint: "/learning/content".into(),
                message: self.message.unwrap_or_else(|| "request was not successful".into()),
            });
        }

        let raw_sections = self
            .content
            .ok_or_else(|| ContentError::MissingField("content".into()))?;
        let sections = parse_sections(raw_sections)?;

        let mut raw_quizzes = self
            .section_quizzes
            .ok_or_else(|| ContentError::MissingField("section_quizzes".into()))?;
        let mut section_quizzes = BTreeMap::new();
        for number in QUIZ_SECTIONS {
            let raw = raw_quizzes
                .remove(&number.to_string())
                .or_else(|| raw_quizzes.remove(&format!("section{number}")))
                .ok_or(ContentError::MissingQuizSet(number))?;
            if raw.is_empty() {
                return Err(ContentError::EmptyQuizSet(number).into());
            }
            let items = raw
                .into_iter()
                .enumerate()
                .map(|(i, item)| item.into_item(&format!("s{number}-q{}", i + 1)))
                .collect::<Result<Vec<_>, _>>()?;
            section_quizzes.insert(number, items);
        }

        let question_analysis = match self.question_analysis {
            Some(RawSection::Text(text)) | Some(RawSection::Titled { content: text, .. })
                if !text.trim().is_empty() =>
            {
                text
            }
            _ => return Err(ContentError::MissingField("question_analysis".into()).into()),
        };

        let selected_question = self.selected_question.map(|q| match q {
            RawSelectedQuestion::Full(q) => q.title,
            RawSelectedQuestion::Title(t) => t,
        });

        let analysis_quiz = self
            .analysis_quiz
            .into_iter()
            .enumerate()
            .map(|(i, item)| item.into_item(&format!("qa-q{}", i + 1)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LearningContent {
            question_analysis,
            selected_question,
            sections,
            section_quizzes,
            analysis_quiz,
            unlocked_difficulties: self.unlocked_difficulties,
        })
    }
}

/// Accepts both payload layouts: `section1..section5`, or the four topic keys
/// (`company_info`, `operation`, `valuation`, `investment_strategy`). The
/// topical layout may add a `summary`; without one, section 5 is built from
/// the opening lines of the other four.
fn parse_sections(mut raw: HashMap<String, RawSection>) -> Result<Vec<Section>, ContentError> {
    let numbered = (1..=SECTION_COUNT).any(|n| raw.contains_key(&format!("section{n}")));
    let topical = raw.contains_key(SectionTopic::CompanyBasics.wire_key());
    if !numbered && !topical {
        return Err(ContentError::UnknownSchema);
    }

    let mut sections = Vec::with_capacity(SECTION_COUNT as usize);
    for number in 1..=SECTION_COUNT {
        let topic = SectionTopic::for_section(number).ok_or(ContentError::MissingSection(number))?;
        let key = if numbered {
            format!("section{number}")
        } else {
            topic.wire_key().to_string()
        };
        let (title, body) = match raw.remove(&key) {
            Some(RawSection::Text(body)) => (None, body),
            Some(RawSection::Titled { title, content }) => (title, content),
            None if !numbered && topic == SectionTopic::Summary => (None, summarize(&sections)),
            None => return Err(ContentError::MissingSection(number)),
        };
        if body.trim().is_empty() {
            return Err(ContentError::MissingSection(number));
        }
        sections.push(Section {
            number,
            topic,
            title: title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| topic.default_title().to_string()),
            body,
        });
    }
    Ok(sections)
}

/// One line per section: its title and the first non-blank line of its body.
fn summarize(sections: &[Section]) -> String {
    sections
        .iter()
        .map(|s| {
            let lead = s.body.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
            format!("- **{}**：{lead}", s.title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
