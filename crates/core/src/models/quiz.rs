use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::errors::ContentError;

/// The four quiz formats served by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizKind {
    /// Pick exactly one option
    Single,
    /// Pick every correct option, nothing else
    Multiple,
    /// Two-option single choice (正确 / 错误)
    TrueFalse,
    /// Put all options in the right order
    Sort,
}

impl std::fmt::Display for QuizKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuizKind::Single => write!(f, "single"),
            QuizKind::Multiple => write!(f, "multiple"),
            QuizKind::TrueFalse => write!(f, "truefalse"),
            QuizKind::Sort => write!(f, "sort"),
        }
    }
}

/// The expected answer of a quiz item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CorrectAnswer {
    /// Exactly this option index
    Index(usize),
    /// Any one of these option indices is accepted
    AnyOf(BTreeSet<usize>),
    /// Exactly this set of option indices, order irrelevant
    Set(BTreeSet<usize>),
    /// Exactly this ordering of option indices
    Order(Vec<usize>),
}

/// What the learner submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Choice(usize),
    Choices(Vec<usize>),
    Order(Vec<usize>),
}

/// A validated quiz item. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizItem {
    pub id: String,
    pub kind: QuizKind,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct: CorrectAnswer,
    #[serde(default)]
    pub explanation: String,
}

impl QuizItem {
    pub fn single(
        id: impl Into<String>,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct: usize,
    ) -> Self {
        Self {
            id: id.into(),
            kind: QuizKind::Single,
            prompt: prompt.into(),
            options,
            correct: CorrectAnswer::Index(correct),
            explanation: String::new(),
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }
}

// ── Wire format ─────────────────────────────────────────────────────

/// Quiz item as it appears in backend JSON. Field names vary between
/// endpoints, hence the aliases.
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuizItem {
    #[serde(default)]
    pub id: Value,

    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(alias = "question", alias = "title", default)]
    pub prompt: String,

    #[serde(default)]
    pub options: Vec<String>,

    #[serde(alias = "correct", alias = "answer", default)]
    pub correct_answer: Value,

    #[serde(default)]
    pub explanation: String,
}

const TRUE_FALSE_OPTIONS: [&str; 2] = ["正确", "错误"];

impl RawQuizItem {
    /// Validate and convert. `fallback_id` names items that arrive without an id.
    pub fn into_item(self, fallback_id: &str) -> Result<QuizItem, ContentError> {
        let id = match &self.id {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => fallback_id.to_string(),
        };
        let invalid = |reason: String| ContentError::InvalidQuizItem {
            id: id.clone(),
            reason,
        };

        let kind = match self.kind.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("single") | Some("choice") => QuizKind::Single,
            Some("multiple") | Some("multi") => QuizKind::Multiple,
            Some("truefalse") | Some("true_false") | Some("judge") => QuizKind::TrueFalse,
            Some("sort") | Some("order") => QuizKind::Sort,
            Some(other) => return Err(invalid(format!("unknown type '{other}'"))),
        };

        if self.prompt.trim().is_empty() {
            return Err(invalid("prompt is empty".into()));
        }

        let options = if self.options.is_empty() && kind == QuizKind::TrueFalse {
            TRUE_FALSE_OPTIONS.iter().map(|s| s.to_string()).collect()
        } else {
            self.options
        };
        if options.is_empty() {
            return Err(invalid("no options".into()));
        }
        let n = options.len();

        let correct = match kind {
            QuizKind::Single | QuizKind::TrueFalse => {
                let idx = match &self.correct_answer {
                    // true/false items sometimes carry a boolean: true → "正确" (0)
                    Value::Bool(b) if kind == QuizKind::TrueFalse => Some(if *b { 0 } else { 1 }),
                    other => as_index(other),
                }
                .ok_or_else(|| invalid("correct answer is not an option index".into()))?;
                if idx >= n {
                    return Err(invalid(format!("correct index {idx} out of range (0..{n})")));
                }
                CorrectAnswer::Index(idx)
            }
            QuizKind::Multiple => {
                let indices = as_index_list(&self.correct_answer)
                    .ok_or_else(|| invalid("correct answer is not a list of indices".into()))?;
                let set: BTreeSet<usize> = indices.iter().copied().collect();
                if set.is_empty() || set.len() != indices.len() {
                    return Err(invalid("correct set is empty or has duplicates".into()));
                }
                if set.iter().any(|&i| i >= n) {
                    return Err(invalid("correct set references a missing option".into()));
                }
                CorrectAnswer::Set(set)
            }
            QuizKind::Sort => {
                let order = as_index_list(&self.correct_answer)
                    .ok_or_else(|| invalid("correct ordering is not a list of indices".into()))?;
                let mut sorted = order.clone();
                sorted.sort_unstable();
                if sorted != (0..n).collect::<Vec<_>>() {
                    return Err(invalid("correct ordering is not a permutation of the options".into()));
                }
                CorrectAnswer::Order(order)
            }
        };

        Ok(QuizItem {
            id,
            kind,
            prompt: self.prompt,
            options,
            correct,
            explanation: self.explanation,
        })
    }
}

fn as_index(v: &Value) -> Option<usize> {
    match v {
        Value::Number(n) => n.as_u64().map(|i| i as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_index_list(v: &Value) -> Option<Vec<usize>> {
    match v {
        Value::Array(items) => items.iter().map(as_index).collect(),
        _ => None,
    }
}
