use thiserror::Error;

/// Unified error type for the entire stock-quest-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── API / Network ───────────────────────────────────────────────
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error ({endpoint}): {message}")]
    Api {
        endpoint: String,
        message: String,
    },

    // ── Content returned by the backend ─────────────────────────────
    #[error("Malformed content: {0}")]
    Content(#[from] ContentError),

    // ── Session state ───────────────────────────────────────────────
    #[error("Missing required state: {0}")]
    MissingState(String),

    #[error("Another request is still in flight: {0}")]
    Busy(String),

    #[error("Response arrived for a request that is no longer current")]
    StaleResponse,

    // ── Question selection ──────────────────────────────────────────
    #[error("Selection limit reached — at most {limit} questions can be selected")]
    SelectionLimit { limit: usize },

    #[error("Select at least 1 question before continuing")]
    NoQuestionSelected,

    // ── Learning flow ───────────────────────────────────────────────
    #[error("Cannot {action} from {from}")]
    InvalidTransition { from: String, action: String },

    #[error("Section {section} quiz still has {remaining} unanswered item(s)")]
    QuizPending { section: u8, remaining: usize },

    #[error("This question has already been answered")]
    AlreadyAnswered,

    #[error("Answer does not fit the question type: {0}")]
    AnswerMismatch(String),

    #[error("Difficulty '{0}' is not unlocked for this stock")]
    DifficultyLocked(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    // ── Serialization ───────────────────────────────────────────────
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl CoreError {
    /// Network failures and malformed content leave the session untouched;
    /// the same action can simply be tried again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::Network(_)
                | CoreError::Timeout(_)
                | CoreError::Api { .. }
                | CoreError::Content(_)
                | CoreError::Deserialization(_)
        )
    }

    /// The operation referenced state that does not exist. The learner has to
    /// be sent back to stock selection.
    pub fn requires_restart(&self) -> bool {
        matches!(self, CoreError::MissingState(_))
    }
}

/// Problems found while validating a `/learning/content` payload.
///
/// The backend answers with `success: true` but may still leave out
/// sections or quiz sets; these are caught at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("section {0} is missing")]
    MissingSection(u8),

    #[error("quiz set for section {0} is missing")]
    MissingQuizSet(u8),

    #[error("quiz set for section {0} is empty")]
    EmptyQuizSet(u8),

    #[error("quiz item '{id}' is invalid: {reason}")]
    InvalidQuizItem { id: String, reason: String },

    #[error("content matches no known section layout")]
    UnknownSchema,

    #[error("response field '{0}' is missing")]
    MissingField(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Strip query parameters: they carry the user id.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        if e.is_timeout() {
            CoreError::Timeout(sanitized)
        } else {
            CoreError::Network(sanitized)
        }
    }
}
