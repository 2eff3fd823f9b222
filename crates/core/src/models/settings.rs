use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Default number of swipes that completes a swipe session.
pub const DEFAULT_SWIPE_TARGET: usize = 15;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client configuration. Hosts usually build it from JSON or the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the backend API (e.g., "http://localhost:8000/api").
    pub api_base_url: String,

    /// Learner identifier sent with every request.
    pub user_id: String,

    /// Per-request timeout. Expiry is treated as a network failure.
    /// Not applied on wasm32, where the browser owns the fetch.
    pub request_timeout_secs: u64,

    /// Swipes needed to finish the swipe phase.
    pub swipe_target: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            user_id: "guest".to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            swipe_target: DEFAULT_SWIPE_TARGET,
        }
    }
}

impl Settings {
    /// Build settings from `STOCK_QUEST_*` environment variables.
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: std::env::var("STOCK_QUEST_API_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.api_base_url),
            user_id: std::env::var("STOCK_QUEST_USER_ID")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.user_id),
            request_timeout_secs: std::env::var("STOCK_QUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            swipe_target: std::env::var("STOCK_QUEST_SWIPE_TARGET")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.swipe_target),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.api_base_url.trim().is_empty() {
            return Err(CoreError::ValidationError("api_base_url must not be empty".into()));
        }
        if self.user_id.trim().is_empty() {
            return Err(CoreError::ValidationError("user_id must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::ValidationError(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.swipe_target == 0 {
            return Err(CoreError::ValidationError("swipe_target must be greater than zero".into()));
        }
        Ok(())
    }
}
