use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::content::LearningContent;
use crate::models::difficulty::Difficulty;
use crate::models::question::Question;
use crate::models::reward::{CollectionReceipt, CompletionRequest};
use crate::models::stock::Stock;
use crate::services::swipe_service::SwipeDirection;

/// The backend contract the core depends on.
///
/// The HTTP client implements it for production; tests plug in mocks.
/// Implementations return validated models: malformed payloads surface as
/// `CoreError::Content`, unsuccessful responses as `CoreError::Api`.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait LearningApi: Send + Sync {
    /// Human-readable name of this backend (for logs/errors).
    fn name(&self) -> &str;

    /// `GET /stocks`. Style/risk are not yet normalized.
    async fn fetch_stocks(&self) -> Result<Vec<Stock>, CoreError>;

    /// `GET /learning/questions?stock_id=`
    async fn fetch_questions(&self, stock_id: i64) -> Result<Vec<Question>, CoreError>;

    /// `POST /learning/select-question`
    async fn select_question(
        &self,
        user_id: &str,
        stock_id: i64,
        question_id: i64,
    ) -> Result<(), CoreError>;

    /// `GET /learning/content?user_id=&stock_id=&difficulty=`
    async fn fetch_content(
        &self,
        user_id: &str,
        stock_id: i64,
        difficulty: Difficulty,
    ) -> Result<LearningContent, CoreError>;

    /// `POST /collection/complete`
    async fn complete(&self, request: &CompletionRequest) -> Result<CollectionReceipt, CoreError>;

    /// `POST /user/action`
    async fn record_action(
        &self,
        user_id: &str,
        stock_id: i64,
        direction: SwipeDirection,
    ) -> Result<(), CoreError>;
}
