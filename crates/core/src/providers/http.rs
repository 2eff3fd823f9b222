use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::content::{ContentResponse, LearningContent};
use crate::models::difficulty::Difficulty;
use crate::models::question::Question;
use crate::models::reward::{CollectionReceipt, CompletionRequest};
use crate::models::settings::Settings;
use crate::models::stock::Stock;
use crate::services::swipe_service::SwipeDirection;
use super::traits::LearningApi;

/// JSON-over-HTTP client for the learning backend.
///
/// - **Timeout**: taken from `Settings::request_timeout_secs` (native only).
/// - **Errors**: transport failures and timeouts become `Network`/`Timeout`,
///   `success: false` becomes `Api`, missing fields become `Content`.
pub struct HttpLearningApi {
    client: Client,
    base_url: String,
}

impl HttpLearningApi {
    pub fn new(settings: &Settings) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(settings.request_timeout_secs));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, CoreError> {
        let resp = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await?;
        Self::decode(path, resp).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CoreError> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        Self::decode(path, resp).await
    }

    async fn decode<T: DeserializeOwned>(
        path: &str,
        resp: reqwest::Response,
    ) -> Result<T, CoreError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                endpoint: path.to_string(),
                message: format!("HTTP {status}"),
            });
        }
        resp.json().await.map_err(|e| CoreError::Api {
            endpoint: path.to_string(),
            message: format!("Failed to parse response: {e}"),
        })
    }
}

// ── Backend response types ──────────────────────────────────────────

/// `/stocks` answers with a bare array or a `{ success, stocks }` envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StocksResponse {
    List(Vec<Stock>),
    Envelope {
        #[serde(default = "default_true")]
        success: bool,
        #[serde(default, alias = "data")]
        stocks: Vec<Stock>,
        #[serde(default)]
        message: Option<String>,
    },
}

impl StocksResponse {
    pub fn into_stocks(self) -> Result<Vec<Stock>, CoreError> {
        match self {
            StocksResponse::List(stocks) => Ok(stocks),
            StocksResponse::Envelope { success: true, stocks, .. } => Ok(stocks),
            StocksResponse::Envelope { message, .. } => Err(api_failure("/stocks", message)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QuestionsResponse {
    pub success: bool,
    #[serde(default)]
    pub questions: Option<Vec<Question>>,
    #[serde(default)]
    pub message: Option<String>,
}

impl QuestionsResponse {
    pub fn into_questions(self) -> Result<Vec<Question>, CoreError> {
        if !self.success {
            return Err(api_failure("/learning/questions", self.message));
        }
        self.questions.ok_or_else(|| {
            CoreError::Content(crate::errors::ContentError::MissingField("questions".into()))
        })
    }
}

/// Plain `{ success, message }` acknowledgement.
#[derive(Debug, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl AckResponse {
    pub fn into_result(self, endpoint: &str) -> Result<(), CoreError> {
        if self.success {
            Ok(())
        } else {
            Err(api_failure(endpoint, self.message))
        }
    }
}

#[derive(Serialize)]
struct SelectQuestionBody<'a> {
    user_id: &'a str,
    stock_id: i64,
    question_id: i64,
}

#[derive(Serialize)]
struct UserActionBody<'a> {
    user_id: &'a str,
    stock_id: i64,
    action_type: &'static str,
}

fn default_true() -> bool {
    true
}

fn api_failure(endpoint: &str, message: Option<String>) -> CoreError {
    CoreError::Api {
        endpoint: endpoint.to_string(),
        message: message.unwrap_or_else(|| "request was not successful".into()),
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl LearningApi for HttpLearningApi {
    fn name(&self) -> &str {
        "HTTP"
    }

    async fn fetch_stocks(&self) -> Result<Vec<Stock>, CoreError> {
        let resp: StocksResponse = self.get_json("/stocks", &[]).await?;
        resp.into_stocks()
    }

    async fn fetch_questions(&self, stock_id: i64) -> Result<Vec<Question>, CoreError> {
        let resp: QuestionsResponse = self
            .get_json("/learning/questions", &[("stock_id", stock_id.to_string())])
            .await?;
        resp.into_questions()
    }

    async fn select_question(
        &self,
        user_id: &str,
        stock_id: i64,
        question_id: i64,
    ) -> Result<(), CoreError> {
        let body = SelectQuestionBody {
            user_id,
            stock_id,
            question_id,
        };
        let resp: AckResponse = self.post_json("/learning/select-question", &body).await?;
        resp.into_result("/learning/select-question")
    }

    async fn fetch_content(
        &self,
        user_id: &str,
        stock_id: i64,
        difficulty: Difficulty,
    ) -> Result<LearningContent, CoreError> {
        let resp: ContentResponse = self
            .get_json(
                "/learning/content",
                &[
                    ("user_id", user_id.to_string()),
                    ("stock_id", stock_id.to_string()),
                    ("difficulty", difficulty.as_str().to_string()),
                ],
            )
            .await?;
        resp.into_content()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CollectionReceipt, CoreError> {
        let receipt: CollectionReceipt = self.post_json("/collection/complete", request).await?;
        if !receipt.success {
            return Err(api_failure("/collection/complete", receipt.message));
        }
        Ok(receipt)
    }

    async fn record_action(
        &self,
        user_id: &str,
        stock_id: i64,
        direction: SwipeDirection,
    ) -> Result<(), CoreError> {
        let body = UserActionBody {
            user_id,
            stock_id,
            action_type: direction.action_type(),
        };
        let resp: AckResponse = self.post_json("/user/action", &body).await?;
        resp.into_result("/user/action")
    }
}
