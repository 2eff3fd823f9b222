pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use models::{
    content::LearningContent,
    difficulty::Difficulty,
    learner::LearnerContext,
    profile::{InvestorProfile, ProfileTheme},
    question::Question,
    quiz::Answer,
    reward::{
        CollectionReceipt, CompletionRequest, LearningCompletion, QuickLearnCompletion,
        QuizOutcome,
    },
    settings::Settings,
    stock::{normalize_stocks, Stock},
};
use providers::{http::HttpLearningApi, traits::LearningApi};
use services::{
    fetch_gate::{FetchGate, FetchTicket},
    learning_flow::{LearningSession, Phase, SectionAnswer, Step},
    profile_service::ProfileService,
    question_service::{QuestionSelection, ToggleOutcome},
    quick_learn::{QuickLearnFeedback, QuickLearnSession, QuickLearnStep},
    swipe_service::{SwipeDirection, SwipeRecord, SwipeSession},
};

use errors::CoreError;

/// A pending `/learning/questions` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionsRequest {
    pub ticket: FetchTicket,
    pub stock_id: i64,
}

/// A pending `/learning/content` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    pub ticket: FetchTicket,
    pub user_id: String,
    pub stock_id: i64,
    pub difficulty: Difficulty,
}

/// A pending `/collection/complete` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionTicket {
    pub ticket: FetchTicket,
    pub request: CompletionRequest,
}

/// Result of a synchronous forward step in the learning flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved(Phase),
    /// Section 5 is done; the completion must be reported before the flow ends.
    CompletionPending(CompletionTicket),
}

/// Result of [`StockQuest::next`].
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    Moved(Phase),
    Completed(LearningCompletion),
}

/// Result of [`StockQuest::quick_next`].
#[derive(Debug, Clone, PartialEq)]
pub enum QuickLearnEvent {
    Question(usize),
    Finished(QuickLearnCompletion),
}

/// Main entry point for the Stock Quest core library.
///
/// Owns the backend client and every piece of learner state: swipe
/// session, derived profile, question selection and the active learning
/// or quick-learn session. State changes happen synchronously; backend
/// calls are guarded so a late response never lands on newer state.
#[must_use]
pub struct StockQuest {
    api: Box<dyn LearningApi>,
    settings: Settings,
    learner: LearnerContext,
    profile_service: ProfileService,
    gate: FetchGate,
    stocks: Option<Vec<Stock>>,
    swipe: Option<SwipeSession>,
    profile: Option<InvestorProfile>,
    selected_stock: Option<Stock>,
    selection: Option<QuestionSelection>,
    learning: Option<LearningSession>,
    quick_learn: Option<(QuickLearnSession, Difficulty)>,
}

impl std::fmt::Debug for StockQuest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockQuest")
            .field("api", &self.api.name())
            .field("user_id", &self.learner.user_id)
            .field("points", &self.learner.total_points)
            .field("stocks", &self.stocks.as_ref().map(Vec::len))
            .field("profile", &self.profile.as_ref().map(|p| p.type_code.as_str()))
            .field("phase", &self.learning.as_ref().map(LearningSession::phase))
            .field("busy", &self.gate.is_busy())
            .finish()
    }
}

impl StockQuest {
    /// Create a client talking to the HTTP backend configured in `settings`.
    pub fn new(settings: Settings) -> Result<Self, CoreError> {
        let api = HttpLearningApi::new(&settings);
        Self::with_api(settings, Box::new(api))
    }

    /// Create a client on top of any backend implementation.
    pub fn with_api(settings: Settings, api: Box<dyn LearningApi>) -> Result<Self, CoreError> {
        settings.validate()?;
        let learner = LearnerContext::new(settings.user_id.clone());
        Ok(Self {
            api,
            settings,
            learner,
            profile_service: ProfileService::new(),
            gate: FetchGate::new(),
            stocks: None,
            swipe: None,
            profile: None,
            selected_stock: None,
            selection: None,
            learning: None,
            quick_learn: None,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn learner(&self) -> &LearnerContext {
        &self.learner
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    // ── Stocks ──────────────────────────────────────────────────────

    pub fn begin_load_stocks(&mut self) -> Result<FetchTicket, CoreError> {
        self.gate.begin("stocks")
    }

    /// Apply a `/stocks` response. Style/risk are normalized here.
    pub fn apply_stocks(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<Stock>, CoreError>,
    ) -> Result<&[Stock], CoreError> {
        let stocks = self.settle(ticket, result)?;
        tracing::info!(count = stocks.len(), "stocks loaded");
        Ok(self.stocks.insert(normalize_stocks(stocks)).as_slice())
    }

    /// Fetch the stock list once; later calls refetch it.
    pub async fn load_stocks(&mut self) -> Result<&[Stock], CoreError> {
        let ticket = self.begin_load_stocks()?;
        let _guard = self.gate.guard(&ticket);
        let result = self.api.fetch_stocks().await;
        self.apply_stocks(&ticket, result)
    }

    #[must_use]
    pub fn stocks(&self) -> &[Stock] {
        self.stocks.as_deref().unwrap_or(&[])
    }

    #[must_use]
    pub fn find_stock(&self, stock_id: i64) -> Option<&Stock> {
        self.stocks().iter().find(|s| s.id == stock_id)
    }

    // ── Swiping ─────────────────────────────────────────────────────

    /// Start a fresh swipe session over the loaded stocks.
    /// Discards any previous session and profile.
    pub fn start_swipe(&mut self) -> Result<&SwipeSession, CoreError> {
        let stocks = self
            .stocks
            .clone()
            .ok_or_else(|| CoreError::MissingState("stocks have not been loaded".into()))?;
        self.profile = None;
        let target = self.settings.swipe_target;
        Ok(&*self.swipe.insert(SwipeSession::new(stocks, target)))
    }

    /// Alias used by hosts that offer a "start over" button.
    pub fn reset_swipe(&mut self) -> Result<&SwipeSession, CoreError> {
        self.start_swipe()
    }

    #[must_use]
    pub fn swipe_session(&self) -> Option<&SwipeSession> {
        self.swipe.as_ref()
    }

    /// Swipe the current stock. The swipe is reported to `/user/action`;
    /// reporting failures are logged and otherwise ignored.
    pub async fn swipe(&mut self, direction: SwipeDirection) -> Result<SwipeRecord, CoreError> {
        let record = self
            .swipe
            .as_mut()
            .ok_or_else(|| CoreError::MissingState("no swipe session in progress".into()))?
            .record_swipe(direction)?;

        if let Err(err) = self
            .api
            .record_action(&self.learner.user_id, record.stock.id, direction)
            .await
        {
            tracing::warn!(stock_id = record.stock.id, error = %err, "swipe telemetry failed");
        }
        Ok(record)
    }

    // ── Profile ─────────────────────────────────────────────────────

    /// Classify the finished swipe session. The session is consumed.
    pub fn generate_profile(&mut self) -> Result<&InvestorProfile, CoreError> {
        let session = self
            .swipe
            .as_ref()
            .ok_or_else(|| CoreError::MissingState("no swipe session to classify".into()))?;
        if !session.is_complete() {
            return Err(CoreError::InvalidTransition {
                from: format!("swipe {}/{}", session.swipe_count(), session.target()),
                action: "generate a profile".into(),
            });
        }
        let profile = self.profile_service.analyze(session.liked());
        tracing::info!(
            type_code = %profile.type_code,
            liked = session.liked().len(),
            "profile generated"
        );
        self.swipe = None;
        Ok(&*self.profile.insert(profile))
    }

    #[must_use]
    pub fn profile(&self) -> Option<&InvestorProfile> {
        self.profile.as_ref()
    }

    #[must_use]
    pub fn profile_theme(&self) -> Option<ProfileTheme> {
        self.profile
            .as_ref()
            .map(|p| self.profile_service.theme(&p.type_code))
    }

    // ── Question selection ──────────────────────────────────────────

    /// Pick a stock to study and request its questions.
    pub fn begin_choose_stock(&mut self, stock_id: i64) -> Result<QuestionsRequest, CoreError> {
        if self.find_stock(stock_id).is_none() {
            return Err(CoreError::MissingState(format!("stock {stock_id} is not loaded")));
        }
        let ticket = self.gate.begin("questions")?;
        Ok(QuestionsRequest { ticket, stock_id })
    }

    pub fn apply_questions(
        &mut self,
        request: &QuestionsRequest,
        result: Result<Vec<Question>, CoreError>,
    ) -> Result<&[Question], CoreError> {
        let questions = self.settle(&request.ticket, result)?;
        let stock = self
            .find_stock(request.stock_id)
            .cloned()
            .ok_or_else(|| CoreError::MissingState(format!("stock {} is not loaded", request.stock_id)))?;

        self.learning = None;
        self.quick_learn = None;
        self.selected_stock = Some(stock);
        let selection = self
            .selection
            .insert(QuestionSelection::new(request.stock_id, questions));
        Ok(selection.available())
    }

    pub async fn choose_stock(&mut self, stock_id: i64) -> Result<&[Question], CoreError> {
        let request = self.begin_choose_stock(stock_id)?;
        let _guard = self.gate.guard(&request.ticket);
        let result = self.api.fetch_questions(stock_id).await;
        self.apply_questions(&request, result)
    }

    #[must_use]
    pub fn selected_stock(&self) -> Option<&Stock> {
        self.selected_stock.as_ref()
    }

    #[must_use]
    pub fn question_selection(&self) -> Option<&QuestionSelection> {
        self.selection.as_ref()
    }

    pub fn toggle_question(&mut self, question_id: i64) -> Result<ToggleOutcome, CoreError> {
        self.selection
            .as_mut()
            .ok_or_else(|| CoreError::MissingState("no stock chosen".into()))?
            .toggle(question_id)
    }

    // ── Full learning flow ──────────────────────────────────────────

    /// Confirm the selected questions and request content for `difficulty`.
    pub fn begin_learning(&mut self, difficulty: Difficulty) -> Result<ContentRequest, CoreError> {
        let stock_id = self.require_stock()?.id;
        self.require_selection()?.confirm()?;
        let ticket = self.gate.begin("content")?;
        Ok(ContentRequest {
            ticket,
            user_id: self.learner.user_id.clone(),
            stock_id,
            difficulty,
        })
    }

    /// Build the learning session from a content response.
    /// On any error no session is created and nothing else changes.
    pub fn apply_content(
        &mut self,
        request: &ContentRequest,
        result: Result<LearningContent, CoreError>,
    ) -> Result<&LearningSession, CoreError> {
        let content = self.settle(&request.ticket, result)?;
        let stock = self.require_stock()?.clone();
        let selected = self.require_selection()?.selected().to_vec();

        let session = LearningSession::new(
            request.user_id.clone(),
            stock,
            selected,
            request.difficulty,
            content,
        )?;
        self.quick_learn = None;
        Ok(&*self.learning.insert(session))
    }

    /// Confirm questions, report them, fetch content and start at the
    /// question analysis. Only the primary question shapes the content.
    pub async fn start_learning(&mut self, difficulty: Difficulty) -> Result<&LearningSession, CoreError> {
        let request = self.begin_learning(difficulty)?;
        let _guard = self.gate.guard(&request.ticket);
        self.report_selected_questions(request.stock_id).await;
        let result = self
            .api
            .fetch_content(&request.user_id, request.stock_id, request.difficulty)
            .await;
        self.apply_content(&request, result)
    }

    #[must_use]
    pub fn learning_session(&self) -> Option<&LearningSession> {
        self.learning.as_ref()
    }

    /// Step forward without touching the network. At the end of section 5
    /// this returns a completion ticket instead of moving.
    pub fn advance(&mut self) -> Result<Advance, CoreError> {
        let step = self.require_learning_mut()?.next()?;
        match step {
            Step::Moved(phase) => Ok(Advance::Moved(phase)),
            Step::ReadyToComplete(request) => {
                let ticket = self.gate.begin("completion")?;
                Ok(Advance::CompletionPending(CompletionTicket { ticket, request }))
            }
        }
    }

    /// Apply the collection's answer. On failure the learner stays on section 5.
    pub fn apply_completion(
        &mut self,
        ticket: &CompletionTicket,
        result: Result<CollectionReceipt, CoreError>,
    ) -> Result<LearningCompletion, CoreError> {
        let receipt = self.settle(&ticket.ticket, result)?;
        let completion = self.require_learning_mut()?.complete(receipt)?;
        self.learner.record_completion(completion.stock_id, completion.difficulty);
        Ok(completion)
    }

    pub async fn next(&mut self) -> Result<FlowEvent, CoreError> {
        match self.advance()? {
            Advance::Moved(phase) => Ok(FlowEvent::Moved(phase)),
            Advance::CompletionPending(ticket) => {
                let _guard = self.gate.guard(&ticket.ticket);
                let result = self.api.complete(&ticket.request).await;
                self.apply_completion(&ticket, result).map(FlowEvent::Completed)
            }
        }
    }

    /// Step back. Any in-flight request is invalidated.
    pub fn previous(&mut self) -> Result<Phase, CoreError> {
        self.gate.invalidate();
        self.require_learning_mut()?.previous()
    }

    pub fn answer(&mut self, answer: &Answer) -> Result<SectionAnswer, CoreError> {
        let result = self.require_learning_mut()?.answer(answer)?;
        self.learner.credit(result.outcome.points);
        Ok(result)
    }

    pub fn answer_analysis(&mut self, answer: &Answer) -> Result<QuizOutcome, CoreError> {
        let outcome = self.require_learning_mut()?.answer_analysis(answer)?;
        self.learner.credit(outcome.points);
        Ok(outcome)
    }

    /// Leave the learning flow and return to stock selection.
    pub fn exit_learning(&mut self) {
        self.gate.invalidate();
        self.learning = None;
        self.quick_learn = None;
        self.selection = None;
        self.selected_stock = None;
        tracing::debug!("returned to stock selection");
    }

    // ── Quick learn ─────────────────────────────────────────────────

    /// Start a five-question run seeded by the primary selected question.
    pub fn start_quick_learn(&mut self, difficulty: Difficulty) -> Result<&QuickLearnSession, CoreError> {
        let stock = self.require_stock()?.clone();
        let seed = self.require_selection()?.confirm()?.clone();
        self.learning = None;
        let (session, _) = self
            .quick_learn
            .insert((QuickLearnSession::new(stock, seed), difficulty));
        Ok(&*session)
    }

    #[must_use]
    pub fn quick_learn_session(&self) -> Option<&QuickLearnSession> {
        self.quick_learn.as_ref().map(|(s, _)| s)
    }

    pub fn quick_answer(&mut self, selected: usize) -> Result<QuickLearnFeedback, CoreError> {
        let (session, _) = self
            .quick_learn
            .as_mut()
            .ok_or_else(|| CoreError::MissingState("no quick learn in progress".into()))?;
        let feedback = session.answer(selected)?;
        self.learner.credit(feedback.outcome.points);
        Ok(feedback)
    }

    /// Move to the next quick-learn item. Leaving the last item reports the
    /// run to the collection first; if that fails the learner stays put.
    pub async fn quick_next(&mut self) -> Result<QuickLearnEvent, CoreError> {
        let (session, difficulty) = self
            .quick_learn
            .as_ref()
            .ok_or_else(|| CoreError::MissingState("no quick learn in progress".into()))?;
        let difficulty = *difficulty;

        let on_last = session.current_index() + 1 >= session.items().len();
        if !on_last || session.is_finished() {
            let (session, _) = self
                .quick_learn
                .as_mut()
                .ok_or_else(|| CoreError::MissingState("no quick learn in progress".into()))?;
            return match session.next()? {
                QuickLearnStep::Question(i) => Ok(QuickLearnEvent::Question(i)),
                QuickLearnStep::Finished(_) => Err(CoreError::MissingState(
                    "quick learn finished without a report".into(),
                )),
            };
        }

        let request = CompletionRequest {
            user_id: self.learner.user_id.clone(),
            stock_id: session.stock().id,
            difficulty,
        };
        let ticket = self.gate.begin("completion")?;
        let _guard = self.gate.guard(&ticket);
        let result = self.api.complete(&request).await;
        let receipt = self.settle(&ticket, result)?;

        let (session, _) = self
            .quick_learn
            .as_mut()
            .ok_or_else(|| CoreError::MissingState("no quick learn in progress".into()))?;
        match session.next()? {
            QuickLearnStep::Finished(summary) => {
                self.learner.record_completion(summary.stock_id, difficulty);
                Ok(QuickLearnEvent::Finished(QuickLearnCompletion {
                    summary,
                    difficulty,
                    receipt,
                }))
            }
            QuickLearnStep::Question(i) => Ok(QuickLearnEvent::Question(i)),
        }
    }

    // ── Internals ───────────────────────────────────────────────────

    fn settle<T>(&mut self, ticket: &FetchTicket, result: Result<T, CoreError>) -> Result<T, CoreError> {
        self.gate.settle(ticket)?;
        result
    }

    /// Report every selected question. Failures never block the flow.
    async fn report_selected_questions(&self, stock_id: i64) {
        let Some(selection) = self.selection.as_ref() else {
            return;
        };
        for question in selection.selected() {
            if let Err(err) = self
                .api
                .select_question(&self.learner.user_id, stock_id, question.id)
                .await
            {
                tracing::warn!(stock_id, question_id = question.id, error = %err, "question report failed");
            }
        }
    }

    fn require_stock(&self) -> Result<&Stock, CoreError> {
        self.selected_stock
            .as_ref()
            .ok_or_else(|| CoreError::MissingState("no stock chosen".into()))
    }

    fn require_selection(&self) -> Result<&QuestionSelection, CoreError> {
        self.selection
            .as_ref()
            .ok_or_else(|| CoreError::MissingState("no question selection".into()))
    }

    fn require_learning_mut(&mut self) -> Result<&mut LearningSession, CoreError> {
        self.learning
            .as_mut()
            .ok_or_else(|| CoreError::MissingState("no learning session".into()))
    }
}
