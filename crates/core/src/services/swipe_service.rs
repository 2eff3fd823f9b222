use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::stock::Stock;

/// Swipe direction. Right means "interesting".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    /// `action_type` reported to `/user/action`.
    pub fn action_type(&self) -> &'static str {
        match self {
            SwipeDirection::Left => "swipe_left",
            SwipeDirection::Right => "swipe_right",
        }
    }
}

/// Outcome of one swipe.
#[derive(Debug, Clone, PartialEq)]
pub struct SwipeRecord {
    pub stock: Stock,
    pub direction: SwipeDirection,
    /// True when this swipe finished the session
    pub completed: bool,
}

/// Progress through the candidate stock list.
///
/// Invariants: `swipe_count() == liked.len() + disliked.len()`, the index only
/// grows, and once complete the session stays complete.
#[derive(Debug, Clone)]
pub struct SwipeSession {
    id: Uuid,
    stocks: Vec<Stock>,
    current_index: usize,
    liked: Vec<Stock>,
    disliked: Vec<Stock>,
    target: usize,
}

impl SwipeSession {
    /// `target` is fixed for the lifetime of the session.
    pub fn new(stocks: Vec<Stock>, target: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            stocks,
            current_index: 0,
            liked: Vec::new(),
            disliked: Vec::new(),
            target,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Stock currently on top of the deck, if any.
    pub fn current(&self) -> Option<&Stock> {
        if self.is_complete() {
            return None;
        }
        self.stocks.get(self.current_index)
    }

    /// Record a swipe on the current stock and move to the next one.
    pub fn record_swipe(&mut self, direction: SwipeDirection) -> Result<SwipeRecord, CoreError> {
        if self.is_complete() {
            return Err(CoreError::InvalidTransition {
                from: "a completed swipe session".into(),
                action: "swipe".into(),
            });
        }
        let stock = self
            .stocks
            .get(self.current_index)
            .cloned()
            .ok_or_else(|| CoreError::MissingState("no stock at the current swipe position".into()))?;

        match direction {
            SwipeDirection::Right => self.liked.push(stock.clone()),
            SwipeDirection::Left => self.disliked.push(stock.clone()),
        }
        self.current_index += 1;

        tracing::debug!(
            session = %self.id,
            stock_id = stock.id,
            ?direction,
            swipes = self.swipe_count(),
            "swipe recorded"
        );

        Ok(SwipeRecord {
            stock,
            direction,
            completed: self.is_complete(),
        })
    }

    /// Complete when the deck is exhausted or the target is reached.
    pub fn is_complete(&self) -> bool {
        self.current_index >= self.stocks.len() || self.swipe_count() >= self.target
    }

    pub fn swipe_count(&self) -> usize {
        self.liked.len() + self.disliked.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn total(&self) -> usize {
        self.stocks.len()
    }

    pub fn liked(&self) -> &[Stock] {
        &self.liked
    }

    pub fn disliked(&self) -> &[Stock] {
        &self.disliked
    }

    /// Swipes left before the session completes.
    pub fn remaining(&self) -> usize {
        if self.is_complete() {
            return 0;
        }
        let by_deck = self.stocks.len() - self.current_index;
        let by_target = self.target - self.swipe_count();
        by_deck.min(by_target)
    }
}
