use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::errors::CoreError;

/// Handle for one in-flight backend request.
///
/// A response may only be applied while its ticket is still current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    label: &'static str,
}

impl FetchTicket {
    pub fn label(&self) -> &'static str {
        self.label
    }
}

/// Guards async fetch boundaries.
///
/// - While a request is in flight, new requests are refused with `Busy`
///   (input is ignored until the first one settles).
/// - Navigation calls [`FetchGate::invalidate`]; a response that arrives
///   afterwards is reported stale and must be dropped.
/// - A request whose [`FetchGuard`] is dropped before it settles (the host
///   cancelled the future or timed it out) no longer holds the gate.
#[derive(Debug, Default)]
pub struct FetchGate {
    generation: u64,
    in_flight: Option<FetchTicket>,
    abandoned: Arc<AtomicU64>,
}

impl FetchGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, label: &'static str) -> Result<FetchTicket, CoreError> {
        self.reclaim_abandoned();
        if let Some(current) = &self.in_flight {
            return Err(CoreError::Busy(current.label.to_string()));
        }
        self.generation += 1;
        let ticket = FetchTicket {
            generation: self.generation,
            label,
        };
        self.in_flight = Some(ticket.clone());
        Ok(ticket)
    }

    /// Tie `ticket` to the lifetime of the awaiting future. Dropping the
    /// guard while the ticket is still in flight releases the gate.
    pub fn guard(&self, ticket: &FetchTicket) -> FetchGuard {
        FetchGuard {
            abandoned: Arc::clone(&self.abandoned),
            generation: ticket.generation,
        }
    }

    /// Close the request. Errors with `StaleResponse` if the ticket was
    /// invalidated in the meantime; the caller then discards the response.
    pub fn settle(&mut self, ticket: &FetchTicket) -> Result<(), CoreError> {
        if ticket.generation != self.generation {
            tracing::warn!(request = ticket.label, "discarding stale response");
            return Err(CoreError::StaleResponse);
        }
        if self.in_flight.as_ref() == Some(ticket) {
            self.in_flight = None;
        }
        Ok(())
    }

    /// Forget any in-flight request; its response will be stale.
    pub fn invalidate(&mut self) {
        if let Some(ticket) = self.in_flight.take() {
            tracing::debug!(request = ticket.label, "in-flight request invalidated");
        }
        self.generation += 1;
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|t| !self.is_abandoned(t))
    }

    fn is_abandoned(&self, ticket: &FetchTicket) -> bool {
        self.abandoned.load(Ordering::Acquire) == ticket.generation
    }

    fn reclaim_abandoned(&mut self) {
        let abandoned = self
            .in_flight
            .as_ref()
            .is_some_and(|t| self.is_abandoned(t));
        if abandoned {
            tracing::warn!(
                request = self.in_flight.as_ref().map(FetchTicket::label),
                "request was cancelled before it settled"
            );
            self.invalidate();
        }
    }
}

/// Drop guard for a request awaited inside the core.
///
/// Generations only grow, so a guard dropped after its ticket settled
/// marks a generation that is no longer in flight and changes nothing.
#[derive(Debug)]
pub struct FetchGuard {
    abandoned: Arc<AtomicU64>,
    generation: u64,
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        self.abandoned.fetch_max(self.generation, Ordering::AcqRel);
    }
}
