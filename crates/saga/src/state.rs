//! Checkout saga state machine.

use serde::{Deserialize, Serialize};

/// The state of an order placement.
///
/// State transitions:
/// ```text
/// Preparing ──► Paying ──► Shipping ──► Finalizing ──► Done
///     │            │           │
///     └────────────┴───────────┴──► Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    /// Generating the order ID and gathering cart, prices and shipping quote.
    #[default]
    Preparing,

    /// Charging the payment instrument.
    Paying,

    /// Dispatching the shipment.
    Shipping,

    /// Best-effort cart reset, confirmation and publication.
    Finalizing,

    /// Order placed (terminal state).
    Done,

    /// A fatal step failed (terminal state).
    Aborted,
}

impl SagaState {
    /// Returns true if the saga may move from this state to `next`.
    pub fn can_transition_to(&self, next: SagaState) -> bool {
        matches!(
            (self, next),
            (SagaState::Preparing, SagaState::Paying)
                | (SagaState::Paying, SagaState::Shipping)
                | (SagaState::Shipping, SagaState::Finalizing)
                | (SagaState::Finalizing, SagaState::Done)
                | (
                    SagaState::Preparing | SagaState::Paying | SagaState::Shipping,
                    SagaState::Aborted
                )
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaState::Done | SagaState::Aborted)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::Preparing => "Preparing",
            SagaState::Paying => "Paying",
            SagaState::Shipping => "Shipping",
            SagaState::Finalizing => "Finalizing",
            SagaState::Done => "Done",
            SagaState::Aborted => "Aborted",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
