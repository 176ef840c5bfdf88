//! Payment service trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Money, RequestContext};
use domain::CreditCardInfo;

use crate::error::ServiceError;

/// Trait for card charging.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Charges `amount` to `card`, returning the transaction ID.
    async fn charge(
        &self,
        ctx: &RequestContext,
        amount: &Money,
        card: &CreditCardInfo,
    ) -> Result<String, ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    charges: Vec<(String, Money)>,
    attempts: usize,
    next_id: u32,
    fail_on_charge: bool,
}

/// In-memory payment service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentService {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentService {
    /// Creates a new in-memory payment service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to decline every charge.
    pub fn set_fail_on_charge(&self, fail: bool) {
        self.state.write().unwrap().fail_on_charge = fail;
    }

    /// Returns the number of successful charges.
    pub fn charge_count(&self) -> usize {
        self.state.read().unwrap().charges.len()
    }

    /// Returns the number of charge calls, successful or not.
    pub fn attempt_count(&self) -> usize {
        self.state.read().unwrap().attempts
    }

    /// Returns the amount charged under `transaction_id`.
    pub fn charged_amount(&self, transaction_id: &str) -> Option<Money> {
        self.state
            .read()
            .unwrap()
            .charges
            .iter()
            .find(|(id, _)| id == transaction_id)
            .map(|(_, amount)| amount.clone())
    }
}

#[async_trait]
impl PaymentService for InMemoryPaymentService {
    async fn charge(
        &self,
        _ctx: &RequestContext,
        amount: &Money,
        _card: &CreditCardInfo,
    ) -> Result<String, ServiceError> {
        let mut state = self.state.write().unwrap();
        state.attempts += 1;

        if state.fail_on_charge {
            return Err(ServiceError::Rejected("payment declined".to_string()));
        }

        state.next_id += 1;
        let transaction_id = format!("PAY-{:04}", state.next_id);
        state.charges.push((transaction_id.clone(), amount.clone()));

        Ok(transaction_id)
    }
}
