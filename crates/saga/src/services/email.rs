//! Email service trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{OrderId, RequestContext};
use domain::OrderResult;

use crate::error::ServiceError;

/// Trait for order confirmation emails.
#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send_order_confirmation(
        &self,
        ctx: &RequestContext,
        email: &str,
        order: &OrderResult,
    ) -> Result<(), ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryEmailState {
    sent: Vec<(String, OrderId)>,
    attempts: usize,
    fail_on_send: bool,
}

/// In-memory email service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEmailService {
    state: Arc<RwLock<InMemoryEmailState>>,
}

impl InMemoryEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail every send.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    /// Recipients and order IDs of every confirmation sent.
    pub fn sent(&self) -> Vec<(String, OrderId)> {
        self.state.read().unwrap().sent.clone()
    }

    /// Returns the number of send calls, successful or not.
    pub fn attempt_count(&self) -> usize {
        self.state.read().unwrap().attempts
    }
}

#[async_trait]
impl EmailService for InMemoryEmailService {
    async fn send_order_confirmation(
        &self,
        _ctx: &RequestContext,
        email: &str,
        order: &OrderResult,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.write().unwrap();
        state.attempts += 1;

        if state.fail_on_send {
            return Err(ServiceError::Status {
                status: 500,
                message: "mailer down".to_string(),
            });
        }
        state.sent.push((email.to_string(), order.order_id));
        Ok(())
    }
}
