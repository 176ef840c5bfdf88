use std::sync::Arc;

use common::RequestContext;
use domain::OrderResult;
use tracing::{info, warn};

use crate::services::EmailService;

/// Best-effort order confirmation.
#[derive(Clone)]
pub struct NotificationSender {
    email: Arc<dyn EmailService>,
}

impl NotificationSender {
    pub fn new(email: Arc<dyn EmailService>) -> Self {
        Self { email }
    }

    /// Sends the confirmation for `order` to `email`. Failures are logged and dropped.
    pub async fn notify(&self, ctx: &RequestContext, email: &str, order: &OrderResult) {
        match ctx
            .run(self.email.send_order_confirmation(ctx, email, order))
            .await
        {
            Ok(()) => info!(email, app.order.id = %order.order_id, "order confirmation email sent"),
            Err(err) => warn!(
                email,
                app.order.id = %order.order_id,
                error = %err,
                "failed to send order confirmation"
            ),
        }
    }
}
