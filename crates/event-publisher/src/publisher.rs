//! Publication of placed orders onto the message bus.

use std::sync::Arc;
use std::time::Duration;

use common::flags::KAFKA_QUEUE_PROBLEMS;
use common::{ContextError, FeatureFlags, RequestContext};
use domain::{OrderResult, encode_order_result};
use tokio::time::Instant;
use tracing::{Instrument, Span, error, info, warn};

use crate::envelope::Envelope;
use crate::error::ProducerError;
use crate::metrics::PublisherMetrics;
use crate::producer::{Acknowledgement, Delivery, MessageProducer};

/// Default bound on waiting for a delivery report.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Which of the raced events settled a publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Delivered(Acknowledgement),
    Failed(ProducerError),
    Cancelled(ContextError),
}

impl PublishOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, PublishOutcome::Delivered(_))
    }

    fn label(&self) -> &'static str {
        match self {
            PublishOutcome::Delivered(_) => "delivered",
            PublishOutcome::Failed(_) => "failed",
            PublishOutcome::Cancelled(_) => "cancelled",
        }
    }
}

/// Emits `OrderResult` events to a single topic.
///
/// Outcomes are recorded on the publish span, in logs and in metrics; none
/// is returned as an error.
pub struct EventPublisher {
    producer: Arc<dyn MessageProducer>,
    topic: String,
    flags: FeatureFlags,
    metrics: PublisherMetrics,
    delivery_timeout: Duration,
}

impl EventPublisher {
    pub fn new(
        producer: Arc<dyn MessageProducer>,
        topic: impl Into<String>,
        flags: FeatureFlags,
        metrics: PublisherMetrics,
    ) -> Self {
        Self {
            producer,
            topic: topic.into(),
            flags,
            metrics,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    /// Overrides how long a publish waits for its delivery report.
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Publishes `order`, then runs the overload simulation if its flag is set.
    pub async fn publish(&self, ctx: &RequestContext, order: &OrderResult) -> PublishOutcome {
        let span = tracing::info_span!(
            "publish",
            otel.name = %format!("{} publish", self.topic),
            otel.kind = "producer",
            otel.status_code = tracing::field::Empty,
            otel.status_message = tracing::field::Empty,
            peer.service = "kafka",
            messaging.system = "kafka",
            messaging.destination.name = %self.topic,
            messaging.operation.type = "publish",
            messaging.destination.partition.id = tracing::field::Empty,
            messaging.kafka.offset = tracing::field::Empty,
            messaging.kafka.producer.success = tracing::field::Empty,
            messaging.kafka.producer.duration_ms = tracing::field::Empty,
            app.order.id = %order.order_id,
        );

        let payload = match encode_order_result(order) {
            Ok(payload) => payload,
            Err(err) => {
                let outcome = PublishOutcome::Failed(ProducerError::Encode(err.to_string()));
                self.record(&span, &outcome, Duration::ZERO);
                return outcome;
            }
        };
        let envelope = Envelope::builder(&self.topic)
            .key(order.order_id.to_string())
            .payload(payload)
            .trace_context(&ctx.trace().child())
            .build();

        let started = Instant::now();
        let outcome = self
            .send_and_wait(ctx, envelope.clone())
            .instrument(span.clone())
            .await;
        self.record(&span, &outcome, started.elapsed());

        self.overload(ctx, &envelope).instrument(span).await;
        outcome
    }

    async fn send_and_wait(&self, ctx: &RequestContext, envelope: Envelope) -> PublishOutcome {
        let Delivery {
            acknowledged,
            failed,
        } = self.producer.send(envelope);
        let wait = ctx.with_timeout(self.delivery_timeout);

        // A closed channel disables its branch; the context branch always remains.
        tokio::select! {
            biased;
            Ok(ack) = acknowledged => PublishOutcome::Delivered(ack),
            Ok(err) = failed => PublishOutcome::Failed(err),
            err = wait.done() => PublishOutcome::Cancelled(err),
        }
    }

    fn record(&self, span: &Span, outcome: &PublishOutcome, elapsed: Duration) {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        span.record("messaging.kafka.producer.duration_ms", elapsed_ms);
        span.record("messaging.kafka.producer.success", outcome.is_delivered());
        self.metrics.duration_seconds.record(elapsed.as_secs_f64());

        let _guard = span.enter();
        match outcome {
            PublishOutcome::Delivered(ack) => {
                span.record("messaging.destination.partition.id", ack.partition);
                span.record("messaging.kafka.offset", ack.offset);
                span.record("otel.status_code", "OK");
                self.metrics.delivered.increment(1);
                info!(
                    topic = %self.topic,
                    partition = ack.partition,
                    offset = ack.offset,
                    duration_ms = elapsed_ms,
                    "Successful to write message"
                );
            }
            PublishOutcome::Failed(err) => {
                span.record("otel.status_code", "ERROR");
                span.record("otel.status_message", tracing::field::display(err));
                self.metrics.failed.increment(1);
                error!(topic = %self.topic, error = %err, "Failed to write message");
            }
            PublishOutcome::Cancelled(err) => {
                span.record("otel.status_code", "ERROR");
                span.record("otel.status_message", tracing::field::display(err));
                self.metrics.cancelled.increment(1);
                warn!(topic = %self.topic, reason = %err, outcome = outcome.label(), "Publish abandoned");
            }
        }
    }

    async fn overload(&self, ctx: &RequestContext, envelope: &Envelope) {
        let count = self.flags.integer(ctx, KAFKA_QUEUE_PROBLEMS).await;
        if count <= 0 {
            return;
        }

        warn!(count, "kafkaQueueProblems flag is active, overloading queue");
        for _ in 0..count {
            let delivery = self.producer.send(envelope.clone());
            self.metrics.overload_sends.increment(1);
            // Outstanding sends are neither bounded nor drained, and only the
            // acknowledgement channel is awaited.
            tokio::spawn(async move {
                let _ = delivery.acknowledged.await;
            });
        }
        info!(count, "Done with messages for overload simulation");
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("topic", &self.topic)
            .field("delivery_timeout", &self.delivery_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::trace::TRACEPARENT_HEADER;
    use common::{InMemoryFlagProvider, Money, OrderId, TraceContext};
    use domain::{Address, CartItem, OrderItem, decode_order_result};

    use crate::metrics::testing::PublishCounts;
    use crate::producer::{InMemoryBehavior, InMemoryProducer};

    fn order() -> OrderResult {
        OrderResult {
            order_id: OrderId::new(),
            shipping_tracking_id: "TRACK-0001".to_string(),
            shipping_cost: Money::from_cents("USD", 500).unwrap(),
            shipping_address: Address::default(),
            items: vec![OrderItem::new(
                CartItem::new("OLJCESPC7Z", 2),
                Money::from_cents("USD", 1000).unwrap(),
            )],
        }
    }

    fn publisher(
        producer: &InMemoryProducer,
        flags: FeatureFlags,
    ) -> (EventPublisher, PublishCounts) {
        let counts = PublishCounts::default();
        let publisher = EventPublisher::new(
            Arc::new(producer.clone()),
            "orders",
            flags,
            counts.metrics(),
        );
        (publisher, counts)
    }

    #[tokio::test]
    async fn test_delivered_message_carries_order_and_trace() {
        let producer = InMemoryProducer::new();
        let (publisher, counts) = publisher(&producer, FeatureFlags::disabled());
        let trace = TraceContext::root().with_baggage("session.id", "abc");
        let ctx = RequestContext::background().with_trace(trace.clone());
        let order = order();

        let outcome = publisher.publish(&ctx, &order).await;

        assert_eq!(
            outcome,
            PublishOutcome::Delivered(Acknowledgement {
                partition: 0,
                offset: 0
            })
        );
        let sent = producer.sent();
        assert_eq!(sent.len(), 1);
        let envelope = &sent[0];
        assert_eq!(envelope.topic, "orders");
        assert_eq!(envelope.key, Some(order.order_id.to_string()));
        assert_eq!(decode_order_result(&envelope.payload).unwrap(), order);

        let propagated = TraceContext::extract(|key| envelope.header(key)).unwrap();
        assert_eq!(propagated.trace_id(), trace.trace_id());
        assert_ne!(propagated.span_id(), trace.span_id());
        assert_eq!(propagated.baggage().get("session.id").map(String::as_str), Some("abc"));
        assert!(envelope.header(TRACEPARENT_HEADER).is_some());
        assert_eq!(counts.outcomes(), (1, 0, 0));
        assert_eq!(counts.overload_sends(), 0);
    }

    #[tokio::test]
    async fn test_broker_error_is_reported_not_raised() {
        let producer = InMemoryProducer::new();
        producer.set_behavior(InMemoryBehavior::Fail("message too large".to_string()));
        let (publisher, counts) = publisher(&producer, FeatureFlags::disabled());

        let outcome = publisher
            .publish(&RequestContext::background(), &order())
            .await;

        assert_eq!(
            outcome,
            PublishOutcome::Failed(ProducerError::Broker("message too large".to_string()))
        );
        assert_eq!(counts.outcomes(), (0, 1, 0));
    }

    #[tokio::test]
    async fn test_unencodable_order_fails_without_sending() {
        let producer = InMemoryProducer::new();
        let provider = InMemoryFlagProvider::new();
        provider.set_integer(KAFKA_QUEUE_PROBLEMS, 2);
        let (publisher, counts) = publisher(&producer, FeatureFlags::new(Arc::new(provider)));
        let mut order = order();
        order.items[0].item.quantity = CartItem::MAX_QUANTITY + 1;

        let outcome = publisher
            .publish(&RequestContext::background(), &order)
            .await;

        assert!(matches!(
            outcome,
            PublishOutcome::Failed(ProducerError::Encode(_))
        ));
        assert_eq!(producer.sent_count(), 0);
        assert_eq!(counts.outcomes(), (0, 1, 0));
        assert_eq!(counts.overload_sends(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_context_settles_pending_publish() {
        let producer = InMemoryProducer::new();
        producer.set_behavior(InMemoryBehavior::Hang);
        let (publisher, counts) = publisher(&producer, FeatureFlags::disabled());
        let (ctx, handle) = RequestContext::with_cancel(TraceContext::root());
        handle.cancel();

        let outcome = publisher.publish(&ctx, &order()).await;

        assert_eq!(outcome, PublishOutcome::Cancelled(ContextError::Cancelled));
        assert_eq!(producer.sent_count(), 1);
        assert_eq!(counts.outcomes(), (0, 0, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_caller_deadline_settles_pending_publish() {
        let producer = InMemoryProducer::new();
        producer.set_behavior(InMemoryBehavior::Hang);
        let (publisher, counts) = publisher(&producer, FeatureFlags::disabled());
        let ctx = RequestContext::background().with_timeout(Duration::from_millis(200));

        let outcome = publisher.publish(&ctx, &order()).await;

        assert_eq!(
            outcome,
            PublishOutcome::Cancelled(ContextError::DeadlineExceeded)
        );
        assert_eq!(counts.outcomes(), (0, 0, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_timeout_bounds_wait_without_caller_deadline() {
        let producer = InMemoryProducer::new();
        producer.set_behavior(InMemoryBehavior::Hang);
        let (publisher, counts) = publisher(&producer, FeatureFlags::disabled());
        let publisher = publisher.with_delivery_timeout(Duration::from_secs(1));

        let started = Instant::now();
        let outcome = publisher
            .publish(&RequestContext::background(), &order())
            .await;

        assert_eq!(
            outcome,
            PublishOutcome::Cancelled(ContextError::DeadlineExceeded)
        );
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(counts.outcomes(), (0, 0, 1));
    }

    #[tokio::test]
    async fn test_overload_flag_initiates_extra_sends() {
        let producer = InMemoryProducer::new();
        let flags = InMemoryFlagProvider::new();
        flags.set_integer(KAFKA_QUEUE_PROBLEMS, 3);
        let (publisher, counts) = publisher(&producer, FeatureFlags::new(Arc::new(flags)));
        let order = order();

        let outcome = publisher
            .publish(&RequestContext::background(), &order)
            .await;

        assert!(outcome.is_delivered());
        let sent = producer.sent();
        assert_eq!(sent.len(), 4);
        assert!(sent.iter().all(|envelope| *envelope == sent[0]));
        assert_eq!(counts.outcomes(), (1, 0, 0));
        assert_eq!(counts.overload_sends(), 3);
    }

    #[tokio::test]
    async fn test_overload_runs_after_failed_publish() {
        let producer = InMemoryProducer::new();
        producer.set_behavior(InMemoryBehavior::Fail("broker down".to_string()));
        let flags = InMemoryFlagProvider::new();
        flags.set_integer(KAFKA_QUEUE_PROBLEMS, 2);
        let (publisher, counts) = publisher(&producer, FeatureFlags::new(Arc::new(flags)));

        publisher
            .publish(&RequestContext::background(), &order())
            .await;

        assert_eq!(producer.sent_count(), 3);
        assert_eq!(counts.outcomes(), (0, 1, 0));
        assert_eq!(counts.overload_sends(), 2);
    }

    #[tokio::test]
    async fn test_non_positive_overload_flag_sends_once() {
        let producer = InMemoryProducer::new();
        let flags = InMemoryFlagProvider::new();
        flags.set_integer(KAFKA_QUEUE_PROBLEMS, -4);
        let (publisher, counts) = publisher(&producer, FeatureFlags::new(Arc::new(flags)));

        publisher
            .publish(&RequestContext::background(), &order())
            .await;

        assert_eq!(producer.sent_count(), 1);
        assert_eq!(counts.overload_sends(), 0);
    }
}
