//! Order event publication.
//!
//! Placed orders are encoded, wrapped in an [`Envelope`] carrying the
//! caller's trace context, and handed to a [`MessageProducer`]. The
//! [`EventPublisher`] races the delivery report against the caller's
//! context and records whichever settles first.

pub mod envelope;
pub mod error;
pub mod kafka;
pub mod metrics;
pub mod producer;
pub mod publisher;

pub use envelope::{Envelope, EnvelopeBuilder};
pub use error::{ProducerError, Result};
pub use kafka::KafkaProducer;
pub use metrics::PublisherMetrics;
pub use producer::{
    Acknowledgement, Delivery, DeliveryReport, InMemoryBehavior, InMemoryProducer,
    MessageProducer,
};
pub use publisher::{DEFAULT_DELIVERY_TIMEOUT, EventPublisher, PublishOutcome};
