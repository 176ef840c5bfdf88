//! Kafka-backed [`MessageProducer`].
//!
//! Uses a threaded producer: librdkafka is polled on a background thread and
//! each delivery callback reports into the send's [`DeliveryReport`].

use std::time::Duration;

use rdkafka::ClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::message::{Header, Message, OwnedHeaders};
use rdkafka::producer::{BaseRecord, DeliveryResult, Producer, ProducerContext, ThreadedProducer};
use tracing::{debug, info, warn};

use crate::envelope::Envelope;
use crate::error::{ProducerError, Result};
use crate::producer::{Acknowledgement, Delivery, DeliveryReport, MessageProducer};

/// Client context routing delivery callbacks to per-send channels.
pub struct DeliveryContext;

impl ClientContext for DeliveryContext {}

impl ProducerContext for DeliveryContext {
    type DeliveryOpaque = Box<DeliveryReport>;

    fn delivery(&self, result: &DeliveryResult<'_>, report: Self::DeliveryOpaque) {
        match result {
            Ok(message) => report.succeed(Acknowledgement {
                partition: message.partition(),
                offset: message.offset(),
            }),
            Err((err, _)) => report.fail(ProducerError::Broker(err.to_string())),
        }
    }
}

/// Producer writing envelopes to a Kafka cluster.
pub struct KafkaProducer {
    inner: ThreadedProducer<DeliveryContext>,
}

impl KafkaProducer {
    /// Creates a producer for the given bootstrap servers.
    pub fn connect(brokers: &str) -> Result<Self> {
        let inner: ThreadedProducer<DeliveryContext> = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create_with_context(DeliveryContext)
            .map_err(|e| ProducerError::Configuration(e.to_string()))?;

        info!(brokers = %brokers, "Kafka producer created");
        Ok(Self { inner })
    }

    /// Waits for outstanding messages to be delivered.
    pub fn flush(&self, timeout: Duration) {
        match self.inner.flush(timeout) {
            Ok(()) => debug!("Kafka producer flushed"),
            Err(e) => warn!(error = %e, "Kafka producer flush incomplete"),
        }
    }
}

impl MessageProducer for KafkaProducer {
    fn send(&self, envelope: Envelope) -> Delivery {
        let (report, delivery) = Delivery::channel();

        let mut headers = OwnedHeaders::new_with_capacity(envelope.headers.len());
        for (key, value) in &envelope.headers {
            headers = headers.insert(Header {
                key: key.as_str(),
                value: Some(value.as_str()),
            });
        }

        let mut record = BaseRecord::with_opaque_to(&envelope.topic, Box::new(report))
            .payload(&envelope.payload)
            .headers(headers);
        if let Some(key) = &envelope.key {
            record = record.key(key);
        }

        if let Err((err, record)) = self.inner.send(record) {
            record
                .delivery_opaque
                .fail(ProducerError::Enqueue(err.to_string()));
        }

        delivery
    }
}
