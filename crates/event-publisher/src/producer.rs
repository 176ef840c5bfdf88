//! Asynchronous producer abstraction.
//!
//! A send returns immediately with a [`Delivery`]: two typed channels, one
//! for the broker acknowledgement and one for the broker error. A producer
//! reports on exactly one of them per envelope.

use std::sync::{Arc, RwLock};

use tokio::sync::oneshot;

use crate::envelope::Envelope;
use crate::error::ProducerError;

/// Broker acknowledgement of a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acknowledgement {
    pub partition: i32,
    pub offset: i64,
}

/// Receiving side of a single send.
#[derive(Debug)]
pub struct Delivery {
    pub acknowledged: oneshot::Receiver<Acknowledgement>,
    pub failed: oneshot::Receiver<ProducerError>,
}

/// Reporting side of a single send, held by the producer.
#[derive(Debug)]
pub struct DeliveryReport {
    acknowledged: oneshot::Sender<Acknowledgement>,
    failed: oneshot::Sender<ProducerError>,
}

impl Delivery {
    /// Creates a connected report/delivery pair.
    pub fn channel() -> (DeliveryReport, Delivery) {
        let (ack_tx, ack_rx) = oneshot::channel();
        let (err_tx, err_rx) = oneshot::channel();
        (
            DeliveryReport {
                acknowledged: ack_tx,
                failed: err_tx,
            },
            Delivery {
                acknowledged: ack_rx,
                failed: err_rx,
            },
        )
    }
}

impl DeliveryReport {
    /// Reports a successful delivery. The error channel closes unused.
    pub fn succeed(self, ack: Acknowledgement) {
        // Receiver may have stopped waiting; nothing left to report to.
        let _ = self.acknowledged.send(ack);
    }

    /// Reports a failed delivery. The acknowledgement channel closes unused.
    pub fn fail(self, err: ProducerError) {
        let _ = self.failed.send(err);
    }
}

/// A message producer safe for concurrent use by many requests.
pub trait MessageProducer: Send + Sync + 'static {
    /// Enqueues `envelope` and returns the channels its outcome arrives on.
    fn send(&self, envelope: Envelope) -> Delivery;
}

/// How [`InMemoryProducer`] answers sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InMemoryBehavior {
    /// Acknowledge every message with increasing offsets.
    Acknowledge,
    /// Report every message as failed.
    Fail(String),
    /// Never answer; the delivery channels stay open.
    Hang,
}

#[derive(Debug)]
struct InMemoryProducerState {
    sent: Vec<Envelope>,
    behavior: InMemoryBehavior,
    next_offset: i64,
    // Reports held open for `Hang`.
    pending: Vec<DeliveryReport>,
}

/// In-memory producer for testing.
#[derive(Debug, Clone)]
pub struct InMemoryProducer {
    state: Arc<RwLock<InMemoryProducerState>>,
}

impl Default for InMemoryProducer {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProducer {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryProducerState {
                sent: Vec::new(),
                behavior: InMemoryBehavior::Acknowledge,
                next_offset: 0,
                pending: Vec::new(),
            })),
        }
    }

    pub fn set_behavior(&self, behavior: InMemoryBehavior) {
        self.state.write().unwrap().behavior = behavior;
    }

    /// Number of envelopes received so far.
    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }

    /// Copies of every envelope received so far.
    pub fn sent(&self) -> Vec<Envelope> {
        self.state.read().unwrap().sent.clone()
    }
}

impl MessageProducer for InMemoryProducer {
    fn send(&self, envelope: Envelope) -> Delivery {
        let (report, delivery) = Delivery::channel();
        let mut state = self.state.write().unwrap();
        state.sent.push(envelope);
        match state.behavior.clone() {
            InMemoryBehavior::Acknowledge => {
                let offset = state.next_offset;
                state.next_offset += 1;
                report.succeed(Acknowledgement {
                    partition: 0,
                    offset,
                });
            }
            InMemoryBehavior::Fail(reason) => report.fail(ProducerError::Broker(reason)),
            InMemoryBehavior::Hang => state.pending.push(report),
        }
        delivery
    }
}
