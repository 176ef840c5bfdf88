use metrics::{Counter, Histogram};

/// Publisher instruments, registered once and shared by every publish.
#[derive(Clone)]
pub struct PublisherMetrics {
    pub delivered: Counter,
    pub failed: Counter,
    pub cancelled: Counter,
    pub duration_seconds: Histogram,
    pub overload_sends: Counter,
}

impl PublisherMetrics {
    /// Registers the instruments with the installed global recorder.
    pub fn register() -> Self {
        Self {
            delivered: metrics::counter!("checkout_kafka_publish_total", "outcome" => "delivered"),
            failed: metrics::counter!("checkout_kafka_publish_total", "outcome" => "failed"),
            cancelled: metrics::counter!("checkout_kafka_publish_total", "outcome" => "cancelled"),
            duration_seconds: metrics::histogram!("checkout_kafka_publish_duration_seconds"),
            overload_sends: metrics::counter!("checkout_kafka_overload_sends_total"),
        }
    }

    /// Instruments that record nothing.
    pub fn noop() -> Self {
        Self {
            delivered: Counter::noop(),
            failed: Counter::noop(),
            cancelled: Counter::noop(),
            duration_seconds: Histogram::noop(),
            overload_sends: Counter::noop(),
        }
    }
}

impl std::fmt::Debug for PublisherMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublisherMetrics").finish_non_exhaustive()
    }
}

/// Atomic-backed instruments whose values tests can read back.
#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    use metrics::{Counter, Histogram};

    use super::PublisherMetrics;

    #[derive(Default)]
    pub(crate) struct PublishCounts {
        delivered: Arc<AtomicU64>,
        failed: Arc<AtomicU64>,
        cancelled: Arc<AtomicU64>,
        overload_sends: Arc<AtomicU64>,
    }

    impl PublishCounts {
        pub(crate) fn metrics(&self) -> PublisherMetrics {
            PublisherMetrics {
                delivered: Counter::from_arc(self.delivered.clone()),
                failed: Counter::from_arc(self.failed.clone()),
                cancelled: Counter::from_arc(self.cancelled.clone()),
                duration_seconds: Histogram::noop(),
                overload_sends: Counter::from_arc(self.overload_sends.clone()),
            }
        }

        /// Delivered, failed and cancelled publishes, in that order.
        pub(crate) fn outcomes(&self) -> (u64, u64, u64) {
            (
                self.delivered.load(Ordering::Relaxed),
                self.failed.load(Ordering::Relaxed),
                self.cancelled.load(Ordering::Relaxed),
            )
        }

        pub(crate) fn overload_sends(&self) -> u64 {
            self.overload_sends.load(Ordering::Relaxed)
        }
    }
}
