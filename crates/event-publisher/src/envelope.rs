//! Outbound message envelope.

use common::TraceContext;

/// A message ready to hand to a producer.
///
/// Headers are ordered key/value pairs; trace propagation headers are
/// added with [`EnvelopeBuilder::trace_context`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub topic: String,
    pub key: Option<String>,
    pub payload: Vec<u8>,
    pub headers: Vec<(String, String)>,
}

impl Envelope {
    /// Creates a new envelope builder for `topic`.
    pub fn builder(topic: impl Into<String>) -> EnvelopeBuilder {
        EnvelopeBuilder {
            topic: topic.into(),
            key: None,
            payload: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// Returns the first header value stored under `key`.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Builder for constructing envelopes.
#[derive(Debug)]
pub struct EnvelopeBuilder {
    topic: String,
    key: Option<String>,
    payload: Vec<u8>,
    headers: Vec<(String, String)>,
}

impl EnvelopeBuilder {
    /// Sets the partitioning key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the message value.
    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    /// Adds a single header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Adds the propagation headers of `trace`.
    pub fn trace_context(mut self, trace: &TraceContext) -> Self {
        self.headers.extend(
            trace
                .headers()
                .into_iter()
                .map(|(key, value)| (key.to_string(), value)),
        );
        self
    }

    pub fn build(self) -> Envelope {
        Envelope {
            topic: self.topic,
            key: self.key,
            payload: self.payload,
            headers: self.headers,
        }
    }
}
