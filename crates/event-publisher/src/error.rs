use thiserror::Error;

/// Errors reported by a message producer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProducerError {
    /// The broker (or the client library on its behalf) rejected the message.
    #[error("broker error: {0}")]
    Broker(String),

    /// The message could not be enqueued locally.
    #[error("enqueue failed: {0}")]
    Enqueue(String),

    /// The payload could not be encoded, so nothing was sent.
    #[error("encode failed: {0}")]
    Encode(String),

    /// The producer could not be created.
    #[error("producer configuration error: {0}")]
    Configuration(String),
}

/// Result type for producer operations.
pub type Result<T> = std::result::Result<T, ProducerError>;
