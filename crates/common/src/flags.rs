//! Feature flag oracle.
//!
//! Flags are evaluated per call against a [`FlagProvider`]. Any provider
//! failure is logged and replaced by the flag's default (`false` / `0`),
//! so callers never see an error from flag evaluation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use crate::context::RequestContext;

/// Boolean flag: route payment charges to an unreachable endpoint.
pub const PAYMENT_SERVICE_UNREACHABLE: &str = "paymentServiceUnreachable";

/// Integer flag: number of extra sends used to overload the message producer.
pub const KAFKA_QUEUE_PROBLEMS: &str = "kafkaQueueProblems";

/// Errors a flag backend can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    #[error("flag not found: {0}")]
    NotFound(String),

    #[error("flag {flag} is not of type {expected}")]
    TypeMismatch { flag: String, expected: &'static str },

    #[error("flag backend unavailable: {0}")]
    Unavailable(String),

    #[error("malformed flag response: {0}")]
    Malformed(String),
}

/// A backend that evaluates flags and may fail.
#[async_trait]
pub trait FlagProvider: Send + Sync {
    async fn boolean_value(&self, ctx: &RequestContext, flag: &str) -> Result<bool, FlagError>;

    async fn integer_value(&self, ctx: &RequestContext, flag: &str) -> Result<i64, FlagError>;
}

/// Best-effort flag lookups with defaults on failure.
#[derive(Clone, Default)]
pub struct FeatureFlags {
    provider: Option<Arc<dyn FlagProvider>>,
}

impl FeatureFlags {
    pub fn new(provider: Arc<dyn FlagProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Flags with no backend: every lookup returns its default.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Evaluates a boolean flag, returning `false` on any failure.
    pub async fn boolean(&self, ctx: &RequestContext, flag: &str) -> bool {
        let Some(provider) = &self.provider else {
            return false;
        };
        match provider.boolean_value(ctx, flag).await {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(flag, error = %err, "flag evaluation failed, using default");
                false
            }
        }
    }

    /// Evaluates an integer flag, returning `0` on any failure.
    pub async fn integer(&self, ctx: &RequestContext, flag: &str) -> i64 {
        let Some(provider) = &self.provider else {
            return 0;
        };
        match provider.integer_value(ctx, flag).await {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(flag, error = %err, "flag evaluation failed, using default");
                0
            }
        }
    }
}

impl std::fmt::Debug for FeatureFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureFlags")
            .field("enabled", &self.provider.is_some())
            .finish()
    }
}

/// A flag value held by [`InMemoryFlagProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagValue {
    Boolean(bool),
    Integer(i64),
}

#[derive(Debug, Default)]
struct InMemoryFlagState {
    flags: HashMap<String, FlagValue>,
    unavailable: bool,
    evaluations: usize,
}

/// In-memory flag backend for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFlagProvider {
    state: Arc<RwLock<InMemoryFlagState>>,
}

impl InMemoryFlagProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_boolean(&self, flag: &str, value: bool) {
        self.state
            .write()
            .unwrap()
            .flags
            .insert(flag.to_string(), FlagValue::Boolean(value));
    }

    pub fn set_integer(&self, flag: &str, value: i64) {
        self.state
            .write()
            .unwrap()
            .flags
            .insert(flag.to_string(), FlagValue::Integer(value));
    }

    /// Makes every evaluation fail as if the backend were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }

    /// Number of evaluations served or failed so far.
    pub fn evaluation_count(&self) -> usize {
        self.state.read().unwrap().evaluations
    }

    fn lookup(&self, flag: &str) -> Result<FlagValue, FlagError> {
        let mut state = self.state.write().unwrap();
        state.evaluations += 1;
        if state.unavailable {
            return Err(FlagError::Unavailable("flag backend offline".to_string()));
        }
        state
            .flags
            .get(flag)
            .copied()
            .ok_or_else(|| FlagError::NotFound(flag.to_string()))
    }
}

#[async_trait]
impl FlagProvider for InMemoryFlagProvider {
    async fn boolean_value(&self, _ctx: &RequestContext, flag: &str) -> Result<bool, FlagError> {
        match self.lookup(flag)? {
            FlagValue::Boolean(value) => Ok(value),
            FlagValue::Integer(_) => Err(FlagError::TypeMismatch {
                flag: flag.to_string(),
                expected: "boolean",
            }),
        }
    }

    async fn integer_value(&self, _ctx: &RequestContext, flag: &str) -> Result<i64, FlagError> {
        match self.lookup(flag)? {
            FlagValue::Integer(value) => Ok(value),
            FlagValue::Boolean(_) => Err(FlagError::TypeMismatch {
                flag: flag.to_string(),
                expected: "integer",
            }),
        }
    }
}
