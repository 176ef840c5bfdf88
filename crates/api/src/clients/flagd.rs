//! flagd flag backend, evaluated through its OFREP HTTP API.

use async_trait::async_trait;
use common::{FlagError, FlagProvider, RequestContext};
use saga::ServiceError;
use serde::Deserialize;

use super::http::JsonClient;

#[derive(Deserialize)]
struct Evaluation {
    value: serde_json::Value,
}

/// Evaluates flags against a flagd instance.
#[derive(Debug, Clone)]
pub struct FlagdProvider {
    client: JsonClient,
}

impl FlagdProvider {
    pub fn new(client: JsonClient) -> Self {
        Self { client }
    }

    async fn evaluate(
        &self,
        ctx: &RequestContext,
        flag: &str,
    ) -> Result<serde_json::Value, FlagError> {
        let path = ["ofrep", "v1", "evaluate", "flags", flag];
        let body = serde_json::json!({ "context": {} });
        match self.client.post_json::<_, Evaluation>(ctx, &path, &body).await {
            Ok(evaluation) => Ok(evaluation.value),
            Err(ServiceError::Status { status: 404, .. }) => {
                Err(FlagError::NotFound(flag.to_string()))
            }
            Err(ServiceError::InvalidResponse(reason)) => Err(FlagError::Malformed(reason)),
            Err(err) => Err(FlagError::Unavailable(err.to_string())),
        }
    }
}

#[async_trait]
impl FlagProvider for FlagdProvider {
    async fn boolean_value(&self, ctx: &RequestContext, flag: &str) -> Result<bool, FlagError> {
        self.evaluate(ctx, flag)
            .await?
            .as_bool()
            .ok_or_else(|| FlagError::TypeMismatch {
                flag: flag.to_string(),
                expected: "boolean",
            })
    }

    async fn integer_value(&self, ctx: &RequestContext, flag: &str) -> Result<i64, FlagError> {
        self.evaluate(ctx, flag)
            .await?
            .as_i64()
            .ok_or_else(|| FlagError::TypeMismatch {
                flag: flag.to_string(),
                expected: "integer",
            })
    }
}
