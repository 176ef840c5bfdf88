//! Health check endpoint.

use axum::Json;
use serde::Serialize;

/// Serving status reported to health checkers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Serving,
    NotServing,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
}

/// GET /health: always serving while the process is up.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthStatus::Serving,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Serving).unwrap(),
            "\"SERVING\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::NotServing).unwrap(),
            "\"NOT_SERVING\""
        );
    }
}
