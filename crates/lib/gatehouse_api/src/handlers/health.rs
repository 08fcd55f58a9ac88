//! Liveness endpoint.

/// `GET /v1/health`: always `OK` while the process serves requests.
pub async fn health_check() -> &'static str {
    "OK"
}
