//! Service health reporting.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone)]
pub struct HealthChecker {
    started_at: DateTime<Utc>,
    gateway_base_url: String,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: i64,
    pub gateway_configured: bool,
    pub timestamp: String,
}

impl HealthChecker {
    pub fn new(gateway_base_url: impl Into<String>) -> Self {
        Self {
            started_at: Utc::now(),
            gateway_base_url: gateway_base_url.into(),
        }
    }

    pub fn status(&self) -> HealthStatus {
        let now = Utc::now();
        HealthStatus {
            status: "healthy",
            version: env!("CARGO_PKG_VERSION"),
            uptime_secs: (now - self.started_at).num_seconds(),
            gateway_configured: !self.gateway_base_url.is_empty(),
            timestamp: now.to_rfc3339(),
        }
    }
}

pub async fn health(State(checker): State<HealthChecker>) -> Json<HealthStatus> {
    Json(checker.status())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_reports_gateway_configuration() {
        let checker = HealthChecker::new("https://api.example-gateway.com");
        let status = checker.status();
        assert_eq!(status.status, "healthy");
        assert!(status.gateway_configured);
        assert!(status.uptime_secs >= 0);

        let unconfigured = HealthChecker::new("");
        assert!(!unconfigured.status().gateway_configured);
    }
}
