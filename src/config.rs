use std::env;
use std::time::Duration;

/// Base URL used when no live backend can exist (tests, pre-render
/// embedding). Never dereferenced as a network target: `HttpProbe` reports
/// not-running and `StatsClient` refuses before building a request.
pub const PLACEHOLDER_BASE_URL: &str = "placeholder://api-local";

pub const DEFAULT_BACKEND_PORT: u16 = 5000;
pub const DEFAULT_PING_POLL_SECS: u64 = 10;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2000;

/// Resolved once at startup and injected into the fetch layer and the
/// probe; read-only afterwards.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    base_url: String,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let port = env::var("BACKEND_PORT")
            .ok()
            .and_then(|val| val.parse::<u16>().ok())
            .unwrap_or(DEFAULT_BACKEND_PORT);
        Self {
            base_url: format!("http://localhost:{port}"),
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn placeholder() -> Self {
        Self {
            base_url: PLACEHOLDER_BASE_URL.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_placeholder(&self) -> bool {
        self.base_url == PLACEHOLDER_BASE_URL
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

pub fn ping_interval() -> Duration {
    let secs = env::var("PING_POLL_SECS")
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(DEFAULT_PING_POLL_SECS)
        .max(2);
    Duration::from_secs(secs)
}

pub fn probe_timeout() -> Duration {
    let millis = env::var("PROBE_TIMEOUT_MS")
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(DEFAULT_PROBE_TIMEOUT_MS)
        .clamp(200, 30_000);
    Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_flagged() {
        assert!(ApiConfig::placeholder().is_placeholder());
        assert!(!ApiConfig::with_base_url("http://localhost:5000").is_placeholder());
    }

    #[test]
    fn endpoint_joins_base_and_path() {
        let config = ApiConfig::with_base_url("http://localhost:5000");
        assert_eq!(
            config.endpoint("/api/ping"),
            "http://localhost:5000/api/ping"
        );
    }
}
