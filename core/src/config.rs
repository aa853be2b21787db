use crate::error::{GenieError, Result};

/// Connection and behavior settings, resolved from the environment.
///
/// `DATABRICKS_HOST` and `DATABRICKS_TOKEN` identify the workspace; the
/// remaining variables tune polling, retries, and the local rate limiter.
#[derive(Debug, Clone)]
pub struct GenieConfig {
    /// Workspace URL, e.g. `https://my-workspace.cloud.databricks.com`.
    pub host: String,
    /// Personal access token used as a bearer credential.
    pub token: Option<String>,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_seconds: u64,
    /// Default total wait for one question (submission to terminal state).
    pub timeout_seconds: u64,
    /// Default pause between status polls.
    pub poll_interval_seconds: u64,
    /// Retry budget for transient failures.
    pub max_retries: u32,
    /// Local admission quota: requests per window.
    pub rate_limit_max_requests: usize,
    /// Local admission quota: window length in seconds.
    pub rate_limit_window_seconds: u64,
}

impl Default for GenieConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("DATABRICKS_HOST")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_default(),
            token: std::env::var("DATABRICKS_TOKEN").ok().filter(|s| !s.is_empty()),
            request_timeout_seconds: env_u64("GENIE_REQUEST_TIMEOUT_SECONDS", 60),
            timeout_seconds: env_u64("GENIE_TIMEOUT_SECONDS", 300),
            poll_interval_seconds: env_u64("GENIE_POLL_INTERVAL_SECONDS", 2),
            max_retries: env_u64("GENIE_MAX_RETRIES", 3) as u32,
            rate_limit_max_requests: env_u64("GENIE_RATE_LIMIT_MAX_REQUESTS", 5) as usize,
            rate_limit_window_seconds: env_u64("GENIE_RATE_LIMIT_WINDOW_SECONDS", 60),
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

impl GenieConfig {
    /// Check that the config is usable for authenticated calls.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(GenieError::Validation(
                "DATABRICKS_HOST is not set".to_string(),
            ));
        }
        if self.token.as_deref().unwrap_or("").is_empty() {
            return Err(GenieError::Validation(
                "DATABRICKS_TOKEN is not set".to_string(),
            ));
        }
        if self.timeout_seconds == 0 || self.poll_interval_seconds == 0 {
            return Err(GenieError::Validation(
                "timeout_seconds and poll_interval_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Workspace URL with a scheme and no trailing slash.
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual(host: &str, token: Option<&str>) -> GenieConfig {
        GenieConfig {
            host: host.to_string(),
            token: token.map(|t| t.to_string()),
            request_timeout_seconds: 60,
            timeout_seconds: 300,
            poll_interval_seconds: 2,
            max_retries: 3,
            rate_limit_max_requests: 5,
            rate_limit_window_seconds: 60,
        }
    }

    #[test]
    fn base_url_normalization() {
        assert_eq!(
            manual("https://x.cloud.databricks.com/", Some("t")).base_url(),
            "https://x.cloud.databricks.com"
        );
        assert_eq!(
            manual("x.cloud.databricks.com", Some("t")).base_url(),
            "https://x.cloud.databricks.com"
        );
    }

    #[test]
    fn validate_requires_host_and_token() {
        assert!(manual("", Some("t")).validate().is_err());
        assert!(manual("https://x", None).validate().is_err());
        assert!(manual("https://x", Some("")).validate().is_err());
        assert!(manual("https://x", Some("t")).validate().is_ok());
    }
}
