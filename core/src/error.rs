use thiserror::Error;

/// Error taxonomy for Genie operations.
///
/// `Validation` is raised locally before any network call. `Transient` and
/// `RateLimited` may be retried with backoff; everything else propagates
/// directly to the caller as a structured failure.
#[derive(Error, Debug)]
pub enum GenieError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Genie space not found: {0}")]
    SpaceNotFound(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Operation timed out after {seconds} seconds. The remote query may still complete; consider increasing timeout_seconds.")]
    Timeout { seconds: u64 },

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("Transient network error: {0}")]
    Transient(String),

    #[error("Genie API error: {0}")]
    Api(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GenieError>;

impl GenieError {
    /// Whether a bounded retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, GenieError::Transient(_) | GenieError::RateLimited(_))
    }

    /// Stable kind tag carried in structured failure payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            GenieError::Authentication(_) => "authentication",
            GenieError::SpaceNotFound(_) => "space_not_found",
            GenieError::ResourceNotFound(_) => "resource_not_found",
            GenieError::RateLimited(_) => "rate_limited",
            GenieError::Timeout { .. } => "timeout",
            GenieError::Validation(_) => "validation",
            GenieError::Transient(_) => "transient",
            GenieError::Api(_) => "api",
            GenieError::Serialization(_) => "serialization",
        }
    }
}

/// Translate a remote HTTP failure into the taxonomy.
///
/// Status codes take precedence; the message substrings cover SDK-style
/// errors that arrive without a usable status. `resource` names the thing a
/// 404 refers to (usually a space id).
pub fn translate_remote_error(status: Option<u16>, detail: &str, resource: Option<&str>) -> GenieError {
    match status {
        Some(401) | Some(403) => {
            return GenieError::Authentication(format!(
                "Databricks rejected the credentials: {}",
                detail
            ));
        }
        Some(404) => {
            return match resource {
                Some(id) => GenieError::SpaceNotFound(id.to_string()),
                None => GenieError::ResourceNotFound(detail.to_string()),
            };
        }
        Some(429) => {
            return GenieError::RateLimited(format!(
                "Genie API allows 5 queries per minute in Public Preview. {}",
                detail
            ));
        }
        Some(code) if code >= 500 => {
            return GenieError::Transient(format!("remote returned {}: {}", code, detail));
        }
        _ => {}
    }

    let lower = detail.to_lowercase();
    if lower.contains("authentication") || lower.contains("unauthorized") || lower.contains("401")
    {
        GenieError::Authentication(detail.to_string())
    } else if lower.contains("not found") || lower.contains("404") {
        match resource {
            Some(id) => GenieError::SpaceNotFound(id.to_string()),
            None => GenieError::ResourceNotFound(detail.to_string()),
        }
    } else if lower.contains("rate limit") || lower.contains("429") {
        GenieError::RateLimited(format!(
            "Genie API allows 5 queries per minute in Public Preview. {}",
            detail
        ))
    } else if lower.contains("timeout") || lower.contains("timed out") {
        // Upstream call-level timeouts are retryable; `Timeout` is reserved
        // for the client-side polling give-up.
        GenieError::Transient(detail.to_string())
    } else {
        GenieError::Api(detail.to_string())
    }
}
