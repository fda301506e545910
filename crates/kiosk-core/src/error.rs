use thiserror::Error;

/// Uniform error type for every storage backend.
///
/// Only a human-readable message travels with each variant; the kiosk shows
/// it in a toast and stays on the current screen.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl StoreError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Map a non-success proxy response onto the taxonomy.
    ///
    /// `message` is the `error` field of the response envelope when the body
    /// carried one, otherwise the raw body.
    pub fn from_status(status: reqwest::StatusCode, message: &str) -> Self {
        let truncated = Self::truncate_body(message);
        match status.as_u16() {
            400 | 422 => StoreError::Validation(truncated),
            404 => StoreError::NotFound(truncated),
            _ => StoreError::Network(format!("Status {}: {}", status, truncated)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Network(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert_eq!(
            StoreError::from_status(StatusCode::BAD_REQUEST, "Group ID is required"),
            StoreError::Validation("Group ID is required".to_string())
        );
        assert!(StoreError::from_status(StatusCode::NOT_FOUND, "Group not found").is_not_found());
        assert!(matches!(
            StoreError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            StoreError::Network(msg) if msg.contains("boom") && msg.contains("500")
        ));
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let truncated = StoreError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(truncated.ends_with(&format!("({} total bytes)", long.len())));

        assert_eq!(StoreError::truncate_body("short"), "short");
    }
}
