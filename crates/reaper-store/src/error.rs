//! Store-level error taxonomy.

/// Errors produced by artifact store communication.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store rejected request with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid store configuration: {0}")]
    Config(String),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = StoreError::Status {
            status: 403,
            body: "token expired".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("token expired"));
    }

    #[test]
    fn test_config_error_display() {
        let err = StoreError::Config("REAPER_THREADS is not a number".to_string());
        assert!(err.to_string().contains("invalid store configuration"));
    }
}
