use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Request timeout: {0}")]
    RequestTimeout(String),
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Compression error: {0}")]
    CompressionError(#[from] std::io::Error),
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
    #[error("Store not ready after {attempts} attempts: {last_error}")]
    Unavailable { attempts: u32, last_error: String },
    #[error("Operation cancelled")]
    Cancelled,
}

impl StoreError {
    /// Whether repeating the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::RequestTimeout(_) | StoreError::NetworkError(_) => true,
            StoreError::HttpError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::RequestTimeout("bulk".to_string()).is_transient());
        assert!(
            StoreError::HttpError {
                status: 503,
                message: String::new()
            }
            .is_transient()
        );
        assert!(
            StoreError::HttpError {
                status: 429,
                message: String::new()
            }
            .is_transient()
        );
        assert!(
            !StoreError::HttpError {
                status: 400,
                message: String::new()
            }
            .is_transient()
        );
        assert!(!StoreError::Cancelled.is_transient());
    }
}
