use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Unauthorized - catalog rejected the request")]
    Unauthorized,

    #[error("Catalog not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl CatalogError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let cut: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
            format!("{}... (truncated, {} total bytes)", cut, body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 | 403 => CatalogError::Unauthorized,
            404 => CatalogError::NotFound(truncated),
            429 => CatalogError::RateLimited,
            500..=599 => CatalogError::ServerError(truncated),
            _ => CatalogError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}
