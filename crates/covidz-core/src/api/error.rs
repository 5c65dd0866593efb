use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Source unavailable at {url}: {source}")]
    SourceUnavailable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Source rejected request ({status}): {body}")]
    SourceRejected {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Invalid response from {url}: {detail}")]
    InvalidResponse { url: String, detail: String },
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
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

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        ApiError::SourceRejected {
            status,
            body: Self::truncate_body(body),
        }
    }

    /// True when the remote endpoint could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ApiError::SourceUnavailable { .. })
    }
}
