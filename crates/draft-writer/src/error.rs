use thiserror::Error;

/// Errors raised by the text-generation service
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Generation service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Generation service returned no choices")]
    EmptyResponse,
}
