use thiserror::Error;

/// Errors raised while obtaining or refreshing OAuth credentials
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The client-secret document could not be parsed
    #[error("Invalid client secret document: {0}")]
    ClientSecret(String),

    /// The configured redirect URI is not registered for this client
    #[error("Redirect URI '{redirect_uri}' is not registered for this OAuth client")]
    RedirectUriNotRegistered { redirect_uri: String },

    /// The token endpoint rejected the request (bad/expired code, redirect mismatch, revoked token)
    #[error(
        "Token endpoint rejected the request (status {status}): {error}{}",
        detail(.description)
    )]
    Exchange {
        status: u16,
        error: String,
        description: Option<String>,
    },

    /// A required field was absent from the token response
    #[error("Missing {0} in token response")]
    MissingField(&'static str),

    /// Credentials cannot be refreshed because no refresh token was granted
    #[error("No refresh token available")]
    NoRefreshToken,

    /// The anti-forgery state returned by the callback did not match
    #[error("OAuth state mismatch")]
    StateMismatch,

    /// The user declined consent or the authorization server reported an error
    #[error("Authorization denied: {0}")]
    Denied(String),

    /// The loopback flow gave up waiting for the browser
    #[error("OAuth authorization timeout ({0} seconds)")]
    Timeout(u64),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn detail(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(" - {}", d))
        .unwrap_or_default()
}
