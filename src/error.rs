use draft_writer::GenerationError;
use thiserror::Error;
use yt_data_client::YouTubeError;
use yt_oauth::OAuthError;

/// Startup failures: the server refuses to run with these
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {0}: set the environment variable or pass the matching --*-path flag")]
    MissingSecret(&'static str),

    #[error("Failed to read {what} from '{path}': {source}")]
    SecretFile {
        what: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Public URL '{0}' must be an absolute http(s) URL")]
    PublicUrl(String),

    #[error(transparent)]
    OAuth(#[from] OAuthError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Why a step of the signed-in flow failed
#[derive(Debug, Error)]
pub enum FlowError {
    /// Bad or expired code, state mismatch, consent denied, failed refresh
    #[error("Authorization failed: {0}")]
    AuthExchange(#[from] OAuthError),

    #[error("Could not resolve the signed-in channel: {0}")]
    IdentityResolution(#[source] YouTubeError),

    #[error("Signed-in channel changed from '{expected}' to '{actual}'")]
    IdentityChanged { expected: String, actual: String },

    #[error("Could not rank channel uploads: {0}")]
    StatisticsFetch(#[source] YouTubeError),

    #[error("'{0}' is not a YouTube video URL")]
    ReferenceParse(String),

    #[error("Could not fetch the reference description: {0}")]
    ReferenceLookup(#[source] YouTubeError),

    #[error("Draft generation failed: {0}")]
    GenerationService(#[from] GenerationError),

    #[error("No signed-in session")]
    NotAuthenticated,
}

impl FlowError {
    /// Fatal errors end the session; the rest are shown next to the form
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FlowError::ReferenceParse(_))
    }
}
