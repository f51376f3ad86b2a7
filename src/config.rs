use clap::Parser;
use std::time::Duration;
use yt_oauth::ClientSecret;

use crate::error::ConfigError;

/// YouTube Draft Studio - drafts descriptions and titles from a transcript
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDRESS", default_value = "127.0.0.1:8501")]
    pub bind: String,

    /// Canonical root URL of this app; also the OAuth redirect URI
    #[arg(long, env = "PUBLIC_URL")]
    pub public_url: String,

    /// YouTube Data API address
    #[arg(long, env = "REST_API_ADDRESS", default_value = yt_data_client::DEFAULT_REST_API_ADDRESS)]
    pub rest_api_address: String,

    /// Chat-completions API address
    #[arg(
        long,
        env = "OPENAI_API_ADDRESS",
        default_value = draft_writer::DEFAULT_OPENAI_API_ADDRESS
    )]
    pub openai_api_address: String,

    /// Model used for both drafting calls
    #[arg(long, env = "OPENAI_MODEL", default_value = draft_writer::DEFAULT_MODEL)]
    pub openai_model: String,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Path to file containing the OpenAI API key
    #[arg(long)]
    pub openai_api_key_path: Option<String>,

    /// Google API key for read-only Data API queries
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub google_api_key: Option<String>,

    /// Path to file containing the Google API key
    #[arg(long)]
    pub google_api_key_path: Option<String>,

    /// OAuth client secret document (JSON content)
    #[arg(long, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Path to the OAuth client_secret.json file
    #[arg(long)]
    pub client_secret_path: Option<String>,

    /// Number of recent uploads ranked for title inspiration
    #[arg(long, default_value_t = yt_data_client::DEFAULT_TOP_LIMIT)]
    pub top_limit: usize,

    /// Idle time in seconds after which a session is forgotten
    #[arg(long, default_value_t = 3600)]
    pub session_idle_secs: u64,

    /// Timeout in seconds for each outgoing HTTP request
    #[arg(long, default_value_t = 120)]
    pub request_timeout_secs: u64,
}

/// Resolve a secret from a file (preferred) or an inline value
pub fn read_secret(
    inline: Option<&str>,
    path: Option<&str>,
    what: &'static str,
) -> Result<String, ConfigError> {
    let value = match path {
        Some(path) => {
            tracing::info!("Reading {} from: {}", what, path);
            std::fs::read_to_string(path).map_err(|source| ConfigError::SecretFile {
                what,
                path: path.to_string(),
                source,
            })?
        }
        None => inline.ok_or(ConfigError::MissingSecret(what))?.to_string(),
    };

    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ConfigError::MissingSecret(what));
    }
    Ok(value)
}

/// Validated runtime configuration. Contains secrets, so no `Debug`.
#[derive(Clone)]
pub struct Settings {
    pub bind: String,
    pub public_url: String,
    pub rest_api_address: String,
    pub openai_api_address: String,
    pub openai_model: String,
    pub openai_api_key: String,
    pub google_api_key: String,
    pub client_secret: ClientSecret,
    pub top_limit: usize,
    pub session_idle: Duration,
    pub request_timeout: Duration,
}

impl Settings {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let public_url = args.public_url.trim().to_string();
        if !(public_url.starts_with("https://") || public_url.starts_with("http://")) {
            return Err(ConfigError::PublicUrl(public_url));
        }

        let openai_api_key = read_secret(
            args.openai_api_key.as_deref(),
            args.openai_api_key_path.as_deref(),
            "OpenAI API key",
        )?;
        let google_api_key = read_secret(
            args.google_api_key.as_deref(),
            args.google_api_key_path.as_deref(),
            "Google API key",
        )?;
        let client_secret = ClientSecret::from_json(&read_secret(
            args.client_secret.as_deref(),
            args.client_secret_path.as_deref(),
            "OAuth client secret",
        )?)?;

        Ok(Self {
            bind: args.bind,
            public_url,
            rest_api_address: args.rest_api_address,
            openai_api_address: args.openai_api_address,
            openai_model: args.openai_model,
            openai_api_key,
            google_api_key,
            client_secret,
            top_limit: args.top_limit,
            session_idle: Duration::from_secs(args.session_idle_secs),
            request_timeout: Duration::from_secs(args.request_timeout_secs),
        })
    }
}
