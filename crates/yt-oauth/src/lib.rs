mod client_secret;
mod error;
mod loopback;

pub use client_secret::ClientSecret;
pub use error::OAuthError;
pub use loopback::{LOOPBACK_TIMEOUT_SECS, complete_on_listener, start_loopback_flow};

use serde::Deserialize;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Default OAuth callback port for the loopback flow
pub const OAUTH_CALLBACK_PORT: u16 = 8080;

/// Read-only access to the signed-in user's YouTube account
pub const YOUTUBE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/youtube.readonly";

/// Tokens are treated as expired this many seconds before their real expiry
const EXPIRY_MARGIN_SECS: u64 = 60;

/// Absolute expiry for a token endpoint's `expires_in`
fn expires_at(expires_in: Option<u64>) -> Result<u64, OAuthError> {
    let expires_in = expires_in.ok_or(OAuthError::MissingField("expires_in"))?;
    Ok(now_secs().saturating_add(expires_in))
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// OAuth 2.0 credentials for one signed-in user
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access token for API requests
    pub access_token: String,
    /// Refresh token for getting new access tokens (absent if the server did not grant one)
    pub refresh_token: Option<String>,
    /// Token type (usually "Bearer")
    pub token_type: String,
    /// Expiry time as Unix timestamp (seconds since epoch)
    pub expires_at: u64,
    /// Scopes granted by the user
    pub scopes: Vec<String>,
}

impl Credentials {
    /// Check if the token is expired or will expire within a minute
    pub fn is_expired(&self) -> bool {
        now_secs() + EXPIRY_MARGIN_SECS >= self.expires_at
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// OAuth configuration
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Authorization endpoint
    pub auth_uri: String,
    /// Token endpoint
    pub token_uri: String,
    /// Redirect URI for OAuth callback
    pub redirect_uri: String,
    /// OAuth scope(s)
    pub scope: String,
}

impl OAuthConfig {
    /// Build a configuration for a web client.
    ///
    /// The redirect URI must exactly match one registered for the client; Google rejects
    /// the exchange otherwise, so a mismatch is refused here instead of at sign-in time.
    pub fn from_client_secret(
        secret: ClientSecret,
        redirect_uri: impl Into<String>,
    ) -> Result<Self, OAuthError> {
        let redirect_uri = redirect_uri.into();
        if !secret.is_registered_redirect(&redirect_uri) {
            return Err(OAuthError::RedirectUriNotRegistered { redirect_uri });
        }
        Ok(Self::unchecked(secret, redirect_uri))
    }

    /// Build a configuration for the loopback flow of an installed client
    pub fn loopback(secret: ClientSecret, port: u16) -> Self {
        Self::unchecked(secret, format!("http://localhost:{}/oauth2callback", port))
    }

    fn unchecked(secret: ClientSecret, redirect_uri: String) -> Self {
        Self {
            client_id: secret.client_id,
            client_secret: secret.client_secret,
            auth_uri: secret.auth_uri,
            token_uri: secret.token_uri,
            redirect_uri,
            scope: YOUTUBE_READONLY_SCOPE.to_string(),
        }
    }
}

/// A pending authorization: the URL to send the user to, plus what is needed to finish it
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    /// Opaque anti-forgery token echoed back on the callback
    pub state: String,
    /// PKCE verifier to present when exchanging the code
    pub pkce_verifier: String,
}

fn random_alphanumeric(len: usize) -> String {
    use rand::Rng;
    use rand::distributions::Alphanumeric;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generate PKCE verifier and challenge
pub fn generate_pkce() -> (String, String) {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use sha2::{Digest, Sha256};

    // 43-128 characters are allowed
    let verifier = random_alphanumeric(64);

    // challenge = base64url(SHA256(verifier))
    let hash = Sha256::digest(verifier.as_bytes());
    let challenge = URL_SAFE_NO_PAD.encode(hash);

    (verifier, challenge)
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<u64>,
    scope: Option<String>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

/// Talks to the authorization server for one registered client
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    pub fn with_http_client(config: OAuthConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// Build the consent URL. Nothing is sent anywhere.
    pub fn begin_authorization(&self) -> AuthorizationRequest {
        let (pkce_verifier, challenge) = generate_pkce();
        let state = random_alphanumeric(32);

        let separator = if self.config.auth_uri.contains('?') {
            '&'
        } else {
            '?'
        };
        let url = format!(
            "{}{}\
            client_id={}&\
            redirect_uri={}&\
            response_type=code&\
            scope={}&\
            state={}&\
            code_challenge={}&\
            code_challenge_method=S256&\
            access_type=offline&\
            prompt=consent",
            self.config.auth_uri,
            separator,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(&self.config.scope),
            urlencoding::encode(&state),
            urlencoding::encode(&challenge),
        );

        AuthorizationRequest {
            url,
            state,
            pkce_verifier,
        }
    }

    /// Exchange a one-time authorization code for credentials
    pub async fn complete_authorization(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<Credentials, OAuthError> {
        info!("Exchanging authorization code for tokens");

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("code_verifier", pkce_verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let token = self.post_token(&params).await?;

        let credentials = Credentials {
            access_token: token
                .access_token
                .ok_or(OAuthError::MissingField("access_token"))?,
            refresh_token: token.refresh_token,
            token_type: token.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_at: expires_at(token.expires_in)?,
            scopes: token
                .scope
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_else(|| vec![self.config.scope.clone()]),
        };

        info!(scopes = ?credentials.scopes, "Obtained OAuth tokens");
        Ok(credentials)
    }

    /// Refresh the access token, keeping the refresh token and scopes when the
    /// server does not send new ones
    pub async fn refresh(&self, current: &Credentials) -> Result<Credentials, OAuthError> {
        let refresh_token = current
            .refresh_token
            .as_deref()
            .ok_or(OAuthError::NoRefreshToken)?;

        info!("Refreshing OAuth token");

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let token = self.post_token(&params).await?;

        let refreshed = Credentials {
            access_token: token
                .access_token
                .ok_or(OAuthError::MissingField("access_token"))?,
            refresh_token: token.refresh_token.or_else(|| current.refresh_token.clone()),
            token_type: token.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_at: expires_at(token.expires_in)?,
            scopes: token
                .scope
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_else(|| current.scopes.clone()),
        };

        info!("OAuth token refreshed successfully");
        Ok(refreshed)
    }

    async fn post_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse, OAuthError> {
        let response = self
            .http
            .post(&self.config.token_uri)
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            debug!(status = status.as_u16(), "Token endpoint returned an error");
            let (error, description) = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(parsed) => (parsed.error, parsed.error_description),
                Err(_) => (body, None),
            };
            return Err(OAuthError::Exchange {
                status: status.as_u16(),
                error,
                description,
            });
        }

        Ok(response.json().await?)
    }
}
