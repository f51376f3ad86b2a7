use serde::Deserialize;

use crate::OAuthError;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client registration, as downloaded from the Google Cloud console
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
    /// Redirect URIs registered for this client (may be empty for installed apps)
    pub redirect_uris: Vec<String>,
}

#[derive(Deserialize)]
struct Document {
    web: Option<Registration>,
    installed: Option<Registration>,
}

#[derive(Deserialize)]
struct Registration {
    client_id: String,
    client_secret: String,
    auth_uri: Option<String>,
    token_uri: Option<String>,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

impl ClientSecret {
    /// Parse a `client_secret.json` document (either the `web` or `installed` flavour)
    pub fn from_json(content: &str) -> Result<Self, OAuthError> {
        let document: Document = serde_json::from_str(content)
            .map_err(|e| OAuthError::ClientSecret(e.to_string()))?;

        let registration = document.web.or(document.installed).ok_or_else(|| {
            OAuthError::ClientSecret("expected a 'web' or 'installed' section".to_string())
        })?;

        if registration.client_id.trim().is_empty() {
            return Err(OAuthError::ClientSecret("client_id is empty".to_string()));
        }

        Ok(Self {
            client_id: registration.client_id,
            client_secret: registration.client_secret,
            auth_uri: registration
                .auth_uri
                .unwrap_or_else(|| DEFAULT_AUTH_URI.to_string()),
            token_uri: registration
                .token_uri
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            redirect_uris: registration.redirect_uris,
        })
    }

    /// Whether `redirect_uri` exactly matches a registered redirect URI.
    /// Clients with no registered URIs accept anything.
    pub fn is_registered_redirect(&self, redirect_uri: &str) -> bool {
        self.redirect_uris.is_empty() || self.redirect_uris.iter().any(|r| r == redirect_uri)
    }
}
