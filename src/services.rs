//! The collaborators the session controller drives, behind object-safe traits so the
//! flow can run against real clients or in-process fakes.

use async_trait::async_trait;
use draft_writer::{DraftWriter, GenerationError};
use std::sync::Arc;
use yt_data_client::{ChannelRef, VideoSummary, YouTubeClient, YouTubeError};
use yt_oauth::{AuthorizationRequest, Credentials, OAuthClient, OAuthConfig, OAuthError};

use crate::config::Settings;
use crate::error::ConfigError;

#[async_trait]
pub trait CredentialManager: Send + Sync {
    /// Build a consent URL plus the state and PKCE verifier needed to finish it
    fn begin_authorization(&self) -> AuthorizationRequest;

    async fn complete_authorization(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<Credentials, OAuthError>;

    async fn refresh(&self, credentials: &Credentials) -> Result<Credentials, OAuthError>;
}

#[async_trait]
pub trait ChannelQuery: Send + Sync {
    async fn resolve_own_channel(&self, credentials: &Credentials)
    -> Result<ChannelRef, YouTubeError>;

    async fn list_top_items(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<VideoSummary>, YouTubeError>;
}

#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// Description of a video, or the "not found" sentinel
    async fn fetch_description(&self, video_id: &str) -> Result<String, YouTubeError>;
}

#[async_trait]
pub trait DraftGenerator: Send + Sync {
    async fn draft_description(
        &self,
        transcript: &str,
        exemplar: &str,
    ) -> Result<String, GenerationError>;

    async fn draft_titles(
        &self,
        description: &str,
        past_titles: &[String],
    ) -> Result<String, GenerationError>;
}

#[async_trait]
impl CredentialManager for OAuthClient {
    fn begin_authorization(&self) -> AuthorizationRequest {
        OAuthClient::begin_authorization(self)
    }

    async fn complete_authorization(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<Credentials, OAuthError> {
        OAuthClient::complete_authorization(self, code, pkce_verifier).await
    }

    async fn refresh(&self, credentials: &Credentials) -> Result<Credentials, OAuthError> {
        OAuthClient::refresh(self, credentials).await
    }
}

#[async_trait]
impl ChannelQuery for YouTubeClient {
    async fn resolve_own_channel(
        &self,
        credentials: &Credentials,
    ) -> Result<ChannelRef, YouTubeError> {
        YouTubeClient::resolve_own_channel(self, &credentials.access_token).await
    }

    async fn list_top_items(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<VideoSummary>, YouTubeError> {
        YouTubeClient::list_top_items(self, channel_id, limit).await
    }
}

#[async_trait]
impl ReferenceLookup for YouTubeClient {
    async fn fetch_description(&self, video_id: &str) -> Result<String, YouTubeError> {
        YouTubeClient::fetch_description(self, video_id).await
    }
}

#[async_trait]
impl DraftGenerator for DraftWriter {
    async fn draft_description(
        &self,
        transcript: &str,
        exemplar: &str,
    ) -> Result<String, GenerationError> {
        DraftWriter::draft_description(self, transcript, exemplar).await
    }

    async fn draft_titles(
        &self,
        description: &str,
        past_titles: &[String],
    ) -> Result<String, GenerationError> {
        DraftWriter::draft_titles(self, description, past_titles).await
    }
}

#[derive(Clone)]
pub struct Services {
    pub credentials: Arc<dyn CredentialManager>,
    pub channels: Arc<dyn ChannelQuery>,
    pub references: Arc<dyn ReferenceLookup>,
    pub generator: Arc<dyn DraftGenerator>,
}

impl Services {
    /// Production clients sharing one HTTP connection pool
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()?;

        // Refuses a public URL that is not a registered redirect URI
        let oauth_config =
            OAuthConfig::from_client_secret(settings.client_secret.clone(), &settings.public_url)?;
        let oauth = OAuthClient::with_http_client(oauth_config, http.clone());

        let youtube = Arc::new(YouTubeClient::with_http_client(
            http.clone(),
            &settings.rest_api_address,
            &settings.google_api_key,
        ));

        let writer = DraftWriter::with_http_client(
            http,
            &settings.openai_api_address,
            &settings.openai_api_key,
        )
        .with_model(&settings.openai_model);

        Ok(Self {
            credentials: Arc::new(oauth),
            channels: youtube.clone(),
            references: youtube,
            generator: Arc::new(writer),
        })
    }
}
