#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use draft_writer::GenerationError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use yt_data_client::{ChannelRef, DESCRIPTION_NOT_FOUND, VideoSummary, YouTubeError};
use yt_draft_studio::services::{ChannelQuery, CredentialManager, DraftGenerator, ReferenceLookup};
use yt_draft_studio::{AppState, Services, SessionController, SessionStore, create_router};
use yt_oauth::{AuthorizationRequest, Credentials, OAuthError};

pub const PUBLIC_URL: &str = "https://drafts.example.com/";
pub const GOOD_CODE: &str = "4/good-code";
pub const REFERENCE_ID: &str = "ref123abc";
pub const REFERENCE_DESCRIPTION: &str = "Links:\n- shop\n#cooking";

fn far_future() -> u64 {
    u64::MAX / 2
}

#[derive(Default)]
pub struct FakeAuth {
    pub begun: AtomicUsize,
    pub exchanged: AtomicUsize,
    pub refreshed: AtomicUsize,
    /// Hand out credentials that are already expired
    pub issue_expired: AtomicBool,
    pub fail_refresh: AtomicBool,
}

#[async_trait]
impl CredentialManager for FakeAuth {
    fn begin_authorization(&self) -> AuthorizationRequest {
        let n = self.begun.fetch_add(1, Ordering::SeqCst) + 1;
        AuthorizationRequest {
            url: format!("https://accounts.example.com/o/oauth2/auth?state=state-{}", n),
            state: format!("state-{}", n),
            pkce_verifier: format!("verifier-{}", n),
        }
    }

    async fn complete_authorization(
        &self,
        code: &str,
        _pkce_verifier: &str,
    ) -> Result<Credentials, OAuthError> {
        self.exchanged.fetch_add(1, Ordering::SeqCst);
        if code != GOOD_CODE {
            return Err(OAuthError::Exchange {
                status: 400,
                error: "invalid_grant".to_string(),
                description: Some("Malformed auth code.".to_string()),
            });
        }
        let expires_at = if self.issue_expired.load(Ordering::SeqCst) {
            0
        } else {
            far_future()
        };
        Ok(Credentials {
            access_token: "ya29.first".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            token_type: "Bearer".to_string(),
            expires_at,
            scopes: vec![yt_oauth::YOUTUBE_READONLY_SCOPE.to_string()],
        })
    }

    async fn refresh(&self, credentials: &Credentials) -> Result<Credentials, OAuthError> {
        self.refreshed.fetch_add(1, Ordering::SeqCst);
        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(OAuthError::Exchange {
                status: 400,
                error: "invalid_grant".to_string(),
                description: Some("Token has been expired or revoked.".to_string()),
            });
        }
        Ok(Credentials {
            access_token: "ya29.refreshed".to_string(),
            expires_at: far_future(),
            ..credentials.clone()
        })
    }
}

pub struct FakeChannels {
    pub channel_id: Mutex<String>,
    pub resolved: AtomicUsize,
    pub ranked: AtomicUsize,
    pub fail_statistics: AtomicBool,
    /// Report that the account owns no channel
    pub fail_resolve: AtomicBool,
    /// Access tokens seen by `resolve_own_channel`
    pub tokens: Mutex<Vec<String>>,
}

impl Default for FakeChannels {
    fn default() -> Self {
        Self {
            channel_id: Mutex::new("UC-owner".to_string()),
            resolved: AtomicUsize::new(0),
            ranked: AtomicUsize::new(0),
            fail_statistics: AtomicBool::new(false),
            fail_resolve: AtomicBool::new(false),
            tokens: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChannelQuery for FakeChannels {
    async fn resolve_own_channel(
        &self,
        credentials: &Credentials,
    ) -> Result<ChannelRef, YouTubeError> {
        self.resolved.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .lock()
            .unwrap()
            .push(credentials.access_token.clone());
        if self.fail_resolve.load(Ordering::SeqCst) {
            return Err(YouTubeError::NoChannel);
        }
        Ok(ChannelRef {
            id: self.channel_id.lock().unwrap().clone(),
            title: "Weekend Kitchen".to_string(),
        })
    }

    async fn list_top_items(
        &self,
        channel_id: &str,
        _limit: usize,
    ) -> Result<Vec<VideoSummary>, YouTubeError> {
        self.ranked.fetch_add(1, Ordering::SeqCst);
        if self.fail_statistics.load(Ordering::SeqCst) {
            return Err(YouTubeError::Statistics {
                video_id: "v2".to_string(),
                source: Box::new(YouTubeError::Status {
                    resource: "videos",
                    status: 500,
                    body: "backend error".to_string(),
                }),
            });
        }
        assert_eq!(channel_id, "UC-owner");
        Ok(vec![
            VideoSummary {
                id: "v9".to_string(),
                title: "Best ramen at home".to_string(),
                view_count: 9000,
            },
            VideoSummary {
                id: "v3".to_string(),
                title: "Knife skills 101".to_string(),
                view_count: 300,
            },
        ])
    }
}

#[derive(Default)]
pub struct FakeReferences {
    pub lookups: AtomicUsize,
    pub fail_lookup: AtomicBool,
}

#[async_trait]
impl ReferenceLookup for FakeReferences {
    async fn fetch_description(&self, video_id: &str) -> Result<String, YouTubeError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(YouTubeError::Status {
                resource: "videos",
                status: 503,
                body: "backend unavailable".to_string(),
            });
        }
        if video_id == REFERENCE_ID {
            Ok(REFERENCE_DESCRIPTION.to_string())
        } else {
            Ok(DESCRIPTION_NOT_FOUND.to_string())
        }
    }
}

#[derive(Default)]
pub struct FakeGenerator {
    /// `(transcript, exemplar)` per description call
    pub descriptions: Mutex<Vec<(String, String)>>,
    /// `(description, past titles)` per titles call
    pub titles: Mutex<Vec<(String, Vec<String>)>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl DraftGenerator for FakeGenerator {
    async fn draft_description(
        &self,
        transcript: &str,
        exemplar: &str,
    ) -> Result<String, GenerationError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GenerationError::Status {
                status: 429,
                body: "rate limited".to_string(),
            });
        }
        self.descriptions
            .lock()
            .unwrap()
            .push((transcript.to_string(), exemplar.to_string()));
        Ok(format!("DESCRIPTION FOR {}", transcript))
    }

    async fn draft_titles(
        &self,
        description: &str,
        past_titles: &[String],
    ) -> Result<String, GenerationError> {
        self.titles
            .lock()
            .unwrap()
            .push((description.to_string(), past_titles.to_vec()));
        Ok("1. Ramen night\n2. Noodles from scratch".to_string())
    }
}

pub struct Harness {
    pub app: Router,
    pub auth: Arc<FakeAuth>,
    pub channels: Arc<FakeChannels>,
    pub references: Arc<FakeReferences>,
    pub generator: Arc<FakeGenerator>,
    pub sessions: SessionStore,
}

impl Harness {
    pub fn new() -> Self {
        let auth = Arc::new(FakeAuth::default());
        let channels = Arc::new(FakeChannels::default());
        let references = Arc::new(FakeReferences::default());
        let generator = Arc::new(FakeGenerator::default());

        let services = Services {
            credentials: auth.clone(),
            channels: channels.clone(),
            references: references.clone(),
            generator: generator.clone(),
        };
        let sessions = SessionStore::new(Duration::from_secs(3600));
        let state = AppState::new(
            Arc::new(SessionController::new(services, 10)),
            sessions.clone(),
            PUBLIC_URL,
        );

        Self {
            app: create_router(state),
            auth,
            channels,
            references,
            generator,
            sessions,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.app
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>, form: &str) -> Response<Body> {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.app
            .clone()
            .oneshot(request.body(Body::from(form.to_string())).unwrap())
            .await
            .unwrap()
    }

    /// Walk through sign-in and return the signed-in session cookie (`name=value`)
    pub async fn sign_in(&self) -> String {
        let response = self.get("/", None).await;
        let cookie = session_cookie(&response).expect("sign-in page sets a cookie");
        let n = self.auth.begun.load(Ordering::SeqCst);

        let callback = format!("/?code={}&state=state-{}", GOOD_CODE, n);
        let response = self.get(&callback, Some(&cookie)).await;
        assert_eq!(response.status(), 200);
        session_cookie(&response).expect("callback re-issues the cookie")
    }
}

/// The `name=value` pair of the session cookie set by a response, if any
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(yt_draft_studio::web::SESSION_COOKIE))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}
