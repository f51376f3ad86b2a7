//! The session state machine.
//!
//! `Unauthenticated -> AwaitingCallback -> Authenticated -> Generating -> Authenticated`.
//! Each step returns `Result<Page, FlowError>`; a fatal error becomes the single
//! terminal [`Transition::Reset`], which sends the browser back to the root URL with
//! a fresh session.

use draft_writer::compact_transcript;
use serde::Deserialize;
use tracing::{info, warn};
use yt_data_client::extract_video_id;

use crate::error::FlowError;
use crate::services::Services;
use crate::session::{ReferencePreview, Session, SignedIn};

/// Query parameters of the root URL, which doubles as the OAuth callback
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// The drafting form
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DraftForm {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub reference_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drafts {
    pub description: String,
    pub titles: String,
}

/// What the signed-in page shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub channel_title: String,
    pub transcript: String,
    pub reference_url: String,
    pub reference_description: Option<String>,
    pub warning: Option<String>,
    pub drafts: Option<Drafts>,
}

impl Workspace {
    fn new(signed_in: &SignedIn, form: &DraftForm) -> Self {
        Self {
            channel_title: signed_in.channel.title.clone(),
            transcript: form.transcript.clone(),
            reference_url: form.reference_url.clone(),
            reference_description: None,
            warning: None,
            drafts: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    SignIn { auth_url: String },
    Workspace(Workspace),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Render(Page),
    /// Forget the session and redirect to the canonical root
    Reset,
}

pub struct SessionController {
    services: Services,
    top_limit: usize,
}

impl SessionController {
    pub fn new(services: Services, top_limit: usize) -> Self {
        Self {
            services,
            top_limit,
        }
    }

    /// `GET /`: sign-in link, OAuth callback, or the signed-in workspace
    pub async fn landing(&self, session: &mut Session, params: CallbackParams) -> Transition {
        let result = self.landing_step(session, params).await;
        settle(session, result)
    }

    /// `POST /reference`: look up the reference video before the full submission
    pub async fn preview_reference(&self, session: &mut Session, form: DraftForm) -> Transition {
        let result = self.preview_step(session, form).await;
        settle(session, result)
    }

    /// `POST /generate`: rank uploads, then draft the description, then the titles
    pub async fn generate(&self, session: &mut Session, form: DraftForm) -> Transition {
        let result = self.generate_step(session, form).await;
        settle(session, result)
    }

    /// `POST /logout`
    pub fn sign_out(&self, session: &mut Session) -> Transition {
        info!("User signed out");
        session.invalidate();
        Transition::Reset
    }

    async fn landing_step(
        &self,
        session: &mut Session,
        params: CallbackParams,
    ) -> Result<Page, FlowError> {
        if let Some(error) = params.error {
            return Err(yt_oauth::OAuthError::Denied(error).into());
        }

        if session.signed_in().is_none() {
            if let Some(code) = params.code {
                return self.complete_sign_in(session, &code, params.state).await;
            }

            let request = self.services.credentials.begin_authorization();
            session.await_callback(&request);
            return Ok(Page::SignIn {
                auth_url: request.url,
            });
        }

        // A reload of the callback URL lands here too; the code is already spent.
        let signed_in = session
            .signed_in_mut()
            .ok_or(FlowError::NotAuthenticated)?;
        self.confirm_identity(signed_in).await?;

        let mut workspace = Workspace::new(signed_in, &DraftForm::default());
        if let Some(reference) = &signed_in.reference {
            workspace.reference_url = reference.url.clone();
            workspace.reference_description = Some(reference.description.clone());
        }
        Ok(Page::Workspace(workspace))
    }

    async fn complete_sign_in(
        &self,
        session: &mut Session,
        code: &str,
        returned_state: Option<String>,
    ) -> Result<Page, FlowError> {
        let (expected_state, verifier) = session
            .take_pending()
            .ok_or(yt_oauth::OAuthError::StateMismatch)?;
        if returned_state.as_deref() != Some(expected_state.as_str()) {
            return Err(yt_oauth::OAuthError::StateMismatch.into());
        }

        let credentials = self
            .services
            .credentials
            .complete_authorization(code, &verifier)
            .await?;
        let channel = self
            .services
            .channels
            .resolve_own_channel(&credentials)
            .await
            .map_err(FlowError::IdentityResolution)?;

        info!(channel_id = %channel.id, "Signed in");
        session.sign_in(credentials, channel);

        let signed_in = session
            .signed_in()
            .ok_or(FlowError::NotAuthenticated)?;
        Ok(Page::Workspace(Workspace::new(
            signed_in,
            &DraftForm::default(),
        )))
    }

    async fn refresh_if_expired(&self, signed_in: &mut SignedIn) -> Result<(), FlowError> {
        if signed_in.credentials.is_expired() {
            signed_in.credentials = self
                .services
                .credentials
                .refresh(&signed_in.credentials)
                .await?;
        }
        Ok(())
    }

    /// Re-check the channel behind the session's credentials; it must not change
    async fn confirm_identity(&self, signed_in: &mut SignedIn) -> Result<(), FlowError> {
        self.refresh_if_expired(signed_in).await?;

        let channel = self
            .services
            .channels
            .resolve_own_channel(&signed_in.credentials)
            .await
            .map_err(FlowError::IdentityResolution)?;

        if channel.id != signed_in.channel.id {
            return Err(FlowError::IdentityChanged {
                expected: signed_in.channel.id.clone(),
                actual: channel.id,
            });
        }
        Ok(())
    }

    /// Resolve the reference URL of a form. `None` when no URL was given.
    async fn lookup_reference(
        &self,
        url: &str,
        cached: Option<&ReferencePreview>,
    ) -> Result<Option<ReferencePreview>, FlowError> {
        let url = url.trim();
        if url.is_empty() {
            return Ok(None);
        }
        if let Some(cached) = cached.filter(|c| c.url == url) {
            return Ok(Some(cached.clone()));
        }

        let video_id =
            extract_video_id(url).ok_or_else(|| FlowError::ReferenceParse(url.to_string()))?;

        let description = self
            .services
            .references
            .fetch_description(&video_id)
            .await
            .map_err(FlowError::ReferenceLookup)?;

        Ok(Some(ReferencePreview {
            url: url.to_string(),
            description,
        }))
    }

    /// Record a lookup in the session and on the page, and return the exemplar text.
    /// Recoverable errors become a warning; the rest propagate.
    fn apply_reference(
        signed_in: &mut SignedIn,
        workspace: &mut Workspace,
        lookup: Result<Option<ReferencePreview>, FlowError>,
    ) -> Result<String, FlowError> {
        match lookup {
            Ok(Some(preview)) => {
                let description = preview.description.clone();
                workspace.reference_description = Some(description.clone());
                signed_in.reference = Some(preview);
                Ok(description)
            }
            Ok(None) => {
                signed_in.reference = None;
                Ok(String::new())
            }
            Err(err) if !err.is_fatal() => {
                warn!(error = %err, "Ignoring reference URL");
                signed_in.reference = None;
                workspace.warning = Some(err.to_string());
                Ok(String::new())
            }
            Err(err) => Err(err),
        }
    }

    async fn preview_step(
        &self,
        session: &mut Session,
        form: DraftForm,
    ) -> Result<Page, FlowError> {
        let signed_in = session
            .signed_in_mut()
            .ok_or(FlowError::NotAuthenticated)?;
        let mut workspace = Workspace::new(signed_in, &form);

        let lookup = self
            .lookup_reference(&form.reference_url, signed_in.reference.as_ref())
            .await;
        Self::apply_reference(signed_in, &mut workspace, lookup)?;

        Ok(Page::Workspace(workspace))
    }

    async fn generate_step(
        &self,
        session: &mut Session,
        form: DraftForm,
    ) -> Result<Page, FlowError> {
        let signed_in = session
            .signed_in_mut()
            .ok_or(FlowError::NotAuthenticated)?;
        self.refresh_if_expired(signed_in).await?;

        let mut workspace = Workspace::new(signed_in, &form);
        let lookup = self
            .lookup_reference(&form.reference_url, signed_in.reference.as_ref())
            .await;
        let exemplar = Self::apply_reference(signed_in, &mut workspace, lookup)?;

        let top = self
            .services
            .channels
            .list_top_items(&signed_in.channel.id, self.top_limit)
            .await
            .map_err(FlowError::StatisticsFetch)?;
        let past_titles: Vec<String> = top.into_iter().map(|v| v.title).collect();

        let transcript = compact_transcript(&form.transcript);
        let description = self
            .services
            .generator
            .draft_description(&transcript, &exemplar)
            .await?;
        // Titles are drafted from the fresh description, not the raw transcript
        let titles = self
            .services
            .generator
            .draft_titles(&description, &past_titles)
            .await?;

        info!(channel_id = %signed_in.channel.id, "Drafts generated");
        workspace.drafts = Some(Drafts {
            description,
            titles,
        });
        Ok(Page::Workspace(workspace))
    }
}

/// The one place a step's error turns into the terminal transition
fn settle(session: &mut Session, result: Result<Page, FlowError>) -> Transition {
    match result {
        Ok(page) => Transition::Render(page),
        Err(err) => {
            warn!(error = %err, "Resetting session");
            session.invalidate();
            Transition::Reset
        }
    }
}
