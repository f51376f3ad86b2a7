//! axum routes. Each handler opens the caller's session, holds its lock while the
//! controller runs, and turns the resulting [`Transition`] into a response.
//! A session is stored only once a page is rendered for it, and its id is
//! re-issued when the request signed it in.

use axum::{
    Form, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use tracing::debug;

use crate::controller::{CallbackParams, DraftForm, SessionController, Transition};
use crate::render;
use crate::session::{SessionHandle, SessionStore};

pub const SESSION_COOKIE: &str = "draft_studio_session";

#[derive(Clone)]
pub struct AppState {
    controller: Arc<SessionController>,
    sessions: SessionStore,
    public_url: Arc<str>,
    secure_cookies: bool,
}

impl AppState {
    pub fn new(
        controller: Arc<SessionController>,
        sessions: SessionStore,
        public_url: impl Into<String>,
    ) -> Self {
        let public_url: String = public_url.into();
        Self {
            controller,
            sessions,
            secure_cookies: public_url.starts_with("https://"),
            public_url: public_url.into(),
        }
    }

    async fn open(&self, jar: &CookieJar) -> (Option<String>, SessionHandle) {
        let id = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
        self.sessions.open(id.as_deref()).await
    }

    fn session_cookie(&self, id: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, id))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookies)
            .build()
    }

    async fn respond(
        &self,
        jar: CookieJar,
        id: Option<String>,
        handle: &SessionHandle,
        fresh_sign_in: bool,
        transition: Transition,
    ) -> Response {
        match transition {
            Transition::Render(page) => {
                let id = match id {
                    Some(id) if !fresh_sign_in => id,
                    Some(id) => match self.sessions.rotate(&id).await {
                        Some(rotated) => rotated,
                        None => self.sessions.insert(handle.clone()).await,
                    },
                    None => self.sessions.insert(handle.clone()).await,
                };
                let jar = jar.add(self.session_cookie(id));
                (jar, Html(render::page(&page))).into_response()
            }
            Transition::Reset => {
                if let Some(id) = id {
                    self.sessions.discard(&id).await;
                }
                let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
                (jar, Redirect::to(&self.public_url)).into_response()
            }
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/reference", post(preview_reference))
        .route("/generate", post(generate))
        .route("/logout", post(logout))
        .route("/health", get(health))
        .with_state(state)
}

async fn landing(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let (id, handle) = state.open(&jar).await;
    let mut session = handle.lock().await;
    debug!(callback = params.code.is_some(), "GET /");
    let was_signed_in = session.signed_in().is_some();
    let transition = state.controller.landing(&mut session, params).await;
    let fresh_sign_in = !was_signed_in && session.signed_in().is_some();
    state.respond(jar, id, &handle, fresh_sign_in, transition).await
}

async fn preview_reference(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<DraftForm>,
) -> Response {
    let (id, handle) = state.open(&jar).await;
    let mut session = handle.lock().await;
    let transition = state.controller.preview_reference(&mut session, form).await;
    state.respond(jar, id, &handle, false, transition).await
}

async fn generate(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<DraftForm>,
) -> Response {
    let (id, handle) = state.open(&jar).await;
    let mut session = handle.lock().await;
    let transition = state.controller.generate(&mut session, form).await;
    state.respond(jar, id, &handle, false, transition).await
}

async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (id, handle) = state.open(&jar).await;
    let mut session = handle.lock().await;
    let transition = state.controller.sign_out(&mut session);
    state.respond(jar, id, &handle, false, transition).await
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
