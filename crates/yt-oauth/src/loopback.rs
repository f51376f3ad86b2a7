use axum::{
    Router,
    extract::Query,
    response::{Html, IntoResponse},
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{AuthorizationRequest, Credentials, OAuthClient, OAuthError};

/// How long the loopback flow waits for the browser to come back
pub const LOOPBACK_TIMEOUT_SECS: u64 = 300;

#[derive(Deserialize)]
struct AuthCallback {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

type CallbackResult = Result<(String, String), String>;

/// Run the authorization flow for a command-line user: print the consent URL,
/// catch the redirect on a local listener and exchange the code
pub async fn start_loopback_flow(
    client: &OAuthClient,
    port: u16,
) -> Result<Credentials, OAuthError> {
    let request = client.begin_authorization();

    eprintln!("\n=================================================");
    eprintln!("OAuth 2.0 Authorization Required");
    eprintln!("=================================================");
    eprintln!("\nPlease visit the following URL to authorize the application:\n");
    eprintln!("{}\n", request.url);
    eprintln!("Waiting for authorization...");
    eprintln!("=================================================\n");

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    complete_on_listener(client, &request, listener).await
}

/// Wait on `listener` for the `/oauth2callback` redirect that answers `request`,
/// then exchange its code
pub async fn complete_on_listener(
    client: &OAuthClient,
    request: &AuthorizationRequest,
    listener: tokio::net::TcpListener,
) -> Result<Credentials, OAuthError> {
    // Shared state for callback
    let received = Arc::new(Mutex::new(None::<CallbackResult>));
    let received_clone = received.clone();

    let callback_handler = move |Query(params): Query<AuthCallback>| async move {
        if let Some(error) = params.error {
            *received_clone.lock().await = Some(Err(error.clone()));
            return Html(format!(
                "<html><body><h1>Authorization Failed</h1><p>Error: {}</p>\
                <p>You can close this window.</p></body></html>",
                html_escape::encode_text(&error)
            ))
            .into_response();
        }

        if let Some(code) = params.code {
            *received_clone.lock().await = Some(Ok((code, params.state.unwrap_or_default())));
            return Html(
                "<html><body><h1>Authorization Successful!</h1>\
                <p>You can close this window and return to the application.</p></body></html>",
            )
            .into_response();
        }

        Html("<html><body><h1>Authorization Failed</h1><p>No code received</p></body></html>")
            .into_response()
    };

    let app = Router::new().route("/oauth2callback", get(callback_handler));

    let server = axum::serve(listener, app);

    let server_handle = tokio::spawn(async move {
        server.await.ok();
    });

    let timeout = tokio::time::Duration::from_secs(LOOPBACK_TIMEOUT_SECS);
    let start = tokio::time::Instant::now();

    let outcome = loop {
        if start.elapsed() > timeout {
            server_handle.abort();
            return Err(OAuthError::Timeout(LOOPBACK_TIMEOUT_SECS));
        }

        if let Some(outcome) = received.lock().await.take() {
            break outcome;
        }

        tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
    };

    server_handle.abort();

    let (code, state) = outcome.map_err(OAuthError::Denied)?;
    if state != request.state {
        warn!("Loopback callback carried an unexpected state");
        return Err(OAuthError::StateMismatch);
    }

    info!("Authorization code received on loopback listener");
    client
        .complete_authorization(&code, &request.pkce_verifier)
        .await
}
