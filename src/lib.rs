//! YouTube Draft Studio: sign in with YouTube, paste a transcript, get a drafted
//! description and a list of title ideas in the style of your channel.

pub mod config;
pub mod controller;
pub mod error;
pub mod render;
pub mod services;
pub mod session;
pub mod telemetry;
pub mod web;

pub use config::{Args, Settings};
pub use controller::{SessionController, Transition};
pub use error::{ConfigError, FlowError};
pub use services::Services;
pub use session::{Session, SessionStore};
pub use web::{AppState, create_router};

use std::sync::Arc;

/// Wire the production clients from `settings` into a ready-to-serve router
pub fn build_router(settings: &Settings) -> Result<axum::Router, ConfigError> {
    let services = Services::from_settings(settings)?;
    let controller = SessionController::new(services, settings.top_limit);
    let state = AppState::new(
        Arc::new(controller),
        SessionStore::new(settings.session_idle),
        settings.public_url.clone(),
    );
    Ok(create_router(state))
}
