//! Application state shared across handlers

use auth::{CredentialStore, ResetTokenService, SessionAuthority};
use std::sync::Arc;

use crate::mailer::Mailer;
use crate::repositories::PostStore;
use crate::settings::Settings;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub credentials: CredentialStore,
    pub sessions: SessionAuthority,
    pub reset_tokens: ResetTokenService,
    pub posts: Arc<dyn PostStore>,
    pub mailer: Arc<dyn Mailer>,
    pub settings: Arc<Settings>,
}
