//! Identity provider abstraction.

use async_trait::async_trait;
use campus_feed_models::Viewer;
use serde::{Deserialize, Serialize};

/// Where the auth provider is in resolving the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "viewer", rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated(Viewer),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn session(&self) -> SessionState;

    /// The signed-in viewer, if resolution has finished with one.
    async fn current_viewer(&self) -> Option<Viewer> {
        match self.session().await {
            SessionState::Authenticated(viewer) => Some(viewer),
            SessionState::Unauthenticated | SessionState::Authenticating => None,
        }
    }
}
