//! Fixed identity provider for tests and command-line use.

use async_trait::async_trait;
use campus_feed_models::Viewer;
use campus_feed_traits::{IdentityProvider, SessionState};
use parking_lot::RwLock;

/// Identity whose session is set explicitly.
pub struct StaticIdentity {
    session: RwLock<SessionState>,
}

impl StaticIdentity {
    pub fn signed_in(viewer: Viewer) -> Self {
        Self {
            session: RwLock::new(SessionState::Authenticated(viewer)),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            session: RwLock::new(SessionState::Unauthenticated),
        }
    }

    pub fn set(&self, session: SessionState) {
        *self.session.write() = session;
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn session(&self) -> SessionState {
        self.session.read().clone()
    }
}
