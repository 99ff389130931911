use std::sync::Arc;

use crate::app::Result;
use crate::bluesky::BlueskyClient;
use crate::domain::{Credentials, Session};
use crate::store::{Ledger, SESSION_KEY};

#[derive(Debug, Clone)]
enum SessionState {
    /// Nothing loaded from the ledger yet.
    Unloaded,
    /// Validated during this process; reused without I/O.
    Active(Session),
    /// Known but not trusted: must be refreshed before use.
    Expired(Session),
}

/// Owns the posting-service session for the lifetime of a run.
pub struct SessionManager {
    client: BlueskyClient,
    ledger: Arc<dyn Ledger + Send + Sync>,
    credentials: Credentials,
    state: SessionState,
}

impl SessionManager {
    pub fn new(
        client: BlueskyClient,
        ledger: Arc<dyn Ledger + Send + Sync>,
        credentials: Credentials,
    ) -> Self {
        Self {
            client,
            ledger,
            credentials,
            state: SessionState::Unloaded,
        }
    }

    /// Return a usable session, refreshing the cached one or logging in.
    ///
    /// Once a session is active, later calls return it without any I/O.
    pub async fn ensure_session(&mut self) -> Result<Session> {
        if let SessionState::Active(session) = &self.state {
            return Ok(session.clone());
        }

        if let SessionState::Unloaded = self.state {
            if let Some(cached) = self.load_cached()? {
                self.state = SessionState::Expired(cached);
            }
        }

        let session = match std::mem::replace(&mut self.state, SessionState::Unloaded) {
            SessionState::Expired(stale) => {
                match self.client.refresh_session(&stale.refresh_jwt).await {
                    Ok(session) => {
                        tracing::info!(handle = %session.handle, "Refreshed session");
                        session
                    }
                    Err(e) => {
                        tracing::warn!("Session refresh failed, logging in again: {}", e);
                        self.login().await?
                    }
                }
            }
            _ => self.login().await?,
        };

        self.persist(&session)?;
        self.state = SessionState::Active(session.clone());

        Ok(session)
    }

    async fn login(&self) -> Result<Session> {
        let session = self.client.create_session(&self.credentials).await?;
        tracing::info!(handle = %session.handle, "Logged in");
        Ok(session)
    }

    fn load_cached(&self) -> Result<Option<Session>> {
        let Some(bytes) = self.ledger.get(SESSION_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_slice(&bytes) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable cached session: {}", e);
                Ok(None)
            }
        }
    }

    fn persist(&self, session: &Session) -> Result<()> {
        let encoded = serde_json::to_vec(session)?;
        self.ledger.set(SESSION_KEY, &encoded)
    }
}
