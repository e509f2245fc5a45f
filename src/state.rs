//! Shared router state

use crate::chat::{InMemorySessionStore, SessionStore};
use crate::config::Config;
use crate::notify::Notifiers;
use crate::relay::Relay;
use std::sync::Arc;

/// State handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Live sessions
    pub sessions: Arc<dyn SessionStore>,
    /// Upstream relay
    pub relay: Relay,
}

impl AppState {
    /// Assemble state from explicit parts
    pub fn new(sessions: Arc<dyn SessionStore>, relay: Relay) -> Self {
        Self { sessions, relay }
    }

    /// Build the production state: in-memory sessions, configured relay and
    /// notifiers
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let notifiers = Notifiers::from_config(&config.notify)?;
        let relay = Relay::new(&config.upstream, notifiers)?;
        Ok(Self::new(Arc::new(InMemorySessionStore::new()), relay))
    }
}
