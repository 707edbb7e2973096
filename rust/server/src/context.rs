use crate::events::EventBus;
use crate::session::SessionManager;
use crate::settings::{AppSettings, SettingsError, SettingsStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Shared components handed to whatever transport fronts the sessions.
#[derive(Debug, Clone)]
pub struct AppContext {
    settings: Arc<SettingsStore>,
    event_bus: EventBus,
    sessions: Arc<SessionManager>,
}

impl AppContext {
    pub fn new(settings: AppSettings) -> Result<Self, SettingsError> {
        let store = Arc::new(SettingsStore::with_settings(settings)?);
        Ok(Self::with_store(store))
    }

    pub fn new_for_tests() -> Self {
        let settings = AppSettings {
            bot_delay_min_ms: 1,
            bot_delay_max_ms: 5,
            ..AppSettings::default()
        };
        Self::new(settings).expect("test context")
    }

    fn with_store(store: Arc<SettingsStore>) -> Self {
        let event_bus = EventBus::new();
        let sessions = Arc::new(SessionManager::with_store(
            event_bus.clone(),
            Arc::clone(&store),
        ));
        Self {
            settings: store,
            event_bus,
            sessions,
        }
    }

    pub fn settings(&self) -> Arc<SettingsStore> {
        Arc::clone(&self.settings)
    }

    pub fn event_bus(&self) -> EventBus {
        self.event_bus.clone()
    }

    pub fn sessions(&self) -> Arc<SessionManager> {
        Arc::clone(&self.sessions)
    }

    /// Sweeps idle sessions every `every` until the handle is aborted.
    pub fn spawn_janitor(&self, every: Duration) -> JoinHandle<()> {
        let sessions = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let expired = sessions.cleanup_expired_sessions();
                if !expired.is_empty() {
                    tracing::info!(count = expired.len(), "expired sessions swept");
                }
            }
        })
    }
}
