use crate::errors::{ErrorSeverity, IntoErrorResponse};
use crate::events::{EventBus, GameEvent};
use crate::orchestrator::TurnOrchestrator;
use crate::settings::{AppSettings, SettingsStore};
use chrono::Utc;
use nothanks_ai::create_policy;
use nothanks_ai::params::Difficulty;
use nothanks_engine::errors::GameError;
use nothanks_engine::game::{GameSession, TurnOutcome};
use nothanks_engine::player::PlayerId;
use nothanks_engine::settings::{GameSettings, SettingsPatch};
use nothanks_engine::snapshot::PublicSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

pub type SessionId = String;

const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Identifiers handed back to a joining human.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinTicket {
    pub session_id: SessionId,
    pub player_id: PlayerId,
}

/// Registry of live sessions, keyed by id.
///
/// Server settings are read from the shared [`SettingsStore`] whenever they
/// are needed: policy and bot delays when a session opens, the default tier
/// when a bot is seated, and the idle TTL on every lookup.
#[derive(Debug)]
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, TurnOrchestrator>>,
    event_bus: EventBus,
    settings: Arc<SettingsStore>,
    ttl_override: Option<Duration>,
}

impl SessionManager {
    pub fn new(event_bus: EventBus) -> Self {
        Self::with_store(event_bus, Arc::new(SettingsStore::new()))
    }

    /// Default settings, but sessions expire after `ttl` regardless of the store.
    pub fn with_ttl(event_bus: EventBus, ttl: Duration) -> Self {
        Self {
            ttl_override: Some(ttl),
            ..Self::new(event_bus)
        }
    }

    pub fn with_store(event_bus: EventBus, settings: Arc<SettingsStore>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            event_bus,
            settings,
            ttl_override: None,
        }
    }

    fn current_settings(&self) -> Result<AppSettings, SessionError> {
        self.settings
            .get()
            .map_err(|_| SessionError::StoragePoisoned)
    }

    fn session_ttl(&self) -> Duration {
        self.ttl_override.unwrap_or_else(|| {
            self.settings
                .get()
                .map(|s| s.session_ttl())
                .unwrap_or(DEFAULT_SESSION_TTL)
        })
    }

    /// Seats a human. Without a session id, or with one that is not
    /// registered, a new session is opened under that id.
    pub fn join(
        &self,
        session_id: Option<&SessionId>,
        name: &str,
    ) -> Result<JoinTicket, SessionError> {
        let player_id = Uuid::new_v4().to_string();
        let session_id = session_id
            .cloned()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let (orchestrator, created) = match self.get(&session_id) {
            Ok(existing) => (existing, false),
            Err(SessionError::NotFound(_)) => (self.create(&session_id)?, true),
            Err(err) => return Err(err),
        };

        if let Err(err) = orchestrator.join(&player_id, name) {
            if created {
                self.remove_session(&session_id)?;
            }
            return Err(err.into());
        }

        tracing::info!(
            session_id = %session_id,
            player_id = %player_id,
            created,
            "player joined"
        );
        Ok(JoinTicket {
            session_id,
            player_id,
        })
    }

    /// Unseats a player. The session closes once no humans remain.
    pub fn leave(&self, session_id: &SessionId, player_id: &str) -> Result<(), SessionError> {
        let orchestrator = self.get(session_id)?;
        orchestrator.leave(player_id)?;
        if orchestrator.human_count() == 0 {
            self.close(session_id, "empty")?;
        }
        Ok(())
    }

    pub fn start(
        &self,
        session_id: &SessionId,
        requester: &str,
        patch: Option<&SettingsPatch>,
    ) -> Result<(), SessionError> {
        Ok(self.get(session_id)?.start(requester, patch)?)
    }

    pub fn pass(&self, session_id: &SessionId, player_id: &str) -> Result<TurnOutcome, SessionError> {
        Ok(self.get(session_id)?.pass(player_id)?)
    }

    pub fn take(&self, session_id: &SessionId, player_id: &str) -> Result<TurnOutcome, SessionError> {
        Ok(self.get(session_id)?.take(player_id)?)
    }

    pub fn update_settings(
        &self,
        session_id: &SessionId,
        requester: &str,
        patch: &SettingsPatch,
    ) -> Result<GameSettings, SessionError> {
        Ok(self.get(session_id)?.update_settings(requester, patch)?)
    }

    pub fn transfer_host(
        &self,
        session_id: &SessionId,
        requester: &str,
        target: &str,
    ) -> Result<(), SessionError> {
        Ok(self.get(session_id)?.transfer_host(requester, target)?)
    }

    /// Seats a bot at `difficulty`, or the configured default tier.
    pub fn add_bot(
        &self,
        session_id: &SessionId,
        requester: &str,
        difficulty: Option<Difficulty>,
    ) -> Result<PlayerId, SessionError> {
        let difficulty = match difficulty {
            Some(difficulty) => difficulty,
            None => self.current_settings()?.default_bot_difficulty,
        };
        Ok(self.get(session_id)?.add_bot(requester, difficulty)?)
    }

    pub fn remove_bot(
        &self,
        session_id: &SessionId,
        requester: &str,
        bot_id: &str,
    ) -> Result<(), SessionError> {
        Ok(self.get(session_id)?.remove_bot(requester, bot_id)?)
    }

    /// Public snapshot, redacted for `viewer` when one is given.
    pub fn snapshot(
        &self,
        session_id: &SessionId,
        viewer: Option<&str>,
    ) -> Result<PublicSnapshot, SessionError> {
        let snapshot = self.get(session_id)?.snapshot();
        Ok(match viewer {
            Some(viewer) => snapshot.redacted_for(viewer),
            None => snapshot,
        })
    }

    /// Looks up a session, closing it first if it sat idle past the TTL.
    pub fn get(&self, session_id: &SessionId) -> Result<TurnOrchestrator, SessionError> {
        let orchestrator = {
            let guard = self
                .sessions
                .read()
                .map_err(|_| SessionError::StoragePoisoned)?;
            guard
                .get(session_id)
                .cloned()
                .ok_or_else(|| SessionError::NotFound(session_id.clone()))?
        };
        if orchestrator.is_idle(self.session_ttl()) {
            self.close(session_id, "expired due to inactivity")?;
            return Err(SessionError::Expired(session_id.clone()));
        }
        Ok(orchestrator)
    }

    pub fn delete_session(&self, session_id: &SessionId) -> Result<(), SessionError> {
        if self.close(session_id, "terminated_by_request")? {
            Ok(())
        } else {
            Err(SessionError::NotFound(session_id.clone()))
        }
    }

    /// Closes every session idle past the TTL and returns their ids.
    pub fn cleanup_expired_sessions(&self) -> Vec<SessionId> {
        let mut expired = Vec::new();
        {
            let mut guard = match self.sessions.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let ttl = self.session_ttl();
            guard.retain(|id, orchestrator| {
                if orchestrator.is_idle(ttl) {
                    orchestrator.shutdown();
                    expired.push(id.clone());
                    false
                } else {
                    true
                }
            });
        }

        for id in &expired {
            self.announce_closed(id, "expired");
        }
        expired
    }

    pub fn active_sessions(&self) -> Vec<SessionId> {
        match self.sessions.read() {
            Ok(guard) => guard.keys().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn event_bus(&self) -> EventBus {
        self.event_bus.clone()
    }

    fn create(&self, session_id: &SessionId) -> Result<TurnOrchestrator, SessionError> {
        let settings = self.current_settings()?;
        let mut guard = self
            .sessions
            .write()
            .map_err(|_| SessionError::StoragePoisoned)?;
        // another caller may have opened it since the lookup
        if let Some(existing) = guard.get(session_id) {
            return Ok(existing.clone());
        }
        let orchestrator = TurnOrchestrator::new(
            session_id.clone(),
            GameSession::new(None),
            self.event_bus.clone(),
            create_policy(&settings.policy),
            settings.orchestrator_config(),
        );
        guard.insert(session_id.clone(), orchestrator.clone());
        tracing::info!(
            session_id = %session_id,
            policy = %settings.policy,
            "session created"
        );
        Ok(orchestrator)
    }

    /// Removes and announces a session. Returns whether it existed.
    fn close(&self, session_id: &SessionId, reason: &str) -> Result<bool, SessionError> {
        match self.remove_session(session_id)? {
            Some(orchestrator) => {
                orchestrator.shutdown();
                self.announce_closed(session_id, reason);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn announce_closed(&self, session_id: &SessionId, reason: &str) {
        tracing::info!(session_id = %session_id, reason, "session closed");
        self.event_bus.broadcast(
            session_id,
            GameEvent::SessionClosed {
                session_id: session_id.clone(),
                reason: reason.to_string(),
                at: Utc::now(),
            },
        );
        self.event_bus.drop_session(session_id);
    }

    fn remove_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<TurnOrchestrator>, SessionError> {
        match self.sessions.write() {
            Ok(mut guard) => Ok(guard.remove(session_id)),
            Err(_) => Err(SessionError::StoragePoisoned),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),
    #[error("Session expired: {0}")]
    Expired(SessionId),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("Session storage poisoned")]
    StoragePoisoned,
}

impl IntoErrorResponse for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            SessionError::NotFound(_) => "session_not_found",
            SessionError::Expired(_) => "session_expired",
            SessionError::Game(err) => err.error_code(),
            SessionError::StoragePoisoned => "session_storage_error",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            SessionError::NotFound(id) | SessionError::Expired(id) => {
                Some(serde_json::json!({ "session_id": id }))
            }
            SessionError::Game(err) => err.error_details(),
            SessionError::StoragePoisoned => None,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            SessionError::StoragePoisoned => ErrorSeverity::Critical,
            _ => ErrorSeverity::Client,
        }
    }
}
