//! Session hosting for No Thanks! tables.
//!
//! [`SessionManager`] keeps one [`TurnOrchestrator`] per table. The
//! orchestrator is the only writer of its game; it publishes
//! [`GameEvent`]s on the [`EventBus`] and runs bot and turn timers.
//! Transports (websocket, SSE, CLI) subscribe to the bus and call into the
//! manager; none lives in this crate.

pub mod context;
pub mod errors;
pub mod events;
pub mod logging;
pub mod orchestrator;
pub mod session;
pub mod settings;

pub use context::AppContext;
pub use errors::{ErrorResponse, ErrorSeverity, IntoErrorResponse};
pub use events::{EventBus, EventSubscription, GameEvent};
pub use logging::{LogEntry, LogFormat, TestLogSubscriber, init_logging};
pub use orchestrator::{OrchestratorConfig, TimerKind, TurnOrchestrator};
pub use session::{JoinTicket, SessionError, SessionId, SessionManager};
pub use settings::{AppSettings, SettingsError, SettingsStore};
