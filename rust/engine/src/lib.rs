//! # nothanks-engine: Card-Drafting Game Core
//!
//! A deterministic engine for a turn-based drafting game played with the
//! cards 3 to 35. On their turn a player either pays a token to decline the
//! face-up card or takes it together with every token placed on it. When the
//! deck runs out the lowest score wins.
//!
//! ## Core Modules
//!
//! - [`cards`] - The `Card` newtype and the full range
//! - [`deck`] - Seeded removal sampling and the draw pile
//! - [`player`] - Seats, token stashes and held cards
//! - [`settings`] - Table rules with clamped partial updates
//! - [`game`] - The session state machine (lobby, turns, round end)
//! - [`scoring`] - Run-aware scoring and ranking
//! - [`snapshot`] - Public projection of a session
//! - [`logger`] - Round records serialized as JSONL
//! - [`errors`] - Error types for rejected operations
//!
//! ## Quick Start
//!
//! ```rust
//! use nothanks_engine::game::{GameSession, Phase};
//!
//! let mut game = GameSession::new(Some(7));
//! game.add_player("p1", "Ann").unwrap();
//! game.add_player("p2", "Bob").unwrap();
//! game.start(None).unwrap();
//!
//! while game.phase() == Phase::InTurn {
//!     let id = game.current_player_id().unwrap().clone();
//!     game.take(&id).unwrap();
//! }
//!
//! let table = game.last_standings().unwrap();
//! assert_eq!(table.len(), 2);
//! ```
//!
//! ## Deterministic Deals
//!
//! The same seed produces the same removed set, seating and draw order:
//!
//! ```rust
//! use nothanks_engine::game::GameSession;
//!
//! let deal = |seed| {
//!     let mut g = GameSession::new(Some(seed));
//!     g.add_player("a", "A").unwrap();
//!     g.add_player("b", "B").unwrap();
//!     g.start(None).unwrap();
//!     g.undrawn_cards().to_vec()
//! };
//! assert_eq!(deal(42), deal(42));
//! ```

pub mod cards;
pub mod deck;
pub mod errors;
pub mod game;
pub mod logger;
pub mod player;
pub mod scoring;
pub mod settings;
pub mod snapshot;
