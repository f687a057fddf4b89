//! Game Lifecycle Service
//!
//! Drives games through their phases and keeps the roster consistent:
//! creation with per-kind markets, joining and leaving while the roster is
//! open, the start transition, and the event ticks that extend the roll
//! sequence.
//!
//! **Key Invariants:**
//! - Every transition checks the game status read in the same transaction
//!   it writes; racing callers serialize through the store.
//! - A user is in at most one live game. A `current_game` pointer at a
//!   finished or deleted game is stale and never blocks a new join.
//! - The roll sequence is append-only and only ever grows through
//!   [`GameLifecycle::tick_game`].
//! - Event draws come from a single seeded RNG, so a fixed seed replays a
//!   game identically.

pub mod service;

pub use service::GameLifecycle;
