//! Types library for the market game
//!
//! This library provides all core type definitions used across the game
//! services: the persistent document shapes, identifier newtypes, numeric
//! types, the event feed vocabulary, and the error taxonomy.
//!
//! # Modules
//! - `ids`: Unique identifiers (GameId, UserId, TeamId, MarketId, OrderId, TradeId)
//! - `numeric`: Price and share-quantity types
//! - `order`: Order lifecycle types
//! - `trade`: Immutable trade records
//! - `game`: Game document and lifecycle states
//! - `market`: Market documents and book summary
//! - `team`: Teams and roster memberships
//! - `user`: User documents
//! - `events`: Game event feed entries
//! - `leaderboard`: Per-game and season leaderboards
//! - `auth`: Caller identity wrapper
//! - `errors`: Error taxonomy

// Public modules
pub mod auth;
pub mod errors;
pub mod events;
pub mod game;
pub mod ids;
pub mod leaderboard;
pub mod market;
pub mod numeric;
pub mod order;
pub mod team;
pub mod trade;
pub mod user;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::auth::*;
    pub use crate::errors::*;
    pub use crate::events::*;
    pub use crate::game::*;
    pub use crate::ids::*;
    pub use crate::leaderboard::*;
    pub use crate::market::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::team::*;
    pub use crate::trade::*;
    pub use crate::user::*;
}
