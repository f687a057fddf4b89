//! Full-Game Simulation Harness
//!
//! Drives complete games through the real lifecycle, matching, and
//! settlement engines over one shared store, with deterministic seeded bot
//! traders. Used for integration and invariant testing: same seeds, same
//! game, down to every trade and settled balance.
//!
//! # Modules
//! - `harness`: one live game wired through the real service stack
//! - `bots`: quoting and spread-crossing bot traders
//! - `replay`: run-stable snapshots and seeded full-game replays

pub mod bots;
pub mod harness;
pub mod replay;

pub use harness::{GameSim, SimConfig};
pub use replay::{capture_snapshot, run_bot_game, GameSnapshot};
