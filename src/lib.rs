//! Wagerhall - Real-Time Wagered Mini-Game Engine
//!
//! Runs short-lived, wagered game sessions (head-to-head coinflips,
//! stake-weighted jackpot draws) concurrently in a single process. Each
//! session follows a strict `waiting -> playing -> completed` lifecycle with
//! timeout-driven resolution, at most one outcome per session, and payout
//! accounting that always balances against the pooled stake.

pub mod api;
pub mod broadcast;
pub mod cleanup;
pub mod config;
pub mod engine;
pub mod errors;
pub mod matchmaker;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod settlement;
pub mod types;
