//! # Match Coach
//!
//! Summarizes a League of Legends player's recent matches and asks an
//! optional AI model for coaching tips.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (players, matches, platforms, stats)
//! - **riot**: Riot Games API client and wire types
//! - **calculate**: Per-match metrics and aggregation
//! - **advisor**: AI coaching backends
//! - **pipeline**: Request orchestration and error taxonomy
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod advisor;
pub mod api;
pub mod calculate;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod riot;

pub use models::*;
