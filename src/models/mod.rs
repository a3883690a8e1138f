//! Core data models for the match coach.

mod ids;
mod match_record;
mod platform;
mod player;
mod stats;

pub use ids::*;
pub use match_record::*;
pub use platform::*;
pub use player::*;
pub use stats::*;
