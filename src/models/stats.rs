//! Derived statistics models.

use serde::{Deserialize, Serialize};

/// Summary of a player's recent matches.
///
/// Averages are already rounded to two decimal places.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Matches in which the player was found
    pub games: u32,

    /// (kills + assists) / max(deaths, 1) over all counted games
    pub avg_kda: f64,

    /// Total creep score divided by total minutes played
    pub avg_cs_per_min: f64,

    /// Most played champion, earliest wins a tie
    pub top_champion: Option<String>,
}

impl AggregateStats {
    pub fn is_empty(&self) -> bool {
        self.games == 0
    }
}
