//! Match records as consumed by the aggregator.

use serde::{Deserialize, Serialize};

use super::Puuid;

/// Per-player line of a finished match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantStat {
    pub puuid: Puuid,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub minions_killed: u32,
    pub neutral_minions_killed: u32,
    pub champion_name: String,
}

impl ParticipantStat {
    /// Lane minions plus jungle monsters.
    pub fn creep_score(&self) -> u64 {
        u64::from(self.minions_killed) + u64::from(self.neutral_minions_killed)
    }
}

/// A single match with its participants in upstream order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub duration_seconds: f64,
    pub participants: Vec<ParticipantStat>,
}

impl MatchRecord {
    /// The participant entry belonging to `puuid`, if present.
    pub fn participant(&self, puuid: &Puuid) -> Option<&ParticipantStat> {
        self.participants.iter().find(|p| &p.puuid == puuid)
    }
}
