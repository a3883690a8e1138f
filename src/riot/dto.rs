//! Wire formats of the Riot endpoints we call.
//!
//! Only the fields the pipeline reads are modelled; everything else is ignored.

use serde::Deserialize;

use crate::models::{MatchRecord, ParticipantStat, Platform, PlayerIdentity, Puuid};

/// `summoner-v4` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonerDto {
    #[serde(default)]
    pub name: Option<String>,
    pub puuid: String,
    #[serde(default)]
    pub summoner_level: i64,
}

impl SummonerDto {
    /// Build the identity, falling back to the queried name when upstream omits it.
    pub fn into_identity(self, platform: Platform, queried_name: &str) -> PlayerIdentity {
        PlayerIdentity {
            display_name: self
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| queried_name.to_string()),
            platform,
            level: u32::try_from(self.summoner_level).unwrap_or(0),
            puuid: Puuid::from(self.puuid),
        }
    }
}

/// `match-v5` match response.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchDto {
    pub info: InfoDto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoDto {
    /// Seconds
    pub game_duration: f64,
    #[serde(default)]
    pub participants: Vec<ParticipantDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub puuid: String,
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub total_minions_killed: u32,
    #[serde(default)]
    pub neutral_minions_killed: u32,
    #[serde(default)]
    pub champion_name: String,
}

impl From<ParticipantDto> for ParticipantStat {
    fn from(p: ParticipantDto) -> Self {
        Self {
            puuid: Puuid::from(p.puuid),
            kills: p.kills,
            deaths: p.deaths,
            assists: p.assists,
            minions_killed: p.total_minions_killed,
            neutral_minions_killed: p.neutral_minions_killed,
            champion_name: p.champion_name,
        }
    }
}

impl From<MatchDto> for MatchRecord {
    fn from(m: MatchDto) -> Self {
        Self {
            duration_seconds: m.info.game_duration,
            participants: m.info.participants.into_iter().map(Into::into).collect(),
        }
    }
}
