//! Resolved player identity.

use serde::{Deserialize, Serialize};

use super::{Platform, Puuid};

/// A player resolved from a display name on a given platform.
///
/// Built once by the resolver and never mutated for the rest of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    /// Display name as reported upstream
    #[serde(rename = "summoner")]
    pub display_name: String,

    pub platform: Platform,

    pub level: u32,

    /// Canonical player identifier
    pub puuid: Puuid,
}
