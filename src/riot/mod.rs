//! Riot API client.
//!
//! Resolves players and fetches their recent match history. Every call is a
//! single attempt; retrying and rate negotiation are left to the caller.

mod dto;

pub use dto::*;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::models::{MatchId, MatchRecord, Platform, PlayerIdentity, Puuid, Region};

/// Upstream error bodies are cut to this many characters.
pub const MAX_ERROR_BODY_CHARS: usize = 200;

/// Errors that can occur when talking to the Riot API.
#[derive(Debug, Error)]
pub enum RiotError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Riot API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("API key is not a valid header value")]
    InvalidApiKey,
}

impl RiotError {
    /// Upstream HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            RiotError::Status { status, .. } => Some(*status),
            RiotError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Cut `text` to at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// The three Riot operations the pipeline depends on.
#[async_trait]
pub trait RiotApi: Send + Sync {
    /// Resolve a display name on `platform` to a player identity.
    async fn resolve(&self, platform: Platform, display_name: &str)
        -> Result<PlayerIdentity, RiotError>;

    /// Most recent match ids for `puuid`, newest first.
    async fn recent_match_ids(
        &self,
        region: Region,
        puuid: &Puuid,
        count: u32,
    ) -> Result<Vec<MatchId>, RiotError>;

    /// Full record for one match.
    async fn fetch_match(&self, region: Region, match_id: &MatchId)
        -> Result<MatchRecord, RiotError>;
}

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct RiotClientConfig {
    /// Value for the `X-Riot-Token` header
    pub api_key: String,

    /// Send every request to this host instead of the routed Riot hosts
    pub base_url: Option<Url>,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl Default for RiotClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            timeout: Duration::from_secs(8),
            user_agent: concat!("match-coach/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// reqwest-backed [`RiotApi`].
pub struct RiotClient {
    client: Client,
    config: RiotClientConfig,
}

impl RiotClient {
    /// Create a new client with the given configuration.
    pub fn new(config: RiotClientConfig) -> Result<Self, RiotError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("match-coach")),
        );
        let mut token = HeaderValue::from_str(&config.api_key)
            .map_err(|_| RiotError::InvalidApiKey)?;
        token.set_sensitive(true);
        headers.insert("X-Riot-Token", token);

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Root URL for a routing value such as `na1` or `americas`.
    fn host(&self, route: &str) -> Result<Url, RiotError> {
        match &self.config.base_url {
            Some(base) => Ok(base.clone()),
            None => {
                let raw = format!("https://{}.api.riotgames.com/", route);
                Url::parse(&raw).map_err(|e| RiotError::InvalidUrl(format!("{}: {}", raw, e)))
            }
        }
    }

    /// Append path segments, percent-encoding each one.
    fn endpoint(&self, route: &str, segments: &[&str]) -> Result<Url, RiotError> {
        let mut url = self.host(route)?;
        url.path_segments_mut()
            .map_err(|_| RiotError::InvalidUrl("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, RiotError> {
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RiotError::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| RiotError::Decode(e.to_string()))
    }

    /// URL of the summoner lookup, exposed for tests.
    pub fn summoner_url(&self, platform: Platform, display_name: &str) -> Result<Url, RiotError> {
        self.endpoint(
            platform.as_str(),
            &["lol", "summoner", "v4", "summoners", "by-name", display_name],
        )
    }

    /// URL of the match id window, exposed for tests.
    pub fn match_ids_url(&self, region: Region, puuid: &Puuid, count: u32) -> Result<Url, RiotError> {
        let mut url = self.endpoint(
            region.as_str(),
            &["lol", "match", "v5", "matches", "by-puuid", puuid.as_str(), "ids"],
        )?;
        url.query_pairs_mut()
            .append_pair("start", "0")
            .append_pair("count", &count.to_string());
        Ok(url)
    }

    /// URL of a single match, exposed for tests.
    pub fn match_url(&self, region: Region, match_id: &MatchId) -> Result<Url, RiotError> {
        self.endpoint(
            region.as_str(),
            &["lol", "match", "v5", "matches", match_id.as_str()],
        )
    }
}

#[async_trait]
impl RiotApi for RiotClient {
    async fn resolve(
        &self,
        platform: Platform,
        display_name: &str,
    ) -> Result<PlayerIdentity, RiotError> {
        let url = self.summoner_url(platform, display_name)?;
        let summoner: SummonerDto = self.get_json(url).await?;
        Ok(summoner.into_identity(platform, display_name))
    }

    async fn recent_match_ids(
        &self,
        region: Region,
        puuid: &Puuid,
        count: u32,
    ) -> Result<Vec<MatchId>, RiotError> {
        let url = self.match_ids_url(region, puuid, count)?;
        self.get_json(url).await
    }

    async fn fetch_match(
        &self,
        region: Region,
        match_id: &MatchId,
    ) -> Result<MatchRecord, RiotError> {
        let url = self.match_url(region, match_id)?;
        let dto: MatchDto = self.get_json(url).await?;
        Ok(dto.into())
    }
}

/// Scripted Riot API for testing. Counts every call it receives.
#[cfg(test)]
pub struct MockRiotApi {
    pub player: Option<PlayerIdentity>,
    pub lookup_status: u16,
    pub match_ids: Option<Vec<MatchId>>,
    pub matches: std::collections::HashMap<MatchId, MatchRecord>,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockRiotApi {
    pub fn new(player: PlayerIdentity) -> Self {
        Self {
            player: Some(player),
            lookup_status: 404,
            match_ids: Some(Vec::new()),
            matches: std::collections::HashMap::new(),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Lookup fails with `status`.
    pub fn unknown_player(status: u16) -> Self {
        Self {
            player: None,
            lookup_status: status,
            ..Self::new(PlayerIdentity {
                display_name: String::new(),
                platform: Platform::Na1,
                level: 0,
                puuid: Puuid::from(""),
            })
        }
    }

    /// Listed ids without a record fail when fetched.
    pub fn with_matches(mut self, ids: &[&str], records: Vec<(&str, MatchRecord)>) -> Self {
        self.match_ids = Some(ids.iter().map(|id| MatchId::from(*id)).collect());
        self.matches = records
            .into_iter()
            .map(|(id, record)| (MatchId::from(id), record))
            .collect();
        self
    }

    pub fn without_match_list(mut self) -> Self {
        self.match_ids = None;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
#[async_trait]
impl RiotApi for MockRiotApi {
    async fn resolve(
        &self,
        platform: Platform,
        display_name: &str,
    ) -> Result<PlayerIdentity, RiotError> {
        self.record_call();
        match &self.player {
            Some(player) => Ok(PlayerIdentity {
                platform,
                display_name: if player.display_name.is_empty() {
                    display_name.to_string()
                } else {
                    player.display_name.clone()
                },
                ..player.clone()
            }),
            None => Err(RiotError::Status {
                status: self.lookup_status,
                body: r#"{"status":{"message":"Data not found - summoner not found","status_code":404}}"#
                    .to_string(),
            }),
        }
    }

    async fn recent_match_ids(
        &self,
        _region: Region,
        _puuid: &Puuid,
        count: u32,
    ) -> Result<Vec<MatchId>, RiotError> {
        self.record_call();
        match &self.match_ids {
            Some(ids) => Ok(ids.iter().take(count as usize).cloned().collect()),
            None => Err(RiotError::Status {
                status: 503,
                body: "Service Unavailable".to_string(),
            }),
        }
    }

    async fn fetch_match(
        &self,
        _region: Region,
        match_id: &MatchId,
    ) -> Result<MatchRecord, RiotError> {
        self.record_call();
        self.matches
            .get(match_id)
            .cloned()
            .ok_or_else(|| RiotError::Status {
                status: 404,
                body: format!("match {} not found", match_id),
            })
    }
}
