//! Coaching pipeline orchestrator.
//!
//! Runs one request end to end:
//! 1. Resolve the player on their platform
//! 2. Fetch the recent match id window
//! 3. Fetch each match, dropping the ones that fail
//! 4. Aggregate the surviving records
//! 5. Ask the advisor for tips (never fails)

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::advisor::backend::create_backend;
use crate::advisor::Advisor;
use crate::calculate;
use crate::config::{AppConfig, RiotConfig};
use crate::models::{AggregateStats, MatchId, MatchRecord, Platform, PlayerIdentity, Region};
use crate::riot::{RiotApi, RiotClient, RiotClientConfig, RiotError};

pub const DEFAULT_SUMMONER: &str = "Faker";
pub const DEFAULT_PLATFORM: &str = "na1";

/// Errors that end a request. Each maps to a wire code and HTTP status.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid platform {given:?}; expected one of: {}", .allowed.join(", "))]
    InvalidPlatform {
        given: String,
        allowed: Vec<&'static str>,
    },

    #[error("{0}")]
    MissingConfig(String),

    #[error("Summoner lookup failed: {message}")]
    SummonerLookupFailed { status: Option<u16>, message: String },

    #[error("Match list fetch failed: {message}")]
    MatchFetchFailed { status: Option<u16>, message: String },

    #[error("Request failed: {0}")]
    RequestFailed(String),
}

impl PipelineError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::InvalidPlatform { .. } => "invalid_platform",
            PipelineError::MissingConfig(_) => "missing_config",
            PipelineError::SummonerLookupFailed { .. } => "summoner_lookup_failed",
            PipelineError::MatchFetchFailed { .. } => "match_fetch_failed",
            PipelineError::RequestFailed(_) => "request_failed",
        }
    }

    /// HTTP status for this error. Upstream error statuses pass through.
    pub fn status(&self) -> u16 {
        match self {
            PipelineError::InvalidPlatform { .. } => 400,
            PipelineError::MissingConfig(_) | PipelineError::RequestFailed(_) => 500,
            PipelineError::SummonerLookupFailed { status, .. }
            | PipelineError::MatchFetchFailed { status, .. } => status
                .filter(|s| (400..=599).contains(s))
                .unwrap_or(502),
        }
    }

    /// Upstream status, if the error came from an upstream response.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            PipelineError::SummonerLookupFailed { status, .. }
            | PipelineError::MatchFetchFailed { status, .. } => *status,
            _ => None,
        }
    }

    fn from_lookup(error: RiotError) -> Self {
        match error {
            RiotError::Http(e) if e.status().is_none() => PipelineError::RequestFailed(e.to_string()),
            RiotError::Status { status, body } => PipelineError::SummonerLookupFailed {
                status: Some(status),
                message: body,
            },
            other => PipelineError::SummonerLookupFailed {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }

    fn from_match_list(error: RiotError) -> Self {
        match error {
            RiotError::Status { status, body } => PipelineError::MatchFetchFailed {
                status: Some(status),
                message: body,
            },
            other => PipelineError::MatchFetchFailed {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}

/// Inbound query. Both fields fall back to defaults when absent or blank.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryQuery {
    pub summoner: Option<String>,
    pub platform: Option<String>,
}

impl SummaryQuery {
    pub fn new(summoner: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            summoner: Some(summoner.into()),
            platform: Some(platform.into()),
        }
    }

    fn summoner(&self) -> String {
        non_blank(self.summoner.as_deref()).unwrap_or(DEFAULT_SUMMONER).to_string()
    }

    fn platform(&self) -> String {
        non_blank(self.platform.as_deref())
            .unwrap_or(DEFAULT_PLATFORM)
            .to_ascii_lowercase()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Successful response body.
#[derive(Debug, Clone, Serialize)]
pub struct CoachReport {
    pub player: PlayerIdentity,
    pub summary: AggregateStats,
    pub coach: String,
}

/// Knobs for the match fetch stages.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Size of the recent match window
    pub match_count: u32,

    /// Minimum spacing between match detail request starts
    pub request_delay: Duration,

    /// Match detail requests allowed in flight at once
    pub detail_concurrency: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&RiotConfig::default())
    }
}

impl From<&RiotConfig> for PipelineSettings {
    fn from(config: &RiotConfig) -> Self {
        Self {
            match_count: config.match_count,
            request_delay: Duration::from_millis(config.request_delay_ms),
            detail_concurrency: config.detail_concurrency.max(1),
        }
    }
}

/// Pipeline orchestrator.
pub struct CoachPipeline {
    /// `None` when no Riot key is configured
    riot: Option<Arc<dyn RiotApi>>,
    advisor: Advisor,
    settings: PipelineSettings,
}

impl CoachPipeline {
    pub fn new(riot: Option<Arc<dyn RiotApi>>, advisor: Advisor, settings: PipelineSettings) -> Self {
        Self {
            riot,
            advisor,
            settings,
        }
    }

    /// Build the Riot client and advisor described by `config`.
    ///
    /// A missing Riot key is not an error here; requests report it instead.
    /// A broken AI backend disables coaching rather than failing start-up.
    pub fn from_config(config: &AppConfig) -> Result<Self, RiotError> {
        let riot = match config.riot.api_key() {
            Some(api_key) => {
                let base_url = config
                    .riot
                    .base_url
                    .as_deref()
                    .map(url::Url::parse)
                    .transpose()
                    .map_err(|e| RiotError::InvalidUrl(e.to_string()))?;
                let client = RiotClient::new(RiotClientConfig {
                    api_key: api_key.to_string(),
                    base_url,
                    timeout: Duration::from_secs(config.riot.timeout_seconds),
                    ..Default::default()
                })?;
                Some(Arc::new(client) as Arc<dyn RiotApi>)
            }
            None => {
                warn!("No Riot API key configured; every request will fail with missing_config");
                None
            }
        };

        let advisor = match create_backend(&config.ai) {
            Ok(Some(backend)) => {
                info!(backend = backend.name(), "AI coaching enabled");
                Advisor::enabled(backend, config.ai.max_tokens)
            }
            Ok(None) => {
                info!("AI coaching disabled (no model configured)");
                Advisor::Disabled
            }
            Err(e) => {
                warn!("AI coaching disabled: {}", e);
                Advisor::Disabled
            }
        };

        Ok(Self::new(riot, advisor, PipelineSettings::from(&config.riot)))
    }

    pub fn advisor(&self) -> &Advisor {
        &self.advisor
    }

    /// Run the whole pipeline for one query.
    pub async fn run(&self, query: &SummaryQuery) -> Result<CoachReport, PipelineError> {
        let riot = self.riot.as_deref().ok_or_else(|| {
            PipelineError::MissingConfig("Riot API key is not configured (set RIOT_KEY)".to_string())
        })?;

        let token = query.platform();
        let platform: Platform = token.parse().map_err(|_| PipelineError::InvalidPlatform {
            given: token.clone(),
            allowed: Platform::tokens(),
        })?;
        let summoner = query.summoner();
        let region = platform.region();

        info!(%platform, %region, "Resolving summoner {:?}", summoner);
        let player = riot
            .resolve(platform, &summoner)
            .await
            .map_err(PipelineError::from_lookup)?;

        let match_ids = riot
            .recent_match_ids(region, &player.puuid, self.settings.match_count)
            .await
            .map_err(PipelineError::from_match_list)?;
        info!("Found {} recent matches for {}", match_ids.len(), player.puuid);

        let matches = fetch_matches(riot, region, &match_ids, &self.settings).await;
        let summary = calculate::summarize(&player.puuid, &matches);
        let coach = self.advisor.advise(&summary, &player).await;

        Ok(CoachReport {
            player,
            summary,
            coach,
        })
    }
}

/// Fetch every match in `ids`, keeping only the ones that succeed.
///
/// Request starts are spaced by `request_delay` no matter how many run at
/// once, and results keep the order of `ids`. Returns only after every
/// fetch has settled.
pub async fn fetch_matches(
    riot: &dyn RiotApi,
    region: Region,
    ids: &[MatchId],
    settings: &PipelineSettings,
) -> Vec<MatchRecord> {
    let pacer: Option<Mutex<Interval>> = (!settings.request_delay.is_zero()).then(|| {
        let mut ticker = interval(settings.request_delay);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Mutex::new(ticker)
    });
    let pacer = pacer.as_ref();

    let fetches: Vec<_> = ids
        .iter()
        .map(|id| async move {
            if let Some(pacer) = pacer {
                pacer.lock().await.tick().await;
            }
            (id, riot.fetch_match(region, id).await)
        })
        .collect();

    let outcomes: Vec<(&MatchId, Result<MatchRecord, RiotError>)> = stream::iter(fetches)
        .buffered(settings.detail_concurrency.max(1))
        .collect()
        .await;

    let total = outcomes.len();
    let matches: Vec<MatchRecord> = outcomes
        .into_iter()
        .filter_map(|(id, outcome)| match outcome {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(match_id = %id, "Skipping match: {}", e);
                None
            }
        })
        .collect();

    info!("Fetched {}/{} match records", matches.len(), total);
    matches
}
