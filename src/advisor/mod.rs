//! AI coaching advice.
//!
//! Advice is best effort: [`Advisor::advise`] always returns text, either
//! the model's tips or a short message explaining why there are none.

pub mod backend;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use self::backend::{AiBackend, ChatRequest};
use crate::models::{AggregateStats, PlayerIdentity};

/// Returned as advice when no model is configured.
pub const ADVISOR_DISABLED_MESSAGE: &str =
    "AI coaching is disabled: no generative model is configured.";

const COACH_SYSTEM_PROMPT: &str = "You are a concise, motivating League of Legends coach. \
Given a player's recent match summary, reply with exactly 3 short, actionable tips. \
Reference the numbers you are given. No preamble.";

/// Errors that can occur while generating advice.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("AI backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("AI response unparseable: {0}")]
    ResponseParseError(String),

    #[error("AI returned an empty response")]
    EmptyResponse,
}

/// Structured payload sent to the model as the user message.
#[derive(Debug, Serialize)]
struct CoachPayload<'a> {
    player: &'a PlayerIdentity,
    summary: &'a AggregateStats,
}

/// Coaching capability, chosen once from configuration.
#[derive(Clone)]
pub enum Advisor {
    Enabled {
        backend: Arc<dyn AiBackend>,
        max_tokens: u32,
    },
    Disabled,
}

impl Advisor {
    pub fn enabled(backend: Arc<dyn AiBackend>, max_tokens: u32) -> Self {
        Advisor::Enabled {
            backend,
            max_tokens,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Advisor::Enabled { .. })
    }

    /// Produce coaching text. Never fails; errors become a degraded message.
    pub async fn advise(&self, stats: &AggregateStats, player: &PlayerIdentity) -> String {
        let Advisor::Enabled {
            backend,
            max_tokens,
        } = self
        else {
            return ADVISOR_DISABLED_MESSAGE.to_string();
        };

        match generate(backend.as_ref(), *max_tokens, stats, player).await {
            Ok(text) => text,
            Err(e) => {
                warn!(backend = backend.name(), "Coaching advice degraded: {}", e);
                degraded_message(&e)
            }
        }
    }
}

impl std::fmt::Debug for Advisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Advisor::Enabled { backend, .. } => write!(f, "Advisor::Enabled({})", backend.name()),
            Advisor::Disabled => write!(f, "Advisor::Disabled"),
        }
    }
}

/// Human-readable stand-in for advice when the model call failed.
pub fn degraded_message(error: &AdvisorError) -> String {
    format!("AI coaching is unavailable right now ({}).", error)
}

fn build_request(
    stats: &AggregateStats,
    player: &PlayerIdentity,
    max_tokens: u32,
) -> Result<ChatRequest, AdvisorError> {
    let payload = serde_json::to_string(&CoachPayload {
        player,
        summary: stats,
    })
    .map_err(|e| AdvisorError::ResponseParseError(e.to_string()))?;

    Ok(ChatRequest::new(COACH_SYSTEM_PROMPT, payload)
        .with_temperature(0.7)
        .with_max_tokens(max_tokens))
}

async fn generate(
    backend: &dyn AiBackend,
    max_tokens: u32,
    stats: &AggregateStats,
    player: &PlayerIdentity,
) -> Result<String, AdvisorError> {
    let request = build_request(stats, player, max_tokens)?;

    debug!(backend = backend.name(), "Requesting coaching advice");
    let reply = backend.chat(&request).await?;

    let text = reply.trim();
    if text.is_empty() {
        return Err(AdvisorError::EmptyResponse);
    }
    Ok(text.to_string())
}
