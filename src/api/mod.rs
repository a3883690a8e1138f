//! REST API endpoints.
//!
//! Axum-based HTTP API serving match summaries and coaching advice.
//! Every response, including failures, carries a JSON body.

pub mod state;

pub mod routes {
    pub mod health;
    pub mod platforms;
    pub mod summary;
}

use axum::{
    http::{header, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::ServerConfig;
use crate::pipeline::PipelineError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method {0} not allowed")]
    MethodNotAllowed(Method),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,

    /// Accepted platform tokens, on `invalid_platform`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<&'static str>>,

    /// Upstream HTTP status, when an upstream call failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ApiError {
    /// HTTP status and JSON body for this error.
    pub fn to_parts(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::Pipeline(e) => {
                let status = StatusCode::from_u16(e.status())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let allowed = match e {
                    PipelineError::InvalidPlatform { allowed, .. } => Some(allowed.clone()),
                    _ => None,
                };
                (
                    status,
                    ErrorResponse {
                        error: e.code(),
                        message: e.to_string(),
                        allowed,
                        status: e.upstream_status(),
                    },
                )
            }
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.plain("bad_request")),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.plain("not_found")),
            ApiError::MethodNotAllowed(_) => (
                StatusCode::METHOD_NOT_ALLOWED,
                self.plain("method_not_allowed"),
            ),
        }
    }

    fn plain(&self, code: &'static str) -> ErrorResponse {
        ErrorResponse {
            error: code,
            message: self.to_string(),
            allowed: None,
            status: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_parts();

        if status.is_server_error() {
            warn!(code = body.error, "Request failed: {}", body.message);
        }

        (status, Json(body)).into_response()
    }
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}

/// CORS policy from the configured origin list.
pub fn build_cors(server: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if server.allows_any_origin() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = server
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = build_cors(&state.config.server);

    Router::new()
        .route(
            "/health",
            get(routes::health::health).fallback(method_not_allowed),
        )
        .route(
            "/api/platforms",
            get(routes::platforms::list_platforms).fallback(method_not_allowed),
        )
        .route(
            "/api/summary",
            get(routes::summary::get_summary).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::backend::MockBackend;
    use crate::advisor::{Advisor, ADVISOR_DISABLED_MESSAGE};
    use crate::config::AppConfig;
    use crate::models::{MatchRecord, ParticipantStat, Platform, PlayerIdentity, Puuid};
    use crate::pipeline::{CoachPipeline, PipelineSettings};
    use crate::riot::{MockRiotApi, RiotApi};
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn player() -> PlayerIdentity {
        PlayerIdentity {
            display_name: "Faker".to_string(),
            platform: Platform::Kr,
            level: 712,
            puuid: Puuid::from("puuid-faker"),
        }
    }

    fn record(champion: &str, kills: u32, deaths: u32, assists: u32) -> MatchRecord {
        MatchRecord {
            duration_seconds: 1500.0,
            participants: vec![ParticipantStat {
                puuid: Puuid::from("puuid-faker"),
                kills,
                deaths,
                assists,
                minions_killed: 200,
                neutral_minions_killed: 0,
                champion_name: champion.to_string(),
            }],
        }
    }

    fn mock_riot() -> Arc<MockRiotApi> {
        Arc::new(MockRiotApi::new(player()).with_matches(
            &["KR_1", "KR_2", "KR_3", "KR_4", "KR_5"],
            vec![
                ("KR_1", record("Azir", 10, 0, 5)),
                ("KR_3", record("Azir", 3, 3, 3)),
            ],
        ))
    }

    fn setup_state(riot: Option<Arc<MockRiotApi>>, advisor: Advisor) -> AppState {
        let settings = PipelineSettings {
            match_count: 5,
            request_delay: Duration::from_millis(1),
            detail_concurrency: 1,
        };
        AppState {
            config: Arc::new(AppConfig::default()),
            pipeline: Arc::new(CoachPipeline::new(
                riot.map(|r| r as Arc<dyn RiotApi>),
                advisor,
                settings,
            )),
        }
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_summary_endpoint_success() {
        let app = build_router(setup_state(Some(mock_riot()), Advisor::Disabled));
        let (status, json) = get_json(app, "/api/summary?summoner=Faker&platform=KR").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["player"]["summoner"], "Faker");
        assert_eq!(json["player"]["platform"], "kr");
        assert_eq!(json["player"]["level"], 712);
        assert_eq!(json["player"]["puuid"], "puuid-faker");
        assert_eq!(json["summary"]["games"], 2);
        // (13 + 8) / 3
        assert_eq!(json["summary"]["avg_kda"], 7.0);
        assert_eq!(json["summary"]["avg_cs_per_min"], 8.0);
        assert_eq!(json["summary"]["top_champion"], "Azir");
        assert_eq!(json["coach"], ADVISOR_DISABLED_MESSAGE);
    }

    #[tokio::test]
    async fn test_summary_endpoint_with_advice() {
        let backend = Arc::new(MockBackend::new("1. Farm.\n2. Ward.\n3. Group."));
        let app = build_router(setup_state(
            Some(mock_riot()),
            Advisor::enabled(backend, 200),
        ));
        let (status, json) = get_json(app, "/api/summary?summoner=Faker&platform=kr").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["coach"], "1. Farm.\n2. Ward.\n3. Group.");
    }

    #[tokio::test]
    async fn test_summary_endpoint_encoded_name() {
        let app = build_router(setup_state(
            Some(Arc::new(MockRiotApi::new(PlayerIdentity {
                display_name: String::new(),
                ..player()
            }))),
            Advisor::Disabled,
        ));
        let (status, json) =
            get_json(app, "/api/summary?summoner=Hide%20on%20bush&platform=kr").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["player"]["summoner"], "Hide on bush");
        assert_eq!(json["summary"]["games"], 0);
        assert!(json["summary"]["top_champion"].is_null());
    }

    #[tokio::test]
    async fn test_invalid_platform_returns_400_with_allowed_list() {
        let riot = mock_riot();
        let app = build_router(setup_state(Some(riot.clone()), Advisor::Disabled));
        let (status, json) = get_json(app, "/api/summary?summoner=Faker&platform=xx9").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_platform");
        let allowed: Vec<&str> = json["allowed"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(allowed, Platform::tokens());
        assert_eq!(riot.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_config_returns_500() {
        let app = build_router(setup_state(None, Advisor::Disabled));
        let (status, json) = get_json(app, "/api/summary").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "missing_config");
        assert!(json.get("allowed").is_none());
    }

    #[tokio::test]
    async fn test_lookup_failure_uses_upstream_status() {
        let app = build_router(setup_state(
            Some(Arc::new(MockRiotApi::unknown_player(404))),
            Advisor::Disabled,
        ));
        let (status, json) = get_json(app, "/api/summary?summoner=ghost&platform=na1").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "summoner_lookup_failed");
        assert_eq!(json["status"], 404);
        assert!(json["message"].as_str().unwrap().contains("summoner not found"));
    }

    #[tokio::test]
    async fn test_match_list_failure_returns_structured_error() {
        let riot = Arc::new(MockRiotApi::new(player()).without_match_list());
        let app = build_router(setup_state(Some(riot), Advisor::Disabled));
        let (status, json) = get_json(app, "/api/summary?summoner=Faker&platform=kr").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "match_fetch_failed");
        assert_eq!(json["status"], 503);
    }

    #[tokio::test]
    async fn test_platforms_endpoint() {
        let app = build_router(setup_state(None, Advisor::Disabled));
        let (status, json) = get_json(app, "/api/platforms").await;

        assert_eq!(status, StatusCode::OK);
        let platforms = json["platforms"].as_array().unwrap();
        assert_eq!(platforms.len(), Platform::ALL.len());
        assert_eq!(platforms[0]["platform"], "br1");
        assert_eq!(platforms[0]["region"], "americas");
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let backend = Arc::new(MockBackend::new("tips"));
        let app = build_router(setup_state(None, Advisor::enabled(backend, 100)));
        let (status, json) = get_json(app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["advisor"], "enabled");
    }

    #[tokio::test]
    async fn test_unknown_route_is_structured_404() {
        let app = build_router(setup_state(None, Advisor::Disabled));
        let (status, json) = get_json(app, "/api/nope").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");
    }

    #[tokio::test]
    async fn test_duplicate_query_key_is_structured_400() {
        let riot = mock_riot();
        let app = build_router(setup_state(Some(riot.clone()), Advisor::Disabled));
        let (status, json) = get_json(app, "/api/summary?summoner=a&summoner=b").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "bad_request");
        assert!(json["message"].as_str().unwrap().contains("summoner"));
        assert_eq!(riot.call_count(), 0);
    }

    #[tokio::test]
    async fn test_wrong_method_is_structured_405() {
        let app = build_router(setup_state(Some(mock_riot()), Advisor::Disabled));
        let resp = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/summary")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "method_not_allowed");
        assert_eq!(json["message"], "Method POST not allowed");
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_any_origin_by_default() {
        let app = build_router(setup_state(None, Advisor::Disabled));
        let resp = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/summary")
                    .header(header::ORIGIN, "https://coach.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_cors_restricted_origins() {
        let mut config = AppConfig::default();
        config.server.allowed_origins = vec!["https://coach.example".to_string()];
        let state = AppState {
            config: Arc::new(config),
            ..setup_state(None, Advisor::Disabled)
        };

        let request = |origin: &'static str| {
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, origin)
                .body(Body::empty())
                .unwrap()
        };

        let allowed = build_router(state.clone())
            .oneshot(request("https://coach.example"))
            .await
            .unwrap();
        assert_eq!(
            allowed
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "https://coach.example"
        );

        let denied = build_router(state)
            .oneshot(request("https://evil.example"))
            .await
            .unwrap();
        assert!(denied
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
