use axum::Json;
use serde::Serialize;

use crate::models::{Platform, Region};

#[derive(Debug, Serialize)]
pub struct PlatformEntry {
    pub platform: Platform,
    pub region: Region,
}

#[derive(Debug, Serialize)]
pub struct PlatformsResponse {
    pub platforms: Vec<PlatformEntry>,
}

/// Accepted platform tokens and the partition each one routes to.
pub async fn list_platforms() -> Json<PlatformsResponse> {
    Json(PlatformsResponse {
        platforms: Platform::ALL
            .into_iter()
            .map(|platform| PlatformEntry {
                platform,
                region: platform.region(),
            })
            .collect(),
    })
}
