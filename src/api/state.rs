use std::sync::Arc;

use crate::config::AppConfig;
use crate::pipeline::CoachPipeline;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<CoachPipeline>,
}
