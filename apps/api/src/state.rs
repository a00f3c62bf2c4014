use std::sync::Arc;

use reqwest::Client as HttpClient;
use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::matching::scoring::SkillScorer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmClient,
    /// Outbound client for the HR system and mail API.
    pub http: HttpClient,
    pub config: Config,
    /// Pluggable candidate scorer. Default: LevelDeltaScorer.
    pub skill_scorer: Arc<dyn SkillScorer>,
}
