use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_type: String,
    pub target_id: Option<String>,
    pub match_score: f64,
    pub created_at: DateTime<Utc>,
}
