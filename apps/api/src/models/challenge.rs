use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Open,
    InProgress,
    Resolved,
}

impl ChallengeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeStatus::Open => "open",
            ChallengeStatus::InProgress => "in_progress",
            ChallengeStatus::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChallengeRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub posted_by: Uuid,
    pub status: String,
    /// Skill names, stored as a JSON array.
    pub required_skills: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
