use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One element of `ideas.evaluation_data`. The list is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: i16,
    pub comment: String,
    pub evaluated_at: DateTime<Utc>,
    pub evaluated_by: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IdeaRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub posted_by: Uuid,
    pub required_resources: Value,
    pub evaluation_data: Value,
    pub created_at: DateTime<Utc>,
}

impl IdeaRow {
    /// Evaluations that parse; malformed legacy elements are skipped.
    pub fn evaluations(&self) -> Vec<Evaluation> {
        self.evaluation_data
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| serde_json::from_value(v.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}
