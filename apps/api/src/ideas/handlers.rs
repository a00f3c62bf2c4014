//! Axum route handlers for the Ideas board and its evaluations.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use tracing::info;
use uuid::Uuid;

use crate::analytics::charts::round1;
use crate::auth::token::AuthUser;
use crate::errors::AppError;
use crate::listing::{contains_ci, Recency};
use crate::models::idea::{Evaluation, IdeaRow};
use crate::state::AppState;

pub const MIN_SCORE: i16 = 1;
pub const MAX_SCORE: i16 = 5;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IdeaQuery {
    pub q: Option<String>,
    pub sort: Recency,
}

#[derive(Debug, Clone, FromRow)]
pub struct IdeaWithPoster {
    #[sqlx(flatten)]
    pub idea: IdeaRow,
    pub poster_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IdeaOverview {
    #[serde(flatten)]
    pub idea: IdeaRow,
    pub poster_name: Option<String>,
    pub evaluation_count: usize,
    /// One decimal; `None` before the first evaluation.
    pub average_score: Option<f64>,
}

impl From<IdeaWithPoster> for IdeaOverview {
    fn from(row: IdeaWithPoster) -> Self {
        let evaluations = row.idea.evaluations();
        let average_score = if evaluations.is_empty() {
            None
        } else {
            let total: f64 = evaluations.iter().map(|e| f64::from(e.score)).sum();
            Some(round1(total / evaluations.len() as f64))
        };
        Self {
            evaluation_count: evaluations.len(),
            average_score,
            poster_name: row.poster_name,
            idea: row.idea,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateIdeaRequest {
    pub title: String,
    pub description: String,
    #[serde(default = "empty_object")]
    pub required_resources: Value,
}

fn empty_object() -> Value {
    json!({})
}

#[derive(Debug, Deserialize)]
pub struct EvaluateIdeaRequest {
    pub score: i16,
    #[serde(default)]
    pub comment: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/ideas?q=&sort=
pub async fn handle_list_ideas(
    State(state): State<AppState>,
    Query(query): Query<IdeaQuery>,
) -> Result<Json<Vec<IdeaOverview>>, AppError> {
    let rows = sqlx::query_as::<_, IdeaWithPoster>(
        r#"
        SELECT i.*, u.name AS poster_name
        FROM ideas i
        LEFT JOIN users u ON u.id = i.posted_by
        ORDER BY i.created_at DESC
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    let ideas = rows.into_iter().map(IdeaOverview::from).collect();
    Ok(Json(filter_and_sort(ideas, query.q.as_deref(), query.sort)))
}

/// POST /api/v1/ideas
pub async fn handle_create_idea(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateIdeaRequest>,
) -> Result<(StatusCode, Json<IdeaRow>), AppError> {
    let title = req.title.trim();
    let description = req.description.trim();
    if title.is_empty() || description.is_empty() {
        return Err(AppError::Validation(
            "title and description are required".to_string(),
        ));
    }

    let idea = sqlx::query_as::<_, IdeaRow>(
        r#"
        INSERT INTO ideas (title, description, posted_by, required_resources, evaluation_data)
        VALUES ($1, $2, $3, $4, '[]'::jsonb)
        RETURNING *
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(auth.user_id)
    .bind(&req.required_resources)
    .fetch_one(&state.db)
    .await?;

    info!("Idea {} posted by {}", idea.id, auth.user_id);
    Ok((StatusCode::CREATED, Json(idea)))
}

/// GET /api/v1/ideas/:id
pub async fn handle_get_idea(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IdeaOverview>, AppError> {
    let row = sqlx::query_as::<_, IdeaWithPoster>(
        r#"
        SELECT i.*, u.name AS poster_name
        FROM ideas i
        LEFT JOIN users u ON u.id = i.posted_by
        WHERE i.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Idea {id} not found")))?;

    Ok(Json(IdeaOverview::from(row)))
}

/// POST /api/v1/ideas/:id/evaluations
///
/// Appends one evaluation in a single statement; earlier entries are never rewritten.
pub async fn handle_evaluate_idea(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<EvaluateIdeaRequest>,
) -> Result<(StatusCode, Json<IdeaRow>), AppError> {
    let evaluation = build_evaluation(&req, auth.user_id)?;
    let element = serde_json::to_value(&evaluation).map_err(|e| AppError::Internal(e.into()))?;

    let idea = sqlx::query_as::<_, IdeaRow>(
        r#"
        UPDATE ideas
        SET evaluation_data = COALESCE(evaluation_data, '[]'::jsonb) || jsonb_build_array($2::jsonb)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&element)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Idea {id} not found")))?;

    info!("Idea {} evaluated {} by {}", id, evaluation.score, auth.user_id);
    Ok((StatusCode::CREATED, Json(idea)))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn build_evaluation(req: &EvaluateIdeaRequest, evaluated_by: Uuid) -> Result<Evaluation, AppError> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&req.score) {
        return Err(AppError::Validation(format!(
            "score must be between {MIN_SCORE} and {MAX_SCORE}, got {}",
            req.score
        )));
    }
    Ok(Evaluation {
        score: req.score,
        comment: req.comment.trim().to_string(),
        evaluated_at: Utc::now(),
        evaluated_by,
    })
}

fn filter_and_sort(ideas: Vec<IdeaOverview>, q: Option<&str>, sort: Recency) -> Vec<IdeaOverview> {
    let needle = q.map(str::trim).unwrap_or_default();
    let mut ideas: Vec<IdeaOverview> = ideas
        .into_iter()
        .filter(|i| contains_ci(&i.idea.title, needle) || contains_ci(&i.idea.description, needle))
        .collect();
    match sort {
        Recency::Newest => ideas.sort_by(|a, b| b.idea.created_at.cmp(&a.idea.created_at)),
        Recency::Oldest => ideas.sort_by(|a, b| a.idea.created_at.cmp(&b.idea.created_at)),
    }
    ideas
}
