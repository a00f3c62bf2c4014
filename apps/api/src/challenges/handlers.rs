//! Axum route handlers for the Challenges board.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::token::AuthUser;
use crate::errors::AppError;
use crate::listing::{contains_ci, optional_filter, Recency};
use crate::models::challenge::{ChallengeRow, ChallengeStatus};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChallengeQuery {
    pub status: Option<String>,
    pub q: Option<String>,
    pub sort: Recency,
}

#[derive(Debug, Deserialize)]
pub struct CreateChallengeRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ChallengeStatus,
}

/// GET /api/v1/challenges?status=&q=&sort=
pub async fn handle_list_challenges(
    State(state): State<AppState>,
    Query(query): Query<ChallengeQuery>,
) -> Result<Json<Vec<ChallengeRow>>, AppError> {
    let status = parse_status_filter(query.status.as_deref())?;
    let challenges =
        sqlx::query_as::<_, ChallengeRow>("SELECT * FROM challenges ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(filter_and_sort(challenges, status, query.q.as_deref(), query.sort)))
}

/// POST /api/v1/challenges
pub async fn handle_create_challenge(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateChallengeRequest>,
) -> Result<(StatusCode, Json<ChallengeRow>), AppError> {
    let title = req.title.trim();
    let description = req.description.trim();
    if title.is_empty() || description.is_empty() {
        return Err(AppError::Validation(
            "title and description are required".to_string(),
        ));
    }
    let required_skills: Vec<&str> = req
        .required_skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    let challenge = sqlx::query_as::<_, ChallengeRow>(
        r#"
        INSERT INTO challenges (title, description, posted_by, status, required_skills)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(auth.user_id)
    .bind(ChallengeStatus::Open.as_str())
    .bind(json!(required_skills))
    .fetch_one(&state.db)
    .await?;

    info!("Challenge {} posted by {}", challenge.id, auth.user_id);
    Ok((StatusCode::CREATED, Json(challenge)))
}

/// PATCH /api/v1/challenges/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ChallengeRow>, AppError> {
    let challenge = sqlx::query_as::<_, ChallengeRow>(
        "UPDATE challenges SET status = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(req.status.as_str())
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Challenge {id} not found")))?;

    info!("Challenge {} moved to {}", id, req.status.as_str());
    Ok(Json(challenge))
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<ChallengeStatus>, AppError> {
    optional_filter(raw)
        .map(|s| {
            serde_json::from_value::<ChallengeStatus>(json!(s)).map_err(|_| {
                AppError::Validation(format!(
                    "status must be one of open, in_progress, resolved or all; got '{s}'"
                ))
            })
        })
        .transpose()
}

fn filter_and_sort(
    challenges: Vec<ChallengeRow>,
    status: Option<ChallengeStatus>,
    q: Option<&str>,
    sort: Recency,
) -> Vec<ChallengeRow> {
    let needle = q.map(str::trim).unwrap_or_default();
    let mut challenges: Vec<ChallengeRow> = challenges
        .into_iter()
        .filter(|c| status.map_or(true, |s| c.status == s.as_str()))
        .filter(|c| contains_ci(&c.title, needle) || contains_ci(&c.description, needle))
        .collect();
    match sort {
        Recency::Newest => challenges.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        Recency::Oldest => challenges.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
    }
    challenges
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn challenge(title: &str, description: &str, status: ChallengeStatus, age_days: i64) -> ChallengeRow {
        ChallengeRow {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.to_string(),
            posted_by: Uuid::new_v4(),
            status: status.as_str().to_string(),
            required_skills: json!([]),
            created_at: Utc::now() - Duration::days(age_days),
        }
    }

    fn fixture() -> Vec<ChallengeRow> {
        vec![
            challenge("Slow CI", "Builds take 40 minutes", ChallengeStatus::Open, 3),
            challenge("Flaky login", "Session drops on refresh", ChallengeStatus::Resolved, 10),
            challenge("Data export", "Finance needs CI reports", ChallengeStatus::InProgress, 1),
        ]
    }

    fn titles(rows: &[ChallengeRow]) -> Vec<&str> {
        rows.iter().map(|c| c.title.as_str()).collect()
    }

    #[test]
    fn test_status_filter_parsing() {
        assert_eq!(parse_status_filter(None).unwrap(), None);
        assert_eq!(parse_status_filter(Some("all")).unwrap(), None);
        assert_eq!(
            parse_status_filter(Some("in_progress")).unwrap(),
            Some(ChallengeStatus::InProgress)
        );
        assert!(matches!(
            parse_status_filter(Some("closed")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_newest_first_by_default() {
        let rows = filter_and_sort(fixture(), None, None, Recency::default());
        assert_eq!(titles(&rows), vec!["Data export", "Slow CI", "Flaky login"]);
    }

    #[test]
    fn test_search_matches_title_or_description() {
        let rows = filter_and_sort(fixture(), None, Some("ci"), Recency::Oldest);
        assert_eq!(titles(&rows), vec!["Slow CI", "Data export"]);
    }

    #[test]
    fn test_status_filter_applies() {
        let rows = filter_and_sort(fixture(), Some(ChallengeStatus::Resolved), None, Recency::Newest);
        assert_eq!(titles(&rows), vec!["Flaky login"]);
    }
}
