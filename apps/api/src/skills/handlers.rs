//! Axum route handlers for the skill catalogue and skill registration.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::info;
use uuid::Uuid;

use crate::auth::token::AuthUser;
use crate::errors::AppError;
use crate::listing::{like_pattern, optional_filter};
use crate::models::skill::{validate_level, SkillRow, UserSkillRow};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SkillListQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SkillOverview {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub holder_count: i64,
    /// `None` when nobody holds the skill.
    pub average_level: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterSkillRequest {
    pub skill_name: String,
    pub category: String,
    pub level: i16,
    #[serde(default)]
    pub years_of_experience: i32,
}

impl RegisterSkillRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.skill_name.trim().is_empty() {
            return Err(AppError::Validation("skill_name cannot be empty".to_string()));
        }
        if self.category.trim().is_empty() {
            return Err(AppError::Validation("category cannot be empty".to_string()));
        }
        validate_level("level", self.level)?;
        if self.years_of_experience < 0 {
            return Err(AppError::Validation(
                "years_of_experience cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterSkillResponse {
    pub skill: SkillRow,
    pub user_skill: UserSkillRow,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SkillSearchQuery {
    pub keyword: Option<String>,
    pub min_level: Option<i16>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SkillHolder {
    pub user_id: Uuid,
    pub name: String,
    pub department: String,
    pub position: String,
    pub skill_id: Uuid,
    pub skill_name: String,
    pub category: String,
    pub level: i16,
    pub years_of_experience: i32,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/skills?category=&q=
pub async fn handle_list_skills(
    State(state): State<AppState>,
    Query(query): Query<SkillListQuery>,
) -> Result<Json<Vec<SkillOverview>>, AppError> {
    let category = optional_filter(query.category.as_deref());
    let pattern = optional_filter(query.q.as_deref()).map(|q| like_pattern(&q));

    let skills = sqlx::query_as::<_, SkillOverview>(
        r#"
        SELECT s.id, s.name, s.category, s.created_at,
               COUNT(us.id) AS holder_count,
               ROUND(AVG(us.level)::numeric, 1)::float8 AS average_level
        FROM skills s
        LEFT JOIN user_skills us ON us.skill_id = s.id
        WHERE ($1::text IS NULL OR s.category = $1)
          AND ($2::text IS NULL OR s.name ILIKE $2)
        GROUP BY s.id
        ORDER BY s.category, s.name
        "#,
    )
    .bind(category)
    .bind(pattern)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(skills))
}

/// GET /api/v1/skills/categories
pub async fn handle_list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, AppError> {
    let categories: Vec<String> =
        sqlx::query_scalar("SELECT DISTINCT category FROM skills ORDER BY category")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(categories))
}

/// POST /api/v1/skills/register
///
/// Creates the skill if its name is new, then records the caller's level.
/// Re-registering an existing skill overwrites the level and refreshes `updated_at`.
pub async fn handle_register_skill(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<RegisterSkillRequest>,
) -> Result<(StatusCode, Json<RegisterSkillResponse>), AppError> {
    req.validate()?;

    let mut tx = state.db.begin().await?;
    let skill = sqlx::query_as::<_, SkillRow>(
        r#"
        INSERT INTO skills (name, category) VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING *
        "#,
    )
    .bind(req.skill_name.trim())
    .bind(req.category.trim())
    .fetch_one(&mut *tx)
    .await?;

    let user_skill = sqlx::query_as::<_, UserSkillRow>(
        r#"
        INSERT INTO user_skills (user_id, skill_id, level, years_of_experience)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, skill_id) DO UPDATE SET
            level = EXCLUDED.level,
            years_of_experience = EXCLUDED.years_of_experience,
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(auth.user_id)
    .bind(skill.id)
    .bind(req.level)
    .bind(req.years_of_experience)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(
        "User {} registered skill '{}' at level {}",
        auth.user_id, skill.name, user_skill.level
    );
    Ok((
        StatusCode::CREATED,
        Json(RegisterSkillResponse { skill, user_skill }),
    ))
}

/// GET /api/v1/skills/search?keyword=&min_level=&department=
pub async fn handle_search_skills(
    State(state): State<AppState>,
    Query(query): Query<SkillSearchQuery>,
) -> Result<Json<Vec<SkillHolder>>, AppError> {
    let min_level = validate_level("min_level", query.min_level.unwrap_or(1))?;
    let pattern = optional_filter(query.keyword.as_deref()).map(|k| like_pattern(&k));
    let department = optional_filter(query.department.as_deref());

    let holders = sqlx::query_as::<_, SkillHolder>(
        r#"
        SELECT u.id AS user_id, u.name, u.department, u.position,
               s.id AS skill_id, s.name AS skill_name, s.category,
               us.level, us.years_of_experience
        FROM user_skills us
        JOIN users u ON u.id = us.user_id
        JOIN skills s ON s.id = us.skill_id
        WHERE ($1::text IS NULL OR s.name ILIKE $1)
          AND us.level >= $2
          AND ($3::text IS NULL OR u.department = $3)
        ORDER BY us.level DESC, u.name
        "#,
    )
    .bind(pattern)
    .bind(min_level)
    .bind(department)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(holders))
}
