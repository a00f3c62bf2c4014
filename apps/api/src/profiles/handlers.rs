//! Axum route handlers for employee profiles and career records.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::listing::{contains_ci, optional_filter, Direction};
use crate::models::user::UserRow;
use crate::profiles::career::{
    CareerData, CareerEntry, CertificationEntry, TrainingEntry, WorkHistoryEntry,
};
use crate::state::AppState;

const CAREER_KEY: &str = "career";

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSort {
    #[default]
    Name,
    Department,
    Position,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileQuery {
    pub department: Option<String>,
    pub q: Option<String>,
    pub sort: ProfileSort,
    pub order: Direction,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub email: Option<String>,
    pub profile_data: Option<Value>,
}

impl UpdateProfileRequest {
    fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [
            ("name", &self.name),
            ("department", &self.department),
            ("position", &self.position),
            ("email", &self.email),
        ] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(AppError::Validation(format!("{field} cannot be empty")));
            }
        }
        if matches!(&self.email, Some(email) if !email.contains('@')) {
            return Err(AppError::Validation("email is not a valid address".to_string()));
        }
        if matches!(&self.profile_data, Some(data) if !data.is_object()) {
            return Err(AppError::Validation("profile_data must be a JSON object".to_string()));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/profiles?department=&q=&sort=&order=
pub async fn handle_list_profiles(
    State(state): State<AppState>,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<Vec<UserRow>>, AppError> {
    let users = sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY name")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(filter_and_sort(users, &query)))
}

/// GET /api/v1/profiles/:id
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserRow>, AppError> {
    Ok(Json(fetch_user(&state, id).await?))
}

/// PUT /api/v1/profiles/:id
///
/// Absent fields keep their stored value. `profile_data` is merged key by key
/// into the stored object; `career` only changes through the append endpoints.
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserRow>, AppError> {
    req.validate()?;

    let updated = sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users SET
            name = COALESCE($2, name),
            department = COALESCE($3, department),
            position = COALESCE($4, position),
            email = COALESCE($5, email),
            profile_data = COALESCE(profile_data, '{}'::jsonb) || COALESCE($6, '{}'::jsonb),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(req.name.as_deref().map(str::trim))
    .bind(req.department.as_deref().map(str::trim))
    .bind(req.position.as_deref().map(str::trim))
    .bind(req.email.as_deref().map(str::trim))
    .bind(req.profile_data.map(profile_patch))
    .fetch_optional(&state.db)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "email is already in use"))?
    .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;

    info!("Updated profile {}", id);
    Ok(Json(updated))
}

/// GET /api/v1/profiles/:id/career
pub async fn handle_get_career(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CareerData>, AppError> {
    let user = fetch_user(&state, id).await?;
    Ok(Json(CareerData::from_profile(&user.profile_data)))
}

/// POST /api/v1/profiles/:id/career/work-history
pub async fn handle_add_work_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(entry): Json<WorkHistoryEntry>,
) -> Result<Json<CareerData>, AppError> {
    append_career_entry(&state, id, entry).await
}

/// POST /api/v1/profiles/:id/career/certifications
pub async fn handle_add_certification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(entry): Json<CertificationEntry>,
) -> Result<Json<CareerData>, AppError> {
    append_career_entry(&state, id, entry).await
}

/// POST /api/v1/profiles/:id/career/trainings
pub async fn handle_add_training(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(entry): Json<TrainingEntry>,
) -> Result<Json<CareerData>, AppError> {
    append_career_entry(&state, id, entry).await
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn fetch_user(state: &AppState, id: Uuid) -> Result<UserRow, AppError> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
}

/// Appends in a single statement so concurrent appends never overwrite each other.
async fn append_career_entry<E: CareerEntry>(
    state: &AppState,
    id: Uuid,
    entry: E,
) -> Result<Json<CareerData>, AppError> {
    entry.validate()?;
    let key = E::SECTION.key();
    let value = serde_json::to_value(&entry).map_err(|e| AppError::Internal(e.into()))?;

    let profile_data: Option<Value> = sqlx::query_scalar(
        r#"
        UPDATE users SET
            profile_data = jsonb_set(
                COALESCE(profile_data, '{}'::jsonb),
                '{career}',
                COALESCE(profile_data -> 'career', '{}'::jsonb)
                    || jsonb_build_object(
                        $2::text,
                        COALESCE(profile_data -> 'career' -> $2, '[]'::jsonb) || jsonb_build_array($3::jsonb)
                    ),
                true
            ),
            updated_at = now()
        WHERE id = $1
        RETURNING profile_data
        "#,
    )
    .bind(id)
    .bind(key)
    .bind(&value)
    .fetch_optional(&state.db)
    .await?;

    let profile_data =
        profile_data.ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;
    info!("Appended {} entry for user {}", key, id);
    Ok(Json(CareerData::from_profile(&profile_data)))
}

/// Keys to merge into the stored profile. `career` is dropped.
fn profile_patch(mut data: Value) -> Value {
    if let Some(object) = data.as_object_mut() {
        object.remove(CAREER_KEY);
    }
    data
}

fn filter_and_sort(users: Vec<UserRow>, query: &ProfileQuery) -> Vec<UserRow> {
    let department = optional_filter(query.department.as_deref());
    let needle = query.q.as_deref().map(str::trim).unwrap_or_default();

    let mut users: Vec<UserRow> = users
        .into_iter()
        .filter(|u| department.as_deref().map_or(true, |d| u.department == d))
        .filter(|u| contains_ci(&u.name, needle) || contains_ci(&u.position, needle))
        .collect();

    users.sort_by(|a, b| {
        let (ka, kb) = match query.sort {
            ProfileSort::Name => (&a.name, &b.name),
            ProfileSort::Department => (&a.department, &b.department),
            ProfileSort::Position => (&a.position, &b.position),
        };
        ka.cmp(kb).then_with(|| a.name.cmp(&b.name))
    });
    if query.order == Direction::Desc {
        users.reverse();
    }
    users
}
