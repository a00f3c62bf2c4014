//! Axum route handlers for user administration.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use sqlx::types::Json as DbJson;
use tracing::info;
use uuid::Uuid;

use crate::auth::access::decide_access;
use crate::auth::token::AuthUser;
use crate::errors::AppError;
use crate::listing::contains_ci;
use crate::models::user::{AccessFlag, AccessRights, UserRow};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdminUserQuery {
    pub q: Option<String>,
}

/// GET /api/v1/admin/users?q=
pub async fn handle_list_users(
    State(state): State<AppState>,
    Query(query): Query<AdminUserQuery>,
) -> Result<Json<Vec<UserRow>>, AppError> {
    let users = sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY name")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(search(users, query.q.as_deref())))
}

/// PUT /api/v1/admin/users/:id/access-rights
///
/// Replaces every flag. The caller needs `user_management` (or `admin`).
pub async fn handle_update_access_rights(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(rights): Json<AccessRights>,
) -> Result<Json<UserRow>, AppError> {
    let caller_rights: DbJson<AccessRights> =
        sqlx::query_scalar("SELECT access_rights FROM users WHERE id = $1")
            .bind(auth.user_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or(AppError::Unauthorized)?;
    if !decide_access(&caller_rights, &[AccessFlag::UserManagement]).is_granted() {
        return Err(AppError::Forbidden);
    }

    let user = sqlx::query_as::<_, UserRow>(
        "UPDATE users SET access_rights = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(DbJson(&rights))
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;

    info!("User {} updated access rights of {}", auth.user_id, id);
    Ok(Json(user))
}

/// Matches name, email or department.
fn search(users: Vec<UserRow>, q: Option<&str>) -> Vec<UserRow> {
    let needle = q.map(str::trim).unwrap_or_default();
    users
        .into_iter()
        .filter(|u| {
            contains_ci(&u.name, needle)
                || contains_ci(&u.email, needle)
                || contains_ci(&u.department, needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn user(name: &str, email: &str, department: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            employee_id: format!("E-{name}"),
            name: name.to_string(),
            email: email.to_string(),
            department: department.to_string(),
            position: "Staff".to_string(),
            hire_date: None,
            profile_data: json!({}),
            access_rights: DbJson(AccessRights::default()),
            password_hash: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_search_by_name_email_or_department() {
        let users = vec![
            user("Haru", "haru@corp.example", "Finance"),
            user("Nao", "nao@corp.example", "Engineering"),
        ];
        assert_eq!(search(users.clone(), None).len(), 2);
        assert_eq!(search(users.clone(), Some("HARU@")).len(), 1);
        assert_eq!(search(users.clone(), Some("engineer"))[0].name, "Nao");
        assert!(search(users, Some("marketing")).is_empty());
    }

    #[test]
    fn test_access_rights_body_defaults_missing_flags() {
        let rights: AccessRights = serde_json::from_value(json!({"idea_management": true})).unwrap();
        assert!(rights.idea_management);
        assert!(!decide_access(&rights, &[AccessFlag::UserManagement]).is_granted());
    }
}
