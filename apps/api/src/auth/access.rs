//! Access validation: rule-based flag check with an advisory LLM review
//! that may only tighten (deny), never widen, the rule-based result.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::prompts::{ACCESS_REVIEW_PROMPT, ACCESS_REVIEW_SYSTEM};
use crate::errors::AppError;
use crate::llm_client::ContentSource;
use crate::models::user::{AccessFlag, AccessRights, UserRow, UserSummary};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// `admin` implies every other flag.
    Admin,
    Granted,
    Denied { missing: Vec<AccessFlag> },
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        !matches!(self, AccessDecision::Denied { .. })
    }
}

pub fn decide_access(rights: &AccessRights, required: &[AccessFlag]) -> AccessDecision {
    if rights.admin {
        return AccessDecision::Admin;
    }
    let missing: Vec<AccessFlag> = required
        .iter()
        .copied()
        .filter(|flag| !rights.has(*flag))
        .collect();
    if missing.is_empty() {
        AccessDecision::Granted
    } else {
        AccessDecision::Denied { missing }
    }
}

#[derive(Debug, Deserialize)]
pub struct AccessValidationRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub required_access: Vec<AccessFlag>,
}

#[derive(Debug, Serialize)]
pub struct AccessValidationResponse {
    pub has_access: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_source: Option<ContentSource>,
}

#[derive(Debug, Deserialize)]
struct AccessReview {
    is_valid: bool,
    #[serde(default)]
    reason: String,
}

/// POST /api/v1/auth/access-validation
pub async fn handle_access_validation(
    State(state): State<AppState>,
    Json(req): Json<AccessValidationRequest>,
) -> Result<(StatusCode, Json<AccessValidationResponse>), AppError> {
    if req.required_access.is_empty() {
        return Err(AppError::Validation(
            "required_access must list at least one permission".to_string(),
        ));
    }

    let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(req.user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", req.user_id)))?;

    let decision = decide_access(&user.access_rights.0, &req.required_access);

    let (message, review_source) = match decision {
        AccessDecision::Denied { missing } => {
            let names: Vec<&str> = missing.iter().map(AccessFlag::as_str).collect();
            return Ok((
                StatusCode::FORBIDDEN,
                Json(AccessValidationResponse {
                    has_access: false,
                    message: format!("Missing permissions: {}", names.join(", ")),
                    user: None,
                    review_source: None,
                }),
            ));
        }
        AccessDecision::Admin => ("Access granted with administrator rights".to_string(), None),
        AccessDecision::Granted => {
            let (review, source) = review_with_llm(&state, &user, &req.required_access).await;
            if let Some(reason) = review {
                return Ok((
                    StatusCode::FORBIDDEN,
                    Json(AccessValidationResponse {
                        has_access: false,
                        message: reason,
                        user: None,
                        review_source: Some(source),
                    }),
                ));
            }
            ("Access granted".to_string(), Some(source))
        }
    };

    record_access(&state, user.id, &req.required_access).await;

    Ok((
        StatusCode::OK,
        Json(AccessValidationResponse {
            has_access: true,
            message,
            user: Some(UserSummary::from(&user)),
            review_source,
        }),
    ))
}

/// Returns `Some(reason)` only when the LLM explicitly rejects the request.
async fn review_with_llm(
    state: &AppState,
    user: &UserRow,
    required: &[AccessFlag],
) -> (Option<String>, ContentSource) {
    let requested: Vec<&str> = required.iter().map(AccessFlag::as_str).collect();
    let prompt = ACCESS_REVIEW_PROMPT
        .replace("{name}", &user.name)
        .replace("{department}", &user.department)
        .replace("{position}", &user.position)
        .replace("{requested}", &requested.join(", "));

    match state
        .llm
        .call_json::<AccessReview>(&prompt, ACCESS_REVIEW_SYSTEM)
        .await
    {
        Ok(review) if !review.is_valid => {
            info!("LLM review denied access for user {}", user.id);
            let reason = if review.reason.trim().is_empty() {
                "Access denied by security review".to_string()
            } else {
                review.reason
            };
            (Some(reason), ContentSource::Llm)
        }
        Ok(_) => (None, ContentSource::Llm),
        Err(e) => {
            warn!("LLM access review unavailable, keeping rule-based decision: {e}");
            (None, ContentSource::Fallback)
        }
    }
}

async fn record_access(state: &AppState, user_id: Uuid, required: &[AccessFlag]) {
    let access_type: Vec<String> = required.iter().map(|f| f.as_str().to_string()).collect();
    let result = sqlx::query(
        "INSERT INTO access_logs (user_id, access_type, granted) VALUES ($1, $2, TRUE)",
    )
    .bind(user_id)
    .bind(&access_type)
    .execute(&state.db)
    .await;

    if let Err(e) = result {
        warn!("Failed to record access log for user {user_id}: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_grants_everything() {
        let rights = AccessRights {
            admin: true,
            ..Default::default()
        };
        let decision = decide_access(&rights, &[AccessFlag::IdeaManagement]);
        assert_eq!(decision, AccessDecision::Admin);
        assert!(decision.is_granted());
    }

    #[test]
    fn test_all_required_flags_must_be_set() {
        let rights = AccessRights {
            skill_management: true,
            ..Default::default()
        };
        let decision = decide_access(
            &rights,
            &[AccessFlag::SkillManagement, AccessFlag::UserManagement],
        );
        assert_eq!(
            decision,
            AccessDecision::Denied {
                missing: vec![AccessFlag::UserManagement]
            }
        );
    }

    #[test]
    fn test_granted_when_every_flag_present() {
        let rights = AccessRights {
            skill_management: true,
            challenge_management: true,
            ..Default::default()
        };
        let decision = decide_access(
            &rights,
            &[AccessFlag::SkillManagement, AccessFlag::ChallengeManagement],
        );
        assert_eq!(decision, AccessDecision::Granted);
    }

    #[test]
    fn test_unknown_flag_rejected_at_deserialization() {
        let parsed = serde_json::from_str::<AccessValidationRequest>(
            r#"{"user_id":"5f0c7c1e-4a55-4c57-9d59-8a2c5e6f0a11","required_access":["root"]}"#,
        );
        assert!(parsed.is_err());
    }
}
