//! Axum route handlers for the Matching API.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::listing::{like_pattern, optional_filter};
use crate::llm_client::ContentSource;
use crate::matching::prompts::{
    MATCH_EXPLANATION_FALLBACK, MATCH_EXPLANATION_PROMPT, MATCH_EXPLANATION_SYSTEM,
    TEAM_RATIONALE_FALLBACK, TEAM_RATIONALE_PROMPT, TEAM_RATIONALE_SYSTEM,
};
use crate::matching::scoring::{HeldSkill, SkillRequirement, SkillScorer};
use crate::models::matching::MatchRow;
use crate::models::skill::{validate_level, SkillRow, UserSkillDetail};
use crate::models::user::{UserRow, UserSummary};
use crate::state::AppState;

/// Number of candidates returned by skill-match.
const TOP_RESULTS: usize = 10;
const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 500;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SkillMatchRequest {
    pub search_type: String,
    pub skill_keywords: String,
    pub minimum_level: Option<i16>,
    pub department: Option<String>,
    pub target_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedSkill {
    pub name: String,
    pub level: i16,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchingResult {
    pub id: Uuid,
    pub name: String,
    pub department: String,
    pub match_score: u32,
    pub skills: Vec<MatchedSkill>,
}

#[derive(Debug, Serialize)]
pub struct SkillMatchResponse {
    pub results: Vec<MatchingResult>,
    pub explanation: String,
    pub explanation_source: ContentSource,
    pub scorer_backend: String,
}

#[derive(Debug, Deserialize)]
pub struct TeamOptimizationRequest {
    pub project_name: String,
    pub required_skills: Vec<String>,
    pub team_size: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MatchHistoryQuery {
    pub user_id: Option<Uuid>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamMember {
    pub user: UserSummary,
    pub skills: Vec<UserSkillDetail>,
    /// 0.0 – 1.0
    pub match_score: f64,
}

#[derive(Debug, Serialize)]
pub struct TeamOptimizationResponse {
    pub team: Vec<TeamMember>,
    pub missing_skills: Vec<String>,
    pub rationale: String,
    pub rationale_source: ContentSource,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/matching/skill-match
///
/// Scores every user in scope against the skills whose name contains the
/// keywords, persists one `matches` row per candidate and returns the top 10.
pub async fn handle_skill_match(
    State(state): State<AppState>,
    Json(req): Json<SkillMatchRequest>,
) -> Result<Json<SkillMatchResponse>, AppError> {
    let keywords = req.skill_keywords.trim();
    if keywords.is_empty() {
        return Err(AppError::Validation(
            "skill_keywords cannot be empty".to_string(),
        ));
    }
    if req.search_type.trim().is_empty() {
        return Err(AppError::Validation("search_type cannot be empty".to_string()));
    }
    let minimum_level = validate_level("minimum_level", req.minimum_level.unwrap_or(1))?;
    let department = optional_filter(req.department.as_deref());

    let skills = sqlx::query_as::<_, SkillRow>(
        "SELECT * FROM skills WHERE name ILIKE $1 ORDER BY name",
    )
    .bind(like_pattern(keywords))
    .fetch_all(&state.db)
    .await?;

    let requirements: Vec<SkillRequirement> = skills
        .iter()
        .map(|s| SkillRequirement {
            skill_id: s.id,
            minimum_level,
        })
        .collect();

    let (users, user_skills) = tokio::try_join!(
        load_users(&state, department.as_deref()),
        load_user_skills(&state, department.as_deref()),
    )?;
    let held_by_user = group_held_skills(&user_skills);

    let results = score_candidates(
        state.skill_scorer.as_ref(),
        &users,
        &held_by_user,
        &requirements,
    )
    .await;

    persist_matches(&state, &req.search_type, req.target_id.as_deref(), &results).await?;

    let results = rank_results(results);
    info!(
        "Skill match '{}' scored {} candidates against {} skills",
        keywords,
        results.len(),
        skills.len()
    );

    let (explanation, explanation_source) = if results.is_empty() {
        (
            "No employees hold a skill matching the requested keywords.".to_string(),
            ContentSource::Fallback,
        )
    } else {
        let candidates_json = serde_json::to_string_pretty(&results).unwrap_or_default();
        let prompt = MATCH_EXPLANATION_PROMPT
            .replace("{keywords}", keywords)
            .replace("{minimum_level}", &minimum_level.to_string())
            .replace("{candidates_json}", &candidates_json);
        state
            .llm
            .text_or_fallback(
                "match explanation",
                &prompt,
                MATCH_EXPLANATION_SYSTEM,
                MATCH_EXPLANATION_FALLBACK,
            )
            .await
    };

    Ok(Json(SkillMatchResponse {
        results,
        explanation,
        explanation_source,
        scorer_backend: state.skill_scorer.backend().to_string(),
    }))
}

/// POST /api/v1/matching/team-optimization
///
/// Picks the `team_size` candidates with the best coverage of the required skills.
pub async fn handle_team_optimization(
    State(state): State<AppState>,
    Json(req): Json<TeamOptimizationRequest>,
) -> Result<Json<TeamOptimizationResponse>, AppError> {
    if req.team_size == 0 {
        return Err(AppError::Validation("team_size must be at least 1".to_string()));
    }
    let required_names: Vec<String> = req
        .required_skills
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if required_names.is_empty() {
        return Err(AppError::Validation(
            "required_skills must list at least one skill".to_string(),
        ));
    }

    let skills = sqlx::query_as::<_, SkillRow>("SELECT * FROM skills WHERE name = ANY($1)")
        .bind(&required_names)
        .fetch_all(&state.db)
        .await?;
    let skill_ids: Vec<Uuid> = skills.iter().map(|s| s.id).collect();
    let missing_skills: Vec<String> = required_names
        .iter()
        .filter(|name| !skills.iter().any(|s| &s.name == *name))
        .cloned()
        .collect();

    let details = sqlx::query_as::<_, UserSkillDetail>(
        r#"
        SELECT us.user_id, us.skill_id, s.name AS skill_name, us.level, us.years_of_experience
        FROM user_skills us
        JOIN skills s ON s.id = us.skill_id
        WHERE us.skill_id = ANY($1)
        "#,
    )
    .bind(&skill_ids)
    .fetch_all(&state.db)
    .await?;

    let candidate_ids: Vec<Uuid> = group_held_skills(&details).into_keys().collect();
    let users = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ANY($1)")
        .bind(&candidate_ids)
        .fetch_all(&state.db)
        .await?;

    let mut candidates = Vec::with_capacity(users.len());
    for user in &users {
        let user_details: Vec<UserSkillDetail> = details
            .iter()
            .filter(|d| d.user_id == user.id)
            .cloned()
            .collect();
        let held: Vec<HeldSkill> = user_details.iter().map(held_skill).collect();
        let match_score = state.skill_scorer.team_fit(&held, &skill_ids).await;
        candidates.push(TeamMember {
            user: UserSummary::from(user),
            skills: user_details,
            match_score,
        });
    }

    let team = select_team(candidates, req.team_size);

    let (rationale, rationale_source) = if team.is_empty() {
        (
            "No employees hold any of the required skills.".to_string(),
            ContentSource::Fallback,
        )
    } else {
        let team_json = serde_json::to_string_pretty(&team).unwrap_or_default();
        let prompt = TEAM_RATIONALE_PROMPT
            .replace("{project_name}", &req.project_name)
            .replace("{required_skills}", &required_names.join(", "))
            .replace("{team_size}", &req.team_size.to_string())
            .replace("{team_json}", &team_json);
        state
            .llm
            .text_or_fallback(
                "team rationale",
                &prompt,
                TEAM_RATIONALE_SYSTEM,
                TEAM_RATIONALE_FALLBACK,
            )
            .await
    };

    Ok(Json(TeamOptimizationResponse {
        team,
        missing_skills,
        rationale,
        rationale_source,
    }))
}

/// GET /api/v1/matching/history?user_id=&limit=
///
/// Stored match rows, newest first. `match_score` is on the stored 0–1 scale.
pub async fn handle_match_history(
    State(state): State<AppState>,
    Query(query): Query<MatchHistoryQuery>,
) -> Result<Json<Vec<MatchRow>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT);
    let rows = sqlx::query_as::<_, MatchRow>(
        r#"
        SELECT * FROM matches
        WHERE ($1::uuid IS NULL OR user_id = $1)
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(query.user_id)
    .bind(limit)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn load_users(state: &AppState, department: Option<&str>) -> Result<Vec<UserRow>, AppError> {
    Ok(sqlx::query_as::<_, UserRow>(
        "SELECT * FROM users WHERE ($1::text IS NULL OR department = $1) ORDER BY name",
    )
    .bind(department)
    .fetch_all(&state.db)
    .await?)
}

async fn load_user_skills(
    state: &AppState,
    department: Option<&str>,
) -> Result<Vec<UserSkillDetail>, AppError> {
    Ok(sqlx::query_as::<_, UserSkillDetail>(
        r#"
        SELECT us.user_id, us.skill_id, s.name AS skill_name, us.level, us.years_of_experience
        FROM user_skills us
        JOIN skills s ON s.id = us.skill_id
        JOIN users u ON u.id = us.user_id
        WHERE ($1::text IS NULL OR u.department = $1)
        "#,
    )
    .bind(department)
    .fetch_all(&state.db)
    .await?)
}

/// One transaction for the whole batch. Scores are stored on a 0–1 scale.
async fn persist_matches(
    state: &AppState,
    target_type: &str,
    target_id: Option<&str>,
    results: &[MatchingResult],
) -> Result<(), AppError> {
    if results.is_empty() {
        return Ok(());
    }
    let mut tx = state.db.begin().await?;
    for result in results {
        sqlx::query(
            "INSERT INTO matches (user_id, target_type, target_id, match_score) VALUES ($1, $2, $3, $4)",
        )
        .bind(result.id)
        .bind(target_type)
        .bind(target_id)
        .bind(stored_match_score(result.match_score))
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Scores users holding at least one required skill. Everyone else is left out.
async fn score_candidates(
    scorer: &dyn SkillScorer,
    users: &[UserRow],
    held_by_user: &HashMap<Uuid, Vec<HeldSkill>>,
    requirements: &[SkillRequirement],
) -> Vec<MatchingResult> {
    let mut results = Vec::new();
    for user in users {
        let held = held_by_user.get(&user.id).map(Vec::as_slice).unwrap_or(&[]);
        if !held
            .iter()
            .any(|h| requirements.iter().any(|r| r.skill_id == h.skill_id))
        {
            continue;
        }
        let match_score = scorer.match_score(held, requirements).await;
        results.push(MatchingResult {
            id: user.id,
            name: user.name.clone(),
            department: user.department.clone(),
            match_score,
            skills: held
                .iter()
                .map(|h| MatchedSkill {
                    name: h.name.clone(),
                    level: h.level,
                })
                .collect(),
        });
    }
    results
}

/// API scores are 0–100, `matches.match_score` is 0–1.
fn stored_match_score(match_score: u32) -> f64 {
    f64::from(match_score) / 100.0
}

fn held_skill(detail: &UserSkillDetail) -> HeldSkill {
    HeldSkill {
        skill_id: detail.skill_id,
        name: detail.skill_name.clone(),
        level: detail.level,
    }
}

fn group_held_skills(details: &[UserSkillDetail]) -> HashMap<Uuid, Vec<HeldSkill>> {
    let mut grouped: HashMap<Uuid, Vec<HeldSkill>> = HashMap::new();
    for detail in details {
        grouped
            .entry(detail.user_id)
            .or_default()
            .push(held_skill(detail));
    }
    grouped
}

/// Highest score first, ties by name, capped at `TOP_RESULTS`.
fn rank_results(mut results: Vec<MatchingResult>) -> Vec<MatchingResult> {
    results.sort_by(|a, b| {
        b.match_score
            .cmp(&a.match_score)
            .then_with(|| a.name.cmp(&b.name))
    });
    results.truncate(TOP_RESULTS);
    results
}

fn select_team(mut candidates: Vec<TeamMember>, team_size: usize) -> Vec<TeamMember> {
    candidates.retain(|c| c.match_score > 0.0);
    candidates.sort_by(|a, b| {
        b.match_score
            .total_cmp(&a.match_score)
            .then_with(|| a.user.name.cmp(&b.user.name))
    });
    candidates.truncate(team_size);
    candidates
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::scoring::LevelDeltaScorer;
    use crate::models::user::AccessRights;
    use chrono::Utc;
    use serde_json::json;

    fn user(name: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            employee_id: format!("E-{name}"),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            department: "Engineering".to_string(),
            position: "Engineer".to_string(),
            hire_date: None,
            profile_data: json!({}),
            access_rights: sqlx::types::Json(AccessRights::default()),
            password_hash: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn result(name: &str, score: u32) -> MatchingResult {
        MatchingResult {
            id: Uuid::new_v4(),
            name: name.to_string(),
            department: "Engineering".to_string(),
            match_score: score,
            skills: vec![],
        }
    }

    fn member(name: &str, score: f64) -> TeamMember {
        TeamMember {
            user: UserSummary {
                id: Uuid::new_v4(),
                name: name.to_string(),
                department: "Engineering".to_string(),
                position: "Engineer".to_string(),
            },
            skills: vec![],
            match_score: score,
        }
    }

    #[test]
    fn test_rank_results_sorts_desc_and_caps_at_ten() {
        let results: Vec<_> = (0..15).map(|i| result(&format!("u{i:02}"), i * 5)).collect();
        let ranked = rank_results(results);
        assert_eq!(ranked.len(), TOP_RESULTS);
        assert_eq!(ranked[0].match_score, 70);
        assert!(ranked.windows(2).all(|w| w[0].match_score >= w[1].match_score));
    }

    #[test]
    fn test_rank_results_breaks_ties_by_name() {
        let ranked = rank_results(vec![result("Suzuki", 80), result("Abe", 80)]);
        assert_eq!(ranked[0].name, "Abe");
    }

    #[test]
    fn test_select_team_drops_zero_scores_and_truncates() {
        let team = select_team(
            vec![
                member("C", 0.4),
                member("A", 0.9),
                member("Z", 0.0),
                member("B", 0.9),
            ],
            2,
        );
        let names: Vec<_> = team.iter().map(|m| m.user.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_group_held_skills_by_user() {
        let user = Uuid::new_v4();
        let details = vec![
            UserSkillDetail {
                user_id: user,
                skill_id: Uuid::new_v4(),
                skill_name: "Rust".to_string(),
                level: 4,
                years_of_experience: 3,
            },
            UserSkillDetail {
                user_id: user,
                skill_id: Uuid::new_v4(),
                skill_name: "SQL".to_string(),
                level: 2,
                years_of_experience: 1,
            },
        ];
        let grouped = group_held_skills(&details);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[&user].len(), 2);
        assert_eq!(grouped[&user][0].name, "Rust");
    }

    #[tokio::test]
    async fn test_score_candidates_skips_users_without_required_skills() {
        let rust = Uuid::new_v4();
        let sql = Uuid::new_v4();
        let holder = user("Mika");
        let outsider = user("Aoi");
        let skill_less = user("Ren");

        let mut held_by_user = HashMap::new();
        held_by_user.insert(
            holder.id,
            vec![HeldSkill {
                skill_id: rust,
                name: "Rust".to_string(),
                level: 4,
            }],
        );
        held_by_user.insert(
            outsider.id,
            vec![HeldSkill {
                skill_id: sql,
                name: "SQL".to_string(),
                level: 5,
            }],
        );
        let requirements = [SkillRequirement {
            skill_id: rust,
            minimum_level: 3,
        }];

        let results = score_candidates(
            &LevelDeltaScorer,
            &[holder.clone(), outsider, skill_less],
            &held_by_user,
            &requirements,
        )
        .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, holder.id);
        assert_eq!(results[0].match_score, 80);
        assert_eq!(
            results[0].skills,
            vec![MatchedSkill {
                name: "Rust".to_string(),
                level: 4
            }]
        );
    }

    #[tokio::test]
    async fn test_score_candidates_without_requirements_is_empty() {
        let holder = user("Mika");
        let mut held_by_user = HashMap::new();
        held_by_user.insert(
            holder.id,
            vec![HeldSkill {
                skill_id: Uuid::new_v4(),
                name: "Rust".to_string(),
                level: 4,
            }],
        );
        let results = score_candidates(&LevelDeltaScorer, &[holder], &held_by_user, &[]).await;
        assert!(results.is_empty());
    }

    #[test]
    fn test_stored_match_score_uses_unit_scale() {
        assert_eq!(stored_match_score(100), 1.0);
        assert_eq!(stored_match_score(0), 0.0);
        assert!((stored_match_score(85) - 0.85).abs() < 1e-9);
    }
}
