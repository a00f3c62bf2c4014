//! Axum route handlers for the Analytics API.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analytics::charts::ChartData;
use crate::analytics::prompts::{
    ANALYST_SYSTEM, KPI_PROMPT, SKILL_GAP_FALLBACK, SKILL_GAP_PROMPT, SKILL_MAP_FALLBACK,
    SKILL_MAP_PROMPT, SYNERGY_PERSONA, SYNERGY_PROMPT, TALENT_FALLBACK, TALENT_PROMPT,
};
use crate::analytics::skill_gap::{
    analyze_gaps, recommended_actions, summarize as summarize_gaps, DepartmentSummary,
    RecommendedAction, SkillGap, SkillLevel,
};
use crate::analytics::skill_map::{build_summary, MapSkill, MapUser, MapUserSkill, SkillMapSummary};
use crate::analytics::synergy::{
    baseline, DepartmentMatch, Period, SynergyBaseline, SynergySummary, Window,
};
use crate::analytics::talent::{
    build_records, clamp_period, department_analysis, organisation_trend,
    summarize as summarize_talent, DepartmentAnalysis, MonthlyPoint, TalentLevel, TalentMatch,
    TalentRecord, TalentSummary, TalentUser,
};
use crate::errors::AppError;
use crate::listing::optional_filter;
use crate::llm_client::prompts::{json_system, CONCISE_INSTRUCTION};
use crate::llm_client::{ContentSource, LlmClient};
use crate::models::skill::SkillRow;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SkillGapRequest {
    pub department: String,
}

#[derive(Debug, Serialize)]
pub struct SkillGapResponse {
    pub skill_gaps: Vec<SkillGap>,
    pub department_summary: DepartmentSummary,
    pub recommended_actions: Vec<RecommendedAction>,
    pub ai_recommendations: String,
    pub ai_source: ContentSource,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SkillMapRequest {
    pub department: Option<String>,
    pub skill_category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SkillMapResponse {
    #[serde(flatten)]
    pub summary: SkillMapSummary,
    pub ai_analysis: String,
    pub ai_source: ContentSource,
}

#[derive(Debug, Deserialize)]
pub struct SynergyRequest {
    pub period: String,
    #[serde(default)]
    pub departments: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SynergyResponse {
    pub period: Period,
    pub window: Window,
    pub summary: SynergySummary,
    pub kpi_data: ChartData,
    pub kpi_source: ContentSource,
    pub synergy_data: ChartData,
    pub synergy_source: ContentSource,
}

#[derive(Debug, Deserialize)]
pub struct TalentQuery {
    pub department: Option<String>,
    pub period: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct GrowthAnalysis {
    pub trends: Vec<MonthlyPoint>,
    pub ai_insights: String,
    pub ai_source: ContentSource,
}

#[derive(Debug, Serialize)]
pub struct TalentResponse {
    pub talent_data: Vec<TalentRecord>,
    pub department_analysis: Vec<DepartmentAnalysis>,
    pub growth_analysis: GrowthAnalysis,
    pub summary: TalentSummary,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analytics/skill-gap
pub async fn handle_skill_gap(
    State(state): State<AppState>,
    Json(req): Json<SkillGapRequest>,
) -> Result<Json<SkillGapResponse>, AppError> {
    let department = req.department.trim();
    if department.is_empty() {
        return Err(AppError::Validation("department cannot be empty".to_string()));
    }

    let (skills, levels) = tokio::try_join!(
        async {
            sqlx::query_as::<_, SkillRow>("SELECT * FROM skills ORDER BY category, name")
                .fetch_all(&state.db)
                .await
        },
        async {
            sqlx::query_as::<_, SkillLevel>(
                r#"
                SELECT us.skill_id, us.level
                FROM user_skills us
                JOIN users u ON u.id = us.user_id
                WHERE u.department = $1
                "#,
            )
            .bind(department)
            .fetch_all(&state.db)
            .await
        },
    )?;

    let skill_gaps = analyze_gaps(&skills, &levels);
    let department_summary = summarize_gaps(department, &skill_gaps);
    let actions = recommended_actions(&skill_gaps);
    info!(
        "Skill gap for '{}': {} skills, {} critical",
        department,
        skill_gaps.len(),
        department_summary.critical_skills.len()
    );

    let prompt = SKILL_GAP_PROMPT
        .replace("{department}", department)
        .replace(
            "{summary_json}",
            &serde_json::to_string_pretty(&department_summary).unwrap_or_default(),
        )
        .replace(
            "{gaps_json}",
            &serde_json::to_string_pretty(&skill_gaps).unwrap_or_default(),
        );
    let (ai_recommendations, ai_source) = state
        .llm
        .text_or_fallback(
            "skill gap recommendations",
            &format!("{prompt}\n\n{CONCISE_INSTRUCTION}"),
            ANALYST_SYSTEM,
            SKILL_GAP_FALLBACK,
        )
        .await;

    Ok(Json(SkillGapResponse {
        skill_gaps,
        department_summary,
        recommended_actions: actions,
        ai_recommendations,
        ai_source,
    }))
}

/// POST /api/v1/analytics/skill-map
pub async fn handle_skill_map(
    State(state): State<AppState>,
    Json(req): Json<SkillMapRequest>,
) -> Result<Json<SkillMapResponse>, AppError> {
    let department = optional_filter(req.department.as_deref());
    let category = optional_filter(req.skill_category.as_deref());

    let (users, skills, user_skills) = tokio::try_join!(
        async {
            sqlx::query_as::<_, MapUser>(
                "SELECT id, department FROM users WHERE ($1::text IS NULL OR department = $1)",
            )
            .bind(department.as_deref())
            .fetch_all(&state.db)
            .await
        },
        async {
            sqlx::query_as::<_, MapSkill>(
                "SELECT id, category FROM skills WHERE ($1::text IS NULL OR category = $1)",
            )
            .bind(category.as_deref())
            .fetch_all(&state.db)
            .await
        },
        async {
            sqlx::query_as::<_, MapUserSkill>("SELECT user_id, skill_id, level FROM user_skills")
                .fetch_all(&state.db)
                .await
        },
    )?;

    let summary = build_summary(&users, &skills, &user_skills, department.as_deref());

    let (ai_analysis, ai_source) = if summary.skill_map_data.labels.is_empty() {
        (
            "No skill data is recorded for this selection.".to_string(),
            ContentSource::Fallback,
        )
    } else {
        let prompt = SKILL_MAP_PROMPT
            .replace("{department}", department.as_deref().unwrap_or("all"))
            .replace("{category}", category.as_deref().unwrap_or("all"))
            .replace(
                "{chart_json}",
                &serde_json::to_string_pretty(&summary.skill_map_data).unwrap_or_default(),
            );
        state
            .llm
            .text_or_fallback(
                "skill map analysis",
                &format!("{prompt}\n\n{CONCISE_INSTRUCTION}"),
                ANALYST_SYSTEM,
                SKILL_MAP_FALLBACK,
            )
            .await
    };

    Ok(Json(SkillMapResponse {
        summary,
        ai_analysis,
        ai_source,
    }))
}

/// POST /api/v1/analytics/synergy
///
/// The summary is always computed from stored matches. The two charts come
/// from the LLM when it returns a well-formed chart, otherwise from the matches.
pub async fn handle_synergy(
    State(state): State<AppState>,
    Json(req): Json<SynergyRequest>,
) -> Result<Json<SynergyResponse>, AppError> {
    let period = Period::parse(&req.period)?;
    let departments: Vec<String> = req
        .departments
        .iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();

    let current = Window::current(period, Utc::now());
    let previous = current.previous();

    // `departments` narrows only the pairwise chart; the summary covers every match.
    let matches = sqlx::query_as::<_, DepartmentMatch>(
        r#"
        SELECT u.department, m.target_type, m.target_id, m.match_score, m.created_at
        FROM matches m
        JOIN users u ON u.id = m.user_id
        WHERE m.created_at >= $1 AND m.created_at <= $2
        ORDER BY m.created_at
        "#,
    )
    .bind(previous.start)
    .bind(current.end)
    .fetch_all(&state.db)
    .await?;

    let SynergyBaseline {
        summary,
        kpi: fallback_kpi,
        synergy: fallback_synergy,
    } = baseline(&matches, &current, &departments);

    let system = json_system(SYNERGY_PERSONA);
    let kpi_prompt = KPI_PROMPT
        .replace("{start}", &current.start.format("%Y-%m-%d").to_string())
        .replace("{end}", &current.end.format("%Y-%m-%d").to_string())
        .replace(
            "{monthly_json}",
            &serde_json::to_string_pretty(&fallback_kpi).unwrap_or_default(),
        );
    let synergy_prompt = SYNERGY_PROMPT
        .replace("{departments}", &fallback_synergy_departments(&departments))
        .replace(
            "{overlap_json}",
            &serde_json::to_string_pretty(&fallback_synergy).unwrap_or_default(),
        );

    let ((kpi_data, kpi_source), (synergy_data, synergy_source)) = tokio::join!(
        chart_or_fallback(&state.llm, "KPI chart", &kpi_prompt, &system, fallback_kpi),
        chart_or_fallback(&state.llm, "synergy chart", &synergy_prompt, &system, fallback_synergy),
    );

    info!(
        "Synergy over {:?}: {} matches, kpi from {:?}, synergy from {:?}",
        period, summary.project_count, kpi_source, synergy_source
    );

    Ok(Json(SynergyResponse {
        period,
        window: current,
        summary,
        kpi_data,
        kpi_source,
        synergy_data,
        synergy_source,
    }))
}

/// GET /api/v1/analytics/talent-utilization?department=&period=
pub async fn handle_talent_utilization(
    State(state): State<AppState>,
    Query(query): Query<TalentQuery>,
) -> Result<Json<TalentResponse>, AppError> {
    let department = optional_filter(query.department.as_deref());
    let period = clamp_period(query.period);
    let now = Utc::now();

    let (users, levels, matches) = tokio::try_join!(
        async {
            sqlx::query_as::<_, TalentUser>(
                "SELECT id, name, department, position FROM users ORDER BY department, name",
            )
            .fetch_all(&state.db)
            .await
        },
        async {
            sqlx::query_as::<_, TalentLevel>("SELECT user_id, level FROM user_skills")
                .fetch_all(&state.db)
                .await
        },
        async {
            sqlx::query_as::<_, TalentMatch>("SELECT user_id, match_score, created_at FROM matches")
                .fetch_all(&state.db)
                .await
        },
    )?;

    let records = build_records(&users, &levels, &matches, now, period);
    let departments = department_analysis(&records);
    let summary = summarize_talent(&records);
    let trends = organisation_trend(&records);

    let prompt = TALENT_PROMPT
        .replace(
            "{summary_json}",
            &serde_json::to_string_pretty(&summary).unwrap_or_default(),
        )
        .replace(
            "{departments_json}",
            &serde_json::to_string_pretty(&departments).unwrap_or_default(),
        )
        .replace(
            "{trend_json}",
            &serde_json::to_string_pretty(&trends).unwrap_or_default(),
        );
    let (ai_insights, ai_source) = state
        .llm
        .text_or_fallback(
            "talent insights",
            &format!("{prompt}\n\n{CONCISE_INSTRUCTION}"),
            ANALYST_SYSTEM,
            TALENT_FALLBACK,
        )
        .await;

    let talent_data = match department.as_deref() {
        Some(name) => records.into_iter().filter(|r| r.department == name).collect(),
        None => records,
    };

    Ok(Json(TalentResponse {
        talent_data,
        department_analysis: departments,
        growth_analysis: GrowthAnalysis {
            trends,
            ai_insights,
            ai_source,
        },
        summary,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn chart_or_fallback(
    llm: &LlmClient,
    purpose: &str,
    prompt: &str,
    system: &str,
    fallback: ChartData,
) -> (ChartData, ContentSource) {
    match llm.call_json::<ChartData>(prompt, system).await {
        Ok(chart) if chart.is_well_formed() => (chart, ContentSource::Llm),
        Ok(_) => {
            warn!("LLM {purpose} was malformed, using fallback");
            (fallback, ContentSource::Fallback)
        }
        Err(e) => {
            warn!("LLM {purpose} unavailable, using fallback: {e}");
            (fallback, ContentSource::Fallback)
        }
    }
}

fn fallback_synergy_departments(departments: &[String]) -> String {
    if departments.is_empty() {
        "all departments".to_string()
    } else {
        departments.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::charts::Dataset;

    fn chart() -> ChartData {
        ChartData {
            labels: vec!["2024-05".into()],
            datasets: vec![Dataset::new("KPI achievement rate", vec![72.0])],
        }
    }

    #[tokio::test]
    async fn test_chart_falls_back_without_llm() {
        let llm = LlmClient::disabled();
        let (data, source) = chart_or_fallback(&llm, "KPI chart", "prompt", "system", chart()).await;
        assert_eq!(source, ContentSource::Fallback);
        assert_eq!(data, chart());
    }

    #[test]
    fn test_synergy_department_label() {
        assert_eq!(fallback_synergy_departments(&[]), "all departments");
        assert_eq!(
            fallback_synergy_departments(&["Eng".to_string(), "Sales".to_string()]),
            "Eng, Sales"
        );
    }

    #[test]
    fn test_skill_map_request_defaults() {
        let req: SkillMapRequest = serde_json::from_str("{}").unwrap();
        assert!(req.department.is_none());
        assert!(req.skill_category.is_none());
    }
}
