//! Candidate scoring: pluggable, trait-based scorer for skill matching and
//! team building.
//!
//! Default: `LevelDeltaScorer` (pure arithmetic, deterministic, no LLM call).
//! `AppState` holds an `Arc<dyn SkillScorer>`, chosen at startup.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Score given to a requirement met exactly at the required level.
const BASE_REQUIREMENT_SCORE: i32 = 70;
/// Points added (or removed) per level above (or below) the requirement.
const POINTS_PER_LEVEL: i32 = 10;
const MAX_LEVEL: f64 = 5.0;

/// A skill a user holds, with the name resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeldSkill {
    pub skill_id: Uuid,
    pub name: String,
    pub level: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub skill_id: Uuid,
    pub minimum_level: i16,
}

/// The scorer trait. Implement this to swap backends without touching
/// the handlers.
#[async_trait]
pub trait SkillScorer: Send + Sync {
    /// Label reported in responses, for transparency.
    fn backend(&self) -> &'static str;

    /// 0–100 match of a user's skills against requirements.
    async fn match_score(&self, held: &[HeldSkill], requirements: &[SkillRequirement]) -> u32;

    /// 0.0–1.0 fit of a candidate for a team needing `required` skills.
    async fn team_fit(&self, held: &[HeldSkill], required: &[Uuid]) -> f64;
}

/// Pure-Rust level-difference scorer.
///
/// Per matched requirement: clamp(0, 100, 70 + (user_level - required_level) * 10).
/// The score is the rounded mean over matched requirements; unmatched
/// requirements are excluded rather than penalised.
pub struct LevelDeltaScorer;

#[async_trait]
impl SkillScorer for LevelDeltaScorer {
    fn backend(&self) -> &'static str {
        "level_delta"
    }

    async fn match_score(&self, held: &[HeldSkill], requirements: &[SkillRequirement]) -> u32 {
        calculate_match_score(held, requirements)
    }

    async fn team_fit(&self, held: &[HeldSkill], required: &[Uuid]) -> f64 {
        calculate_team_fit(held, required)
    }
}

pub fn requirement_score(user_level: i16, required_level: i16) -> i32 {
    let delta = i32::from(user_level) - i32::from(required_level);
    (BASE_REQUIREMENT_SCORE + delta * POINTS_PER_LEVEL).clamp(0, 100)
}

pub fn calculate_match_score(held: &[HeldSkill], requirements: &[SkillRequirement]) -> u32 {
    let contributions: Vec<i32> = requirements
        .iter()
        .filter_map(|req| {
            held.iter()
                .find(|h| h.skill_id == req.skill_id)
                .map(|h| requirement_score(h.level, req.minimum_level))
        })
        .collect();

    if contributions.is_empty() {
        return 0;
    }

    let total: i32 = contributions.iter().sum();
    (f64::from(total) / contributions.len() as f64).round() as u32
}

/// coverage × mean(level of covered skills) / 5, where coverage is the share
/// of distinct required skills the candidate holds.
pub fn calculate_team_fit(held: &[HeldSkill], required: &[Uuid]) -> f64 {
    let required: HashSet<&Uuid> = required.iter().collect();
    if required.is_empty() {
        return 0.0;
    }

    let mut covered = HashSet::new();
    let mut level_sum = 0.0;
    for skill in held.iter().filter(|h| required.contains(&h.skill_id)) {
        if covered.insert(skill.skill_id) {
            level_sum += f64::from(skill.level);
        }
    }

    if covered.is_empty() {
        return 0.0;
    }

    let coverage = covered.len() as f64 / required.len() as f64;
    let mean_level = level_sum / covered.len() as f64;
    (coverage * mean_level / MAX_LEVEL).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(skill_id: Uuid, level: i16) -> HeldSkill {
        HeldSkill {
            skill_id,
            name: "skill".to_string(),
            level,
        }
    }

    fn req(skill_id: Uuid, minimum_level: i16) -> SkillRequirement {
        SkillRequirement {
            skill_id,
            minimum_level,
        }
    }

    #[test]
    fn test_exact_level_scores_seventy() {
        assert_eq!(requirement_score(3, 3), 70);
    }

    #[test]
    fn test_requirement_score_clamps() {
        assert_eq!(requirement_score(5, 1), 100);
        assert_eq!(requirement_score(1, 5), 30);
        assert_eq!(requirement_score(1, 9), 0);
    }

    #[test]
    fn test_match_score_averages_matched_requirements_only() {
        let rust = Uuid::new_v4();
        let sql = Uuid::new_v4();
        let go = Uuid::new_v4();
        let skills = vec![held(rust, 5), held(sql, 2)];
        // rust: 70 + (5-3)*10 = 90, sql: 70 + (2-3)*10 = 60, go unmatched
        let score = calculate_match_score(&skills, &[req(rust, 3), req(sql, 3), req(go, 3)]);
        assert_eq!(score, 75);
    }

    #[test]
    fn test_match_score_rounds_mean() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        // 100 + 100 + 90 = 290 / 3 = 96.67 → 97
        let skills = vec![held(a, 5), held(b, 5), held(c, 5)];
        let score = calculate_match_score(&skills, &[req(a, 1), req(b, 2), req(c, 3)]);
        assert_eq!(score, 97);
    }

    #[test]
    fn test_match_score_zero_without_matches() {
        let skills = vec![held(Uuid::new_v4(), 5)];
        assert_eq!(calculate_match_score(&skills, &[req(Uuid::new_v4(), 1)]), 0);
        assert_eq!(calculate_match_score(&skills, &[]), 0);
    }

    #[test]
    fn test_team_fit_full_coverage_at_max_level() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let fit = calculate_team_fit(&[held(a, 5), held(b, 5)], &[a, b]);
        assert!((fit - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_team_fit_partial_coverage() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        // coverage 0.5, mean level 4 → 0.5 * 0.8 = 0.4
        let fit = calculate_team_fit(&[held(a, 4)], &[a, b]);
        assert!((fit - 0.4).abs() < 1e-9, "fit was {fit}");
    }

    #[test]
    fn test_team_fit_ignores_unrequired_skills_and_duplicates() {
        let a = Uuid::new_v4();
        let fit = calculate_team_fit(&[held(a, 5), held(a, 1), held(Uuid::new_v4(), 5)], &[a]);
        assert!((fit - 1.0).abs() < f64::EPSILON);
        assert_eq!(calculate_team_fit(&[held(a, 5)], &[]), 0.0);
    }

    #[tokio::test]
    async fn test_level_delta_scorer_delegates_to_formula() {
        let a = Uuid::new_v4();
        let scorer = LevelDeltaScorer;
        assert_eq!(scorer.backend(), "level_delta");
        assert_eq!(scorer.match_score(&[held(a, 4)], &[req(a, 2)]).await, 90);
    }
}
