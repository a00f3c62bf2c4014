//! Skill gap analysis: distance between the target level (5) and a
//! department's mean recorded level, per skill.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::analytics::charts::mean;
use crate::models::skill::SkillRow;

pub const TARGET_LEVEL: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn for_gap(gap: f64) -> Self {
        if gap >= 3.0 {
            Priority::High
        } else if gap >= 2.0 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    pub fn recommended_action(&self) -> &'static str {
        match self {
            Priority::High => "Join an intensive training program",
            Priority::Medium => "Take an online learning course",
            Priority::Low => "Use self-learning material",
        }
    }

    pub fn estimated_time(&self) -> &'static str {
        match self {
            Priority::High => "3-6 months",
            Priority::Medium => "2-3 months",
            Priority::Low => "1-2 months",
        }
    }
}

const DEFAULT_RESOURCES: &[&str] = &[
    "In-house training program",
    "Online learning platform",
    "Mentoring program",
];

/// A department member's level for one skill.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct SkillLevel {
    pub skill_id: Uuid,
    pub level: i16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillGap {
    pub skill_id: Uuid,
    pub skill_name: String,
    pub category: String,
    pub required_level: f64,
    pub current_level: f64,
    pub gap: f64,
    pub priority: Priority,
    pub recommended_action: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentSummary {
    pub department_name: String,
    pub average_gap: f64,
    pub critical_skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedAction {
    pub skill_id: Uuid,
    pub skill_name: String,
    pub priority: Priority,
    pub action: String,
    pub estimated_time: String,
    pub resources: Vec<String>,
}

pub fn analyze_gaps(skills: &[SkillRow], levels: &[SkillLevel]) -> Vec<SkillGap> {
    skills
        .iter()
        .map(|skill| {
            let held: Vec<f64> = levels
                .iter()
                .filter(|l| l.skill_id == skill.id)
                .map(|l| f64::from(l.level))
                .collect();
            let current_level = mean(&held);
            let gap = TARGET_LEVEL - current_level;
            let priority = Priority::for_gap(gap);
            SkillGap {
                skill_id: skill.id,
                skill_name: skill.name.clone(),
                category: skill.category.clone(),
                required_level: TARGET_LEVEL,
                current_level,
                gap,
                priority,
                recommended_action: priority.recommended_action().to_string(),
            }
        })
        .collect()
}

pub fn summarize(department: &str, gaps: &[SkillGap]) -> DepartmentSummary {
    let all_gaps: Vec<f64> = gaps.iter().map(|g| g.gap).collect();
    DepartmentSummary {
        department_name: department.to_string(),
        average_gap: mean(&all_gaps),
        critical_skills: gaps
            .iter()
            .filter(|g| g.priority == Priority::High)
            .map(|g| g.skill_name.clone())
            .collect(),
    }
}

pub fn recommended_actions(gaps: &[SkillGap]) -> Vec<RecommendedAction> {
    gaps.iter()
        .map(|g| RecommendedAction {
            skill_id: g.skill_id,
            skill_name: g.skill_name.clone(),
            priority: g.priority,
            action: g.recommended_action.clone(),
            estimated_time: g.priority.estimated_time().to_string(),
            resources: DEFAULT_RESOURCES.iter().map(|r| r.to_string()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn skill(name: &str) -> SkillRow {
        SkillRow {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: "Programming".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_priority_thresholds() {
        assert_eq!(Priority::for_gap(5.0), Priority::High);
        assert_eq!(Priority::for_gap(3.0), Priority::High);
        assert_eq!(Priority::for_gap(2.99), Priority::Medium);
        assert_eq!(Priority::for_gap(2.0), Priority::Medium);
        assert_eq!(Priority::for_gap(1.5), Priority::Low);
        assert_eq!(Priority::for_gap(0.0), Priority::Low);
    }

    #[test]
    fn test_unheld_skill_has_full_gap() {
        let rust = skill("Rust");
        let gaps = analyze_gaps(std::slice::from_ref(&rust), &[]);
        assert_eq!(gaps[0].current_level, 0.0);
        assert_eq!(gaps[0].gap, 5.0);
        assert_eq!(gaps[0].priority, Priority::High);
    }

    #[test]
    fn test_gap_uses_mean_level() {
        let sql = skill("SQL");
        let levels = vec![
            SkillLevel { skill_id: sql.id, level: 2 },
            SkillLevel { skill_id: sql.id, level: 4 },
            SkillLevel { skill_id: Uuid::new_v4(), level: 5 },
        ];
        let gaps = analyze_gaps(std::slice::from_ref(&sql), &levels);
        assert_eq!(gaps[0].current_level, 3.0);
        assert_eq!(gaps[0].gap, 2.0);
        assert_eq!(gaps[0].priority, Priority::Medium);
        assert_eq!(gaps[0].recommended_action, "Take an online learning course");
    }

    #[test]
    fn test_summary_lists_critical_skills_and_average() {
        let rust = skill("Rust");
        let sql = skill("SQL");
        let levels = vec![SkillLevel { skill_id: sql.id, level: 4 }];
        let gaps = analyze_gaps(&[rust, sql], &levels);
        let summary = summarize("Engineering", &gaps);
        assert_eq!(summary.critical_skills, vec!["Rust".to_string()]);
        assert_eq!(summary.average_gap, 3.0);
    }

    #[test]
    fn test_summary_of_no_skills_has_zero_average() {
        let summary = summarize("Sales", &[]);
        assert_eq!(summary.average_gap, 0.0);
        assert!(summary.critical_skills.is_empty());
    }

    #[test]
    fn test_recommended_actions_follow_priority() {
        let gaps = analyze_gaps(&[skill("Go")], &[]);
        let actions = recommended_actions(&gaps);
        assert_eq!(actions[0].estimated_time, "3-6 months");
        assert_eq!(actions[0].resources.len(), 3);
    }
}
