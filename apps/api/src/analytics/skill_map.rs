//! Skill map aggregation: mean skill level per (department, category).

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::analytics::charts::{mean, round1, ChartData, Dataset};

pub const SKILL_MAP_LABEL: &str = "Average skill level";
const SKILL_MAP_BACKGROUND: &str = "rgba(44, 82, 130, 0.2)";
const SKILL_MAP_BORDER: &str = "rgba(44, 82, 130, 1)";

#[derive(Debug, Clone, FromRow)]
pub struct MapUser {
    pub id: Uuid,
    pub department: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct MapSkill {
    pub id: Uuid,
    pub category: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct MapUserSkill {
    pub user_id: Uuid,
    pub skill_id: Uuid,
    pub level: i16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct LevelTotal {
    total: f64,
    count: usize,
}

impl LevelTotal {
    fn add(&mut self, level: i16) {
        self.total += f64::from(level);
        self.count += 1;
    }

    fn merge(&mut self, other: LevelTotal) {
        self.total += other.total;
        self.count += other.count;
    }

    fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            round1(self.total / self.count as f64)
        }
    }
}

/// Department → category → totals. Every in-scope user's department appears,
/// even when its members hold no in-scope skills.
pub struct SkillAggregate {
    by_department: BTreeMap<String, BTreeMap<String, LevelTotal>>,
    categories: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillMapSummary {
    pub skill_map_data: ChartData,
    pub department_count: usize,
    pub total_users: usize,
    pub average_skill_level: f64,
}

pub fn aggregate(users: &[MapUser], skills: &[MapSkill], user_skills: &[MapUserSkill]) -> SkillAggregate {
    let category_of: HashMap<Uuid, &str> = skills.iter().map(|s| (s.id, s.category.as_str())).collect();
    let department_of: HashMap<Uuid, &str> = users.iter().map(|u| (u.id, u.department.as_str())).collect();

    let mut by_department: BTreeMap<String, BTreeMap<String, LevelTotal>> = BTreeMap::new();
    for user in users {
        by_department.entry(user.department.clone()).or_default();
    }

    for us in user_skills {
        let (Some(department), Some(category)) =
            (department_of.get(&us.user_id), category_of.get(&us.skill_id))
        else {
            continue;
        };
        by_department
            .entry(department.to_string())
            .or_default()
            .entry(category.to_string())
            .or_default()
            .add(us.level);
    }

    SkillAggregate {
        by_department,
        categories: skills.iter().map(|s| s.category.clone()).collect(),
    }
}

impl SkillAggregate {
    /// `None` aggregates across every department; labels are then all in-scope
    /// categories, including ones nobody holds (value 0).
    pub fn chart(&self, department: Option<&str>) -> (Vec<String>, Vec<f64>) {
        match department {
            None => {
                let labels: Vec<String> = self.categories.iter().cloned().collect();
                let data = labels
                    .iter()
                    .map(|category| {
                        let mut combined = LevelTotal::default();
                        for totals in self.by_department.values() {
                            if let Some(t) = totals.get(category) {
                                combined.merge(*t);
                            }
                        }
                        combined.average()
                    })
                    .collect();
                (labels, data)
            }
            Some(name) => match self.by_department.get(name) {
                Some(totals) => (
                    totals.keys().cloned().collect(),
                    totals.values().map(LevelTotal::average).collect(),
                ),
                None => (vec![], vec![]),
            },
        }
    }

    pub fn department_count(&self) -> usize {
        self.by_department.len()
    }
}

pub fn build_summary(
    users: &[MapUser],
    skills: &[MapSkill],
    user_skills: &[MapUserSkill],
    department: Option<&str>,
) -> SkillMapSummary {
    let aggregate = aggregate(users, skills, user_skills);
    let (labels, data) = aggregate.chart(department);
    let average_skill_level = round1(mean(&data));

    let mut dataset = Dataset::new(SKILL_MAP_LABEL, data);
    dataset.background_color = Some(SKILL_MAP_BACKGROUND.to_string());
    dataset.border_color = Some(SKILL_MAP_BORDER.to_string());
    dataset.border_width = Some(2);

    SkillMapSummary {
        skill_map_data: ChartData {
            labels,
            datasets: vec![dataset],
        },
        department_count: aggregate.department_count(),
        total_users: users.len(),
        average_skill_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        users: Vec<MapUser>,
        skills: Vec<MapSkill>,
        user_skills: Vec<MapUserSkill>,
    }

    fn fixture() -> Fixture {
        let dev1 = Uuid::new_v4();
        let dev2 = Uuid::new_v4();
        let sales = Uuid::new_v4();
        let rust = Uuid::new_v4();
        let sql = Uuid::new_v4();
        let negotiation = Uuid::new_v4();
        let design = Uuid::new_v4();
        Fixture {
            users: vec![
                MapUser { id: dev1, department: "Engineering".into() },
                MapUser { id: dev2, department: "Engineering".into() },
                MapUser { id: sales, department: "Sales".into() },
            ],
            skills: vec![
                MapSkill { id: rust, category: "Programming".into() },
                MapSkill { id: sql, category: "Database".into() },
                MapSkill { id: negotiation, category: "Communication".into() },
                MapSkill { id: design, category: "Design".into() },
            ],
            user_skills: vec![
                MapUserSkill { user_id: dev1, skill_id: rust, level: 4 },
                MapUserSkill { user_id: dev2, skill_id: rust, level: 3 },
                MapUserSkill { user_id: dev1, skill_id: sql, level: 3 },
                MapUserSkill { user_id: sales, skill_id: negotiation, level: 5 },
                MapUserSkill { user_id: sales, skill_id: rust, level: 2 },
            ],
        }
    }

    #[test]
    fn test_all_departments_covers_every_category() {
        let f = fixture();
        let summary = build_summary(&f.users, &f.skills, &f.user_skills, None);
        let chart = &summary.skill_map_data;
        assert_eq!(
            chart.labels,
            vec!["Communication", "Database", "Design", "Programming"]
        );
        // Programming: (4 + 3 + 2) / 3 = 3.0; Design unheld → 0
        assert_eq!(chart.datasets[0].data, vec![5.0, 3.0, 0.0, 3.0]);
        assert_eq!(summary.department_count, 2);
        assert_eq!(summary.total_users, 3);
        // (5 + 3 + 0 + 3) / 4 = 2.75 → 2.8
        assert_eq!(summary.average_skill_level, 2.8);
    }

    #[test]
    fn test_single_department_only_lists_held_categories() {
        let f = fixture();
        let summary = build_summary(&f.users, &f.skills, &f.user_skills, Some("Engineering"));
        let chart = &summary.skill_map_data;
        assert_eq!(chart.labels, vec!["Database", "Programming"]);
        assert_eq!(chart.datasets[0].data, vec![3.0, 3.5]);
        assert_eq!(summary.average_skill_level, 3.3);
    }

    #[test]
    fn test_unknown_department_yields_empty_chart() {
        let f = fixture();
        let summary = build_summary(&f.users, &f.skills, &f.user_skills, Some("Legal"));
        assert!(summary.skill_map_data.labels.is_empty());
        assert!(summary.skill_map_data.datasets[0].data.is_empty());
        assert_eq!(summary.average_skill_level, 0.0);
    }

    #[test]
    fn test_skills_outside_category_scope_are_ignored() {
        let f = fixture();
        let programming_only: Vec<MapSkill> = f
            .skills
            .iter()
            .filter(|s| s.category == "Programming")
            .cloned()
            .collect();
        let summary = build_summary(&f.users, &programming_only, &f.user_skills, Some("Sales"));
        assert_eq!(summary.skill_map_data.labels, vec!["Programming"]);
        assert_eq!(summary.skill_map_data.datasets[0].data, vec![2.0]);
    }
}
