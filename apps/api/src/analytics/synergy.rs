//! Cross-department synergy: period windows, match-volume summary and the
//! deterministic KPI / synergy charts used when the LLM is unavailable.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::analytics::charts::{mean, month_key, round1, ChartData, Dataset};
use crate::errors::AppError;

pub const KPI_LABEL: &str = "KPI achievement rate";
pub const SYNERGY_LABEL: &str = "Synergy score";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1month")]
    OneMonth,
    #[serde(rename = "3months")]
    ThreeMonths,
    #[serde(rename = "6months")]
    SixMonths,
    #[serde(rename = "1year")]
    OneYear,
}

impl Period {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.trim() {
            "1month" => Ok(Period::OneMonth),
            "3months" => Ok(Period::ThreeMonths),
            "6months" => Ok(Period::SixMonths),
            "1year" => Ok(Period::OneYear),
            other => Err(AppError::Validation(format!(
                "period must be one of 1month, 3months, 6months, 1year; got '{other}'"
            ))),
        }
    }

    pub fn months(&self) -> u32 {
        match self {
            Period::OneMonth => 1,
            Period::ThreeMonths => 3,
            Period::SixMonths => 6,
            Period::OneYear => 12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    /// `[now - period, now]`.
    pub fn current(period: Period, now: DateTime<Utc>) -> Self {
        Self {
            start: now
                .checked_sub_months(Months::new(period.months()))
                .unwrap_or(now),
            end: now,
        }
    }

    /// The same window shifted back by one month.
    pub fn previous(&self) -> Self {
        let shift = |at: DateTime<Utc>| at.checked_sub_months(Months::new(1)).unwrap_or(at);
        Self {
            start: shift(self.start),
            end: shift(self.end),
        }
    }
}

/// A match joined with the matched user's department.
#[derive(Debug, Clone, FromRow)]
pub struct DepartmentMatch {
    pub department: String,
    pub target_type: String,
    pub target_id: Option<String>,
    pub match_score: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergySummary {
    /// Mean match score in the window, 0–100.
    pub total_score: f64,
    pub total_score_change: f64,
    pub project_count: usize,
    pub project_count_change: i64,
    /// Percentage change in match volume versus the previous window.
    pub productivity_rate: f64,
}

fn mean_score_percent(matches: &[DepartmentMatch]) -> f64 {
    let scores: Vec<f64> = matches.iter().map(|m| m.match_score * 100.0).collect();
    mean(&scores)
}

pub fn summarize(current: &[DepartmentMatch], previous: &[DepartmentMatch]) -> SynergySummary {
    let current_count = current.len() as i64;
    let previous_count = previous.len() as i64;
    let productivity_rate = if previous_count == 0 {
        0.0
    } else {
        round1((current_count - previous_count) as f64 / previous_count as f64 * 100.0)
    };
    let current_score = mean_score_percent(current);
    let previous_score = mean_score_percent(previous);

    SynergySummary {
        total_score: round1(current_score),
        total_score_change: round1(current_score - previous_score),
        project_count: current.len(),
        project_count_change: current_count - previous_count,
        productivity_rate,
    }
}

/// Deterministic view of a window: summary and KPI over every match, the
/// pairwise chart over the selected departments only.
#[derive(Debug, Clone)]
pub struct SynergyBaseline {
    pub summary: SynergySummary,
    pub kpi: ChartData,
    pub synergy: ChartData,
}

pub fn baseline(matches: &[DepartmentMatch], current: &Window, departments: &[String]) -> SynergyBaseline {
    let previous = current.previous();
    let in_window = |w: &Window| -> Vec<DepartmentMatch> {
        matches
            .iter()
            .filter(|m| m.created_at >= w.start && m.created_at <= w.end)
            .cloned()
            .collect()
    };
    let current_matches = in_window(current);
    let previous_matches = in_window(&previous);

    SynergyBaseline {
        summary: summarize(&current_matches, &previous_matches),
        kpi: monthly_kpi(&current_matches, current),
        synergy: pairwise_synergy(&current_matches, departments),
    }
}

/// Monthly mean match score (0–100) for every calendar month the window touches.
pub fn monthly_kpi(matches: &[DepartmentMatch], window: &Window) -> ChartData {
    let mut months: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut cursor = window.start;
    while cursor <= window.end {
        months.entry(month_key(cursor)).or_default();
        match cursor.checked_add_months(Months::new(1)) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    months.entry(month_key(window.end)).or_default();

    for m in matches {
        if let Some(scores) = months.get_mut(&month_key(m.created_at)) {
            scores.push(m.match_score * 100.0);
        }
    }

    let labels: Vec<String> = months.keys().cloned().collect();
    let data: Vec<f64> = months.values().map(|s| round1(mean(s))).collect();
    let mut dataset = Dataset::new(KPI_LABEL, data);
    dataset.border_color = Some("rgb(75, 192, 192)".to_string());
    dataset.tension = Some(0.1);
    ChartData {
        labels,
        datasets: vec![dataset],
    }
}

/// Jaccard overlap (0–100) of the targets each pair of departments was matched to.
/// With no departments selected, every department seen in `matches` takes part.
pub fn pairwise_synergy(matches: &[DepartmentMatch], departments: &[String]) -> ChartData {
    let selected: BTreeSet<String> = if departments.is_empty() {
        matches.iter().map(|m| m.department.clone()).collect()
    } else {
        departments.iter().cloned().collect()
    };

    let targets_of = |department: &str| -> HashSet<(String, String)> {
        matches
            .iter()
            .filter(|m| m.department == department)
            .filter_map(|m| {
                m.target_id
                    .as_ref()
                    .map(|id| (m.target_type.clone(), id.clone()))
            })
            .collect()
    };

    let names: Vec<&String> = selected.iter().collect();
    let mut labels = Vec::new();
    let mut data = Vec::new();
    for (i, a) in names.iter().enumerate() {
        for b in names.iter().skip(i + 1) {
            let ta = targets_of(a);
            let tb = targets_of(b);
            let union = ta.union(&tb).count();
            let score = if union == 0 {
                0.0
            } else {
                (ta.intersection(&tb).count() as f64 / union as f64 * 100.0).round()
            };
            labels.push(format!("{a} × {b}"));
            data.push(score);
        }
    }

    let mut dataset = Dataset::new(SYNERGY_LABEL, data);
    dataset.background_color = Some("rgba(54, 162, 235, 0.5)".to_string());
    ChartData {
        labels,
        datasets: vec![dataset],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn dm(department: &str, target: Option<&str>, score: f64, created_at: DateTime<Utc>) -> DepartmentMatch {
        DepartmentMatch {
            department: department.to_string(),
            target_type: "challenge".to_string(),
            target_id: target.map(str::to_string),
            match_score: score,
            created_at,
        }
    }

    #[test]
    fn test_period_parse() {
        assert_eq!(Period::parse("3months").unwrap(), Period::ThreeMonths);
        assert_eq!(Period::parse("1year").unwrap().months(), 12);
        assert!(matches!(Period::parse("2weeks"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_windows() {
        let now = at(2024, 5, 31);
        let current = Window::current(Period::ThreeMonths, now);
        assert_eq!(current.start, at(2024, 2, 29));
        assert_eq!(current.end, now);

        let previous = current.previous();
        assert_eq!(previous.start, at(2024, 1, 29));
        assert_eq!(previous.end, at(2024, 4, 30));
    }

    #[test]
    fn test_summary_arithmetic() {
        let now = at(2024, 5, 1);
        let current = vec![
            dm("Eng", None, 0.8, now),
            dm("Eng", None, 0.6, now),
            dm("Sales", None, 0.7, now),
        ];
        let previous = vec![dm("Eng", None, 0.5, now), dm("Eng", None, 0.5, now)];
        let summary = summarize(&current, &previous);
        assert_eq!(summary.project_count, 3);
        assert_eq!(summary.project_count_change, 1);
        assert_eq!(summary.productivity_rate, 50.0);
        assert_eq!(summary.total_score, 70.0);
        assert_eq!(summary.total_score_change, 20.0);
    }

    #[test]
    fn test_summary_without_previous_matches() {
        let summary = summarize(&[dm("Eng", None, 0.9, at(2024, 5, 1))], &[]);
        assert_eq!(summary.productivity_rate, 0.0);
        assert_eq!(summary.project_count_change, 1);

        let empty = summarize(&[], &[]);
        assert_eq!(empty.total_score, 0.0);
    }

    #[test]
    fn test_monthly_kpi_buckets_by_month() {
        let window = Window {
            start: at(2024, 3, 15),
            end: at(2024, 5, 10),
        };
        let matches = vec![
            dm("Eng", None, 0.8, at(2024, 3, 20)),
            dm("Eng", None, 0.6, at(2024, 3, 21)),
            dm("Eng", None, 0.9, at(2024, 5, 1)),
            dm("Eng", None, 0.1, at(2023, 1, 1)),
        ];
        let chart = monthly_kpi(&matches, &window);
        assert_eq!(chart.labels, vec!["2024-03", "2024-04", "2024-05"]);
        assert_eq!(chart.datasets[0].data, vec![70.0, 0.0, 90.0]);
        assert!(chart.is_well_formed());
    }

    #[test]
    fn test_pairwise_synergy_uses_target_overlap() {
        let now = at(2024, 5, 1);
        let matches = vec![
            dm("Eng", Some("c1"), 0.9, now),
            dm("Eng", Some("c2"), 0.9, now),
            dm("Sales", Some("c1"), 0.9, now),
            dm("HR", Some("c3"), 0.9, now),
        ];
        let chart = pairwise_synergy(&matches, &[]);
        assert_eq!(
            chart.labels,
            vec!["Eng × HR", "Eng × Sales", "HR × Sales"]
        );
        // Eng {c1,c2} vs Sales {c1}: 1/2 → 50
        assert_eq!(chart.datasets[0].data, vec![0.0, 50.0, 0.0]);
    }

    #[test]
    fn test_pairwise_synergy_respects_selection() {
        let now = at(2024, 5, 1);
        let matches = vec![dm("Eng", Some("c1"), 0.9, now), dm("Sales", Some("c1"), 0.9, now)];
        let chart = pairwise_synergy(&matches, &["Eng".to_string(), "Sales".to_string()]);
        assert_eq!(chart.labels, vec!["Eng × Sales"]);
        assert_eq!(chart.datasets[0].data, vec![100.0]);
    }

    #[test]
    fn test_department_selection_only_narrows_synergy_chart() {
        let window = Window {
            start: at(2024, 3, 1),
            end: at(2024, 5, 31),
        };
        let matches = vec![
            dm("Engineering", Some("c1"), 0.8, at(2024, 4, 2)),
            dm("Sales", Some("c1"), 0.6, at(2024, 4, 3)),
            dm("Design", Some("c2"), 0.4, at(2024, 5, 1)),
            // previous window only
            dm("Design", Some("c2"), 0.4, at(2024, 2, 10)),
        ];
        let selected = vec!["Engineering".to_string(), "Sales".to_string()];

        let all = baseline(&matches, &window, &[]);
        let narrowed = baseline(&matches, &window, &selected);

        assert_eq!(narrowed.summary, all.summary);
        assert_eq!(narrowed.summary.project_count, 3);
        assert_eq!(narrowed.summary.total_score, 60.0);
        assert_eq!(narrowed.kpi, all.kpi);
        assert_eq!(narrowed.synergy.labels, vec!["Engineering × Sales"]);
        assert_eq!(narrowed.synergy.datasets[0].data, vec![100.0]);
        assert_eq!(all.synergy.labels.len(), 3);
    }
}
