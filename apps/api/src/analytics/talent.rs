//! Per-employee talent utilization metrics and their department roll-up.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::analytics::charts::{mean, month_key, round1, trailing_months};

pub const DEFAULT_PERIOD_MONTHS: u32 = 6;
pub const MAX_PERIOD_MONTHS: u32 = 24;
/// Matches older than this do not count towards the utilization rate.
pub const UTILIZATION_WINDOW_MONTHS: u32 = 3;

pub fn clamp_period(period: Option<u32>) -> u32 {
    period
        .unwrap_or(DEFAULT_PERIOD_MONTHS)
        .clamp(1, MAX_PERIOD_MONTHS)
}

#[derive(Debug, Clone, FromRow)]
pub struct TalentUser {
    pub id: Uuid,
    pub name: String,
    pub department: String,
    pub position: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct TalentLevel {
    pub user_id: Uuid,
    pub level: i16,
}

#[derive(Debug, Clone, FromRow)]
pub struct TalentMatch {
    pub user_id: Uuid,
    pub match_score: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub month: String,
    pub utilization_rate: u32,
    pub match_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TalentRecord {
    pub id: Uuid,
    pub name: String,
    pub department: String,
    pub position: String,
    pub skill_growth: u32,
    pub utilization_rate: u32,
    pub activity_score: u32,
    pub monthly_data: Vec<MonthlyPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentAnalysis {
    pub department: String,
    pub average_utilization: f64,
    pub average_growth: f64,
    pub employee_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TalentSummary {
    pub total_employees: usize,
    pub average_growth: f64,
    pub average_utilization: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Metrics
// ────────────────────────────────────────────────────────────────────────────

/// `round(mean(level) × 20)`, so a uniform level 5 is 100.
pub fn skill_growth(levels: &[i16]) -> u32 {
    let levels: Vec<f64> = levels.iter().map(|&l| f64::from(l)).collect();
    (mean(&levels) * 20.0).round() as u32
}

pub fn utilization_rate(matches: &[&TalentMatch], now: DateTime<Utc>) -> u32 {
    let since = now
        .checked_sub_months(Months::new(UTILIZATION_WINDOW_MONTHS))
        .unwrap_or(now);
    let recent: Vec<f64> = matches
        .iter()
        .filter(|m| m.created_at >= since)
        .map(|m| m.match_score * 100.0)
        .collect();
    mean(&recent).round() as u32
}

pub fn activity_score(match_count: usize) -> u32 {
    ((match_count as f64 / 3.0 * 10.0).round() as u32).min(100)
}

pub fn monthly_data(matches: &[&TalentMatch], now: DateTime<Utc>, period: u32) -> Vec<MonthlyPoint> {
    let mut buckets: BTreeMap<String, Vec<f64>> = trailing_months(now, period)
        .into_iter()
        .map(|month| (month, Vec::new()))
        .collect();
    for m in matches {
        if let Some(scores) = buckets.get_mut(&month_key(m.created_at)) {
            scores.push(m.match_score * 100.0);
        }
    }
    buckets
        .into_iter()
        .map(|(month, scores)| MonthlyPoint {
            month,
            utilization_rate: mean(&scores).round() as u32,
            match_count: scores.len(),
        })
        .collect()
}

pub fn build_records(
    users: &[TalentUser],
    levels: &[TalentLevel],
    matches: &[TalentMatch],
    now: DateTime<Utc>,
    period: u32,
) -> Vec<TalentRecord> {
    let mut levels_by_user: HashMap<Uuid, Vec<i16>> = HashMap::new();
    for l in levels {
        levels_by_user.entry(l.user_id).or_default().push(l.level);
    }
    let mut matches_by_user: HashMap<Uuid, Vec<&TalentMatch>> = HashMap::new();
    for m in matches {
        matches_by_user.entry(m.user_id).or_default().push(m);
    }

    users
        .iter()
        .map(|user| {
            let user_levels = levels_by_user.get(&user.id).map(Vec::as_slice).unwrap_or(&[]);
            let user_matches = matches_by_user.get(&user.id).map(Vec::as_slice).unwrap_or(&[]);
            TalentRecord {
                id: user.id,
                name: user.name.clone(),
                department: user.department.clone(),
                position: user.position.clone(),
                skill_growth: skill_growth(user_levels),
                utilization_rate: utilization_rate(user_matches, now),
                activity_score: activity_score(user_matches.len()),
                monthly_data: monthly_data(user_matches, now, period),
            }
        })
        .collect()
}

pub fn department_analysis(records: &[TalentRecord]) -> Vec<DepartmentAnalysis> {
    let mut by_department: BTreeMap<&str, Vec<&TalentRecord>> = BTreeMap::new();
    for r in records {
        by_department.entry(r.department.as_str()).or_default().push(r);
    }
    by_department
        .into_iter()
        .map(|(department, members)| {
            let utilization: Vec<f64> = members.iter().map(|r| f64::from(r.utilization_rate)).collect();
            let growth: Vec<f64> = members.iter().map(|r| f64::from(r.skill_growth)).collect();
            DepartmentAnalysis {
                department: department.to_string(),
                average_utilization: round1(mean(&utilization)),
                average_growth: round1(mean(&growth)),
                employee_count: members.len(),
            }
        })
        .collect()
}

pub fn summarize(records: &[TalentRecord]) -> TalentSummary {
    let utilization: Vec<f64> = records.iter().map(|r| f64::from(r.utilization_rate)).collect();
    let growth: Vec<f64> = records.iter().map(|r| f64::from(r.skill_growth)).collect();
    TalentSummary {
        total_employees: records.len(),
        average_growth: round1(mean(&growth)),
        average_utilization: round1(mean(&utilization)),
    }
}

/// Organisation-wide monthly utilization, averaged over every employee's series.
pub fn organisation_trend(records: &[TalentRecord]) -> Vec<MonthlyPoint> {
    let mut totals: BTreeMap<&str, (Vec<f64>, usize)> = BTreeMap::new();
    for r in records {
        for point in &r.monthly_data {
            let entry = totals.entry(point.month.as_str()).or_default();
            if point.match_count > 0 {
                entry.0.push(f64::from(point.utilization_rate));
            }
            entry.1 += point.match_count;
        }
    }
    totals
        .into_iter()
        .map(|(month, (rates, match_count))| MonthlyPoint {
            month: month.to_string(),
            utilization_rate: mean(&rates).round() as u32,
            match_count,
        })
        .collect()
}
