//! Chart-ready payloads. Rendering happens in the browser; the service only
//! ships labels, series and colours.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
}

impl Dataset {
    pub fn new(label: &str, data: Vec<f64>) -> Self {
        Self {
            label: label.to_string(),
            data,
            background_color: None,
            border_color: None,
            border_width: None,
            tension: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    /// A chart is usable when it has labels and every series lines up with them.
    pub fn is_well_formed(&self) -> bool {
        !self.labels.is_empty()
            && !self.datasets.is_empty()
            && self
                .datasets
                .iter()
                .all(|d| d.data.len() == self.labels.len() && d.data.iter().all(|v| v.is_finite()))
    }
}

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// `YYYY-MM` label for the calendar month containing `at`.
pub fn month_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

/// Labels of the `count` calendar months ending with the month of `now`, oldest first.
pub fn trailing_months(now: DateTime<Utc>, count: u32) -> Vec<String> {
    let first_of_month = NaiveDate::from_ymd_opt(now.year(), now.month(), 1).unwrap_or(now.date_naive());
    (0..count)
        .rev()
        .filter_map(|back| first_of_month.checked_sub_months(Months::new(back)))
        .map(|d| d.format("%Y-%m").to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_round1() {
        assert_eq!(round1(3.14159), 3.1);
        assert_eq!(round1(2.25), 2.3);
        assert_eq!(round1(0.0), 0.0);
    }

    #[test]
    fn test_mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn test_trailing_months_crosses_year_boundary() {
        let now = Utc.with_ymd_and_hms(2024, 2, 15, 12, 0, 0).unwrap();
        assert_eq!(
            trailing_months(now, 4),
            vec!["2023-11", "2023-12", "2024-01", "2024-02"]
        );
    }

    #[test]
    fn test_month_key() {
        let at = Utc.with_ymd_and_hms(2024, 7, 31, 23, 59, 0).unwrap();
        assert_eq!(month_key(at), "2024-07");
    }

    #[test]
    fn test_chart_shape_validation() {
        let good = ChartData {
            labels: vec!["a".into(), "b".into()],
            datasets: vec![Dataset::new("x", vec![1.0, 2.0])],
        };
        assert!(good.is_well_formed());

        let misaligned = ChartData {
            labels: vec!["a".into()],
            datasets: vec![Dataset::new("x", vec![1.0, 2.0])],
        };
        assert!(!misaligned.is_well_formed());

        let empty = ChartData {
            labels: vec![],
            datasets: vec![],
        };
        assert!(!empty.is_well_formed());
    }
}
