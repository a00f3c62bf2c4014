//! Career records stored under `users.profile_data.career`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CareerSection {
    WorkHistory,
    Certifications,
    Trainings,
}

impl CareerSection {
    /// Key of the list inside `profile_data.career`.
    pub fn key(&self) -> &'static str {
        match self {
            CareerSection::WorkHistory => "work_history",
            CareerSection::Certifications => "certifications",
            CareerSection::Trainings => "trainings",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkHistoryEntry {
    pub company: String,
    pub position: String,
    /// Free text such as "2019-04 – 2022-03".
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationEntry {
    pub name: String,
    #[serde(alias = "issuedBy")]
    pub issued_by: String,
    #[serde(alias = "acquisitionDate")]
    pub acquisition_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingEntry {
    #[serde(alias = "courseName")]
    pub course_name: String,
    pub provider: String,
    #[serde(alias = "completionDate")]
    pub completion_date: NaiveDate,
}

/// A career list entry that can check its own required fields.
pub trait CareerEntry: Serialize {
    const SECTION: CareerSection;

    fn validate(&self) -> Result<(), AppError>;
}

fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl CareerEntry for WorkHistoryEntry {
    const SECTION: CareerSection = CareerSection::WorkHistory;

    fn validate(&self) -> Result<(), AppError> {
        require("company", &self.company)?;
        require("position", &self.position)
    }
}

impl CareerEntry for CertificationEntry {
    const SECTION: CareerSection = CareerSection::Certifications;

    fn validate(&self) -> Result<(), AppError> {
        require("name", &self.name)?;
        require("issued_by", &self.issued_by)
    }
}

impl CareerEntry for TrainingEntry {
    const SECTION: CareerSection = CareerSection::Trainings;

    fn validate(&self) -> Result<(), AppError> {
        require("course_name", &self.course_name)?;
        require("provider", &self.provider)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareerData {
    #[serde(alias = "workHistory")]
    pub work_history: Vec<Value>,
    pub certifications: Vec<Value>,
    pub trainings: Vec<Value>,
}

impl CareerData {
    /// Missing or malformed sections read as empty lists.
    pub fn from_profile(profile_data: &Value) -> Self {
        let Some(career) = profile_data.get("career") else {
            return Self::default();
        };
        let list = |keys: &[&str]| -> Vec<Value> {
            keys.iter()
                .find_map(|k| career.get(*k).and_then(Value::as_array))
                .cloned()
                .unwrap_or_default()
        };
        Self {
            work_history: list(&["work_history", "workHistory"]),
            certifications: list(&["certifications"]),
            trainings: list(&["trainings"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_career_defaults_to_empty_lists() {
        assert_eq!(CareerData::from_profile(&json!({})), CareerData::default());
        assert_eq!(CareerData::from_profile(&Value::Null), CareerData::default());
    }

    #[test]
    fn test_career_reads_legacy_camel_case_key() {
        let profile = json!({"career": {
            "workHistory": [{"company": "Acme", "position": "Dev"}],
            "certifications": "not a list"
        }});
        let career = CareerData::from_profile(&profile);
        assert_eq!(career.work_history.len(), 1);
        assert!(career.certifications.is_empty());
        assert!(career.trainings.is_empty());
    }

    #[test]
    fn test_entry_validation() {
        let entry = WorkHistoryEntry {
            company: "Acme".into(),
            position: " ".into(),
            period: String::new(),
            description: String::new(),
        };
        assert!(matches!(entry.validate(), Err(AppError::Validation(_))));

        let training: TrainingEntry = serde_json::from_value(json!({
            "courseName": "Rust in Depth", "provider": "Ferrous", "completionDate": "2024-03-01"
        }))
        .unwrap();
        assert!(training.validate().is_ok());
        assert_eq!(TrainingEntry::SECTION.key(), "trainings");
    }
}
