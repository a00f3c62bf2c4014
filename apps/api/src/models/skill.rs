use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

pub const MIN_SKILL_LEVEL: i16 = 1;
pub const MAX_SKILL_LEVEL: i16 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SkillRow {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSkillRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub skill_id: Uuid,
    pub level: i16,
    pub years_of_experience: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rejects levels outside 1..=5.
pub fn validate_level(field: &str, level: i16) -> Result<i16, AppError> {
    if (MIN_SKILL_LEVEL..=MAX_SKILL_LEVEL).contains(&level) {
        Ok(level)
    } else {
        Err(AppError::Validation(format!(
            "{field} must be between {MIN_SKILL_LEVEL} and {MAX_SKILL_LEVEL}, got {level}"
        )))
    }
}

/// A user_skill row joined with its skill name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSkillDetail {
    pub user_id: Uuid,
    pub skill_id: Uuid,
    pub skill_name: String,
    pub level: i16,
    pub years_of_experience: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_level_bounds() {
        assert!(validate_level("level", 1).is_ok());
        assert!(validate_level("level", 5).is_ok());
        assert!(validate_level("level", 0).is_err());
        assert!(validate_level("level", 6).is_err());
    }

    #[test]
    fn test_validate_level_message_names_field() {
        let err = validate_level("minimum_level", 9).unwrap_err();
        assert!(err.to_string().contains("minimum_level"));
    }
}
