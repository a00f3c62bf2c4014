use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Per-user feature flags. Missing flags deserialize as `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessRights {
    pub admin: bool,
    pub user_management: bool,
    pub skill_management: bool,
    pub challenge_management: bool,
    pub idea_management: bool,
}

/// A single access flag name, as sent by clients in `required_access`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessFlag {
    Admin,
    UserManagement,
    SkillManagement,
    ChallengeManagement,
    IdeaManagement,
}

impl AccessFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessFlag::Admin => "admin",
            AccessFlag::UserManagement => "user_management",
            AccessFlag::SkillManagement => "skill_management",
            AccessFlag::ChallengeManagement => "challenge_management",
            AccessFlag::IdeaManagement => "idea_management",
        }
    }
}

impl AccessRights {
    pub fn has(&self, flag: AccessFlag) -> bool {
        match flag {
            AccessFlag::Admin => self.admin,
            AccessFlag::UserManagement => self.user_management,
            AccessFlag::SkillManagement => self.skill_management,
            AccessFlag::ChallengeManagement => self.challenge_management,
            AccessFlag::IdeaManagement => self.idea_management,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub position: String,
    pub hire_date: Option<NaiveDate>,
    pub profile_data: Value,
    pub access_rights: Json<AccessRights>,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public projection of a user used in listings and joins.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub department: String,
    pub position: String,
}

impl From<&UserRow> for UserSummary {
    fn from(user: &UserRow) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            department: user.department.clone(),
            position: user.position.clone(),
        }
    }
}
