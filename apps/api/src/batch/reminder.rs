//! Reminder email composition.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

pub const USER_NAME_PLACEHOLDER: &str = "{USER_NAME}";
pub const NOTIFICATION_TYPE: &str = "skill_update_reminder";
/// Days the employee gets to update after the reminder is sent.
pub const UPDATE_DEADLINE_DAYS: i64 = 7;

#[derive(Debug, Clone, FromRow)]
pub struct ReminderTarget {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct MailRequest<'a> {
    pub to: &'a str,
    pub subject: &'a str,
    pub text: &'a str,
}

pub fn update_deadline(now: DateTime<Utc>) -> NaiveDate {
    (now + Duration::days(UPDATE_DEADLINE_DAYS)).date_naive()
}

/// Fills the shared placeholders of a reminder template.
pub fn render_template(template: &str, threshold_days: i64, deadline: NaiveDate) -> String {
    template
        .replace("{threshold_days}", &threshold_days.to_string())
        .replace("{deadline}", &deadline.format("%Y-%m-%d").to_string())
}

pub fn personalize(body: &str, user_name: &str) -> String {
    body.replace(USER_NAME_PLACEHOLDER, user_name)
}
