//! Axum route handlers for batch jobs.

use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::batch::prompts::{REMINDER_FALLBACK, REMINDER_PROMPT, REMINDER_SUBJECT, REMINDER_SYSTEM};
use crate::batch::reminder::{
    personalize, render_template, update_deadline, MailRequest, ReminderTarget, NOTIFICATION_TYPE,
};
use crate::errors::AppError;
use crate::llm_client::ContentSource;
use crate::models::logs::{NotificationLogRow, NotificationStatus};
use crate::state::AppState;

const RECENT_LOG_LIMIT: i64 = 100;

#[derive(Debug, Serialize)]
pub struct ReminderResponse {
    pub message: String,
    pub reminded_users: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_source: Option<ContentSource>,
    /// Attempts whose `notification_logs` row could not be written.
    #[serde(skip_serializing_if = "is_zero")]
    pub unlogged: usize,
}

fn is_zero(count: &usize) -> bool {
    *count == 0
}

/// POST /api/v1/batch/skill-update-reminder
///
/// Mails every user holding a skill entry older than the configured threshold.
/// Each attempt is written to `notification_logs`, sent or failed.
pub async fn handle_skill_update_reminder(
    State(state): State<AppState>,
) -> Result<Json<ReminderResponse>, AppError> {
    let threshold_days = state.config.reminder_threshold_days;
    let now = Utc::now();
    let cutoff = now - Duration::days(threshold_days);

    let targets = sqlx::query_as::<_, ReminderTarget>(
        r#"
        SELECT u.id, u.name, u.email
        FROM users u
        WHERE EXISTS (
            SELECT 1 FROM user_skills us WHERE us.user_id = u.id AND us.updated_at < $1
        )
        ORDER BY u.name
        "#,
    )
    .bind(cutoff)
    .fetch_all(&state.db)
    .await?;

    if targets.is_empty() {
        return Ok(Json(ReminderResponse {
            message: "No users need reminder".to_string(),
            reminded_users: 0,
            failed: None,
            content_source: None,
            unlogged: 0,
        }));
    }

    let endpoint = state
        .config
        .mail_api_endpoint
        .as_deref()
        .ok_or_else(|| AppError::Upstream("MAIL_API_ENDPOINT is not configured".to_string()))?;

    let deadline = update_deadline(now);
    let (template, content_source) = state
        .llm
        .text_or_fallback(
            "reminder email",
            &render_template(REMINDER_PROMPT, threshold_days, deadline),
            REMINDER_SYSTEM,
            &render_template(REMINDER_FALLBACK, threshold_days, deadline),
        )
        .await;

    let mut sent = 0;
    let mut failed = 0;
    let mut unlogged = 0;
    for target in &targets {
        let body = personalize(&template, &target.name);
        let outcome = send_mail(&state, endpoint, &target.email, &body).await;
        let (status, error_detail) = match outcome {
            Ok(()) => {
                sent += 1;
                (NotificationStatus::Sent, None)
            }
            Err(detail) => {
                warn!("Reminder to {} failed: {}", target.email, detail);
                failed += 1;
                (NotificationStatus::Failed, Some(detail))
            }
        };
        let logged =
            record_notification(&state.db, target.id, status, &body, error_detail.as_deref()).await;
        if !logged {
            unlogged += 1;
        }
    }

    info!(
        "Skill update reminder: {} sent, {} failed (threshold {} days)",
        sent, failed, threshold_days
    );
    Ok(Json(ReminderResponse {
        message: "Reminder process completed".to_string(),
        reminded_users: sent,
        failed: Some(failed),
        content_source: Some(content_source),
        unlogged,
    }))
}

/// GET /api/v1/batch/notification-logs
pub async fn handle_notification_logs(
    State(state): State<AppState>,
) -> Result<Json<Vec<NotificationLogRow>>, AppError> {
    let logs = sqlx::query_as::<_, NotificationLogRow>(
        "SELECT * FROM notification_logs ORDER BY created_at DESC LIMIT $1",
    )
    .bind(RECENT_LOG_LIMIT)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(logs))
}

async fn send_mail(state: &AppState, endpoint: &str, to: &str, text: &str) -> Result<(), String> {
    let response = state
        .http
        .post(endpoint)
        .json(&MailRequest {
            to,
            subject: REMINDER_SUBJECT,
            text,
        })
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(format!("mail API returned {status}"))
    }
}

/// A failed log write is reported but never stops the remaining sends.
async fn record_notification(
    db: &PgPool,
    user_id: Uuid,
    status: NotificationStatus,
    content: &str,
    error_detail: Option<&str>,
) -> bool {
    let result = sqlx::query(
        r#"
        INSERT INTO notification_logs (user_id, type, status, content, error_detail)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(user_id)
    .bind(NOTIFICATION_TYPE)
    .bind(status.as_str())
    .bind(content)
    .bind(error_detail)
    .execute(db)
    .await;
    match result {
        Ok(_) => true,
        Err(e) => {
            warn!("Failed to record notification log for {user_id}: {e}");
            false
        }
    }
}
