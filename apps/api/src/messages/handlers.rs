//! Axum route handlers for direct and group messages.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::token::AuthUser;
use crate::errors::AppError;
use crate::listing::contains_ci;
use crate::models::message::{MessageRow, MessageWithNames};
use crate::state::AppState;

const WITH_NAMES: &str = r#"
    SELECT m.*, s.name AS sender_name, r.name AS receiver_name
    FROM messages m
    LEFT JOIN users s ON s.id = m.sender_id
    LEFT JOIN users r ON r.id = m.receiver_id
"#;

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub user_id: Uuid,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    pub content: String,
}

/// GET /api/v1/messages?user_id=&q=
///
/// Every message the user sent or received, newest first.
pub async fn handle_list_messages(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Result<Json<Vec<MessageWithNames>>, AppError> {
    let messages = sqlx::query_as::<_, MessageWithNames>(&format!(
        "{WITH_NAMES} WHERE m.sender_id = $1 OR m.receiver_id = $1 ORDER BY m.sent_at DESC"
    ))
    .bind(query.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(search(messages, query.q.as_deref())))
}

/// GET /api/v1/messages/group/:id
pub async fn handle_group_messages(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Vec<MessageWithNames>>, AppError> {
    let messages = sqlx::query_as::<_, MessageWithNames>(&format!(
        "{WITH_NAMES} WHERE m.receiver_id = $1 ORDER BY m.sent_at ASC"
    ))
    .bind(group_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(messages))
}

/// POST /api/v1/messages
pub async fn handle_send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageRow>), AppError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }

    let message = sqlx::query_as::<_, MessageRow>(
        "INSERT INTO messages (sender_id, receiver_id, content) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(auth.user_id)
    .bind(req.receiver_id)
    .bind(content)
    .fetch_one(&state.db)
    .await?;

    info!("Message {} sent {} -> {}", message.id, auth.user_id, req.receiver_id);
    Ok((StatusCode::CREATED, Json(message)))
}

/// PATCH /api/v1/messages/:id/read
///
/// Keeps the first read timestamp when called again.
pub async fn handle_mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageRow>, AppError> {
    let message = sqlx::query_as::<_, MessageRow>(
        "UPDATE messages SET read_at = COALESCE(read_at, now()) WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Message {id} not found")))?;
    Ok(Json(message))
}

/// Matches content or either participant's name.
fn search(messages: Vec<MessageWithNames>, q: Option<&str>) -> Vec<MessageWithNames> {
    let needle = q.map(str::trim).unwrap_or_default();
    if needle.is_empty() {
        return messages;
    }
    messages
        .into_iter()
        .filter(|m| {
            contains_ci(&m.content, needle)
                || m.sender_name.as_deref().is_some_and(|n| contains_ci(n, needle))
                || m.receiver_name.as_deref().is_some_and(|n| contains_ci(n, needle))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(content: &str, sender: &str, receiver: Option<&str>) -> MessageWithNames {
        MessageWithNames {
            id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            receiver_id: Uuid::new_v4(),
            content: content.to_string(),
            sent_at: Utc::now(),
            read_at: None,
            sender_name: Some(sender.to_string()),
            receiver_name: receiver.map(str::to_string),
        }
    }

    #[test]
    fn test_search_content_and_names() {
        let messages = vec![
            message("Lunch at noon?", "Sora", Some("Kai")),
            message("Review my PR", "Kai", Some("Yuki")),
            message("Standup moved", "Yuki", None),
        ];

        assert_eq!(search(messages.clone(), None).len(), 3);
        assert_eq!(search(messages.clone(), Some("  ")).len(), 3);

        let by_name = search(messages.clone(), Some("kai"));
        assert_eq!(by_name.len(), 2);

        let by_content = search(messages, Some("STANDUP"));
        assert_eq!(by_content.len(), 1);
        assert_eq!(by_content[0].sender_name.as_deref(), Some("Yuki"));
    }
}
