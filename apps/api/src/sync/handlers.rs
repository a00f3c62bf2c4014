//! Axum route handlers for the HR data sync.

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::logs::SyncLogRow;
use crate::state::AppState;
use crate::sync::diff::{plan_sync, HrEmployee, SyncPlan, SyncedUser};

const SYNC_OPERATION: &str = "hr_sync";
const RECENT_LOG_LIMIT: i64 = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncResults {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub duplicates: usize,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub message: String,
    pub results: SyncResults,
}

/// POST /api/v1/sync/hr-data
///
/// Every outcome, success or failure, is recorded in `sync_logs`.
pub async fn handle_hr_sync(State(state): State<AppState>) -> Result<Json<SyncResponse>, AppError> {
    match run_sync(&state).await {
        Ok(results) => {
            record_sync_log(&state, "success", json!(&results)).await;
            info!(
                "HR sync finished: {} inserted, {} updated, {} unchanged",
                results.inserted, results.updated, results.unchanged
            );
            Ok(Json(SyncResponse {
                success: true,
                message: "Sync completed".to_string(),
                results,
            }))
        }
        Err(e) => {
            record_sync_log(&state, "error", json!({ "error": e.to_string() })).await;
            Err(e)
        }
    }
}

/// GET /api/v1/sync/logs
pub async fn handle_sync_logs(
    State(state): State<AppState>,
) -> Result<Json<Vec<SyncLogRow>>, AppError> {
    let logs = sqlx::query_as::<_, SyncLogRow>(
        "SELECT * FROM sync_logs ORDER BY created_at DESC LIMIT $1",
    )
    .bind(RECENT_LOG_LIMIT)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(logs))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn run_sync(state: &AppState) -> Result<SyncResults, AppError> {
    let incoming = fetch_hr_employees(state).await?;
    let existing = sqlx::query_as::<_, SyncedUser>(
        "SELECT employee_id, name, department, position, email, hire_date, profile_data FROM users",
    )
    .fetch_all(&state.db)
    .await?;

    let plan = plan_sync(incoming, &existing);
    if plan.duplicates > 0 {
        warn!("HR payload repeated {} employee ids; later entries ignored", plan.duplicates);
    }
    apply_plan(state, &plan).await?;

    Ok(SyncResults {
        inserted: plan.to_insert.len(),
        updated: plan.to_update.len(),
        unchanged: plan.unchanged,
        duplicates: plan.duplicates,
    })
}

async fn fetch_hr_employees(state: &AppState) -> Result<Vec<HrEmployee>, AppError> {
    let url = state
        .config
        .hr_system_api_url
        .as_deref()
        .ok_or_else(|| AppError::Upstream("HR_SYSTEM_API_URL is not configured".to_string()))?;

    let mut request = state.http.get(url);
    if let Some(key) = state.config.hr_system_api_key.as_deref() {
        request = request.bearer_auth(key);
    }

    let response = request
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("HR system unreachable: {e}")))?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Upstream(format!("HR system returned {status}")));
    }
    response
        .json::<Vec<HrEmployee>>()
        .await
        .map_err(|e| AppError::Upstream(format!("HR payload could not be parsed: {e}")))
}

/// Inserts and updates share one transaction; a failure leaves the users table untouched.
async fn apply_plan(state: &AppState, plan: &SyncPlan) -> Result<(), AppError> {
    if plan.to_insert.is_empty() && plan.to_update.is_empty() {
        return Ok(());
    }
    let mut tx = state.db.begin().await?;

    for employee in &plan.to_insert {
        sqlx::query(
            r#"
            INSERT INTO users (employee_id, name, email, department, position, hire_date, profile_data, access_rights)
            VALUES ($1, $2, $3, $4, $5, $6, $7, '{}'::jsonb)
            "#,
        )
        .bind(&employee.employee_id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.department)
        .bind(&employee.position)
        .bind(employee.hire_date)
        .bind(Value::Object(employee.profile.clone()))
        .execute(&mut *tx)
        .await?;
    }

    for employee in &plan.to_update {
        sqlx::query(
            r#"
            UPDATE users SET
                name = $2, email = $3, department = $4, position = $5, hire_date = $6,
                profile_data = COALESCE(profile_data, '{}'::jsonb) || $7,
                updated_at = now()
            WHERE employee_id = $1
            "#,
        )
        .bind(&employee.employee_id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.department)
        .bind(&employee.position)
        .bind(employee.hire_date)
        .bind(Value::Object(employee.profile.clone()))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// A failed log write is reported but never fails the sync itself.
async fn record_sync_log(state: &AppState, status: &str, details: Value) {
    let result = sqlx::query("INSERT INTO sync_logs (operation, status, details) VALUES ($1, $2, $3)")
        .bind(SYNC_OPERATION)
        .bind(status)
        .bind(&details)
        .execute(&state.db)
        .await;
    if let Err(e) = result {
        warn!("Failed to record sync log: {e}");
    }
}
