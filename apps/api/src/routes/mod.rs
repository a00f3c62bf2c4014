pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::state::AppState;
use crate::{
    admin, analytics, auth, batch, challenges, ideas, matching, messages, profiles, skills, sync,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/login", post(auth::handlers::handle_login))
        .route(
            "/api/v1/auth/access-validation",
            post(auth::access::handle_access_validation),
        )
        // Profiles
        .route("/api/v1/profiles", get(profiles::handlers::handle_list_profiles))
        .route(
            "/api/v1/profiles/:id",
            get(profiles::handlers::handle_get_profile).put(profiles::handlers::handle_update_profile),
        )
        .route(
            "/api/v1/profiles/:id/career",
            get(profiles::handlers::handle_get_career),
        )
        .route(
            "/api/v1/profiles/:id/career/work-history",
            post(profiles::handlers::handle_add_work_history),
        )
        .route(
            "/api/v1/profiles/:id/career/certifications",
            post(profiles::handlers::handle_add_certification),
        )
        .route(
            "/api/v1/profiles/:id/career/trainings",
            post(profiles::handlers::handle_add_training),
        )
        // Skills
        .route("/api/v1/skills", get(skills::handlers::handle_list_skills))
        .route(
            "/api/v1/skills/categories",
            get(skills::handlers::handle_list_categories),
        )
        .route(
            "/api/v1/skills/register",
            post(skills::handlers::handle_register_skill),
        )
        .route(
            "/api/v1/skills/search",
            get(skills::handlers::handle_search_skills),
        )
        // Challenges
        .route(
            "/api/v1/challenges",
            get(challenges::handlers::handle_list_challenges)
                .post(challenges::handlers::handle_create_challenge),
        )
        .route(
            "/api/v1/challenges/:id/status",
            patch(challenges::handlers::handle_update_status),
        )
        // Ideas
        .route(
            "/api/v1/ideas",
            get(ideas::handlers::handle_list_ideas).post(ideas::handlers::handle_create_idea),
        )
        .route("/api/v1/ideas/:id", get(ideas::handlers::handle_get_idea))
        .route(
            "/api/v1/ideas/:id/evaluations",
            post(ideas::handlers::handle_evaluate_idea),
        )
        // Matching
        .route(
            "/api/v1/matching/skill-match",
            post(matching::handlers::handle_skill_match),
        )
        .route(
            "/api/v1/matching/team-optimization",
            post(matching::handlers::handle_team_optimization),
        )
        .route(
            "/api/v1/matching/history",
            get(matching::handlers::handle_match_history),
        )
        // Messages
        .route(
            "/api/v1/messages",
            get(messages::handlers::handle_list_messages).post(messages::handlers::handle_send_message),
        )
        .route(
            "/api/v1/messages/group/:id",
            get(messages::handlers::handle_group_messages),
        )
        .route(
            "/api/v1/messages/:id/read",
            patch(messages::handlers::handle_mark_read),
        )
        // Analytics
        .route(
            "/api/v1/analytics/skill-gap",
            post(analytics::handlers::handle_skill_gap),
        )
        .route(
            "/api/v1/analytics/skill-map",
            post(analytics::handlers::handle_skill_map),
        )
        .route(
            "/api/v1/analytics/synergy",
            post(analytics::handlers::handle_synergy),
        )
        .route(
            "/api/v1/analytics/talent-utilization",
            get(analytics::handlers::handle_talent_utilization),
        )
        // Admin
        .route("/api/v1/admin/users", get(admin::handlers::handle_list_users))
        .route(
            "/api/v1/admin/users/:id/access-rights",
            put(admin::handlers::handle_update_access_rights),
        )
        // Sync & batch
        .route("/api/v1/sync/hr-data", post(sync::handlers::handle_hr_sync))
        .route("/api/v1/sync/logs", get(sync::handlers::handle_sync_logs))
        .route(
            "/api/v1/batch/skill-update-reminder",
            post(batch::handlers::handle_skill_update_reminder),
        )
        .route(
            "/api/v1/batch/notification-logs",
            get(batch::handlers::handle_notification_logs),
        )
        .with_state(state)
}
