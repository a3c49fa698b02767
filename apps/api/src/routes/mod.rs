pub mod filters;
pub mod health;
pub mod sessions;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Uploaded resumes are small; 10 MB leaves room for image-heavy PDFs.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/filters", get(filters::list_filters_handler))
        // Session lifecycle
        .route("/api/v1/sessions", post(sessions::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(sessions::handle_get_session).delete(sessions::handle_delete_session),
        )
        .route("/api/v1/sessions/:id/reset", post(sessions::handle_reset))
        // Intake
        .route(
            "/api/v1/sessions/:id/intake/text",
            post(sessions::handle_intake_text),
        )
        .route(
            "/api/v1/sessions/:id/intake/document",
            post(sessions::handle_intake_document),
        )
        // Analysis
        .route(
            "/api/v1/sessions/:id/analyze",
            post(sessions::handle_analyze),
        )
        // Summary
        .route(
            "/api/v1/sessions/:id/summary/optimize",
            post(sessions::handle_optimize_summary),
        )
        .route(
            "/api/v1/sessions/:id/summary/accept",
            post(sessions::handle_accept_summary),
        )
        // Skills
        .route(
            "/api/v1/sessions/:id/skills/optimize",
            post(sessions::handle_optimize_skills),
        )
        .route(
            "/api/v1/sessions/:id/skills/add",
            post(sessions::handle_add_skill),
        )
        // Bullets
        .route(
            "/api/v1/sessions/:id/roles/:role_id/bullets/:bullet_id/optimize",
            post(sessions::handle_optimize_bullet),
        )
        .route(
            "/api/v1/sessions/:id/roles/:role_id/bullets/:bullet_id/accept",
            post(sessions::handle_accept_rewrite),
        )
        // Refinement filters and persona
        .route(
            "/api/v1/sessions/:id/filters/toggle",
            post(sessions::handle_toggle_filter),
        )
        .route(
            "/api/v1/sessions/:id/persona",
            post(sessions::handle_switch_persona),
        )
        // Chat
        .route(
            "/api/v1/sessions/:id/chat",
            post(sessions::handle_chat_send).delete(sessions::handle_chat_clear),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
