use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/login", post(handlers::login))
        .route(
            "/api/members",
            get(handlers::list_members).post(handlers::add_member),
        )
        .route(
            "/api/tasks",
            get(handlers::list_tasks).post(handlers::add_task),
        )
        .route("/api/tasks/:id", delete(handlers::delete_task))
        .route("/api/summary", get(handlers::member_day_summary))
        .route("/api/leaves", post(handlers::toggle_leave))
        .route("/api/manager/daily", get(handlers::team_day_summary))
        .route(
            "/api/feedback",
            get(handlers::list_feedback).post(handlers::submit_feedback),
        )
        .route("/api/reports", get(handlers::reports))
        .route("/api/export", get(handlers::export))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
