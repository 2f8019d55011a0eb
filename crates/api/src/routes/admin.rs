//! Route definitions for the `/admin` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`. All require an admin or superadmin.
///
/// ```text
/// GET /stats                      -> stats
/// GET /users                      -> list_users (?search=&limit=&offset=)
/// PUT /users/{id}/role            -> update_role
/// PUT /users/{id}/deactivate      -> deactivate_user
/// PUT /users/{id}/reactivate      -> reactivate_user
/// GET /config                     -> get_config
/// PUT /config                     -> update_config
/// GET /audit-logs                 -> audit_logs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(admin::stats))
        .route("/users", get(admin::list_users))
        .route("/users/{id}/role", put(admin::update_role))
        .route("/users/{id}/deactivate", put(admin::deactivate_user))
        .route("/users/{id}/reactivate", put(admin::reactivate_user))
        .route("/config", get(admin::get_config).put(admin::update_config))
        .route("/audit-logs", get(admin::audit_logs))
}
