//! Handlers for the `/admin` resource.
//!
//! All handlers require an admin or superadmin via [`RequireAdmin`]. Every
//! mutation writes an entry to the admin audit log.

use axum::extract::{Path, Query, State};
use axum::Json;
use kdpdesk_core::error::CoreError;
use kdpdesk_core::roles::ROLE_SUPERADMIN;
use kdpdesk_core::types::DbId;
use kdpdesk_core::validation::validate_role;
use kdpdesk_db::models::audit::{AuditLog, AuditQuery, CreateAuditLog};
use kdpdesk_db::models::system_config::{SystemConfig, UpsertSystemConfig};
use kdpdesk_db::models::user::{User, UserResponse, UserSearch};
use kdpdesk_db::repositories::{
    AuditLogRepo, BookRepo, KdpImportDataRepo, KdpImportRepo, ProjectRepo, SalesDataRepo,
    SessionRepo, SystemConfigRepo, UserRepo,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::client::ClientInfo;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Users who logged in within this many days count as active.
const ACTIVE_USER_WINDOW_DAYS: i32 = 30;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateConfigRequest {
    pub settings: Vec<UpsertSystemConfig>,
}

#[derive(Debug, Serialize)]
pub struct UserPage {
    pub data: Vec<UserResponse>,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct CountByKey {
    pub key: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub total_users: i64,
    pub active_users_30_days: i64,
    pub users_by_role: Vec<CountByKey>,
    pub total_projects: i64,
    pub total_books: i64,
    pub total_import_records: i64,
    pub imports_by_status: Vec<CountByKey>,
    pub total_sales_revenue: f64,
}

fn counts(rows: Vec<(String, i64)>) -> Vec<CountByKey> {
    rows.into_iter()
        .map(|(key, count)| CountByKey { key, count })
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Record an admin action in the audit log.
async fn audit(
    state: &AppState,
    admin: &AuthUser,
    client: ClientInfo,
    action: &str,
    resource: &str,
    resource_id: Option<String>,
    details: serde_json::Value,
) -> AppResult<()> {
    AuditLogRepo::create(
        &state.pool,
        &CreateAuditLog {
            user_id: Some(admin.user_id),
            action: action.to_string(),
            resource: resource.to_string(),
            resource_id,
            details: Some(details),
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        },
    )
    .await?;
    Ok(())
}

async fn find_user(state: &AppState, id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))
}

/// Only a superadmin may touch superadmin accounts or grant the role.
fn guard_superadmin(admin: &AuthUser, target: &User, new_role: Option<&str>) -> AppResult<()> {
    let touches_superadmin = target.role == ROLE_SUPERADMIN || new_role == Some(ROLE_SUPERADMIN);
    if touches_superadmin && !admin.is_superadmin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Superadmin access required".into(),
        )));
    }
    Ok(())
}

fn guard_self(admin: &AuthUser, id: DbId, what: &str) -> AppResult<()> {
    if admin.user_id == id {
        return Err(AppError::BadRequest(format!("You cannot {what} your own account")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/stats
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<AdminStats>> {
    let pool = &state.pool;
    let users_by_role = UserRepo::count_by_role(pool).await?;

    Ok(Json(AdminStats {
        total_users: users_by_role.iter().map(|(_, n)| n).sum(),
        active_users_30_days: UserRepo::count_active_since_days(pool, ACTIVE_USER_WINDOW_DAYS)
            .await?,
        users_by_role: counts(users_by_role),
        total_projects: ProjectRepo::count_all(pool).await?,
        total_books: BookRepo::count_all(pool).await?,
        total_import_records: KdpImportDataRepo::count_all(pool).await?,
        imports_by_status: counts(KdpImportRepo::count_by_status(pool).await?),
        total_sales_revenue: SalesDataRepo::total_revenue_all(pool).await?,
    }))
}

/// GET /api/v1/admin/users?search=&limit=&offset=
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<UserSearch>,
) -> AppResult<Json<UserPage>> {
    let (users, total) = UserRepo::search(&state.pool, &params).await?;
    Ok(Json(UserPage {
        data: users.into_iter().map(UserResponse::from).collect(),
        total,
    }))
}

/// PUT /api/v1/admin/users/{id}/role
pub async fn update_role(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    client: ClientInfo,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateRoleRequest>,
) -> AppResult<Json<UserResponse>> {
    validate_role(&input.role)?;
    guard_self(&admin, id, "change the role of")?;
    let target = find_user(&state, id).await?;
    guard_superadmin(&admin, &target, Some(&input.role))?;

    let updated = UserRepo::set_role(&state.pool, id, &input.role)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;

    audit(
        &state,
        &admin,
        client,
        "update_role",
        "user",
        Some(id.to_string()),
        json!({ "from": target.role, "to": input.role }),
    )
    .await?;
    tracing::info!(admin_id = admin.user_id, user_id = id, role = %input.role, "User role changed");

    Ok(Json(updated.into()))
}

/// PUT /api/v1/admin/users/{id}/deactivate
///
/// Also revokes the user's sessions.
pub async fn deactivate_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    client: ClientInfo,
    Path(id): Path<DbId>,
) -> AppResult<Json<UserResponse>> {
    guard_self(&admin, id, "deactivate")?;
    let target = find_user(&state, id).await?;
    guard_superadmin(&admin, &target, None)?;

    UserRepo::set_active(&state.pool, id, false).await?;
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, id).await?;

    audit(
        &state,
        &admin,
        client,
        "deactivate_user",
        "user",
        Some(id.to_string()),
        json!({ "sessions_revoked": revoked }),
    )
    .await?;
    tracing::info!(admin_id = admin.user_id, user_id = id, "User deactivated");

    Ok(Json(find_user(&state, id).await?.into()))
}

/// PUT /api/v1/admin/users/{id}/reactivate
pub async fn reactivate_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    client: ClientInfo,
    Path(id): Path<DbId>,
) -> AppResult<Json<UserResponse>> {
    let target = find_user(&state, id).await?;
    guard_superadmin(&admin, &target, None)?;

    UserRepo::set_active(&state.pool, id, true).await?;
    audit(
        &state,
        &admin,
        client,
        "reactivate_user",
        "user",
        Some(id.to_string()),
        json!({}),
    )
    .await?;

    Ok(Json(find_user(&state, id).await?.into()))
}

/// GET /api/v1/admin/config
pub async fn get_config(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<SystemConfig>>>> {
    let settings = SystemConfigRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: settings }))
}

/// PUT /api/v1/admin/config
///
/// Body: `{ "settings": [{ "key", "value", "description" }] }`.
pub async fn update_config(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    client: ClientInfo,
    Json(input): Json<UpdateConfigRequest>,
) -> AppResult<Json<DataResponse<Vec<SystemConfig>>>> {
    if input.settings.iter().any(|s| s.key.trim().is_empty()) {
        return Err(AppError::Core(CoreError::Validation(
            "Setting keys must not be empty".into(),
        )));
    }

    let mut saved = Vec::with_capacity(input.settings.len());
    for setting in &input.settings {
        saved.push(SystemConfigRepo::upsert(&state.pool, setting, admin.user_id).await?);
    }

    let keys: Vec<&str> = input.settings.iter().map(|s| s.key.as_str()).collect();
    audit(
        &state,
        &admin,
        client,
        "update_config",
        "system_config",
        None,
        json!({ "keys": keys }),
    )
    .await?;

    Ok(Json(DataResponse { data: saved }))
}

/// GET /api/v1/admin/audit-logs?user_id=&action=&resource=&limit=&offset=
pub async fn audit_logs(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<AuditQuery>,
) -> AppResult<Json<DataResponse<Vec<AuditLog>>>> {
    let logs = AuditLogRepo::query(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: logs }))
}
