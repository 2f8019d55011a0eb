//! Handlers for the `/auth` resource.
//!
//! Register and login open a session; refresh trades a session for a new
//! one. Every session records the caller's address and user agent.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use kdpdesk_core::error::CoreError;
use kdpdesk_core::types::DbId;
use kdpdesk_core::validation::{validate_email, validate_username};
use kdpdesk_db::models::session::CreateSession;
use kdpdesk_db::models::user::{CreateUser, User, UserResponse};
use kdpdesk_db::repositories::{SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{issue_access_token, RefreshToken};
use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::client::ClientInfo;
use crate::state::AppState;

/// Failed logins in a row that lock the account.
const LOCKOUT_THRESHOLD: i32 = 5;

const LOCKOUT_MINUTES: i32 = 15;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// `username` may also be the account's email.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until `access_token` expires.
    pub expires_in: i64,
    pub user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub role: String,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
        }
    }
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.to_string()))
}

fn forbidden(msg: &str) -> AppError {
    AppError::Core(CoreError::Forbidden(msg.to_string()))
}

/// POST /api/v1/auth/register
///
/// Creates a `user` account and signs it in.
pub async fn register(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let username = input.username.trim().to_string();
    let email = input.email.trim().to_lowercase();
    validate_username(&username)?;
    validate_email(&email)?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    if UserRepo::find_by_username(&state.pool, &username).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "Username is already taken".into(),
        )));
    }
    if UserRepo::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "Email is already registered".into(),
        )));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;
    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username,
            email,
            password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            role: None,
        },
    )
    .await?;
    tracing::info!(user_id = user.id, "User registered");

    let (refresh, session) = new_session(&state, &user, client);
    SessionRepo::create(&state.pool, &session).await?;
    Ok((StatusCode::CREATED, Json(auth_response(&state, &user, refresh)?)))
}

/// POST /api/v1/auth/login
///
/// Five wrong passwords in a row lock the account for fifteen minutes.
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = UserRepo::find_by_login(&state.pool, input.username.trim())
        .await?
        .ok_or_else(|| unauthorized("Invalid username or password"))?;

    ensure_active(&user)?;
    if user.is_locked(Utc::now()) {
        return Err(forbidden("Account is temporarily locked. Try again later."));
    }

    let matches = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Stored password hash unreadable: {e}")))?;
    if !matches {
        let locked =
            UserRepo::record_failed_login(&state.pool, user.id, LOCKOUT_THRESHOLD, LOCKOUT_MINUTES)
                .await?;
        if locked {
            tracing::warn!(user_id = user.id, ip = ?client.ip_address, "Account locked");
        }
        return Err(unauthorized("Invalid username or password"));
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;
    let (refresh, session) = new_session(&state, &user, client);
    SessionRepo::create(&state.pool, &session).await?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(auth_response(&state, &user, refresh)?))
}

/// POST /api/v1/auth/refresh
///
/// Single use: the presented token's session is revoked in the same
/// transaction that opens the new one.
pub async fn refresh(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let token_hash = RefreshToken::digest(&input.refresh_token);
    let current = SessionRepo::find_active_by_token_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| unauthorized("Invalid or expired refresh token"))?;

    let user = UserRepo::find_by_id(&state.pool, current.user_id)
        .await?
        .ok_or_else(|| unauthorized("User no longer exists"))?;
    ensure_active(&user)?;

    let (refresh, next) = new_session(&state, &user, client);
    if SessionRepo::rotate(&state.pool, current.id, &next).await?.is_none() {
        tracing::warn!(user_id = user.id, session_id = current.id, "Refresh token reused");
        return Err(unauthorized("Invalid or expired refresh token"));
    }

    Ok(Json(auth_response(&state, &user, refresh)?))
}

/// POST /api/v1/auth/logout
///
/// Revokes every session of the caller, not just the current one.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;
    tracing::debug!(user_id = auth_user.user_id, revoked, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn me(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<Json<UserResponse>> {
    let user = UserRepo::find_by_id(&state.pool, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", auth_user.user_id))?;
    Ok(Json(user.into()))
}

fn ensure_active(user: &User) -> AppResult<()> {
    if user.is_active {
        Ok(())
    } else {
        Err(forbidden("Account is deactivated"))
    }
}

/// A fresh refresh token and the session row that will hold its hash.
fn new_session(state: &AppState, user: &User, client: ClientInfo) -> (RefreshToken, CreateSession) {
    let refresh = RefreshToken::generate();
    let session = CreateSession {
        user_id: user.id,
        refresh_token_hash: refresh.hash.clone(),
        expires_at: Utc::now() + state.config.jwt.refresh_ttl(),
        user_agent: client.user_agent,
        ip_address: client.ip_address,
    };
    (refresh, session)
}

fn auth_response(state: &AppState, user: &User, refresh: RefreshToken) -> AppResult<AuthResponse> {
    let jwt = &state.config.jwt;
    let access_token = issue_access_token(user.id, &user.role, jwt)
        .map_err(|e| AppError::InternalError(format!("Could not sign access token: {e}")))?;

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh.plaintext,
        expires_in: jwt.access_ttl().num_seconds(),
        user: SessionUser::from(user),
    })
}
