//! Handlers for the `/auth` resource (register, login, me, change-password).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tally_core::error::CoreError;
use tally_core::invite_codes::is_redeemable;
use tally_core::permissions::AuthMethod;
use tally_db::models::user::{CreateUser, UserResponse};
use tally_db::repositories::{InviteCodeRepo, UserRepo};
use validator::Validate;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::permissions::{RequireActive, RequireVerified};
use crate::response::DataResponse;
use crate::state::AppState;

const INVALID_INVITE: &str = "Invite code is invalid, expired, or already used";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(equal = 8))]
    pub invite_code: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Session token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Response body for `GET /auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    /// `"session"` or `"api_token"`.
    pub auth_method: &'static str,
}

/// Request body for `POST /auth/change-password`.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create an unverified account. Requires a valid single-use invite code.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let now = state.clock.now();
    let code = input.invite_code.trim().to_uppercase();

    // 1. Cheap pre-check so a bad code never costs an Argon2 hash.
    let invite = InviteCodeRepo::find_by_code(&state.pool, &code).await?;
    let redeemable = invite
        .as_ref()
        .is_some_and(|i| is_redeemable(i.is_active, i.expires_at, i.used_at, now));
    if !redeemable {
        return Err(CoreError::Validation(INVALID_INVITE.into()).into());
    }

    if UserRepo::find_by_email(&state.pool, &input.email).await?.is_some() {
        return Err(CoreError::Conflict("An account with this email already exists".into()).into());
    }

    let password_hash = hash_password(input.password).await?;

    // 2. Create the user and consume the code together.
    let mut tx = state.pool.begin().await?;
    let user = UserRepo::create(
        &mut tx,
        &CreateUser {
            email: input.email.trim().to_string(),
            password_hash,
            is_staff: false,
        },
    )
    .await?;

    // The conditional UPDATE is the real guard; a concurrent registration
    // with the same code loses here and the whole transaction rolls back.
    if InviteCodeRepo::redeem(&mut tx, &code, user.id, now)
        .await?
        .is_none()
    {
        return Err(CoreError::Validation(INVALID_INVITE.into()).into());
    }
    tx.commit().await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

/// POST /api/v1/auth/login
///
/// Authenticate with email + password. Returns a session token.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = UserRepo::find_by_email(&state.pool, &input.email)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Invalid email or password".into()))
        })?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let password_valid = verify_password(input.password, user.password_hash.clone()).await?;
    if !password_valid {
        tracing::warn!(user_id = user.id, "Login failed: wrong password");
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid email or password".into(),
        )));
    }

    let access_token = generate_access_token(user.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.config.jwt.expires_in(),
        user: UserResponse::from(&user),
    }))
}

/// GET /api/v1/auth/me
///
/// Available to unverified accounts so the UI can prompt for verification.
pub async fn me(
    RequireActive(auth): RequireActive,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id())
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: auth.user_id(),
        })?;

    let auth_method = match auth.principal.method {
        AuthMethod::Session => "session",
        AuthMethod::ApiToken { .. } => "api_token",
    };

    Ok(Json(DataResponse {
        data: MeResponse {
            user: UserResponse::from(&user),
            auth_method,
        },
    }))
}

/// POST /api/v1/auth/change-password
pub async fn change_password(
    RequireVerified(auth): RequireVerified,
    State(state): State<AppState>,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    input.validate()?;

    let user = UserRepo::find_by_id(&state.pool, auth.user_id())
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: auth.user_id(),
        })?;

    if !verify_password(input.current_password, user.password_hash).await? {
        return Err(CoreError::Validation("Current password is incorrect".into()).into());
    }

    let new_hash = hash_password(input.new_password).await?;
    UserRepo::update_password(&state.pool, user.id, &new_hash).await?;

    tracing::info!(user_id = user.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}
