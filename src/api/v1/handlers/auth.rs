/*
 * Responsibility
 * - POST /auth/register, POST /auth/login (公開エンドポイント)
 * - GET /auth/me (認証済み Identity の確認用)
 * - token の発行は TokenService、パスワードは services::auth::password に委譲
 */
use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::v1::{
        dto::{
            api_response::ApiResponse,
            auth::{AuthResponse, IdentityResponse, LoginRequest, RegisterRequest, normalize_email},
        },
        extractors::CurrentOwner,
    },
    error::AppError,
    repos::{
        error::RepoError,
        owner_repo::{self, NewOwner, OwnerRow},
    },
    services::auth::password,
    state::AppState,
};

const EMAIL_TAKEN: &str = "Email already registered";
const BAD_CREDENTIALS: &str = "Invalid email or password";

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), AppError> {
    req.validate().map_err(AppError::bad_request)?;

    let email = normalize_email(&req.email);
    if owner_repo::find_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::Conflict(EMAIL_TAKEN.into()));
    }

    let password_hash = password::hash_password(&req.password)?;
    let owner = owner_repo::insert(
        &state.db,
        NewOwner {
            first_name: req.first_name.trim(),
            last_name: req.last_name.trim(),
            email: &email,
            password_hash: &password_hash,
        },
    )
    .await
    .map_err(|e| match e {
        // lost a race with a concurrent registration
        RepoError::Conflict => AppError::Conflict(EMAIL_TAKEN.into()),
        other => other.into(),
    })?;

    let token = state.tokens.issue(owner.id, &owner.email)?;
    tracing::info!(owner_id = owner.id, "owner registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            AuthResponse {
                owner_id: owner.id,
                token,
            },
            "Registration successful",
        )),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    req.validate().map_err(AppError::bad_request)?;

    let email = normalize_email(&req.email);
    let found = owner_repo::find_by_email(&state.db, &email).await?;
    let owner = check_credentials(found, &req.password)?;

    owner_repo::record_login(&state.db, owner.id).await?;
    let token = state.tokens.issue(owner.id, &owner.email)?;

    Ok(Json(ApiResponse::success(
        AuthResponse {
            owner_id: owner.id,
            token,
        },
        "Login successful",
    )))
}

/// Unknown email and wrong password fail the same way and both pay for one Argon2
/// verification.
fn check_credentials(found: Option<OwnerRow>, password: &str) -> Result<OwnerRow, AppError> {
    let Some(owner) = found else {
        password::verify_dummy(password);
        tracing::debug!("login for unknown email");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    };

    if !password::verify_password(password, &owner.password_hash)? {
        tracing::warn!(owner_id = owner.id, "login with wrong password");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    }

    Ok(owner)
}

pub async fn me(CurrentOwner(identity): CurrentOwner) -> Json<ApiResponse<IdentityResponse>> {
    Json(ApiResponse::success(
        IdentityResponse {
            owner_id: identity.owner_id(),
            username: identity.username().to_owned(),
        },
        "Authenticated",
    ))
}
