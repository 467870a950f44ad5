use crate::{
    auth::middleware::AuthUser,
    types::{AppError, AuthResponse, LoginRequest, RegisterRequest, Result, UserResponse},
    AppState,
};
use axum::{extract::rejection::JsonRejection, extract::State, Json};

const MIN_PASSWORD_LEN: usize = 8;

fn validate_registration(payload: &RegisterRequest) -> Result<()> {
    if payload.username.trim().is_empty() {
        return Err(AppError::InvalidInput("Username required".to_string()));
    }
    if !payload.email.contains('@') {
        return Err(AppError::InvalidInput("Valid email required".to_string()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "User already exists")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(payload) = payload?;
    validate_registration(&payload)?;

    if state
        .users
        .find_user_by_email(&payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash = state.hasher.hash(&payload.password)?;

    let user = state
        .users
        .create_user(&payload.username, &payload.email, &password_hash)
        .await?;

    let token = state
        .tokens
        .issue(user.id, &user.email, &user.username, user.role)?;

    tracing::info!(user_id = user.id, role = %user.role, "user registered");

    Ok(Json(AuthResponse {
        token,
        user: user.to_response(),
    }))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Invalid request body"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(payload) = payload?;

    let Some(user) = state.users.find_user_by_email(&payload.email).await? else {
        state.hasher.dummy_verify(&payload.password);
        return Err(AppError::Credentials);
    };

    if !state
        .hasher
        .verify(&payload.password, &user.password_hash)?
    {
        tracing::info!(user_id = user.id, "login rejected");
        return Err(AppError::Credentials);
    }

    let token = state
        .tokens
        .issue(user.id, &user.email, &user.username, user.role)?;

    tracing::info!(user_id = user.id, "user logged in");

    Ok(Json(AuthResponse {
        token,
        user: user.to_response(),
    }))
}

/// Profile of the authenticated caller
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "Caller's profile", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User no longer exists")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<UserResponse>> {
    let user = state
        .users
        .find_user_by_id(claims.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.to_response()))
}
