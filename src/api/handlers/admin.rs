use crate::{
    types::{AppError, Result, UserResponse},
    AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};

/// Look up any user by id (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/admin/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "No such user")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>> {
    state
        .users
        .find_user_by_id(id)
        .await?
        .map(|user| Json(user.to_response()))
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
}
