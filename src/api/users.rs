use super::{ApiError, ApiResult, AppState};
use crate::database::models::UserRecord;
use crate::database::repositories::UserRepository;
use crate::utils::now_utc_iso;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterUserRequest {
    name: String,
    #[serde(default)]
    avatar_url: Option<String>,
}

/// Returned once, at registration; the token is the caller's credential for
/// every authenticated endpoint and is never listed again.
#[derive(Debug, Serialize)]
pub(crate) struct RegisteredUserResponse {
    id: String,
    name: String,
    avatar_url: Option<String>,
    api_token: String,
    created_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    id: String,
    name: String,
    avatar_url: Option<String>,
    created_at: String,
}

pub(crate) async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<RegisteredUserResponse>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("user name may not be empty".into()));
    }

    let record = UserRecord {
        id: Uuid::new_v4().to_string(),
        name: payload.name,
        avatar_url: payload.avatar_url,
        api_token: Uuid::new_v4().to_string(),
        created_at: now_utc_iso(),
    };
    state
        .database
        .with_repositories(|repos| repos.users().create(&record))?;
    tracing::info!(user_id = %record.id, "registered user");

    Ok((
        StatusCode::CREATED,
        Json(RegisteredUserResponse {
            id: record.id,
            name: record.name,
            avatar_url: record.avatar_url,
            api_token: record.api_token,
            created_at: record.created_at,
        }),
    ))
}

pub(crate) async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<UserResponse> {
    let user = state
        .database
        .with_repositories(|repos| repos.users().get(&id))?;
    match user {
        Some(user) => Ok(Json(UserResponse {
            id: user.id,
            name: user.name,
            avatar_url: user.avatar_url,
            created_at: user.created_at,
        })),
        None => Err(ApiError::NotFound(format!("user {id} not found"))),
    }
}
