use super::auth::AuthUser;
use super::{ApiError, ApiResult, AppState};
use crate::comments::{AddCommentInput, CommentPage, CommentService, CommentView};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct ListCommentsParams {
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateCommentRequest {
    content: String,
    #[serde(default)]
    parent_comment_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentResponse {
    comment: CommentView,
}

pub(crate) async fn list_comments(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(item_id): Path<String>,
    Query(params): Query<ListCommentsParams>,
) -> ApiResult<CommentPage> {
    let limits = &state.config.comments;
    let page = params.page.unwrap_or(1);
    let page_size = params
        .page_size
        .unwrap_or(limits.default_page_size)
        .min(limits.max_page_size);

    let service = CommentService::new(state.database.clone());
    let listing = service.list_comments(&item_id, page, page_size)?;
    Ok(Json(listing))
}

pub(crate) async fn create_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(item_id): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    let service = CommentService::new(state.database.clone());
    let comment = service.add_comment(AddCommentInput {
        item_id,
        author_user_id: user.id,
        content: payload.content,
        parent_comment_id: payload.parent_comment_id,
    })?;
    Ok((StatusCode::CREATED, Json(CommentResponse { comment })))
}

pub(crate) async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(comment_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let service = CommentService::new(state.database.clone());
    service.delete_comment(&comment_id, &user.id)?;
    Ok(StatusCode::OK)
}
