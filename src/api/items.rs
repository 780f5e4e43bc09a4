use super::auth::AuthUser;
use super::{ApiError, ApiResult, AppState};
use crate::database::models::{ItemKind, ItemRecord};
use crate::database::repositories::{CommentRepository, ItemRepository};
use crate::utils::now_utc_iso;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub(crate) struct CreateItemRequest {
    kind: ItemKind,
    title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListItemsParams {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ItemResponse {
    id: String,
    kind: String,
    title: String,
    owner_user_id: Option<String>,
    created_at: String,
    /// Derived on read, never stored.
    comment_count: i64,
}

fn map_item(record: ItemRecord, comment_count: i64) -> ItemResponse {
    ItemResponse {
        id: record.id,
        kind: record.kind,
        title: record.title,
        owner_user_id: record.owner_user_id,
        created_at: record.created_at,
        comment_count,
    }
}

pub(crate) async fn create_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("item title may not be empty".into()));
    }

    let record = ItemRecord {
        id: Uuid::new_v4().to_string(),
        kind: payload.kind.as_str().to_string(),
        title: payload.title,
        owner_user_id: Some(user.id),
        created_at: now_utc_iso(),
    };
    state
        .database
        .with_repositories(|repos| repos.items().create(&record))?;
    tracing::info!(item_id = %record.id, kind = %record.kind, "created item");

    Ok((StatusCode::CREATED, Json(map_item(record, 0))))
}

pub(crate) async fn list_items(
    State(state): State<AppState>,
    Query(params): Query<ListItemsParams>,
) -> ApiResult<Vec<ItemResponse>> {
    let limit = params.limit.unwrap_or(50).min(200);
    let items = state.database.with_repositories(|repos| {
        let items = repos.items().list_recent(limit)?;
        let comments = repos.comments();
        items
            .into_iter()
            .map(|item| {
                let count = comments.count_for_item(&item.id)?;
                Ok(map_item(item, count))
            })
            .collect()
    })?;
    Ok(Json(items))
}

pub(crate) async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ItemResponse> {
    let item = state.database.with_repositories(|repos| {
        let item = repos.items().get(&id)?;
        match item {
            Some(item) => {
                let count = repos.comments().count_for_item(&item.id)?;
                Ok(Some(map_item(item, count)))
            }
            None => Ok(None),
        }
    })?;
    match item {
        Some(item) => Ok(Json(item)),
        None => Err(ApiError::NotFound(format!("item {id} not found"))),
    }
}
