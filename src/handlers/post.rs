// src/handlers/post.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    coordinator::PostCoordinator,
    error::AppError,
    models::post::CreatePostRequest,
    store::{PostStore, UserStore},
    utils::jwt::Principal,
};

/// Creates a full post aggregate in one logical operation.
///
/// All shape invariants (media pairing, answer indexes, like types,
/// ratings) are checked before a single row is written; the coordinator
/// then persists the post row and fans out the nine child collections.
pub async fn create_post(
    State(pool): State<PgPool>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let author = UserStore::new(pool.clone())
        .find_by_username(&principal.0)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let coordinator = PostCoordinator::new(PostStore::new(pool));
    let post_id = coordinator.create_post(author.id, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "postId": post_id })),
    ))
}

/// Fetches a post aggregate: the post row and all nine collections, read
/// concurrently and assembled into one document.
pub async fn get_post(
    State(pool): State<PgPool>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let coordinator = PostCoordinator::new(PostStore::new(pool));
    let post = coordinator.get_post(post_id).await?;

    Ok(Json(post))
}
