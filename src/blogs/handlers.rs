use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AdminUser,
    blogs::dto::{BlogListQuery, BlogResponse, BlogUpsertRequest},
    blogs::repo::{self, Blog},
    blogs::services::{calculate_read_time, normalize_tags},
    error::ApiError,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/blogs", get(list_blogs))
        .route("/blogs/:slug", get(get_blog))
}

// The write routes share the `:slug` slot with the public lookup;
// the router requires one parameter name per position. The admin
// handlers still parse the segment as a UUID.
pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/blogs", post(create_blog))
        .route("/blogs/:slug", put(update_blog))
        .route("/blogs/:slug/toggle-popular", put(toggle_popular))
        .route("/blogs/:slug", delete(delete_blog))
}

#[instrument(skip(state))]
async fn list_blogs(
    State(state): State<AppState>,
    Query(query): Query<BlogListQuery>,
) -> Result<Json<Vec<BlogResponse>>, ApiError> {
    let popular_only = query.popular.as_deref() == Some("true");
    let search = query.search.as_deref().filter(|s| !s.trim().is_empty());
    let blogs = repo::list(&state.db, popular_only, search).await?;
    Ok(Json(blogs.into_iter().map(BlogResponse::from).collect()))
}

#[instrument(skip(state))]
async fn get_blog(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogResponse>, ApiError> {
    let blog = repo::find_by_slug(&state.db, &slug)
        .await?
        .ok_or(ApiError::NotFound("Blog"))?;
    Ok(Json(blog.into()))
}

#[instrument(skip(state, admin, payload))]
async fn create_blog(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<BlogUpsertRequest>,
) -> Result<(StatusCode, Json<Blog>), ApiError> {
    if payload.title.trim().is_empty() || payload.slug.trim().is_empty() {
        return Err(ApiError::Validation("title and slug are required".into()));
    }

    let read_time = calculate_read_time(&payload.content);
    let tags = normalize_tags(&payload.tags);

    let blog = repo::insert(
        &state.db,
        payload.title.trim(),
        payload.slug.trim(),
        &payload.content,
        payload.cover_image.as_deref(),
        &read_time,
        &tags,
        admin.id,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(blog)))
}

#[instrument(skip(state, _admin, payload))]
async fn update_blog(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<BlogUpsertRequest>,
) -> Result<Json<Blog>, ApiError> {
    let read_time = calculate_read_time(&payload.content);
    let tags = normalize_tags(&payload.tags);

    let blog = repo::update(
        &state.db,
        id,
        payload.title.trim(),
        payload.slug.trim(),
        &payload.content,
        payload.cover_image.as_deref(),
        &read_time,
        &tags,
    )
    .await?
    .ok_or(ApiError::NotFound("Blog"))?;

    Ok(Json(blog))
}

#[instrument(skip(state, _admin))]
async fn toggle_popular(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Blog>, ApiError> {
    let blog = repo::toggle_popular(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Blog"))?;
    Ok(Json(blog))
}

#[instrument(skip(state, _admin))]
async fn delete_blog(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if repo::delete(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Blog"))
    }
}
