use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;

use crate::{
    auth::dto::PublicUser,
    auth::extractors::AdminUser,
    auth::repo_types::User,
    blogs, leads,
    error::ApiError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/stats", get(get_stats))
        .route("/users", get(list_users))
}

#[derive(Debug, Serialize)]
struct Stats {
    users: i64,
    blogs: i64,
    leads: i64,
}

#[instrument(skip(state, _admin))]
async fn get_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Stats>, ApiError> {
    let (users, blogs, leads) = tokio::try_join!(
        User::count(&state.db),
        blogs::repo::count(&state.db),
        leads::repo::count(&state.db),
    )?;

    Ok(Json(Stats {
        users,
        blogs,
        leads,
    }))
}

#[instrument(skip(state, _admin))]
async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = User::list_all(&state.db).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}
