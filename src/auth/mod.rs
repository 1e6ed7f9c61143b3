use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod oauth;
mod otp;
mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod sessions;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::local_routes())
        .merge(handlers::session_routes())
}
