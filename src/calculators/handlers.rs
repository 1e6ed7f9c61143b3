use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    calculators::dto::{SaveEntryRequest, SavedEntryResponse, UpdateEntryRequest},
    calculators::repo::{self, CalculatorEntry},
    error::ApiError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/calculators", post(save_entry))
        .route("/calculators/:id", put(update_entry))
        .route("/calculators/history", get(get_history))
}

/// Autosave target. Best-effort from the client's point of view: the
/// coordinator fires this once on teardown and does not retry.
#[instrument(skip(state, user, payload))]
async fn save_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<SaveEntryRequest>,
) -> Result<(StatusCode, Json<SavedEntryResponse>), ApiError> {
    let (id, updated) = repo::upsert_daily(
        &state.db,
        user.id,
        payload.calc_type,
        &payload.input_data,
        &payload.result_data,
    )
    .await?;

    if updated {
        Ok((
            StatusCode::OK,
            Json(SavedEntryResponse {
                message: "Entry updated (Same Day)".into(),
                id,
            }),
        ))
    } else {
        Ok((
            StatusCode::CREATED,
            Json(SavedEntryResponse {
                message: "Entry saved".into(),
                id,
            }),
        ))
    }
}

#[instrument(skip(state, user, payload))]
async fn update_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEntryRequest>,
) -> Result<Json<SavedEntryResponse>, ApiError> {
    let entry = repo::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Entry"))?;

    // Ownership check: entries belong to exactly one account.
    if entry.user_id != Some(user.id) {
        return Err(ApiError::Forbidden);
    }

    repo::update_payload(&state.db, id, &payload.input_data, &payload.result_data).await?;

    Ok(Json(SavedEntryResponse {
        message: "Entry updated".into(),
        id,
    }))
}

#[instrument(skip(state, user))]
async fn get_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<CalculatorEntry>>, ApiError> {
    let history = repo::history_for_user(&state.db, user.id).await?;
    Ok(Json(history))
}
