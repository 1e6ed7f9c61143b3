use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::AdminUser,
    calculators,
    error::ApiError,
    leads::dto::{SubmitLeadRequest, SubmitLeadResponse},
    leads::export::leads_to_csv,
    leads::repo::{self, Lead},
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/leads", post(submit_lead))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/leads", get(list_leads))
        .route("/leads/export", get(export_leads))
}

/// Public funnel endpoint; no account is required.
#[instrument(skip(state, payload))]
async fn submit_lead(
    State(state): State<AppState>,
    Json(payload): Json<SubmitLeadRequest>,
) -> Result<(StatusCode, Json<SubmitLeadResponse>), ApiError> {
    if payload.full_name.trim().is_empty() || payload.mobile.trim().is_empty() {
        return Err(ApiError::Validation("full_name and mobile are required".into()));
    }

    // The lead and its context snapshot commit together; a lead never
    // lands without the context it was submitted with.
    let mut tx = state.db.begin().await?;
    let lead = repo::insert(
        &mut *tx,
        payload.full_name.trim(),
        payload.mobile.trim(),
        payload.email.as_deref(),
        payload.city.as_deref(),
        payload.income.as_deref(),
        payload.consent,
    )
    .await?;

    if let Some(ctx) = &payload.calculator_data {
        calculators::repo::insert_for_lead(
            &mut *tx,
            lead.id,
            ctx.calc_type,
            &ctx.input_data,
            &ctx.result_data,
        )
        .await?;
    }
    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitLeadResponse {
            success: true,
            message: "Lead submitted successfully".into(),
            lead_id: lead.id,
        }),
    ))
}

#[instrument(skip(state, _admin))]
async fn list_leads(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<Lead>>, ApiError> {
    let leads = repo::list_all(&state.db).await?;
    Ok(Json(leads))
}

#[instrument(skip(state, _admin))]
async fn export_leads(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<(HeaderMap, String), ApiError> {
    let leads = repo::list_all(&state.db).await?;
    let csv = leads_to_csv(&leads);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        "text/csv; charset=utf-8".parse().expect("static header"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        "attachment; filename=\"leads.csv\""
            .parse()
            .expect("static header"),
    );
    Ok((headers, csv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculators::repo::CalculatorType;
    use crate::leads::dto::CalculatorContext;

    fn unreachable_store_state() -> AppState {
        let mut state = AppState::fake();
        // Port 1 refuses immediately, so the write fails instead of
        // hanging on a half-open pool.
        state.db = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_secs(2))
            .connect_lazy("postgres://postgres@127.0.0.1:1/postgres")
            .expect("lazy pool ok");
        state
    }

    #[tokio::test]
    async fn submission_with_context_is_all_or_nothing() {
        let payload = SubmitLeadRequest {
            full_name: "Asha Rao".into(),
            mobile: "9876543210".into(),
            email: None,
            city: None,
            income: None,
            consent: true,
            calculator_data: Some(CalculatorContext {
                calc_type: CalculatorType::Emi,
                input_data: serde_json::json!({"principal": 500000}),
                result_data: serde_json::json!({"emi": 10624}),
            }),
        };

        let result = submit_lead(State(unreachable_store_state()), Json(payload)).await;
        assert!(result.is_err(), "store failure must fail the submission");
    }

    #[tokio::test]
    async fn missing_required_fields_are_rejected() {
        let payload = SubmitLeadRequest {
            full_name: "  ".into(),
            mobile: "9876543210".into(),
            email: None,
            city: None,
            income: None,
            consent: false,
            calculator_data: None,
        };

        let err = submit_lead(State(AppState::fake()), Json(payload))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
