use crate::error::NylahError;
use crate::server::router::NylahState;
use crate::site::{BookingForm, PublicSite, QuoteForm};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value, json};
use tracing::info;

pub async fn get_site(State(state): State<NylahState>) -> Json<PublicSite> {
    Json(state.snapshot.get().await.public_view())
}

pub async fn create_quote(
    State(state): State<NylahState>,
    payload: Result<Json<QuoteForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), NylahError> {
    let Json(form) = payload?;
    let row = form.into_row()?;

    state.store().insert_quote(&row).await?;
    state.snapshot.invalidate();

    info!(
        store.table = "quotes",
        service_type = %row.service_type,
        "[Store] quote request saved"
    );
    Ok((StatusCode::CREATED, Json(json!({ "status": "saved" }))))
}

pub async fn create_booking(
    State(state): State<NylahState>,
    payload: Result<Json<BookingForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), NylahError> {
    let Json(form) = payload?;
    let row = form.into_row()?;

    state.store().insert_booking(&row).await?;
    state.snapshot.invalidate();

    info!(
        store.table = "bookings",
        date = %row.date,
        time = %row.time,
        "[Store] booking saved"
    );
    Ok((StatusCode::CREATED, Json(json!({ "status": "saved" }))))
}

pub fn router() -> Router<NylahState> {
    Router::new()
        .route("/api/site", get(get_site))
        .route("/api/quotes", post(create_quote))
        .route("/api/bookings", post(create_booking))
}
