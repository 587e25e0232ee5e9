use crate::error::NylahError;
use crate::server::guards::admin::RequireAdmin;
use crate::server::router::NylahState;
use crate::site::{SettingsUpdate, save_settings};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use nylah_schema::{BookingRow, QuoteRow};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Exchanges the operator credentials for a bearer token.
pub async fn login(
    State(state): State<NylahState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, NylahError> {
    let Json(req) = payload?;
    if !state.credentials.verify(&req.username, &req.password) {
        warn!("[Admin] login rejected");
        return Err(NylahError::Unauthorized);
    }

    let token = state.admin_sessions.issue();
    info!("[Admin] operator logged in");
    Ok(Json(LoginResponse { token }))
}

pub async fn logout(State(state): State<NylahState>, admin: RequireAdmin) -> StatusCode {
    state.admin_sessions.revoke(&admin.token);
    info!("[Admin] operator logged out");
    StatusCode::NO_CONTENT
}

/// Current settings and catalog, read fresh from the store.
pub async fn get_settings(State(state): State<NylahState>) -> Json<SettingsUpdate> {
    state.snapshot.invalidate();
    let snapshot = state.snapshot.get().await;
    Json(SettingsUpdate {
        settings: snapshot.settings.clone(),
        services: snapshot.services.clone(),
    })
}

pub async fn put_settings(
    State(state): State<NylahState>,
    payload: Result<Json<SettingsUpdate>, JsonRejection>,
) -> Result<Json<Value>, NylahError> {
    let Json(update) = payload?;
    let result = save_settings(state.store(), &update).await;
    // A partial save still changed the store.
    state.snapshot.invalidate();
    result?;
    Ok(Json(json!({ "status": "saved" })))
}

pub async fn list_bookings(
    State(state): State<NylahState>,
) -> Result<Json<Vec<BookingRow>>, NylahError> {
    Ok(Json(state.store().list_bookings().await?))
}

pub async fn list_quotes(
    State(state): State<NylahState>,
) -> Result<Json<Vec<QuoteRow>>, NylahError> {
    Ok(Json(state.store().list_quotes().await?))
}

pub fn router(state: NylahState) -> Router<NylahState> {
    let guarded = Router::new()
        .route("/admin/logout", post(logout))
        .route("/admin/settings", get(get_settings).put(put_settings))
        .route("/admin/bookings", get(list_bookings))
        .route("/admin/quotes", get(list_quotes))
        .layer(middleware::from_extractor_with_state::<RequireAdmin, _>(
            state,
        ));

    Router::new()
        .route("/admin/login", post(login))
        .merge(guarded)
}
