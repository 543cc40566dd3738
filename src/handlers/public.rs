// src/handlers/public.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, json::AppJson},
    models::authorization::{Authorization, CreatedBy, NewAuthorization},
};

// POST /api/public/autorizacoes
#[utoipa::path(
    post,
    path = "/api/public/autorizacoes",
    tag = "Público",
    request_body = NewAuthorization,
    responses(
        (status = 201, description = "Autorização registrada", body = Authorization),
        (status = 400, description = "Dados inválidos ou sem consentimento")
    )
)]
pub async fn submit_authorization(
    State(app_state): State<AppState>,
    locale: Locale,
    AppJson(payload): AppJson<NewAuthorization>,
) -> Result<impl IntoResponse, ApiError> {
    let record = app_state
        .lead_service
        .create(payload, CreatedBy::Sistema)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(record)))
}
