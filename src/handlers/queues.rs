// src/handlers/queues.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{CanDistribute, CanRelease, CanSchedule, RequireRole},
    },
    models::authorization::Authorization,
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorQueueQuery {
    /// Só vale para o gestor; a coordenadora sempre vê a própria fila.
    pub coordenadora_id: Option<String>,
}

// GET /api/filas/distribuicao
#[utoipa::path(
    get,
    path = "/api/filas/distribuicao",
    tag = "Filas",
    responses((status = 200, description = "Cadastros pendentes", body = Vec<Authorization>)),
    security(("api_jwt" = []))
)]
pub async fn distribution_queue(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<CanDistribute>,
) -> Result<impl IntoResponse, ApiError> {
    let records = app_state
        .lead_service
        .distribution_queue()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(records))
}

// GET /api/filas/coordenacao
#[utoipa::path(
    get,
    path = "/api/filas/coordenacao",
    tag = "Filas",
    params(CoordinatorQueueQuery),
    responses((status = 200, description = "Cadastros distribuídos para a coordenadora", body = Vec<Authorization>)),
    security(("api_jwt" = []))
)]
pub async fn coordinator_queue(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<CanRelease>,
    Query(query): Query<CoordinatorQueueQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let records = app_state
        .lead_service
        .coordinator_queue(&guard.user, query.coordenadora_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(records))
}

// GET /api/filas/agendamento
#[utoipa::path(
    get,
    path = "/api/filas/agendamento",
    tag = "Filas",
    responses((status = 200, description = "Cadastros liberados para ligação", body = Vec<Authorization>)),
    security(("api_jwt" = []))
)]
pub async fn scheduling_queue(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<CanSchedule>,
) -> Result<impl IntoResponse, ApiError> {
    let records = app_state
        .lead_service
        .scheduling_queue()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(records))
}
