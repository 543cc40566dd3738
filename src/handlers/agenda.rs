// src/handlers/agenda.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Local;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{CanUpdateAgenda, RequireRole},
    },
    models::agenda::{AgendaQuery, AgendaWeek},
};

// GET /api/agenda?semana=YYYY-MM-DD
#[utoipa::path(
    get,
    path = "/api/agenda",
    tag = "Agenda",
    params(AgendaQuery),
    responses((status = 200, description = "Semana de segunda a domingo", body = AgendaWeek)),
    security(("api_jwt" = []))
)]
pub async fn get_week(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<CanUpdateAgenda>,
    Query(query): Query<AgendaQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let reference = query.semana.unwrap_or_else(|| Local::now().date_naive());

    let week = app_state
        .lead_service
        .agenda(reference)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(week))
}
