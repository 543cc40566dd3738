// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        json::AppJson,
        rbac::{CanReport, RequireRole},
    },
    models::report::{AttendanceReport, NarrativeReport, ReportQuery},
};

// GET /api/relatorios?tipo=&valor=
#[utoipa::path(
    get,
    path = "/api/relatorios",
    tag = "Relatórios",
    params(ReportQuery),
    responses(
        (status = 200, description = "Resumo de comparecimento", body = AttendanceReport),
        (status = 400, description = "Filtro inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn attendance_report(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<CanReport>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .attendance(query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}

// POST /api/relatorios/narrativa
#[utoipa::path(
    post,
    path = "/api/relatorios/narrativa",
    tag = "Relatórios",
    request_body = ReportQuery,
    responses(
        (status = 200, description = "Relatório em texto com o resumo", body = NarrativeReport),
        (status = 502, description = "Falha no gerador de texto"),
        (status = 503, description = "Gerador de texto não configurado")
    ),
    security(("api_jwt" = []))
)]
pub async fn narrative_report(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<CanReport>,
    AppJson(query): AppJson<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .narrative(query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}
