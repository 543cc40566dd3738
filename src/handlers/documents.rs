// src/handlers/documents.rs

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
};

// GET /api/autorizacoes/{id}/ficha
#[utoipa::path(
    get,
    path = "/api/autorizacoes/{id}/ficha",
    tag = "Autorizações",
    params(("id" = Uuid, Path, description = "ID da autorização")),
    responses(
        (status = 200, description = "Ficha de atendimento em PDF", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn ficha_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let record = app_state
        .lead_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pdf_bytes = app_state
        .document_service
        .ficha_pdf(record)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Configura os Headers para o navegador mostrar o PDF
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, format!("inline; filename=\"ficha_{id}.pdf\"")),
    ];

    Ok((headers, pdf_bytes).into_response())
}
