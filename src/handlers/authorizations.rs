// src/handlers/authorizations.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        json::AppJson,
        rbac::{CanDistribute, CanRelease, CanSchedule, CanUpdateAgenda, RequireRole},
    },
    models::authorization::{
        Authorization, CreatedBy, DistributePayload, NewAuthorization, ReleasePayload, SchedulePayload,
    },
};

// =============================================================================
//  ÁREA 1: CADASTRO E LEITURA
// =============================================================================

// POST /api/autorizacoes
#[utoipa::path(
    post,
    path = "/api/autorizacoes",
    tag = "Autorizações",
    request_body = NewAuthorization,
    responses(
        (status = 201, description = "Autorização cadastrada pela equipe", body = Authorization),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_authorization(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    AppJson(payload): AppJson<NewAuthorization>,
) -> Result<impl IntoResponse, ApiError> {
    let record = app_state
        .lead_service
        .create(payload, CreatedBy::from(user.role))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(record)))
}

// GET /api/autorizacoes/{id}
#[utoipa::path(
    get,
    path = "/api/autorizacoes/{id}",
    tag = "Autorizações",
    params(("id" = Uuid, Path, description = "ID da autorização")),
    responses(
        (status = 200, description = "Autorização", body = Authorization),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_authorization(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let record = app_state
        .lead_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(record))
}

// =============================================================================
//  ÁREA 2: TRANSIÇÕES EM LOTE
// =============================================================================

// POST /api/autorizacoes/distribuir
#[utoipa::path(
    post,
    path = "/api/autorizacoes/distribuir",
    tag = "Autorizações",
    request_body = DistributePayload,
    responses(
        (status = 200, description = "Autorizações distribuídas", body = Vec<Authorization>),
        (status = 400, description = "Seleção vazia ou coordenadora ausente"),
        (status = 409, description = "Algum cadastro não está pendente; nada foi gravado")
    ),
    security(("api_jwt" = []))
)]
pub async fn distribute(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<CanDistribute>,
    AppJson(payload): AppJson<DistributePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .lead_service
        .distribute(&payload.ids, payload.coordenadora_id.trim(), &guard.user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(updated))
}

// POST /api/autorizacoes/liberar
#[utoipa::path(
    post,
    path = "/api/autorizacoes/liberar",
    tag = "Autorizações",
    request_body = ReleasePayload,
    responses(
        (status = 200, description = "Autorizações liberadas para o telemarketing", body = Vec<Authorization>),
        (status = 409, description = "Algum cadastro não está distribuído; nada foi gravado")
    ),
    security(("api_jwt" = []))
)]
pub async fn release(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<CanRelease>,
    AppJson(payload): AppJson<ReleasePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = app_state
        .lead_service
        .release(&payload.ids)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(updated))
}

// =============================================================================
//  ÁREA 3: TELEMARKETING E RESULTADO DA VISITA
// =============================================================================

// POST /api/autorizacoes/{id}/agendar
#[utoipa::path(
    post,
    path = "/api/autorizacoes/{id}/agendar",
    tag = "Autorizações",
    params(("id" = Uuid, Path, description = "ID da autorização")),
    request_body = SchedulePayload,
    responses(
        (status = 200, description = "Visita agendada", body = Authorization),
        (status = 400, description = "Data ou hora inválida"),
        (status = 409, description = "Cadastro não está liberado")
    ),
    security(("api_jwt" = []))
)]
pub async fn schedule(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<CanSchedule>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<SchedulePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let record = app_state
        .lead_service
        .schedule(id, &guard.user, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(record))
}

// POST /api/autorizacoes/{id}/telefone-incorreto
#[utoipa::path(
    post,
    path = "/api/autorizacoes/{id}/telefone-incorreto",
    tag = "Autorizações",
    params(("id" = Uuid, Path, description = "ID da autorização")),
    responses(
        (status = 200, description = "Telefone marcado como incorreto", body = Authorization),
        (status = 409, description = "Cadastro não está liberado nem agendado")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_wrong_number(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<CanSchedule>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let record = app_state
        .lead_service
        .mark_wrong_number(id, &guard.user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(record))
}

// POST /api/autorizacoes/{id}/sem-interesse
#[utoipa::path(
    post,
    path = "/api/autorizacoes/{id}/sem-interesse",
    tag = "Autorizações",
    params(("id" = Uuid, Path, description = "ID da autorização")),
    responses(
        (status = 200, description = "Marcado como sem interesse", body = Authorization),
        (status = 409, description = "Cadastro não está liberado nem agendado")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_not_interested(
    State(app_state): State<AppState>,
    locale: Locale,
    guard: RequireRole<CanSchedule>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let record = app_state
        .lead_service
        .mark_not_interested(id, &guard.user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(record))
}

// POST /api/autorizacoes/{id}/compareceu
#[utoipa::path(
    post,
    path = "/api/autorizacoes/{id}/compareceu",
    tag = "Autorizações",
    params(("id" = Uuid, Path, description = "ID da autorização")),
    responses(
        (status = 200, description = "Comparecimento registrado", body = Authorization),
        (status = 409, description = "Cadastro não está agendado")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_attended(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<CanUpdateAgenda>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let record = app_state
        .lead_service
        .mark_attended(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(record))
}

// POST /api/autorizacoes/{id}/nao-compareceu
#[utoipa::path(
    post,
    path = "/api/autorizacoes/{id}/nao-compareceu",
    tag = "Autorizações",
    params(("id" = Uuid, Path, description = "ID da autorização")),
    responses(
        (status = 200, description = "Falta registrada", body = Authorization),
        (status = 409, description = "Cadastro não está agendado")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_no_show(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<CanUpdateAgenda>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let record = app_state
        .lead_service
        .mark_no_show(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(record))
}

// POST /api/autorizacoes/{id}/remarcado
#[utoipa::path(
    post,
    path = "/api/autorizacoes/{id}/remarcado",
    tag = "Autorizações",
    params(("id" = Uuid, Path, description = "ID da autorização")),
    responses(
        (status = 200, description = "Visita remarcada", body = Authorization),
        (status = 409, description = "Cadastro não está agendado")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_rescheduled(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<CanUpdateAgenda>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let record = app_state
        .lead_service
        .mark_rescheduled(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(record))
}
