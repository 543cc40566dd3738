// src/handlers/events.rs

use std::{convert::Infallible, time::Duration};

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use utoipa::IntoParams;

use crate::{
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        authorization::AuthorizationEvent,
        filter::{AuthorizationFilter, LeadView},
    },
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct EventsQuery {
    /// distribuicao | coordenacao | agendamento | agenda
    #[param(value_type = String, example = "agendamento")]
    pub visao: LeadView,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewEvent<'a> {
    #[serde(flatten)]
    event: &'a AuthorizationEvent,
    saiu_da_visao: bool,
}

/// Se o registro está na visão ou acabou de sair dela.
/// `None` quando o evento não interessa à visão.
pub(crate) fn classify(filter: &AuthorizationFilter, event: &AuthorizationEvent) -> Option<bool> {
    let record = &event.autorizacao;
    if filter.matches(record) {
        return Some(false);
    }
    let previous = event.status_anterior?;
    let mut before = record.clone();
    before.status = previous;
    filter.matches(&before).then_some(true)
}

// GET /api/autorizacoes/eventos?visao=
#[utoipa::path(
    get,
    path = "/api/autorizacoes/eventos",
    tag = "Autorizações",
    params(EventsQuery),
    responses((status = 200, description = "Stream SSE das mudanças da visão", body = String, content_type = "text/event-stream")),
    security(("api_jwt" = []))
)]
pub async fn stream_view(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<EventsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let filter = query.visao.filter_for(&user);
    let mut rx = app_state.lead_service.subscribe();
    tracing::info!(codigo = %user.codigo, visao = ?query.visao, "Cliente SSE conectado");

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let Some(saiu_da_visao) = classify(&filter, &event) else {
                        continue;
                    };
                    let payload = ViewEvent { event: &event, saiu_da_visao };
                    match serde_json::to_string(&payload) {
                        Ok(json) => {
                            yield Ok(Event::default()
                                .event("autorizacao")
                                .id(event.autorizacao.id.to_string())
                                .data(json));
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Falha ao serializar evento");
                        }
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Canal de eventos fechado, encerrando stream");
                    break;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // Cliente ficou para trás: pula os perdidos e segue
                    tracing::warn!(perdidos = n, "Cliente SSE atrasado");
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("keep-alive"))
}
