// src/services/lead_service.rs

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::broadcast;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::AuthorizationStore,
    models::{
        agenda::AgendaWeek,
        auth::{Identity, Role},
        authorization::{
            Authorization, AuthorizationEvent, AuthorizationEventKind, AuthorizationStatus, CreatedBy,
            NewAuthorization, SchedulePayload, Transitioned,
        },
        filter::{AuthorizationFilter, LeadView},
    },
    services::{agenda, lifecycle::Transition},
};

const EVENT_BUFFER: usize = 256;

/// Orquestra o fluxo dos cadastros: criação, filas e transições.
/// Toda escrita bem-sucedida é publicada para as visões ao vivo.
#[derive(Clone)]
pub struct LeadService {
    store: Arc<dyn AuthorizationStore>,
    events: broadcast::Sender<AuthorizationEvent>,
}

impl LeadService {
    pub fn new(store: Arc<dyn AuthorizationStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self { store, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthorizationEvent> {
        self.events.subscribe()
    }

    // --- Cadastro ---

    pub async fn create(&self, payload: NewAuthorization, criado_por: CreatedBy) -> Result<Authorization, AppError> {
        payload.validate()?;

        let record = self.store.insert(&payload, criado_por).await?;
        tracing::info!(id = %record.id, escola = %record.escola, criado_por = ?criado_por, "Autorização cadastrada");

        self.publish(AuthorizationEventKind::Criada, &record, None);
        Ok(record)
    }

    pub async fn get(&self, id: Uuid) -> Result<Authorization, AppError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(AppError::AuthorizationNotFound(id))
    }

    // --- Filas ---

    pub async fn list(&self, filter: &AuthorizationFilter) -> Result<Vec<Authorization>, AppError> {
        self.store.list(filter).await
    }

    pub async fn distribution_queue(&self) -> Result<Vec<Authorization>, AppError> {
        self.list(&AuthorizationFilter::with_status(AuthorizationStatus::Pendente))
            .await
    }

    /// Fila da coordenadora atual. O gestor pode consultar a de outra coordenadora.
    pub async fn coordinator_queue(
        &self,
        user: &Identity,
        coordenadora_id: Option<String>,
    ) -> Result<Vec<Authorization>, AppError> {
        let mut filter = LeadView::Coordenacao.filter_for(user);
        if let (Role::Gestor, Some(other)) = (user.role, coordenadora_id) {
            filter.coordenadora_id = Some(other);
        }
        self.list(&filter).await
    }

    pub async fn scheduling_queue(&self) -> Result<Vec<Authorization>, AppError> {
        self.list(&AuthorizationFilter::with_status(AuthorizationStatus::Liberado))
            .await
    }

    /// A semana de calendário que contém `reference`.
    pub async fn agenda(&self, reference: NaiveDate) -> Result<AgendaWeek, AppError> {
        let (inicio, fim) = agenda::week_bounds(reference);
        let filter = AuthorizationFilter {
            agendamento_entre: Some((inicio, fim)),
            ..AuthorizationFilter::with_statuses(&AuthorizationStatus::CALENDAR)
        };
        let events = self.list(&filter).await?;
        Ok(agenda::build_week(events, reference))
    }

    // --- Transições ---

    pub async fn distribute(
        &self,
        ids: &[Uuid],
        coordenadora_id: &str,
        gestor: &Identity,
    ) -> Result<Vec<Authorization>, AppError> {
        let transition = Transition::Distribute {
            coordenadora_id: coordenadora_id.to_string(),
            gestor_id: gestor.codigo.clone(),
        };
        self.transition(ids, transition).await
    }

    pub async fn release(&self, ids: &[Uuid]) -> Result<Vec<Authorization>, AppError> {
        self.transition(ids, Transition::Release).await
    }

    pub async fn schedule(
        &self,
        id: Uuid,
        agent: &Identity,
        payload: SchedulePayload,
    ) -> Result<Authorization, AppError> {
        payload.validate()?;

        let observacoes = payload
            .observacoes
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty());
        let transition = Transition::Schedule {
            atendente_id: agent.codigo.clone(),
            data: payload.data_agendamento,
            hora: payload.hora_agendamento,
            observacoes,
        };
        self.transition_one(id, transition).await
    }

    pub async fn mark_attended(&self, id: Uuid) -> Result<Authorization, AppError> {
        self.transition_one(id, Transition::MarkAttended).await
    }

    pub async fn mark_no_show(&self, id: Uuid) -> Result<Authorization, AppError> {
        self.transition_one(id, Transition::MarkNoShow).await
    }

    pub async fn mark_rescheduled(&self, id: Uuid) -> Result<Authorization, AppError> {
        self.transition_one(id, Transition::MarkRescheduled).await
    }

    pub async fn mark_wrong_number(&self, id: Uuid, agent: &Identity) -> Result<Authorization, AppError> {
        let transition = Transition::MarkWrongNumber {
            atendente_id: agent.codigo.clone(),
        };
        self.transition_one(id, transition).await
    }

    pub async fn mark_not_interested(&self, id: Uuid, agent: &Identity) -> Result<Authorization, AppError> {
        let transition = Transition::MarkNotInterested {
            atendente_id: agent.codigo.clone(),
        };
        self.transition_one(id, transition).await
    }

    async fn transition_one(&self, id: Uuid, transition: Transition) -> Result<Authorization, AppError> {
        self.transition(&[id], transition)
            .await?
            .into_iter()
            .next()
            .ok_or(AppError::AuthorizationNotFound(id))
    }

    async fn transition(&self, ids: &[Uuid], transition: Transition) -> Result<Vec<Authorization>, AppError> {
        // A mesma seleção pode chegar com ids repetidos
        let mut unique: Vec<Uuid> = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }

        let updated = match self.store.apply_transition(&unique, &transition).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!(transicao = transition.name(), total = unique.len(), error = %e, "Transição rejeitada");
                return Err(e);
            }
        };

        tracing::info!(
            transicao = transition.name(),
            status = %transition.target(),
            total = updated.len(),
            "Transição aplicada"
        );
        Ok(updated
            .into_iter()
            .map(|Transitioned { status_anterior, autorizacao }| {
                self.publish(AuthorizationEventKind::Atualizada, &autorizacao, Some(status_anterior));
                autorizacao
            })
            .collect())
    }

    fn publish(
        &self,
        tipo: AuthorizationEventKind,
        record: &Authorization,
        status_anterior: Option<AuthorizationStatus>,
    ) {
        // Sem assinantes o envio falha, e tudo bem
        let _ = self.events.send(AuthorizationEvent {
            tipo,
            autorizacao: record.clone(),
            status_anterior,
        });
    }
}
