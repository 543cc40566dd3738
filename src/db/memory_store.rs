// src/db/memory_store.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::AuthorizationStore,
    models::{
        authorization::{Authorization, AuthorizationStatus, CreatedBy, NewAuthorization, Transitioned},
        filter::{sort_records, AuthorizationFilter},
    },
    services::lifecycle::Transition,
};

/// Armazenamento em memória com a mesma semântica do Postgres, usado nos testes.
#[derive(Default)]
pub struct MemoryAuthorizationStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    records: HashMap<Uuid, Authorization>,
    last_tick: Option<DateTime<Utc>>,
}

impl Inner {
    // Relógio do "servidor": sempre estritamente crescente.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last_tick {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_tick = Some(next);
        next
    }
}

impl MemoryAuthorizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Semeia um registro já pronto (para montar cenários).
    pub async fn seed(&self, record: Authorization) {
        self.inner.write().await.records.insert(record.id, record);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }
}

#[async_trait]
impl AuthorizationStore for MemoryAuthorizationStore {
    async fn insert(&self, data: &NewAuthorization, criado_por: CreatedBy) -> Result<Authorization, AppError> {
        let mut inner = self.inner.write().await;
        let now = inner.tick();
        let record = Authorization {
            id: Uuid::new_v4(),
            nome_aluno: data.nome_aluno.clone(),
            idade: data.idade,
            serie: data.serie.clone(),
            turno: data.turno.clone(),
            escola: data.escola.clone(),
            nome_responsavel: data.nome_responsavel.clone(),
            telefone: data.telefone.clone(),
            status: AuthorizationStatus::Pendente,
            criado_por,
            data_cadastro: now,
            atualizado_em: now,
            coordenadora_id: None,
            gestor_id: None,
            atendente_id: None,
            data_agendamento: None,
            hora_agendamento: None,
            observacoes: None,
            data_liberacao: None,
        };
        inner.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Authorization>, AppError> {
        Ok(self.inner.read().await.records.get(&id).cloned())
    }

    async fn list(&self, filter: &AuthorizationFilter) -> Result<Vec<Authorization>, AppError> {
        let inner = self.inner.read().await;
        let mut records: Vec<Authorization> =
            inner.records.values().filter(|r| filter.matches(r)).cloned().collect();
        sort_records(&mut records);
        Ok(records)
    }

    async fn apply_transition(&self, ids: &[Uuid], transition: &Transition) -> Result<Vec<Transitioned>, AppError> {
        if ids.is_empty() {
            return Err(AppError::EmptySelection);
        }

        let mut inner = self.inner.write().await;
        let now = inner.tick();

        // Trabalha em cópias; só grava se todas passarem.
        let mut updated = Vec::with_capacity(ids.len());
        for id in ids {
            let mut record = inner
                .records
                .get(id)
                .cloned()
                .ok_or(AppError::AuthorizationNotFound(*id))?;
            let status_anterior = record.status;
            transition.apply(&mut record, now)?;
            updated.push(Transitioned {
                status_anterior,
                autorizacao: record,
            });
        }

        for item in &updated {
            inner.records.insert(item.autorizacao.id, item.autorizacao.clone());
        }
        Ok(updated)
    }
}
