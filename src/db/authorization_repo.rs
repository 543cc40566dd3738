// src/db/authorization_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        authorization::{Authorization, AuthorizationStatus, CreatedBy, NewAuthorization, Transitioned},
        filter::AuthorizationFilter,
    },
    services::lifecycle::Transition,
};

/// O contrato do armazenamento de autorizações.
///
/// Os horários (`dataCadastro`, `atualizadoEm`, `dataLiberacao`) são sempre
/// atribuídos pelo próprio armazenamento.
#[async_trait]
pub trait AuthorizationStore: Send + Sync {
    /// Insere um novo cadastro com status `pendente`.
    async fn insert(&self, data: &NewAuthorization, criado_por: CreatedBy) -> Result<Authorization, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Authorization>, AppError>;

    /// Leitura filtrada, já ordenada por data/hora de agendamento e cadastro.
    async fn list(&self, filter: &AuthorizationFilter) -> Result<Vec<Authorization>, AppError>;

    /// Aplica a mesma transição a todos os ids, tudo ou nada.
    ///
    /// Falha com `AuthorizationNotFound` se algum id não existir e com
    /// `InvalidTransition` se algum registro não estiver no status de origem.
    async fn apply_transition(&self, ids: &[Uuid], transition: &Transition) -> Result<Vec<Transitioned>, AppError>;
}

// O repositório Postgres, responsável pela tabela 'authorizations'
#[derive(Clone)]
pub struct PgAuthorizationStore {
    pool: PgPool,
}

impl PgAuthorizationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorizationStore for PgAuthorizationStore {
    async fn insert(&self, data: &NewAuthorization, criado_por: CreatedBy) -> Result<Authorization, AppError> {
        let record = sqlx::query_as::<_, Authorization>(
            r#"
            INSERT INTO authorizations (
                nome_aluno, idade, serie, turno, escola,
                nome_responsavel, telefone, status, criado_por
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pendente', $8)
            RETURNING *
            "#,
        )
        .bind(&data.nome_aluno)
        .bind(data.idade)
        .bind(&data.serie)
        .bind(&data.turno)
        .bind(&data.escola)
        .bind(&data.nome_responsavel)
        .bind(&data.telefone)
        .bind(criado_por)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Authorization>, AppError> {
        let record = sqlx::query_as::<_, Authorization>("SELECT * FROM authorizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn list(&self, filter: &AuthorizationFilter) -> Result<Vec<Authorization>, AppError> {
        let statuses: Vec<String> = filter.statuses.iter().map(|s| s.as_str().to_string()).collect();

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM authorizations WHERE status::text = ANY(");
        qb.push_bind(statuses).push(")");

        if let Some(coordenadora_id) = &filter.coordenadora_id {
            qb.push(" AND coordenadora_id = ").push_bind(coordenadora_id.clone());
        }
        if let Some(atendente_id) = &filter.atendente_id {
            qb.push(" AND atendente_id = ").push_bind(atendente_id.clone());
        }
        if let Some(escola) = &filter.escola {
            qb.push(" AND escola = ").push_bind(escola.clone());
        }
        if let Some((inicio, fim)) = filter.agendamento_entre {
            qb.push(" AND data_agendamento BETWEEN ")
                .push_bind(inicio)
                .push(" AND ")
                .push_bind(fim);
        }

        qb.push(" ORDER BY data_agendamento ASC NULLS LAST, hora_agendamento ASC NULLS LAST, data_cadastro ASC");

        let records = qb.build_query_as::<Authorization>().fetch_all(&self.pool).await?;
        Ok(records)
    }

    async fn apply_transition(&self, ids: &[Uuid], transition: &Transition) -> Result<Vec<Transitioned>, AppError> {
        if ids.is_empty() {
            return Err(AppError::EmptySelection);
        }

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        // 1. Trava as linhas e confere a pré-condição de cada uma
        let current: Vec<(Uuid, AuthorizationStatus)> =
            sqlx::query_as("SELECT id, status FROM authorizations WHERE id = ANY($1) FOR UPDATE")
                .bind(ids)
                .fetch_all(&mut *tx)
                .await?;

        for id in ids {
            let Some((_, status)) = current.iter().find(|(found, _)| found == id) else {
                return Err(AppError::AuthorizationNotFound(*id)); // rollback no drop
            };
            transition.check(*id, *status)?;
        }

        // 2. Grava o destino e os campos carimbados pela transição.
        // Horários vêm do relógio da escrita (não do início da transação),
        // e atualizado_em nunca anda para trás.
        let target = transition.target();
        let updated = match transition {
            Transition::Distribute {
                coordenadora_id,
                gestor_id,
            } => {
                sqlx::query_as::<_, Authorization>(
                    r#"
                    UPDATE authorizations
                    SET status = $2, coordenadora_id = $3, gestor_id = $4, atualizado_em = GREATEST(clock_timestamp(), atualizado_em + INTERVAL '1 microsecond')
                    WHERE id = ANY($1)
                    RETURNING *
                    "#,
                )
                .bind(ids)
                .bind(target)
                .bind(coordenadora_id)
                .bind(gestor_id)
                .fetch_all(&mut *tx)
                .await?
            }
            Transition::Release => {
                sqlx::query_as::<_, Authorization>(
                    r#"
                    UPDATE authorizations
                    SET status = $2, data_liberacao = clock_timestamp(), atualizado_em = GREATEST(clock_timestamp(), atualizado_em + INTERVAL '1 microsecond')
                    WHERE id = ANY($1)
                    RETURNING *
                    "#,
                )
                .bind(ids)
                .bind(target)
                .fetch_all(&mut *tx)
                .await?
            }
            Transition::Schedule {
                atendente_id,
                data,
                hora,
                observacoes,
            } => {
                sqlx::query_as::<_, Authorization>(
                    r#"
                    UPDATE authorizations
                    SET status = $2, atendente_id = $3, data_agendamento = $4,
                        hora_agendamento = $5, observacoes = $6, atualizado_em = GREATEST(clock_timestamp(), atualizado_em + INTERVAL '1 microsecond')
                    WHERE id = ANY($1)
                    RETURNING *
                    "#,
                )
                .bind(ids)
                .bind(target)
                .bind(atendente_id)
                .bind(data)
                .bind(hora)
                .bind(observacoes)
                .fetch_all(&mut *tx)
                .await?
            }
            Transition::MarkAttended | Transition::MarkNoShow | Transition::MarkRescheduled => {
                sqlx::query_as::<_, Authorization>(
                    r#"
                    UPDATE authorizations
                    SET status = $2, atualizado_em = GREATEST(clock_timestamp(), atualizado_em + INTERVAL '1 microsecond')
                    WHERE id = ANY($1)
                    RETURNING *
                    "#,
                )
                .bind(ids)
                .bind(target)
                .fetch_all(&mut *tx)
                .await?
            }
            Transition::MarkWrongNumber { atendente_id }
            | Transition::MarkNotInterested { atendente_id } => {
                sqlx::query_as::<_, Authorization>(
                    r#"
                    UPDATE authorizations
                    SET status = $2, atendente_id = $3,
                        data_agendamento = NULL, hora_agendamento = NULL,
                        atualizado_em = GREATEST(clock_timestamp(), atualizado_em + INTERVAL '1 microsecond')
                    WHERE id = ANY($1)
                    RETURNING *
                    "#,
                )
                .bind(ids)
                .bind(target)
                .bind(atendente_id)
                .fetch_all(&mut *tx)
                .await?
            }
        };

        // 3. Tudo certo, commita
        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        let transitioned = updated
            .into_iter()
            .filter_map(|record| {
                let (_, status_anterior) = current.iter().find(|(id, _)| *id == record.id)?;
                Some(Transitioned {
                    status_anterior: *status_anterior,
                    autorizacao: record,
                })
            })
            .collect();
        Ok(transitioned)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::models::authorization::fixtures::new_ana;

    // Roda só com um Postgres de teste disponível (TEST_DATABASE_URL).
    async fn test_store() -> Option<PgAuthorizationStore> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = PgPool::connect(&url).await.expect("conexão com o banco de teste");
        sqlx::migrate!().run(&pool).await.expect("migrações do banco de teste");
        Some(PgAuthorizationStore::new(pool))
    }

    #[tokio::test]
    async fn atualizado_em_never_moves_backwards() {
        let Some(store) = test_store().await else {
            eprintln!("TEST_DATABASE_URL ausente, pulando");
            return;
        };
        let record = store.insert(&new_ana(), CreatedBy::Sistema).await.unwrap();

        // Simula uma escrita concorrente que carimbou um horário à frente deste relógio
        let ahead = Utc::now() + Duration::hours(1);
        sqlx::query("UPDATE authorizations SET atualizado_em = $2 WHERE id = $1")
            .bind(record.id)
            .bind(ahead)
            .execute(&store.pool)
            .await
            .unwrap();

        let distribute = Transition::Distribute {
            coordenadora_id: "C1".into(),
            gestor_id: "G1".into(),
        };
        let distributed = store.apply_transition(&[record.id], &distribute).await.unwrap();
        assert_eq!(distributed[0].status_anterior, AuthorizationStatus::Pendente);
        assert!(distributed[0].autorizacao.atualizado_em > ahead);

        let released = store.apply_transition(&[record.id], &Transition::Release).await.unwrap();
        let released = &released[0].autorizacao;
        assert!(released.atualizado_em > distributed[0].autorizacao.atualizado_em);
        assert!(released.data_liberacao.is_some());
    }

    #[tokio::test]
    async fn rejected_batch_writes_nothing() {
        let Some(store) = test_store().await else {
            eprintln!("TEST_DATABASE_URL ausente, pulando");
            return;
        };
        let pending = store.insert(&new_ana(), CreatedBy::Sistema).await.unwrap();
        let other = store.insert(&new_ana(), CreatedBy::Sistema).await.unwrap();
        store.apply_transition(&[other.id], &Transition::Distribute {
            coordenadora_id: "C1".into(),
            gestor_id: "G1".into(),
        })
        .await
        .unwrap();

        let err = store
            .apply_transition(&[pending.id, other.id], &Transition::Distribute {
                coordenadora_id: "C2".into(),
                gestor_id: "G1".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));

        let untouched = store.find_by_id(pending.id).await.unwrap().unwrap();
        assert_eq!(untouched.status, AuthorizationStatus::Pendente);
        assert_eq!(untouched.atualizado_em, pending.atualizado_em);
    }
}
