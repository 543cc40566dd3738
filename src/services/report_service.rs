// src/services/report_service.rs

use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use validator::Validate;

use crate::{
    common::error::AppError,
    db::AuthorizationStore,
    models::{
        authorization::{Authorization, AuthorizationStatus},
        filter::AuthorizationFilter,
        report::{AttendanceReport, NarrativeReport, ReportQuery, ReportSummary, ReportType},
    },
    services::narrator::{ReportContext, ReportNarrator},
};

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn AuthorizationStore>,
    narrator: Arc<dyn ReportNarrator>,
}

impl ReportService {
    pub fn new(store: Arc<dyn AuthorizationStore>, narrator: Arc<dyn ReportNarrator>) -> Self {
        Self { store, narrator }
    }

    async fn records_for(&self, query: &ReportQuery) -> Result<Vec<Authorization>, AppError> {
        query.validate()?;
        self.store.list(&filter_for(query.tipo, &query.valor)).await
    }

    /// Resumo determinístico de comparecimento.
    pub async fn attendance(&self, query: ReportQuery) -> Result<AttendanceReport, AppError> {
        let records = self.records_for(&query).await?;
        let resumo = summarize(&records);
        tracing::info!(tipo = ?query.tipo, valor = %query.valor, total = resumo.total, "Relatório gerado");

        Ok(AttendanceReport {
            tipo: query.tipo,
            valor: query.valor,
            resumo,
        })
    }

    /// Resumo mais o texto produzido pelo gerador externo.
    pub async fn narrative(&self, query: ReportQuery) -> Result<NarrativeReport, AppError> {
        let records = self.records_for(&query).await?;
        let resumo = summarize(&records);

        let context = ReportContext {
            tipo: query.tipo,
            valor: &query.valor,
            records: &records,
            resumo: &resumo,
        };
        let report = self.narrator.generate(&context).await?;
        tracing::info!(tipo = ?query.tipo, valor = %query.valor, total = resumo.total, "Relatório narrativo gerado");

        Ok(NarrativeReport { report, resumo })
    }
}

/// O recorte de um relatório: status de relatório e exatamente um filtro.
pub fn filter_for(tipo: ReportType, valor: &str) -> AuthorizationFilter {
    let base = AuthorizationFilter::with_statuses(&AuthorizationStatus::REPORTING);
    match tipo {
        ReportType::Escola => AuthorizationFilter {
            escola: Some(valor.to_string()),
            ..base
        },
        ReportType::Atendente => AuthorizationFilter {
            atendente_id: Some(valor.to_string()),
            ..base
        },
        ReportType::Coordenadora => AuthorizationFilter {
            coordenadora_id: Some(valor.to_string()),
            ..base
        },
    }
}

/// Conta os status e calcula as taxas sobre `compareceu + nao_compareceu`.
///
/// A taxa de comparecimento é arredondada para uma casa; a de falta é o
/// complemento, então as duas somam exatamente 100 quando há base.
pub fn summarize(records: &[Authorization]) -> ReportSummary {
    let mut resumo = ReportSummary {
        total: records.len() as u32,
        ..Default::default()
    };

    for record in records {
        match record.status {
            AuthorizationStatus::Compareceu => resumo.compareceu += 1,
            AuthorizationStatus::NaoCompareceu => resumo.nao_compareceu += 1,
            AuthorizationStatus::Agendado => resumo.agendado += 1,
            AuthorizationStatus::Remarcado => resumo.remarcado += 1,
            AuthorizationStatus::NaoInteressado => resumo.nao_interessado += 1,
            AuthorizationStatus::TelIncorreto => resumo.tel_incorreto += 1,
            _ => {}
        }
    }

    let base = resumo.compareceu + resumo.nao_compareceu;
    if base > 0 {
        let taxa = (Decimal::from(resumo.compareceu) * Decimal::ONE_HUNDRED / Decimal::from(base))
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
        resumo.taxa_comparecimento = taxa;
        resumo.taxa_falta = Decimal::ONE_HUNDRED - taxa;
    }

    resumo
}
