// src/services/narrator.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    common::error::AppError,
    models::{
        authorization::Authorization,
        report::{ReportSummary, ReportType},
    },
};

/// O que o gerador de texto recebe: o recorte filtrado e o resumo já calculado.
pub struct ReportContext<'a> {
    pub tipo: ReportType,
    pub valor: &'a str,
    pub records: &'a [Authorization],
    pub resumo: &'a ReportSummary,
}

/// Gerador do texto narrativo do relatório. Tratado como uma função opaca.
#[async_trait]
pub trait ReportNarrator: Send + Sync {
    async fn generate(&self, context: &ReportContext<'_>) -> Result<String, AppError>;
}

/// Usado quando nenhum endpoint foi configurado.
pub struct DisabledNarrator;

#[async_trait]
impl ReportNarrator for DisabledNarrator {
    async fn generate(&self, _context: &ReportContext<'_>) -> Result<String, AppError> {
        Err(AppError::ReportServiceNotConfigured)
    }
}

#[derive(Debug, Deserialize)]
struct NarratorResponse {
    report: String,
}

/// Encaminha o pedido para um endpoint HTTP que devolve `{ "report": "..." }`.
#[derive(Debug, Clone)]
pub struct HttpReportNarrator {
    client: reqwest::Client,
    url: String,
}

impl HttpReportNarrator {
    pub fn new(url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Falha ao criar o cliente HTTP do gerador de relatórios: {}", e))?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl ReportNarrator for HttpReportNarrator {
    async fn generate(&self, context: &ReportContext<'_>) -> Result<String, AppError> {
        let body = request_body(context)?;

        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();
        tracing::debug!(status = %status, "Resposta do gerador de relatórios");

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %detail, "Gerador de relatórios recusou o pedido");
            return Err(AppError::ReportServiceError(format!("status {status}")));
        }

        let parsed: NarratorResponse = response.json().await?;
        Ok(parsed.report)
    }
}

/// Monta o corpo do pedido. Os registros vão serializados como texto.
pub(crate) fn request_body(context: &ReportContext<'_>) -> Result<Value, AppError> {
    let authorizations = serde_json::to_string(context.records)
        .map_err(|e| anyhow::anyhow!("Falha ao serializar autorizações: {}", e))?;

    let filter_field = match context.tipo {
        ReportType::Escola => "schoolName",
        ReportType::Atendente => "agentId",
        ReportType::Coordenadora => "coordinatorId",
    };

    let mut body = json!({
        "reportType": context.tipo.external_name(),
        "authorizations": authorizations,
        "prompt": render_prompt(context),
    });
    body[filter_field] = json!(context.valor);
    Ok(body)
}

pub(crate) fn render_prompt(context: &ReportContext<'_>) -> String {
    let alvo = match context.tipo {
        ReportType::Escola => format!("da escola \"{}\"", context.valor),
        ReportType::Atendente => format!("da atendente \"{}\"", context.valor),
        ReportType::Coordenadora => format!("da coordenadora \"{}\"", context.valor),
    };
    let r = context.resumo;

    format!(
        "Você é um analista que escreve relatórios de desempenho de visitas agendadas.\n\
         Escreva um relatório conciso em português sobre os agendamentos {alvo}.\n\
         Destaque as estatísticas principais e sugira ações práticas.\n\n\
         Estatísticas:\n\
         - Total de registros: {total}\n\
         - Compareceram: {compareceu} ({taxa_comparecimento}%)\n\
         - Não compareceram: {nao_compareceu} ({taxa_falta}%)\n\
         - Ainda agendados: {agendado}\n\
         - Remarcados: {remarcado}\n\
         - Sem interesse: {nao_interessado}\n\
         - Telefone incorreto: {tel_incorreto}\n\n\
         Os registros completos seguem no campo \"authorizations\".",
        total = r.total,
        compareceu = r.compareceu,
        taxa_comparecimento = r.taxa_comparecimento,
        nao_compareceu = r.nao_compareceu,
        taxa_falta = r.taxa_falta,
        agendado = r.agendado,
        remarcado = r.remarcado,
        nao_interessado = r.nao_interessado,
        tel_incorreto = r.tel_incorreto,
    )
}
