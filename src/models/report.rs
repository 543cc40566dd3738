// src/models/report.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Por qual campo o relatório é filtrado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Escola,
    Atendente,
    Coordenadora,
}

impl ReportType {
    /// Nome usado no contrato do gerador de texto.
    pub fn external_name(&self) -> &'static str {
        match self {
            ReportType::Escola => "school",
            ReportType::Atendente => "agent",
            ReportType::Coordenadora => "coordinator",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub tipo: ReportType,
    #[validate(length(min = 1, message = "filtro_obrigatorio"))]
    #[schema(example = "Escola X")]
    pub valor: String,
}

/// A redução determinística sobre o conjunto filtrado.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total: u32,
    pub compareceu: u32,
    pub nao_compareceu: u32,
    #[schema(value_type = f64, example = 66.7)]
    pub taxa_comparecimento: Decimal,
    #[schema(value_type = f64, example = 33.3)]
    pub taxa_falta: Decimal,
    pub agendado: u32,
    pub remarcado: u32,
    pub nao_interessado: u32,
    pub tel_incorreto: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceReport {
    pub tipo: ReportType,
    pub valor: String,
    pub resumo: ReportSummary,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeReport {
    pub report: String,
    pub resumo: ReportSummary,
}
