// src/models/agenda.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::authorization::Authorization;

#[derive(Debug, Deserialize, IntoParams)]
pub struct AgendaQuery {
    /// Qualquer dia da semana desejada. Padrão: hoje.
    #[param(value_type = Option<String>, format = Date, example = "2025-03-10")]
    pub semana: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgendaDay {
    #[schema(value_type = String, format = Date)]
    pub data: NaiveDate,
    pub eventos: Vec<Authorization>,
}

/// Uma semana de calendário (segunda a domingo).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgendaWeek {
    #[schema(value_type = String, format = Date)]
    pub inicio: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub fim: NaiveDate,
    pub dias: Vec<AgendaDay>,
}
