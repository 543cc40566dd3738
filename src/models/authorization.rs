// src/models/authorization.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::auth::Role;

// --- Enums ---

/// Os nove estados possíveis de uma autorização.
/// Mapeia o CREATE TYPE authorization_status do banco.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "authorization_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    Pendente,
    Distribuido,
    Liberado,
    Agendado,
    Compareceu,
    NaoCompareceu,
    Remarcado,
    TelIncorreto,
    NaoInteressado,
}

impl AuthorizationStatus {
    pub const ALL: [AuthorizationStatus; 9] = [
        Self::Pendente,
        Self::Distribuido,
        Self::Liberado,
        Self::Agendado,
        Self::Compareceu,
        Self::NaoCompareceu,
        Self::Remarcado,
        Self::TelIncorreto,
        Self::NaoInteressado,
    ];

    /// Status exibidos na agenda compartilhada.
    pub const CALENDAR: [AuthorizationStatus; 4] = [
        Self::Agendado,
        Self::Compareceu,
        Self::NaoCompareceu,
        Self::Remarcado,
    ];

    /// Status considerados pelos relatórios.
    pub const REPORTING: [AuthorizationStatus; 6] = [
        Self::Agendado,
        Self::Compareceu,
        Self::NaoCompareceu,
        Self::Remarcado,
        Self::NaoInteressado,
        Self::TelIncorreto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pendente => "pendente",
            Self::Distribuido => "distribuido",
            Self::Liberado => "liberado",
            Self::Agendado => "agendado",
            Self::Compareceu => "compareceu",
            Self::NaoCompareceu => "nao_compareceu",
            Self::Remarcado => "remarcado",
            Self::TelIncorreto => "tel_incorreto",
            Self::NaoInteressado => "nao_interessado",
        }
    }

    /// Já passou pela distribuição (tem coordenadora atribuída).
    pub fn is_distributed(&self) -> bool {
        !matches!(self, Self::Pendente)
    }

    /// Estados que carregam data/hora de agendamento.
    pub fn has_appointment(&self) -> bool {
        Self::CALENDAR.contains(self)
    }

    /// Estados em que uma atendente já tocou no lead.
    pub fn has_agent(&self) -> bool {
        matches!(
            self,
            Self::Agendado
                | Self::Compareceu
                | Self::NaoCompareceu
                | Self::Remarcado
                | Self::TelIncorreto
                | Self::NaoInteressado
        )
    }
}

impl std::fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origem do cadastro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "authorization_origin", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CreatedBy {
    Sistema,
    Coordenacao,
    Telemarketing,
    Gestor,
}

impl From<Role> for CreatedBy {
    fn from(role: Role) -> Self {
        match role {
            Role::Gestor => CreatedBy::Gestor,
            Role::Coordenadora => CreatedBy::Coordenacao,
            Role::Telemarketing => CreatedBy::Telemarketing,
        }
    }
}

// --- O Registro ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    pub id: Uuid,

    // Dados do aluno
    #[schema(example = "Ana")]
    pub nome_aluno: String,
    #[schema(example = 10)]
    pub idade: i32,
    #[schema(example = "5º Ano")]
    pub serie: String,
    #[schema(example = "Manhã")]
    pub turno: String,
    #[schema(example = "Escola X")]
    pub escola: String,

    // Dados do responsável
    #[schema(example = "Maria")]
    pub nome_responsavel: String,
    #[schema(example = "41999999999")]
    pub telefone: String,

    // Fluxo
    pub status: AuthorizationStatus,
    pub criado_por: CreatedBy,
    pub data_cadastro: DateTime<Utc>,
    pub atualizado_em: DateTime<Utc>,

    // Atribuições
    #[schema(example = "coord_portao")]
    pub coordenadora_id: Option<String>,
    pub gestor_id: Option<String>,
    #[schema(example = "tele_01")]
    pub atendente_id: Option<String>,

    // Agendamento
    #[schema(value_type = Option<String>, format = Date, example = "2025-03-10")]
    pub data_agendamento: Option<NaiveDate>,
    #[schema(example = "14:00")]
    pub hora_agendamento: Option<String>,
    pub observacoes: Option<String>,

    pub data_liberacao: Option<DateTime<Utc>>,
}

// --- Payload de criação (formulário público e interno) ---

/// Os campos usam `#[serde(default)]` para que um campo ausente vire
/// um erro de validação por campo, e não uma rejeição genérica do JSON.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct NewAuthorization {
    #[validate(length(min = 3, message = "nome_aluno_obrigatorio"))]
    #[schema(example = "Ana")]
    pub nome_aluno: String,

    #[validate(range(min = 1, message = "idade_positiva"))]
    #[serde(deserialize_with = "lenient_idade")]
    #[schema(example = 10)]
    pub idade: i32,

    #[validate(length(min = 1, message = "serie_obrigatoria"))]
    #[schema(example = "5º Ano")]
    pub serie: String,

    #[validate(length(min = 1, message = "turno_obrigatorio"))]
    #[schema(example = "Manhã")]
    pub turno: String,

    #[validate(length(min = 3, message = "escola_obrigatoria"))]
    #[schema(example = "Escola X")]
    pub escola: String,

    #[validate(length(min = 3, message = "nome_responsavel_obrigatorio"))]
    #[schema(example = "Maria")]
    pub nome_responsavel: String,

    #[validate(length(min = 10, message = "telefone_obrigatorio"))]
    #[schema(example = "41999999999")]
    pub telefone: String,

    #[validate(custom(function = "validate_consent"))]
    #[schema(example = true)]
    pub consent: bool,
}

/// O formulário envia a idade como número ou como texto ("10").
/// `null` vira 0 e cai na regra de idade positiva.
fn lenient_idade<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Idade {
        Numero(i32),
        Texto(String),
    }

    match Option::<Idade>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Idade::Numero(idade)) => Ok(idade),
        Some(Idade::Texto(texto)) => texto
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("idade não numérica: {texto:?}"))),
    }
}

fn validate_consent(consent: &bool) -> Result<(), ValidationError> {
    if *consent {
        Ok(())
    } else {
        Err(ValidationError::new("consent").with_message("consentimento_obrigatorio".into()))
    }
}

/// Aceita apenas "HH:mm" com zeros à esquerda, para que a ordenação
/// lexicográfica coincida com a cronológica.
pub fn validate_hora(hora: &str) -> Result<(), ValidationError> {
    let well_formed = hora.len() == 5 && NaiveTime::parse_from_str(hora, "%H:%M").is_ok();
    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::new("hora").with_message("hora_invalida".into()))
    }
}

// --- Payloads das transições ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistributePayload {
    pub ids: Vec<Uuid>,
    #[validate(custom(function = "validate_coordenadora"))]
    #[schema(example = "coord_portao")]
    pub coordenadora_id: String,
}

fn validate_coordenadora(codigo: &str) -> Result<(), ValidationError> {
    if codigo.trim().is_empty() {
        Err(ValidationError::new("coordenadora").with_message("coordenadora_obrigatoria".into()))
    } else {
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReleasePayload {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePayload {
    #[schema(value_type = String, format = Date, example = "2025-03-10")]
    pub data_agendamento: NaiveDate,
    #[validate(custom(function = "validate_hora"))]
    #[schema(example = "14:00")]
    pub hora_agendamento: String,
    pub observacoes: Option<String>,
}

// --- Eventos (assinatura ao vivo) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationEventKind {
    Criada,
    Atualizada,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationEvent {
    pub tipo: AuthorizationEventKind,
    pub autorizacao: Authorization,
    /// Status de onde o registro saiu. Ausente em cadastros novos.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_anterior: Option<AuthorizationStatus>,
}

/// Um registro gravado por uma transição, com o status que tinha antes dela.
#[derive(Debug, Clone)]
pub struct Transitioned {
    pub status_anterior: AuthorizationStatus,
    pub autorizacao: Authorization,
}
