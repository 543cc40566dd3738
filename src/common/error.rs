use std::collections::HashMap;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    common::i18n::I18nStore,
    middleware::i18n::Locale,
    models::authorization::AuthorizationStatus,
};

// Nosso tipo de erro interno. Os handlers convertem para ApiError já traduzido.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Código de usuário já existe: {0}")]
    CodigoAlreadyExists(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Papel sem permissão para: {0}")]
    Forbidden(&'static str),

    #[error("Autorização não encontrada: {0}")]
    AuthorizationNotFound(Uuid),

    #[error("Nenhuma autorização selecionada")]
    EmptySelection,

    #[error("Corpo da requisição inválido: {reason}")]
    InvalidBody { field: Option<String>, reason: String },

    #[error("Corpo sem Content-Type JSON")]
    UnsupportedMediaType,

    #[error("Transição inválida para {id}: {from} -> {to}")]
    InvalidTransition {
        id: Uuid,
        from: AuthorizationStatus,
        to: AuthorizationStatus,
    },

    #[error("Gerador de relatórios não configurado")]
    ReportServiceNotConfigured,

    #[error("Falha no gerador de relatórios: {0}")]
    ReportServiceError(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => AppError::UnsupportedMediaType,
            JsonRejection::JsonDataError(e) => {
                let reason = e.body_text();
                AppError::InvalidBody {
                    field: rejected_field(&reason),
                    reason,
                }
            }
            other => AppError::InvalidBody {
                field: None,
                reason: other.body_text(),
            },
        }
    }
}

/// Extrai o campo do texto do erro de desserialização
/// ("...target type: idade: invalid type: ...") no mesmo formato
/// snake_case dos erros de validação.
fn rejected_field(body_text: &str) -> Option<String> {
    let rest = body_text.split_once("target type: ").map_or(body_text, |(_, rest)| rest);
    let (path, _) = rest.split_once(": ")?;
    let field = path.split(['.', '[']).next()?;
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }

    let mut snake = String::with_capacity(field.len() + 4);
    for c in field.chars() {
        if c.is_ascii_uppercase() {
            snake.push('_');
            snake.push(c.to_ascii_lowercase());
        } else {
            snake.push(c);
        }
    }
    Some(snake)
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::ReportServiceError(e.to_string())
    }
}

/// O erro que sai na resposta HTTP, já no idioma do cliente.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Chave da mensagem no catálogo de traduções.
    fn message_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_failed",
            AppError::EmailAlreadyExists => "email_already_exists",
            AppError::CodigoAlreadyExists(_) => "codigo_already_exists",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::Forbidden(_) => "forbidden",
            AppError::AuthorizationNotFound(_) => "authorization_not_found",
            AppError::EmptySelection => "empty_selection",
            AppError::InvalidBody { .. } => "invalid_body",
            AppError::UnsupportedMediaType => "unsupported_media_type",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::ReportServiceNotConfigured => "report_service_not_configured",
            AppError::ReportServiceError(_) => "report_service_error",
            AppError::DatabaseError(_) => "database_unavailable",
            _ => "internal_error",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::EmptySelection | AppError::InvalidBody { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::EmailAlreadyExists | AppError::CodigoAlreadyExists(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::AuthorizationNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::ReportServiceNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ReportServiceError(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status_code();
        let error = i18n.translate(&locale.0, self.message_key());

        let details = match self {
            // Retorna os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| {
                            let key = e.message.as_deref().unwrap_or(&e.code);
                            i18n.translate(&locale.0, key)
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            AppError::InvalidTransition { id, from, to } => Some(json!({
                "id": id,
                "statusAtual": from,
                "statusDestino": to,
            })),
            AppError::InvalidBody { field: Some(field), .. } => {
                let mut details = serde_json::Map::new();
                details.insert(field.clone(), json!([i18n.translate(&locale.0, "campo_invalido")]));
                Some(Value::Object(details))
            }
            AppError::AuthorizationNotFound(id) => Some(json!({ "id": id })),
            AppError::CodigoAlreadyExists(codigo) => Some(json!({ "codigo": codigo })),
            AppError::Forbidden(action) => Some(json!({ "acao": action })),
            _ => None,
        };

        // Erros de servidor: a mensagem detalhada só vai para o log.
        if status.is_server_error() {
            tracing::error!(error = %self, details = ?self, "Erro interno do servidor");
        } else {
            tracing::debug!(error = %self, "Requisição rejeitada");
        }

        ApiError { status, error, details }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn pt() -> Locale {
        Locale("pt".into())
    }

    #[test]
    fn validation_error_lists_translated_fields() {
        let payload = crate::models::authorization::NewAuthorization {
            consent: false,
            ..crate::models::authorization::fixtures::new_ana()
        };
        let err = AppError::from(payload.validate().unwrap_err());
        let api = err.to_api_error(&pt(), &I18nStore::embedded().unwrap());

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.unwrap();
        let consent = details["consent"][0].as_str().unwrap();
        assert!(consent.contains("consentimento"));
    }

    #[test]
    fn invalid_transition_is_conflict_with_statuses() {
        let err = AppError::InvalidTransition {
            id: Uuid::nil(),
            from: AuthorizationStatus::Pendente,
            to: AuthorizationStatus::Agendado,
        };
        let api = err.to_api_error(&pt(), &I18nStore::embedded().unwrap());
        assert_eq!(api.status, StatusCode::CONFLICT);
        let details = api.details.unwrap();
        assert_eq!(details["statusAtual"], "pendente");
        assert_eq!(details["statusDestino"], "agendado");
    }

    #[test]
    fn rejected_field_is_read_from_the_deserializer_message() {
        let text = "Failed to deserialize the JSON body into the target type: \
                    idade: invalid type: string \"dez\", expected i32 at line 1 column 14";
        assert_eq!(rejected_field(text).as_deref(), Some("idade"));

        let nested = "Failed to deserialize the JSON body into the target type: \
                      nomeResponsavel: invalid type: integer `3`, expected a string";
        assert_eq!(rejected_field(nested).as_deref(), Some("nome_responsavel"));

        let indexed = "Failed to deserialize the JSON body into the target type: \
                       ids[0]: UUID parsing failed";
        assert_eq!(rejected_field(indexed).as_deref(), Some("ids"));

        let root = "Failed to deserialize the JSON body into the target type: \
                    invalid type: sequence, expected struct NewAuthorization";
        assert_eq!(rejected_field(root), None);
    }

    #[test]
    fn invalid_body_points_at_the_field() {
        let err = AppError::InvalidBody {
            field: Some("idade".into()),
            reason: "idade: invalid type".into(),
        };
        let api = err.to_api_error(&pt(), &I18nStore::embedded().unwrap());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert!(api.details.unwrap()["idade"][0].is_string());
    }

    #[test]
    fn database_errors_hide_details() {
        let err = AppError::DatabaseError(sqlx::Error::PoolTimedOut);
        let api = err.to_api_error(&Locale("en".into()), &I18nStore::embedded().unwrap());
        assert_eq!(api.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(api.details.is_none());
        assert!(!api.error.contains("Pool"));
    }
}
