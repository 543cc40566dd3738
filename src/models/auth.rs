// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Papel explícito do usuário. Vai dentro do token, nunca é deduzido do e-mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "staff_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Gestor,
    Coordenadora,
    Telemarketing,
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    /// Identificador estável usado nos campos de atribuição (ex: "coord_portao").
    #[schema(example = "coord_portao")]
    pub codigo: String,
    pub email: String,
    pub role: Role,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A identidade autenticada, montada a partir das claims do token.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: Uuid,
    pub codigo: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub session_id: Uuid,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub expires_at: usize,
}

// Dados para cadastro de um usuário da equipe (feito pelo gestor)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 2, message = "codigo_invalido"))]
    #[schema(example = "tele_01")]
    pub codigo: String,
    #[validate(email(message = "email_invalido"))]
    #[schema(example = "tele01@escola.org")]
    pub email: String,
    #[validate(length(min = 6, message = "senha_curta"))]
    pub password: String,
    pub role: Role,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "email_invalido"))]
    pub email: String,
    #[validate(length(min = 6, message = "senha_curta"))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,      // Subject (ID do usuário)
    pub codigo: String, // ID estável do ator
    pub email: String,
    pub role: Role,
    pub jti: Uuid,  // ID da sessão, usado no logout
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Identity {
            user_id: claims.sub,
            codigo: claims.codigo,
            email: claims.email,
            role: claims.role,
            session_id: claims.jti,
            expires_at: claims.exp,
        }
    }
}
