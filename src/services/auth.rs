// src/services/auth.rs

use std::{collections::HashMap, sync::Arc};

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::BootstrapGestor,
    db::UserRepository,
    models::auth::{Claims, Identity, Role, User},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    token_ttl: chrono::Duration,
    // jti -> exp dos tokens encerrados via logout
    revoked: Arc<RwLock<HashMap<Uuid, usize>>>,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, token_ttl: chrono::Duration) -> Self {
        Self {
            user_repo,
            jwt_secret,
            token_ttl,
            revoked: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<(String, User), AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            tracing::warn!(email = %email, "Tentativa de login com senha inválida");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(&user)?;
        tracing::info!(codigo = %user.codigo, role = ?user.role, "Login realizado");
        Ok((token, user))
    }

    /// Cadastra um usuário da equipe. Só o gestor chega aqui.
    pub async fn create_user(&self, codigo: &str, email: &str, password: &str, role: Role) -> Result<User, AppError> {
        let password_clone = password.to_owned();
        let hashed_password = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let user = self.user_repo.create_user(codigo, email, &hashed_password, role).await?;
        tracing::info!(codigo = %user.codigo, role = ?user.role, "Usuário da equipe criado");
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list().await
    }

    /// Cria o primeiro gestor quando ainda não existe nenhum.
    /// Se o código configurado já pertence a outro usuário, tenta com sufixo.
    pub async fn ensure_bootstrap_gestor(&self, bootstrap: &BootstrapGestor) -> Result<(), AppError> {
        if self.user_repo.count_by_role(Role::Gestor).await? > 0 {
            return Ok(());
        }

        for codigo in bootstrap_codigos(&bootstrap.codigo) {
            match self
                .create_user(&codigo, &bootstrap.email, &bootstrap.password, Role::Gestor)
                .await
            {
                Ok(user) => {
                    tracing::info!(codigo = %user.codigo, email = %user.email, "👤 Gestor inicial criado");
                    return Ok(());
                }
                Err(AppError::CodigoAlreadyExists(taken)) => {
                    tracing::warn!(codigo = %taken, "Código do gestor inicial já em uso, tentando outro");
                }
                Err(e) => return Err(e),
            }
        }
        Err(AppError::CodigoAlreadyExists(bootstrap.codigo.clone()))
    }

    pub async fn validate_token(&self, token: &str) -> Result<Identity, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(token, &DecodingKey::from_secret(self.jwt_secret.as_ref()), &validation)
            .map_err(|_| AppError::InvalidToken)?;

        if self.revoked.read().await.contains_key(&token_data.claims.jti) {
            return Err(AppError::InvalidToken);
        }

        Ok(Identity::from(token_data.claims))
    }

    /// Encerra a sessão: o token deixa de valer até expirar.
    pub async fn logout(&self, identity: &Identity) {
        let now = Utc::now().timestamp() as usize;
        let mut revoked = self.revoked.write().await;
        // Limpa o que já expiraria de qualquer forma
        revoked.retain(|_, exp| *exp > now);
        revoked.insert(identity.session_id, identity.expires_at);
        tracing::info!(codigo = %identity.codigo, "Logout realizado");
    }

    pub(crate) fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = Claims {
            sub: user.id,
            codigo: user.codigo.clone(),
            email: user.email.clone(),
            role: user.role,
            jti: Uuid::new_v4(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

const BOOTSTRAP_ATTEMPTS: usize = 10;

/// Códigos tentados para o gestor inicial: o configurado, depois `codigo_2`, `codigo_3`...
fn bootstrap_codigos(base: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(base.to_string()).chain((2..=BOOTSTRAP_ATTEMPTS).map(move |n| format!("{base}_{n}")))
}
