// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{Identity, Role},
};

/// 1. O Trait que define quais papéis podem executar uma ação
pub trait RoleSet: Send + Sync + 'static {
    fn action() -> &'static str;
    fn allowed() -> &'static [Role];
}

/// 2. O Extractor (Guardião). Entrega a identidade já autorizada.
pub struct RequireRole<T> {
    pub user: Identity,
    _marker: PhantomData<T>,
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleSet,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // A. Extrai Usuário (rejeição já traduzida)
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        // B. Confere o papel, que vem explícito no token
        if !T::allowed().contains(&user.role) {
            tracing::warn!(codigo = %user.codigo, role = ?user.role, acao = T::action(), "Acesso negado");
            let app_state = AppState::from_ref(state);
            let locale = Locale::from_parts(parts);
            return Err(AppError::Forbidden(T::action()).to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole {
            user,
            _marker: PhantomData,
        })
    }
}

// ---
// DEFINIÇÃO DOS CONJUNTOS DE PAPÉIS (TIPOS)
// ---

pub struct CanDistribute;
impl RoleSet for CanDistribute {
    fn action() -> &'static str { "distribuir" }
    fn allowed() -> &'static [Role] { &[Role::Gestor] }
}

pub struct CanRelease;
impl RoleSet for CanRelease {
    fn action() -> &'static str { "liberar" }
    fn allowed() -> &'static [Role] { &[Role::Coordenadora, Role::Gestor] }
}

/// Agendar e registrar as saídas laterais da ligação.
pub struct CanSchedule;
impl RoleSet for CanSchedule {
    fn action() -> &'static str { "agendar" }
    fn allowed() -> &'static [Role] { &[Role::Telemarketing, Role::Gestor] }
}

/// Ver a agenda e registrar o resultado da visita.
pub struct CanUpdateAgenda;
impl RoleSet for CanUpdateAgenda {
    fn action() -> &'static str { "agenda" }
    fn allowed() -> &'static [Role] { &[Role::Coordenadora, Role::Telemarketing, Role::Gestor] }
}

pub struct CanReport;
impl RoleSet for CanReport {
    fn action() -> &'static str { "relatorios" }
    fn allowed() -> &'static [Role] { &[Role::Coordenadora, Role::Gestor] }
}

pub struct CanManageUsers;
impl RoleSet for CanManageUsers {
    fn action() -> &'static str { "usuarios" }
    fn allowed() -> &'static [Role] { &[Role::Gestor] }
}
