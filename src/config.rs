// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{AuthorizationStore, PgAuthorizationStore, UserRepository},
    services::{
        auth::AuthService,
        document_service::DocumentService,
        lead_service::LeadService,
        narrator::{DisabledNarrator, HttpReportNarrator, ReportNarrator},
        report_service::ReportService,
    },
};

/// Configuração lida do ambiente (e do `.env`, quando existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub token_ttl: chrono::Duration,
    pub report_service_url: Option<String>,
    pub report_service_timeout: Duration,
    pub fonts_dir: PathBuf,
    pub font_family: String,
    pub bootstrap_gestor: Option<BootstrapGestor>,
}

/// Credenciais do primeiro gestor, criado na subida se ainda não houver nenhum.
#[derive(Debug, Clone)]
pub struct BootstrapGestor {
    pub codigo: String,
    pub email: String,
    pub password: String,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let db_max_connections = var_or("DB_MAX_CONNECTIONS", "5")
            .parse()
            .context("DB_MAX_CONNECTIONS deve ser um número")?;
        let token_ttl_hours: i64 = var_or("TOKEN_TTL_HOURS", "12")
            .parse()
            .context("TOKEN_TTL_HOURS deve ser um número")?;
        let report_timeout_secs: u64 = var_or("REPORT_SERVICE_TIMEOUT_SECS", "60")
            .parse()
            .context("REPORT_SERVICE_TIMEOUT_SECS deve ser um número")?;

        let bootstrap_gestor = match (optional_var("BOOTSTRAP_GESTOR_EMAIL"), optional_var("BOOTSTRAP_GESTOR_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapGestor {
                codigo: var_or("BOOTSTRAP_GESTOR_CODIGO", "gestor"),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000"),
            db_max_connections,
            token_ttl: chrono::Duration::hours(token_ttl_hours),
            report_service_url: optional_var("REPORT_SERVICE_URL"),
            report_service_timeout: Duration::from_secs(report_timeout_secs),
            fonts_dir: PathBuf::from(var_or("FONTS_DIR", "./fonts")),
            font_family: var_or("FONT_FAMILY", "Roboto"),
            bootstrap_gestor,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub lead_service: LeadService,
    pub report_service: ReportService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let narrator: Arc<dyn ReportNarrator> = match &config.report_service_url {
            Some(url) => {
                tracing::info!(url = %url, "Gerador de relatórios configurado");
                Arc::new(HttpReportNarrator::new(url.clone(), config.report_service_timeout)?)
            }
            None => {
                tracing::warn!("REPORT_SERVICE_URL ausente: relatórios narrativos desativados");
                Arc::new(DisabledNarrator)
            }
        };

        let store = Arc::new(PgAuthorizationStore::new(db_pool.clone()));
        Self::assemble(db_pool, store, narrator, config)
    }

    /// Monta o gráfico de dependências a partir das peças já criadas.
    pub fn assemble(
        db_pool: PgPool,
        store: Arc<dyn AuthorizationStore>,
        narrator: Arc<dyn ReportNarrator>,
        config: &Config,
    ) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::embedded()?);

        let user_repo = UserRepository::new(db_pool.clone());
        let auth_service = AuthService::new(user_repo, config.jwt_secret.clone(), config.token_ttl);
        let lead_service = LeadService::new(store.clone());
        let report_service = ReportService::new(store, narrator);
        let document_service = DocumentService::new(config.fonts_dir.clone(), config.font_family.clone());

        Ok(Self {
            db_pool,
            i18n_store,
            auth_service,
            lead_service,
            report_service,
            document_service,
        })
    }
}
