// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::logout,

        // --- Usuários ---
        handlers::users::get_me,
        handlers::users::create_user,
        handlers::users::list_users,

        // --- Público ---
        handlers::public::submit_authorization,

        // --- Autorizações ---
        handlers::authorizations::create_authorization,
        handlers::authorizations::get_authorization,
        handlers::authorizations::distribute,
        handlers::authorizations::release,
        handlers::authorizations::schedule,
        handlers::authorizations::mark_attended,
        handlers::authorizations::mark_no_show,
        handlers::authorizations::mark_rescheduled,
        handlers::authorizations::mark_wrong_number,
        handlers::authorizations::mark_not_interested,
        handlers::documents::ficha_pdf,
        handlers::events::stream_view,

        // --- Filas e Agenda ---
        handlers::queues::distribution_queue,
        handlers::queues::coordinator_queue,
        handlers::queues::scheduling_queue,
        handlers::agenda::get_week,

        // --- Relatórios ---
        handlers::reports::attendance_report,
        handlers::reports::narrative_report,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::Identity,
            models::auth::CreateUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Autorizações ---
            models::authorization::AuthorizationStatus,
            models::authorization::CreatedBy,
            models::authorization::Authorization,
            models::authorization::NewAuthorization,
            models::authorization::DistributePayload,
            models::authorization::ReleasePayload,
            models::authorization::SchedulePayload,
            models::authorization::AuthorizationEventKind,
            models::authorization::AuthorizationEvent,
            models::filter::LeadView,

            // --- Agenda ---
            models::agenda::AgendaDay,
            models::agenda::AgendaWeek,

            // --- Relatórios ---
            models::report::ReportType,
            models::report::ReportQuery,
            models::report::ReportSummary,
            models::report::AttendanceReport,
            models::report::NarrativeReport,
        )
    ),
    tags(
        (name = "Auth", description = "Login e Logout da equipe"),
        (name = "Usuários", description = "Cadastro da equipe (gestor)"),
        (name = "Público", description = "Formulário de autorização aberto"),
        (name = "Autorizações", description = "Ciclo de vida dos cadastros"),
        (name = "Filas", description = "Visões dos painéis"),
        (name = "Agenda", description = "Calendário compartilhado de visitas"),
        (name = "Relatórios", description = "Comparecimento por escola, atendente ou coordenadora")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
