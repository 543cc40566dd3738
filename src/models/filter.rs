// src/models/filter.rs

use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::models::{
    auth::Identity,
    authorization::{Authorization, AuthorizationStatus},
};

/// Predicado de leitura: status por igualdade ou pertinência a um conjunto,
/// opcionalmente combinado com igualdade em um campo de atribuição.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorizationFilter {
    pub statuses: Vec<AuthorizationStatus>,
    pub coordenadora_id: Option<String>,
    pub atendente_id: Option<String>,
    pub escola: Option<String>,
    /// Intervalo fechado de datas de agendamento.
    pub agendamento_entre: Option<(NaiveDate, NaiveDate)>,
}

impl AuthorizationFilter {
    pub fn with_status(status: AuthorizationStatus) -> Self {
        Self {
            statuses: vec![status],
            ..Default::default()
        }
    }

    pub fn with_statuses(statuses: &[AuthorizationStatus]) -> Self {
        Self {
            statuses: statuses.to_vec(),
            ..Default::default()
        }
    }

    pub fn matches(&self, record: &Authorization) -> bool {
        if !self.statuses.contains(&record.status) {
            return false;
        }
        if let Some(c) = &self.coordenadora_id {
            if record.coordenadora_id.as_ref() != Some(c) {
                return false;
            }
        }
        if let Some(a) = &self.atendente_id {
            if record.atendente_id.as_ref() != Some(a) {
                return false;
            }
        }
        if let Some(e) = &self.escola {
            if &record.escola != e {
                return false;
            }
        }
        if let Some((inicio, fim)) = self.agendamento_entre {
            match record.data_agendamento {
                Some(d) if d >= inicio && d <= fim => {}
                _ => return false,
            }
        }
        true
    }
}

/// Ordem de leitura: agendamentos primeiro por data e hora ("HH:mm" ordena
/// lexicograficamente), depois pela data de cadastro.
pub fn sort_records(records: &mut [Authorization]) {
    records.sort_by(|a, b| {
        let key_a = (a.data_agendamento.is_none(), a.data_agendamento, a.hora_agendamento.is_none(), a.hora_agendamento.as_deref());
        let key_b = (b.data_agendamento.is_none(), b.data_agendamento, b.hora_agendamento.is_none(), b.hora_agendamento.as_deref());
        key_a.cmp(&key_b).then(a.data_cadastro.cmp(&b.data_cadastro))
    });
}

/// As visões dos painéis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeadView {
    Distribuicao,
    Coordenacao,
    Agendamento,
    Agenda,
}

impl LeadView {
    /// Monta o predicado da visão para o usuário atual.
    pub fn filter_for(&self, user: &Identity) -> AuthorizationFilter {
        match self {
            LeadView::Distribuicao => AuthorizationFilter::with_status(AuthorizationStatus::Pendente),
            LeadView::Coordenacao => AuthorizationFilter {
                coordenadora_id: Some(user.codigo.clone()),
                ..AuthorizationFilter::with_status(AuthorizationStatus::Distribuido)
            },
            LeadView::Agendamento => AuthorizationFilter::with_status(AuthorizationStatus::Liberado),
            LeadView::Agenda => AuthorizationFilter::with_statuses(&AuthorizationStatus::CALENDAR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{auth::Role, authorization::fixtures::authorization};
    use uuid::Uuid;

    fn coordinator(codigo: &str) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            codigo: codigo.into(),
            email: format!("{codigo}@escola.org"),
            role: Role::Coordenadora,
            session_id: Uuid::new_v4(),
            expires_at: 0,
        }
    }

    #[test]
    fn coordinator_view_requires_own_assignment() {
        let view = LeadView::Coordenacao.filter_for(&coordinator("C1"));

        let mut mine = authorization(AuthorizationStatus::Distribuido);
        mine.coordenadora_id = Some("C1".into());
        let mut other = mine.clone();
        other.coordenadora_id = Some("C2".into());
        let mut released = mine.clone();
        released.status = AuthorizationStatus::Liberado;

        assert!(view.matches(&mine));
        assert!(!view.matches(&other));
        assert!(!view.matches(&released));
    }

    #[test]
    fn calendar_view_uses_status_set() {
        let view = LeadView::Agenda.filter_for(&coordinator("C1"));
        for status in AuthorizationStatus::ALL {
            assert_eq!(
                view.matches(&authorization(status)),
                AuthorizationStatus::CALENDAR.contains(&status)
            );
        }
    }

    #[test]
    fn date_range_is_inclusive() {
        let inicio = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let fim = NaiveDate::from_ymd_opt(2025, 3, 16).unwrap();
        let filter = AuthorizationFilter {
            agendamento_entre: Some((inicio, fim)),
            ..AuthorizationFilter::with_status(AuthorizationStatus::Agendado)
        };

        let mut record = authorization(AuthorizationStatus::Agendado);
        record.data_agendamento = Some(fim);
        assert!(filter.matches(&record));
        record.data_agendamento = NaiveDate::from_ymd_opt(2025, 3, 17);
        assert!(!filter.matches(&record));
        record.data_agendamento = None;
        assert!(!filter.matches(&record));
    }

    #[test]
    fn sort_orders_by_date_then_time() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut late = authorization(AuthorizationStatus::Agendado);
        late.data_agendamento = Some(day);
        late.hora_agendamento = Some("14:00".into());
        let mut early = late.clone();
        early.hora_agendamento = Some("09:30".into());
        let mut next_day = late.clone();
        next_day.data_agendamento = day.succ_opt();
        next_day.hora_agendamento = Some("08:00".into());
        let unscheduled = authorization(AuthorizationStatus::Liberado);

        let mut records = vec![unscheduled.clone(), next_day.clone(), late.clone(), early.clone()];
        sort_records(&mut records);

        let horas: Vec<_> = records.iter().map(|r| r.hora_agendamento.clone()).collect();
        assert_eq!(
            horas,
            vec![Some("09:30".into()), Some("14:00".into()), Some("08:00".into()), None]
        );
    }
}
