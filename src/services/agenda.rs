// src/services/agenda.rs

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{
    agenda::{AgendaDay, AgendaWeek},
    authorization::Authorization,
};

/// Segunda e domingo da semana que contém `reference`.
pub fn week_bounds(reference: NaiveDate) -> (NaiveDate, NaiveDate) {
    let inicio = reference - Duration::days(reference.weekday().num_days_from_monday() as i64);
    (inicio, inicio + Duration::days(6))
}

/// Agrupa os eventos nos sete dias da semana, cada dia ordenado pela hora.
/// Eventos fora da semana são descartados.
pub fn build_week(events: Vec<Authorization>, reference: NaiveDate) -> AgendaWeek {
    let (inicio, fim) = week_bounds(reference);

    let mut dias: Vec<AgendaDay> = (0..7)
        .map(|offset| AgendaDay {
            data: inicio + Duration::days(offset),
            eventos: Vec::new(),
        })
        .collect();

    for event in events {
        let Some(data) = event.data_agendamento else {
            continue;
        };
        if data < inicio || data > fim {
            continue;
        }
        let index = (data - inicio).num_days() as usize;
        dias[index].eventos.push(event);
    }

    for dia in &mut dias {
        dia.eventos
            .sort_by(|a, b| a.hora_agendamento.cmp(&b.hora_agendamento));
    }

    AgendaWeek { inicio, fim, dias }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::authorization::{fixtures::authorization, AuthorizationStatus};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn event(data: &str, hora: &str) -> Authorization {
        let mut record = authorization(AuthorizationStatus::Agendado);
        record.data_agendamento = Some(date(data));
        record.hora_agendamento = Some(hora.into());
        record
    }

    #[test]
    fn week_starts_on_monday() {
        // 2025-03-16 é domingo
        assert_eq!(week_bounds(date("2025-03-16")), (date("2025-03-10"), date("2025-03-16")));
        assert_eq!(week_bounds(date("2025-03-10")), (date("2025-03-10"), date("2025-03-16")));
        assert_eq!(week_bounds(date("2025-03-17")).0, date("2025-03-17"));
    }

    #[test]
    fn events_land_on_their_day_sorted_by_time() {
        let week = build_week(
            vec![
                event("2025-03-12", "15:30"),
                event("2025-03-12", "08:00"),
                event("2025-03-10", "14:00"),
                event("2025-03-18", "10:00"),
            ],
            date("2025-03-12"),
        );

        assert_eq!(week.dias.len(), 7);
        assert_eq!(week.dias[0].eventos.len(), 1);
        let quarta: Vec<_> = week.dias[2]
            .eventos
            .iter()
            .map(|e| e.hora_agendamento.as_deref().unwrap())
            .collect();
        assert_eq!(quarta, vec!["08:00", "15:30"]);
        assert_eq!(week.dias.iter().map(|d| d.eventos.len()).sum::<usize>(), 3);
    }
}
