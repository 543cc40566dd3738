//! Ciclo de vida de uma autorização.
//!
//! ```text
//!   pendente ──distribuir──▶ distribuido ──liberar──▶ liberado ──agendar──▶ agendado
//!                                                        │                     │
//!                                                        │      ┌──────────────┼───────────────┐
//!                                                        │      ▼              ▼               ▼
//!                                                        │  compareceu   nao_compareceu    remarcado
//!                                                        │
//!                                 liberado | agendado ───┴──▶ tel_incorreto | nao_interessado
//! ```
//!
//! Só existem transições para frente. Cada transição confere o status de
//! origem antes de gravar; reaplicar uma transição em um registro que já
//! está no status de destino é rejeitado.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::authorization::{Authorization, AuthorizationStatus},
};

/// Uma transição com os campos que ela carimba no registro.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Distribute {
        coordenadora_id: String,
        gestor_id: String,
    },
    Release,
    Schedule {
        atendente_id: String,
        data: NaiveDate,
        hora: String,
        observacoes: Option<String>,
    },
    MarkAttended,
    MarkNoShow,
    MarkRescheduled,
    MarkWrongNumber {
        atendente_id: String,
    },
    MarkNotInterested {
        atendente_id: String,
    },
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Distribute { .. } => "distribuir",
            Transition::Release => "liberar",
            Transition::Schedule { .. } => "agendar",
            Transition::MarkAttended => "compareceu",
            Transition::MarkNoShow => "nao_compareceu",
            Transition::MarkRescheduled => "remarcado",
            Transition::MarkWrongNumber { .. } => "tel_incorreto",
            Transition::MarkNotInterested { .. } => "nao_interessado",
        }
    }

    pub fn target(&self) -> AuthorizationStatus {
        use AuthorizationStatus::*;

        match self {
            Transition::Distribute { .. } => Distribuido,
            Transition::Release => Liberado,
            Transition::Schedule { .. } => Agendado,
            Transition::MarkAttended => Compareceu,
            Transition::MarkNoShow => NaoCompareceu,
            Transition::MarkRescheduled => Remarcado,
            Transition::MarkWrongNumber { .. } => TelIncorreto,
            Transition::MarkNotInterested { .. } => NaoInteressado,
        }
    }

    /// Status de origem a partir dos quais a transição é permitida.
    pub fn allowed_sources(&self) -> &'static [AuthorizationStatus] {
        use AuthorizationStatus::*;

        match self {
            Transition::Distribute { .. } => &[Pendente],
            Transition::Release => &[Distribuido],
            Transition::Schedule { .. } => &[Liberado],
            Transition::MarkAttended | Transition::MarkNoShow | Transition::MarkRescheduled => {
                &[Agendado]
            }
            Transition::MarkWrongNumber { .. } | Transition::MarkNotInterested { .. } => {
                &[Liberado, Agendado]
            }
        }
    }

    /// Confere o status atual de um registro contra a transição.
    pub fn check(&self, id: Uuid, current: AuthorizationStatus) -> Result<(), AppError> {
        if self.allowed_sources().contains(&current) {
            Ok(())
        } else {
            Err(AppError::InvalidTransition {
                id,
                from: current,
                to: self.target(),
            })
        }
    }

    /// Aplica a transição sobre uma cópia em memória.
    /// `now` é o horário atribuído pelo armazenamento.
    pub fn apply(&self, record: &mut Authorization, now: DateTime<Utc>) -> Result<(), AppError> {
        self.check(record.id, record.status)?;

        match self {
            Transition::Distribute {
                coordenadora_id,
                gestor_id,
            } => {
                record.coordenadora_id = Some(coordenadora_id.clone());
                record.gestor_id = Some(gestor_id.clone());
            }
            Transition::Release => {
                record.data_liberacao = Some(now);
            }
            Transition::Schedule {
                atendente_id,
                data,
                hora,
                observacoes,
            } => {
                record.atendente_id = Some(atendente_id.clone());
                record.data_agendamento = Some(*data);
                record.hora_agendamento = Some(hora.clone());
                record.observacoes = observacoes.clone();
            }
            Transition::MarkAttended | Transition::MarkNoShow | Transition::MarkRescheduled => {}
            Transition::MarkWrongNumber { atendente_id }
            | Transition::MarkNotInterested { atendente_id } => {
                // Saídas laterais não mantêm horário marcado.
                record.atendente_id = Some(atendente_id.clone());
                record.data_agendamento = None;
                record.hora_agendamento = None;
            }
        }

        record.status = self.target();
        record.atualizado_em = now;
        Ok(())
    }
}

/// Todos os destinos possíveis a partir de um status.
#[must_use]
pub fn valid_targets_from(status: AuthorizationStatus) -> Vec<AuthorizationStatus> {
    use AuthorizationStatus::*;

    match status {
        Pendente => vec![Distribuido],
        Distribuido => vec![Liberado],
        Liberado => vec![Agendado, TelIncorreto, NaoInteressado],
        Agendado => vec![Compareceu, NaoCompareceu, Remarcado, TelIncorreto, NaoInteressado],
        Compareceu | NaoCompareceu | Remarcado | TelIncorreto | NaoInteressado => vec![],
    }
}

#[must_use]
pub fn is_terminal(status: AuthorizationStatus) -> bool {
    valid_targets_from(status).is_empty()
}

#[cfg(test)]
pub(crate) fn invariant_violations(record: &Authorization) -> Vec<&'static str> {
    let mut violations = Vec::new();

    if record.coordenadora_id.is_some() != record.status.is_distributed() {
        violations.push("coordenadoraId");
    }
    if record.atendente_id.is_some() != record.status.has_agent() {
        violations.push("atendenteId");
    }
    let has_slot = record.data_agendamento.is_some() && record.hora_agendamento.is_some();
    let no_slot = record.data_agendamento.is_none() && record.hora_agendamento.is_none();
    if (record.status.has_appointment() && !has_slot) || (!record.status.has_appointment() && !no_slot) {
        violations.push("dataAgendamento/horaAgendamento");
    }
    violations
}
