pub mod sqlite;
pub mod traits;

pub use traits::{AdminRepository, AttendanceRepository, MemberRepository};

use crate::domain::{MemberId, ValidationError};

/// Errors from the register's repositories.
///
/// Three families are kept apart: validation failures (nothing was written),
/// uniqueness rejections (the write was refused as a whole), and storage
/// faults (`Sqlx`, `Migration`, `Io`).
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("member {nom} {prenom} is already registered")]
    DuplicateMember { nom: String, prenom: String },
    #[error("attendance already recorded for member {member_id}, service {culte_id} on {date}")]
    DuplicateAttendance {
        member_id: MemberId,
        culte_id: i64,
        date: String,
    },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegisterError {
    /// True when the store itself failed rather than the request.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            RegisterError::Sqlx(_) | RegisterError::Migration(_) | RegisterError::Io(_)
        )
    }

    /// Message for the person at the form; storage details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            RegisterError::Validation(e) => e.user_message().to_string(),
            RegisterError::DuplicateMember { .. } => "Ce membre existe déjà".to_string(),
            RegisterError::DuplicateAttendance { .. } => {
                "Présence déjà enregistrée pour ce membre/culte/date".to_string()
            }
            RegisterError::NotFound { entity, id } => format!("{} {} introuvable", entity, id),
            RegisterError::Sqlx(_) | RegisterError::Migration(_) | RegisterError::Io(_) => {
                "Une erreur est survenue, veuillez réessayer".to_string()
            }
        }
    }
}
