//! Domain types for the congregation register.
//!
//! Everything here is storage-agnostic: members, the closed service
//! enumeration, attendance entries with their status-dependent absence
//! reason, and the admin account. Input types (`MemberInput`,
//! `NewAttendance`, `AttendanceChange`) validate themselves before any
//! repository sees them, so a write never starts with invalid data.

mod admin;
mod attendance;
mod member;
mod service;

pub use admin::{Admin, DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};
pub use attendance::{
    AttendanceChange, AttendanceFilter, AttendanceStatus, AttendanceView, NewAttendance,
    ABSENT_LABEL, MISSING_PHONE, PRESENT_LABEL, UNKNOWN_NAME,
};
pub use member::{Member, MemberInput};
pub use service::{service_label, Service};

/// Identifier assigned to a member by the store.
pub type MemberId = i64;

/// Identifier assigned to an attendance entry by the store.
pub type AttendanceId = i64;

/// Caller-supplied data violates a required-field or conditional-field rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("nom must not be empty")]
    EmptyNom,
    #[error("prenom must not be empty")]
    EmptyPrenom,
    #[error("date must not be empty")]
    EmptyDate,
    #[error("an absence reason is required when the member is absent")]
    MissingAbsenceReason,
    #[error("unknown service id {0}")]
    UnknownService(i64),
}

impl ValidationError {
    /// Field-specific prompt shown to the person filling in the form.
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::EmptyNom | ValidationError::EmptyPrenom => {
                "Le nom et le prénom sont obligatoires"
            }
            ValidationError::EmptyDate => "La date est obligatoire",
            ValidationError::MissingAbsenceReason => "La raison d'absence est requise",
            ValidationError::UnknownService(_) => "Culte invalide",
        }
    }
}

/// Trim `value` and return `None` when nothing is left.
pub(crate) fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_blank_trims() {
        assert_eq!(non_blank("  Jean "), Some("Jean"));
        assert_eq!(non_blank("   "), None);
        assert_eq!(non_blank(""), None);
    }

    #[test]
    fn name_errors_share_one_prompt() {
        assert_eq!(
            ValidationError::EmptyNom.user_message(),
            ValidationError::EmptyPrenom.user_message()
        );
        assert_eq!(
            ValidationError::MissingAbsenceReason.user_message(),
            "La raison d'absence est requise"
        );
    }
}
