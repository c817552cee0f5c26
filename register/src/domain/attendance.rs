use serde::Serialize;

use super::{non_blank, AttendanceId, MemberId, Service, ValidationError};

pub const PRESENT_LABEL: &str = "Présent";
pub const ABSENT_LABEL: &str = "Absent";
/// Shown in listings when the joined member has no name.
pub const UNKNOWN_NAME: &str = "Inconnu";
/// Shown in listings when the joined member has no phone number.
pub const MISSING_PHONE: &str = "N/A";

/// Present, or absent with a non-empty reason.
///
/// Folding the reason into the `Absent` variant means a present entry can
/// never carry one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceStatus {
    Present,
    Absent { reason: String },
}

impl AttendanceStatus {
    /// Build a status from form-style fields.
    ///
    /// When `present` is true the reason is dropped whatever it contains.
    /// When absent, the trimmed reason must not be empty.
    pub fn new(present: bool, absence_reason: Option<&str>) -> Result<Self, ValidationError> {
        if present {
            return Ok(AttendanceStatus::Present);
        }
        let reason = absence_reason
            .and_then(non_blank)
            .ok_or(ValidationError::MissingAbsenceReason)?;
        Ok(AttendanceStatus::Absent {
            reason: reason.to_string(),
        })
    }

    pub fn is_present(&self) -> bool {
        matches!(self, AttendanceStatus::Present)
    }

    /// Value for the `pkabsence` column.
    pub fn absence_reason(&self) -> Option<&str> {
        match self {
            AttendanceStatus::Present => None,
            AttendanceStatus::Absent { reason } => Some(reason),
        }
    }

    pub fn label(&self) -> &'static str {
        if self.is_present() {
            PRESENT_LABEL
        } else {
            ABSENT_LABEL
        }
    }
}

/// A validated check-in, ready to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendance {
    pub member_id: MemberId,
    pub service: Service,
    pub status: AttendanceStatus,
    pub date: String,
}

impl NewAttendance {
    pub fn new(
        member_id: MemberId,
        culte_id: i64,
        present: bool,
        date: &str,
        absence_reason: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let date = non_blank(date).ok_or(ValidationError::EmptyDate)?;
        let service = Service::try_from(culte_id)?;
        let status = AttendanceStatus::new(present, absence_reason)?;
        Ok(Self {
            member_id,
            service,
            status,
            date: date.to_string(),
        })
    }
}

/// The fields an admin may change on an existing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceChange {
    pub service: Service,
    pub status: AttendanceStatus,
}

impl AttendanceChange {
    pub fn new(
        present: bool,
        culte_id: i64,
        absence_reason: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let service = Service::try_from(culte_id)?;
        let status = AttendanceStatus::new(present, absence_reason)?;
        Ok(Self { service, status })
    }
}

/// Denormalized attendance row joined with its member, as shown on the
/// dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceView {
    pub id: AttendanceId,
    pub member_id: MemberId,
    pub full_name: String,
    pub phone: String,
    pub present: bool,
    pub present_label: String,
    pub service_id: i64,
    pub service_label: String,
    pub date: String,
    pub absence_reason: Option<String>,
}

/// Dashboard filter over attendance listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceFilter {
    /// Case-insensitive substring of the member's full name.
    pub name: Option<String>,
    /// Exact service id.
    pub service: Option<i64>,
}

impl AttendanceFilter {
    pub fn matches(&self, view: &AttendanceView) -> bool {
        let name_match = match self.name.as_deref().and_then(non_blank) {
            None => true,
            Some(needle) => {
                !view.full_name.is_empty()
                    && view
                        .full_name
                        .to_lowercase()
                        .contains(&needle.to_lowercase())
            }
        };
        let service_match = self.service.map_or(true, |id| view.service_id == id);
        name_match && service_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(full_name: &str, service_id: i64) -> AttendanceView {
        AttendanceView {
            id: 1,
            member_id: 1,
            full_name: full_name.to_string(),
            phone: MISSING_PHONE.to_string(),
            present: true,
            present_label: PRESENT_LABEL.to_string(),
            service_id,
            service_label: crate::domain::service_label(service_id),
            date: "2024-01-07".to_string(),
            absence_reason: None,
        }
    }

    #[test]
    fn present_discards_reason() {
        let status = AttendanceStatus::new(true, Some("vacation")).unwrap();
        assert_eq!(status, AttendanceStatus::Present);
        assert_eq!(status.absence_reason(), None);
        assert_eq!(status.label(), "Présent");
    }

    #[test]
    fn absent_requires_reason() {
        assert_eq!(
            AttendanceStatus::new(false, None),
            Err(ValidationError::MissingAbsenceReason)
        );
        assert_eq!(
            AttendanceStatus::new(false, Some("   ")),
            Err(ValidationError::MissingAbsenceReason)
        );
        let status = AttendanceStatus::new(false, Some("  malade ")).unwrap();
        assert_eq!(status.absence_reason(), Some("malade"));
        assert_eq!(status.label(), "Absent");
    }

    #[test]
    fn new_attendance_validates_date_then_service() {
        assert_eq!(
            NewAttendance::new(1, 1, true, " ", None),
            Err(ValidationError::EmptyDate)
        );
        assert_eq!(
            NewAttendance::new(1, 5, true, "2024-01-07", None),
            Err(ValidationError::UnknownService(5))
        );
        let entry = NewAttendance::new(1, 2, true, " 2024-01-07 ", None).unwrap();
        assert_eq!(entry.service, Service::Second);
        assert_eq!(entry.date, "2024-01-07");
    }

    #[test]
    fn change_requires_reason_when_absent() {
        assert_eq!(
            AttendanceChange::new(false, 1, Some("")),
            Err(ValidationError::MissingAbsenceReason)
        );
        let change = AttendanceChange::new(true, 1, Some("ignored")).unwrap();
        assert_eq!(change.status, AttendanceStatus::Present);
    }

    #[test]
    fn filter_by_name_and_service() {
        let entry = view("Dupont Jean", 1);

        assert!(AttendanceFilter::default().matches(&entry));

        let by_name = AttendanceFilter {
            name: Some("DUPONT".to_string()),
            service: None,
        };
        assert!(by_name.matches(&entry));

        let by_service = AttendanceFilter {
            name: None,
            service: Some(2),
        };
        assert!(!by_service.matches(&entry));

        let both = AttendanceFilter {
            name: Some("jean".to_string()),
            service: Some(1),
        };
        assert!(both.matches(&entry));
    }

    #[test]
    fn name_filter_drops_unnamed_entries() {
        let filter = AttendanceFilter {
            name: Some("a".to_string()),
            service: None,
        };
        assert!(!filter.matches(&view("", 1)));
    }
}
