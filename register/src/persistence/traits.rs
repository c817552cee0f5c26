//! Async repository trait definitions for the persistence layer.
//!
//! Each trait covers one aggregate of the register. The facade in
//! [`crate::register`] is generic over them (static dispatch), so a
//! different backend can be slotted in without touching the flows.
//!
//! Methods return `impl Future + Send` rather than using `async fn` so that
//! the futures are guaranteed `Send` and can be driven from `tokio::spawn`.

use std::future::Future;

use super::RegisterError;
use crate::domain::{
    Admin, AttendanceChange, AttendanceId, AttendanceView, Member, MemberId, MemberInput,
    NewAttendance,
};

/// Repository for registered members.
///
/// Implementations must keep `(nom, prenom)` unique under case-insensitive
/// comparison and `numero` unique when present. Deleting a member removes
/// all of its attendance entries.
pub trait MemberRepository: Send + Sync {
    fn list_members(&self) -> impl Future<Output = Result<Vec<Member>, RegisterError>> + Send;
    fn add_member(
        &self,
        input: &MemberInput,
    ) -> impl Future<Output = Result<MemberId, RegisterError>> + Send;
    /// Overwrite every field of member `id`. A new name that matches another
    /// member case-insensitively is `DuplicateMember`; an unknown id is
    /// `NotFound`.
    fn update_member(
        &self,
        id: MemberId,
        input: &MemberInput,
    ) -> impl Future<Output = Result<(), RegisterError>> + Send;
    fn delete_member(&self, id: MemberId)
        -> impl Future<Output = Result<(), RegisterError>> + Send;
    fn find_by_name_and_surname(
        &self,
        nom: &str,
        prenom: &str,
    ) -> impl Future<Output = Result<Option<Member>, RegisterError>> + Send;
}

/// Repository for attendance entries.
///
/// Implementations must reject a second entry for the same
/// `(member, service, date)` triple with `DuplicateAttendance`.
pub trait AttendanceRepository: Send + Sync {
    fn list_attendance(
        &self,
    ) -> impl Future<Output = Result<Vec<AttendanceView>, RegisterError>> + Send;
    fn exists(
        &self,
        member_id: MemberId,
        culte_id: i64,
        date: &str,
    ) -> impl Future<Output = Result<bool, RegisterError>> + Send;
    fn record(
        &self,
        entry: &NewAttendance,
    ) -> impl Future<Output = Result<AttendanceId, RegisterError>> + Send;
    fn update(
        &self,
        id: AttendanceId,
        change: &AttendanceChange,
    ) -> impl Future<Output = Result<(), RegisterError>> + Send;
    fn remove(&self, id: AttendanceId) -> impl Future<Output = Result<(), RegisterError>> + Send;
}

/// Read-only access to admin credentials.
pub trait AdminRepository: Send + Sync {
    fn login(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<Option<Admin>, RegisterError>> + Send;
    fn admin_exists(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<bool, RegisterError>> + Send;
}
