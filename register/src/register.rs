//! Caller-level flows over the three repositories.
//!
//! [`Register`] is what a front end talks to: it runs the duplicate
//! pre-checks before inserting, sorts and filters listings the way the
//! dashboard shows them, and turns login lookups into a single generic
//! failure.

use std::cmp::Ordering;

use tracing::{info, warn};

use crate::domain::{
    Admin, AttendanceChange, AttendanceFilter, AttendanceId, AttendanceView, Member, MemberId,
    MemberInput, NewAttendance,
};
use crate::persistence::sqlite::{
    Database, SequencePolicy, SqliteAdminRepository, SqliteAttendanceRepository,
    SqliteMemberRepository,
};
use crate::persistence::{AdminRepository, AttendanceRepository, MemberRepository, RegisterError};

/// Login failures. Wrong username and wrong password are one variant.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("username and password are required")]
    MissingCredentials,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Storage(#[from] RegisterError),
}

impl AuthError {
    pub fn user_message(&self) -> String {
        match self {
            AuthError::MissingCredentials => "Nom d'utilisateur et mot de passe requis".to_string(),
            AuthError::InvalidCredentials => {
                "Nom d'utilisateur ou mot de passe incorrect".to_string()
            }
            AuthError::Storage(e) => e.user_message(),
        }
    }
}

/// The register's operations, generic over its storage.
pub struct Register<M, A, Ad> {
    members: M,
    attendance: A,
    admins: Ad,
}

/// A register backed by the SQLite repositories.
pub type SqliteRegister =
    Register<SqliteMemberRepository, SqliteAttendanceRepository, SqliteAdminRepository>;

impl SqliteRegister {
    pub fn sqlite(db: &Database, sequences: SequencePolicy) -> Self {
        let pool = db.pool().clone();
        Register::new(
            SqliteMemberRepository::new(pool.clone()).with_sequence_policy(sequences),
            SqliteAttendanceRepository::new(pool.clone()).with_sequence_policy(sequences),
            SqliteAdminRepository::new(pool),
        )
    }
}

impl<M, A, Ad> Register<M, A, Ad>
where
    M: MemberRepository,
    A: AttendanceRepository,
    Ad: AdminRepository,
{
    pub fn new(members: M, attendance: A, admins: Ad) -> Self {
        Self {
            members,
            attendance,
            admins,
        }
    }

    // ── members ────────────────────────────────────────────────────────

    /// Register a visitor. An existing member with the same name in any
    /// case is reported as `DuplicateMember` before an insert is tried.
    pub async fn register_member(&self, input: &MemberInput) -> Result<MemberId, RegisterError> {
        let input = input.normalized()?;
        if let Some(existing) = self
            .members
            .find_by_name_and_surname(&input.nom, &input.prenom)
            .await?
        {
            info!(member_id = existing.id, "Registration refused, member exists");
            return Err(RegisterError::DuplicateMember {
                nom: existing.nom,
                prenom: existing.prenom,
            });
        }
        self.members.add_member(&input).await
    }

    /// All members, sorted by full name ignoring case and accents.
    pub async fn members(&self) -> Result<Vec<Member>, RegisterError> {
        let mut members = self.members.list_members().await?;
        members.sort_by(compare_members);
        Ok(members)
    }

    /// Members whose full name contains `query`, ignoring case.
    pub async fn search_members(&self, query: &str) -> Result<Vec<Member>, RegisterError> {
        let needle = query.trim().to_lowercase();
        let mut members = self.members().await?;
        if !needle.is_empty() {
            members.retain(|m| m.full_name().to_lowercase().contains(&needle));
        }
        Ok(members)
    }

    pub async fn find_member(
        &self,
        nom: &str,
        prenom: &str,
    ) -> Result<Option<Member>, RegisterError> {
        self.members.find_by_name_and_surname(nom, prenom).await
    }

    pub async fn update_member(
        &self,
        id: MemberId,
        input: &MemberInput,
    ) -> Result<(), RegisterError> {
        self.members.update_member(id, input).await
    }

    pub async fn delete_member(&self, id: MemberId) -> Result<(), RegisterError> {
        self.members.delete_member(id).await
    }

    // ── attendance ─────────────────────────────────────────────────────

    /// Record a check-in unless one already exists for the same member,
    /// service and date.
    pub async fn check_in(&self, entry: &NewAttendance) -> Result<AttendanceId, RegisterError> {
        let culte_id = entry.service.id();
        if self
            .attendance
            .exists(entry.member_id, culte_id, &entry.date)
            .await?
        {
            return Err(RegisterError::DuplicateAttendance {
                member_id: entry.member_id,
                culte_id,
                date: entry.date.clone(),
            });
        }
        self.attendance.record(entry).await
    }

    /// Attendance listing narrowed by `filter`, newest dates first.
    pub async fn attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<Vec<AttendanceView>, RegisterError> {
        let mut entries = self.attendance.list_attendance().await?;
        entries.retain(|e| filter.matches(e));
        Ok(entries)
    }

    pub async fn update_attendance(
        &self,
        id: AttendanceId,
        change: &AttendanceChange,
    ) -> Result<(), RegisterError> {
        self.attendance.update(id, change).await
    }

    pub async fn delete_attendance(&self, id: AttendanceId) -> Result<(), RegisterError> {
        self.attendance.remove(id).await
    }

    // ── admin ──────────────────────────────────────────────────────────

    pub async fn login(&self, username: &str, password: &str) -> Result<Admin, AuthError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        match self.admins.login(username, password).await? {
            Some(admin) => {
                info!(username = %admin.username, "Admin logged in");
                Ok(admin)
            }
            None => {
                warn!("Rejected admin login");
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

/// Sort key for French names: lowercase with common accents folded.
pub fn sort_key(value: &str) -> String {
    let mut key = String::with_capacity(value.len());
    for c in value.trim().chars().flat_map(char::to_lowercase) {
        match c {
            'à' | 'â' | 'ä' | 'á' | 'ã' => key.push('a'),
            'é' | 'è' | 'ê' | 'ë' => key.push('e'),
            'î' | 'ï' | 'í' | 'ì' => key.push('i'),
            'ô' | 'ö' | 'ó' | 'ò' | 'õ' => key.push('o'),
            'ù' | 'û' | 'ü' | 'ú' => key.push('u'),
            'ÿ' => key.push('y'),
            'ç' => key.push('c'),
            'ñ' => key.push('n'),
            'œ' => key.push_str("oe"),
            'æ' => key.push_str("ae"),
            other => key.push(other),
        }
    }
    key
}

fn compare_members(a: &Member, b: &Member) -> Ordering {
    sort_key(&a.full_name())
        .cmp(&sort_key(&b.full_name()))
        .then_with(|| a.full_name().cmp(&b.full_name()))
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: i64, nom: &str, prenom: &str) -> Member {
        Member {
            id,
            nom: nom.to_string(),
            prenom: prenom.to_string(),
            numero: None,
            date_de_naissance: String::new(),
        }
    }

    #[test]
    fn sort_key_folds_case_and_accents() {
        assert_eq!(sort_key("Émile"), "emile");
        assert_eq!(sort_key(" François "), "francois");
        assert_eq!(sort_key("Cœur"), "coeur");
    }

    #[test]
    fn accented_names_sort_with_plain_letters() {
        let mut members = vec![
            member(1, "Zola", "Émile"),
            member(2, "Éloi", "Marc"),
            member(3, "elie", "Anne"),
            member(4, "Durand", "Luc"),
        ];
        members.sort_by(compare_members);
        let ids: Vec<i64> = members.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }

    #[test]
    fn auth_messages_do_not_say_which_part_failed() {
        let message = AuthError::InvalidCredentials.user_message();
        assert_eq!(message, "Nom d'utilisateur ou mot de passe incorrect");
    }
}
