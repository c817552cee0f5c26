//! SQLite-backed repository for attendance entries.

use sqlx::SqlitePool;
use tracing::{debug, info};

use super::helpers::{
    decode_presence, decode_reason, display_name, display_phone, encode_presence,
    is_foreign_key_violation, is_unique_violation,
};
use super::sequence::{SequencePolicy, SequenceTable};
use crate::domain::{
    service_label, AttendanceChange, AttendanceId, AttendanceView, MemberId, NewAttendance,
    ABSENT_LABEL, PRESENT_LABEL,
};
use crate::persistence::traits::AttendanceRepository;
use crate::persistence::RegisterError;

/// Row type for the attendance listing joined with `membre`.
#[derive(sqlx::FromRow)]
struct AttendanceRow {
    id: i64,
    member_id: i64,
    culte_id: i64,
    presence: i64,
    date: Option<String>,
    pkabsence: Option<String>,
    nom: Option<String>,
    prenom: Option<String>,
    numero: Option<String>,
}

impl From<AttendanceRow> for AttendanceView {
    fn from(r: AttendanceRow) -> Self {
        let present = decode_presence(r.presence);
        Self {
            id: r.id,
            member_id: r.member_id,
            full_name: display_name(r.nom.as_deref(), r.prenom.as_deref()),
            phone: display_phone(r.numero),
            present,
            present_label: (if present { PRESENT_LABEL } else { ABSENT_LABEL }).to_string(),
            service_id: r.culte_id,
            service_label: service_label(r.culte_id),
            date: r.date.unwrap_or_default(),
            absence_reason: decode_reason(r.pkabsence),
        }
    }
}

/// SQLite implementation of [`AttendanceRepository`].
pub struct SqliteAttendanceRepository {
    pool: SqlitePool,
    sequences: SequencePolicy,
}

impl SqliteAttendanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            sequences: SequencePolicy::default(),
        }
    }

    pub fn with_sequence_policy(mut self, policy: SequencePolicy) -> Self {
        self.sequences = policy;
        self
    }
}

impl AttendanceRepository for SqliteAttendanceRepository {
    async fn list_attendance(&self) -> Result<Vec<AttendanceView>, RegisterError> {
        let rows: Vec<AttendanceRow> = sqlx::query_as(
            r#"
            SELECT
                p.id,
                p.member AS member_id,
                p.culte AS culte_id,
                p.presence,
                p.date,
                p.pkabsence,
                m.nom,
                m.prenom,
                m.numero
            FROM presence p
            JOIN membre m ON p.member = m.id
            ORDER BY p.date DESC, m.nom, m.prenom, p.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed attendance");
        Ok(rows.into_iter().map(AttendanceView::from).collect())
    }

    async fn exists(
        &self,
        member_id: MemberId,
        culte_id: i64,
        date: &str,
    ) -> Result<bool, RegisterError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM presence WHERE member = ? AND culte = ? AND date = ?",
        )
        .bind(member_id)
        .bind(culte_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0 > 0)
    }

    /// Insert an entry. The unique `(member, culte, date)` index decides
    /// duplicates inside the single INSERT, so concurrent writers either
    /// insert or get `DuplicateAttendance`.
    async fn record(&self, entry: &NewAttendance) -> Result<AttendanceId, RegisterError> {
        let culte_id = entry.service.id();
        let duplicate = || RegisterError::DuplicateAttendance {
            member_id: entry.member_id,
            culte_id,
            date: entry.date.clone(),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO presence (member, culte, presence, date, pkabsence)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (member, culte, date) DO NOTHING
            "#,
        )
        .bind(entry.member_id)
        .bind(culte_id)
        .bind(encode_presence(entry.status.is_present()))
        .bind(&entry.date)
        .bind(entry.status.absence_reason())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                duplicate()
            } else if is_foreign_key_violation(&e) {
                RegisterError::NotFound {
                    entity: "member",
                    id: entry.member_id,
                }
            } else {
                RegisterError::from(e)
            }
        })?;

        if result.rows_affected() == 0 {
            info!(
                member_id = entry.member_id,
                culte_id,
                date = %entry.date,
                "Attendance already recorded for this member/service/date"
            );
            return Err(duplicate());
        }

        let id = result.last_insert_rowid();
        info!(
            attendance_id = id,
            member_id = entry.member_id,
            culte_id,
            present = entry.status.is_present(),
            date = %entry.date,
            "Attendance recorded"
        );
        Ok(id)
    }

    async fn update(&self, id: AttendanceId, change: &AttendanceChange) -> Result<(), RegisterError> {
        let culte_id = change.service.id();

        let result =
            sqlx::query("UPDATE presence SET presence = ?, culte = ?, pkabsence = ? WHERE id = ?")
                .bind(encode_presence(change.status.is_present()))
                .bind(culte_id)
                .bind(change.status.absence_reason())
                .bind(id)
                .execute(&self.pool)
                .await;

        let result = match result {
            Ok(result) => result,
            Err(e) if is_unique_violation(&e) => {
                let (member_id, date) = entry_key(&self.pool, id).await?.unwrap_or_default();
                return Err(RegisterError::DuplicateAttendance {
                    member_id,
                    culte_id,
                    date,
                });
            }
            Err(e) => return Err(e.into()),
        };

        if result.rows_affected() == 0 {
            return Err(RegisterError::NotFound {
                entity: "attendance",
                id,
            });
        }

        info!(
            attendance_id = id,
            culte_id,
            present = change.status.is_present(),
            "Attendance updated"
        );
        Ok(())
    }

    async fn remove(&self, id: AttendanceId) -> Result<(), RegisterError> {
        let removed = sqlx::query("DELETE FROM presence WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if removed == 0 {
            return Err(RegisterError::NotFound {
                entity: "attendance",
                id,
            });
        }

        info!(attendance_id = id, "Attendance deleted");
        self.sequences
            .apply(&self.pool, SequenceTable::Presence, removed)
            .await;
        Ok(())
    }
}

/// `(member, date)` of an entry, for error reporting.
async fn entry_key(
    pool: &SqlitePool,
    id: AttendanceId,
) -> Result<Option<(MemberId, String)>, RegisterError> {
    let row = sqlx::query_as("SELECT member, date FROM presence WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}
