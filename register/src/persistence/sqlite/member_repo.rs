//! SQLite-backed repository for members.

use sqlx::{Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use super::sequence::{SequencePolicy, SequenceTable};
use crate::domain::{Member, MemberId, MemberInput};
use crate::persistence::traits::MemberRepository;
use crate::persistence::RegisterError;

/// Row type for member queries, mapped via `sqlx::FromRow`.
#[derive(sqlx::FromRow)]
struct MemberRow {
    id: i64,
    nom: String,
    prenom: String,
    numero: Option<String>,
    date_de_naissance: Option<String>,
}

impl From<MemberRow> for Member {
    fn from(r: MemberRow) -> Self {
        Self {
            id: r.id,
            nom: r.nom,
            prenom: r.prenom,
            numero: r.numero,
            date_de_naissance: r.date_de_naissance.unwrap_or_default(),
        }
    }
}

/// SQLite implementation of [`MemberRepository`].
pub struct SqliteMemberRepository {
    pool: SqlitePool,
    sequences: SequencePolicy,
}

impl SqliteMemberRepository {
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

impl MemberRepository for SqliteMemberRepository {
    async fn list_members(&self) -> Result<Vec<Member>, RegisterError> {
        let rows: Vec<MemberRow> = sqlx::query_as(
            r#"
            SELECT id, nom, prenom, numero, "dateDeNaissance" AS date_de_naissance
            FROM membre
            WHERE nom IS NOT NULL AND prenom IS NOT NULL
            ORDER BY nom COLLATE NOCASE, prenom COLLATE NOCASE, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed members");
        Ok(rows.into_iter().map(Member::from).collect())
    }

    /// Insert a member unless one with the same name in any case exists.
    /// The check and the insert are one statement, so two concurrent
    /// registrations of the same person cannot both succeed.
    async fn add_member(&self, input: &MemberInput) -> Result<MemberId, RegisterError> {
        let input = input.normalized()?;

        let result = sqlx::query(
            r#"
            INSERT INTO membre (nom, prenom, numero, "dateDeNaissance")
            SELECT ?, ?, ?, ?
            WHERE NOT EXISTS (
                SELECT 1 FROM membre WHERE LOWER(nom) = LOWER(?) AND LOWER(prenom) = LOWER(?)
            )
            "#,
        )
        .bind(&input.nom)
        .bind(&input.prenom)
        .bind(&input.numero)
        .bind(&input.date_de_naissance)
        .bind(&input.nom)
        .bind(&input.prenom)
        .execute(&self.pool)
        .await
        .inspect_err(|e| warn!(error = %e, "Failed to insert member"))?;

        if result.rows_affected() == 0 {
            let existing = find_member(&self.pool, &input.nom, &input.prenom).await?;
            info!(
                member_id = existing.as_ref().map(|m| m.id),
                "Member already registered"
            );
            return Err(duplicate_of(existing, input));
        }

        let id = result.last_insert_rowid();
        info!(member_id = id, "Member registered");
        Ok(id)
    }

    /// Replace a member's fields. Fails with `DuplicateMember` when the new
    /// name belongs to another member, and `NotFound` for an unknown id.
    async fn update_member(&self, id: MemberId, input: &MemberInput) -> Result<(), RegisterError> {
        let input = input.normalized()?;

        let result = sqlx::query(
            r#"
            UPDATE membre
            SET nom = ?, prenom = ?, numero = ?, "dateDeNaissance" = ?
            WHERE id = ?
              AND NOT EXISTS (
                SELECT 1 FROM membre
                WHERE LOWER(nom) = LOWER(?) AND LOWER(prenom) = LOWER(?) AND id != ?
              )
            "#,
        )
        .bind(&input.nom)
        .bind(&input.prenom)
        .bind(&input.numero)
        .bind(&input.date_de_naissance)
        .bind(id)
        .bind(&input.nom)
        .bind(&input.prenom)
        .bind(id)
        .execute(&self.pool)
        .await
        .inspect_err(|e| warn!(member_id = id, error = %e, "Failed to update member"))?;

        if result.rows_affected() == 0 {
            return match find_member(&self.pool, &input.nom, &input.prenom).await? {
                Some(existing) if existing.id != id => Err(duplicate_of(Some(existing), input)),
                _ => Err(RegisterError::NotFound {
                    entity: "member",
                    id,
                }),
            };
        }

        info!(member_id = id, "Member updated");
        Ok(())
    }

    async fn delete_member(&self, id: MemberId) -> Result<(), RegisterError> {
        let mut tx = self.pool.begin().await?;

        // Explicit delete rather than relying on the cascade, to know how
        // many attendance ids were freed.
        let attendance_removed = sqlx::query("DELETE FROM presence WHERE member = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let members_removed = sqlx::query("DELETE FROM membre WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if members_removed == 0 {
            return Err(RegisterError::NotFound {
                entity: "member",
                id,
            });
        }

        tx.commit().await?;
        info!(member_id = id, attendance_removed, "Member deleted");

        self.sequences
            .apply(&self.pool, SequenceTable::Membre, members_removed)
            .await;
        self.sequences
            .apply(&self.pool, SequenceTable::Presence, attendance_removed)
            .await;

        Ok(())
    }

    async fn find_by_name_and_surname(
        &self,
        nom: &str,
        prenom: &str,
    ) -> Result<Option<Member>, RegisterError> {
        find_member(&self.pool, nom.trim(), prenom.trim()).await
    }
}

/// Case-insensitive exact lookup on `(nom, prenom)`.
async fn find_member<'e, E>(
    executor: E,
    nom: &str,
    prenom: &str,
) -> Result<Option<Member>, RegisterError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row: Option<MemberRow> = sqlx::query_as(
        r#"
        SELECT id, nom, prenom, numero, "dateDeNaissance" AS date_de_naissance
        FROM membre
        WHERE LOWER(nom) = LOWER(?) AND LOWER(prenom) = LOWER(?)
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(nom)
    .bind(prenom)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Member::from))
}

/// `DuplicateMember` naming the stored member, or the submitted name when
/// the conflicting row is already gone.
fn duplicate_of(existing: Option<Member>, input: MemberInput) -> RegisterError {
    match existing {
        Some(m) => RegisterError::DuplicateMember {
            nom: m.nom,
            prenom: m.prenom,
        },
        None => RegisterError::DuplicateMember {
            nom: input.nom,
            prenom: input.prenom,
        },
    }
}
