//! Post-delete bookkeeping for `AUTOINCREMENT` counters.
//!
//! SQLite never reuses an id recorded in `sqlite_sequence`. Decrementing the
//! counter after a delete lets the next insert take the freed id when the
//! deleted row was the highest one. SQLite still picks
//! `max(seq, max(rowid)) + 1`, so lowering the counter can never produce a
//! colliding id.
//!
//! This step is cosmetic. It runs after the delete has committed and a
//! failure is logged, never returned.

use sqlx::SqlitePool;
use tracing::{debug, warn};

/// Tables whose id counter can be reclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceTable {
    Membre,
    Presence,
}

impl SequenceTable {
    pub fn name(self) -> &'static str {
        match self {
            SequenceTable::Membre => "membre",
            SequenceTable::Presence => "presence",
        }
    }
}

/// Whether repositories decrement id counters after deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequencePolicy {
    #[default]
    Reclaim,
    Keep,
}

impl SequencePolicy {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            SequencePolicy::Reclaim
        } else {
            SequencePolicy::Keep
        }
    }

    /// Reclaim `units` ids from `table` when the policy allows it.
    pub async fn apply(self, pool: &SqlitePool, table: SequenceTable, units: u64) {
        if self == SequencePolicy::Reclaim {
            reclaim(pool, table, units).await;
        }
    }
}

/// Decrement the `sqlite_sequence` counter of `table` by `units`, never
/// below zero.
pub async fn reclaim(pool: &SqlitePool, table: SequenceTable, units: u64) {
    if units == 0 {
        return;
    }
    let units = i64::try_from(units).unwrap_or(i64::MAX);

    let result = sqlx::query("UPDATE sqlite_sequence SET seq = MAX(seq - ?, 0) WHERE name = ?")
        .bind(units)
        .bind(table.name())
        .execute(pool)
        .await;

    match result {
        Ok(_) => debug!(table = table.name(), units, "Reclaimed sequence ids"),
        Err(e) => warn!(
            table = table.name(),
            units,
            error = %e,
            "Could not reclaim sequence ids"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sqlite::Database;

    async fn seq(pool: &SqlitePool, table: SequenceTable) -> i64 {
        let row: (i64,) = sqlx::query_as("SELECT seq FROM sqlite_sequence WHERE name = ?")
            .bind(table.name())
            .fetch_one(pool)
            .await
            .unwrap();
        row.0
    }

    async fn insert_member(pool: &SqlitePool, nom: &str) -> i64 {
        sqlx::query("INSERT INTO membre (nom, prenom, \"dateDeNaissance\") VALUES (?, 'X', '')")
            .bind(nom)
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_reclaim_decrements() {
        let db = Database::new_in_memory().await.unwrap();
        let pool = db.pool();
        insert_member(pool, "A").await;
        let last = insert_member(pool, "B").await;
        assert_eq!(seq(pool, SequenceTable::Membre).await, 2);

        sqlx::query("DELETE FROM membre WHERE id = ?")
            .bind(last)
            .execute(pool)
            .await
            .unwrap();
        reclaim(pool, SequenceTable::Membre, 1).await;
        assert_eq!(seq(pool, SequenceTable::Membre).await, 1);

        // The freed id is handed out again
        assert_eq!(insert_member(pool, "C").await, last);
    }

    #[tokio::test]
    async fn test_reclaim_never_goes_negative() {
        let db = Database::new_in_memory().await.unwrap();
        let pool = db.pool();
        insert_member(pool, "A").await;
        reclaim(pool, SequenceTable::Membre, 10).await;
        assert_eq!(seq(pool, SequenceTable::Membre).await, 0);
    }

    #[tokio::test]
    async fn test_lowered_counter_does_not_collide() {
        let db = Database::new_in_memory().await.unwrap();
        let pool = db.pool();
        let first = insert_member(pool, "A").await;
        let second = insert_member(pool, "B").await;

        sqlx::query("DELETE FROM membre WHERE id = ?")
            .bind(first)
            .execute(pool)
            .await
            .unwrap();
        reclaim(pool, SequenceTable::Membre, 1).await;

        let third = insert_member(pool, "C").await;
        assert!(third > second);
    }

    #[tokio::test]
    async fn test_keep_policy_leaves_counter() {
        let db = Database::new_in_memory().await.unwrap();
        let pool = db.pool();
        insert_member(pool, "A").await;
        SequencePolicy::Keep
            .apply(pool, SequenceTable::Membre, 1)
            .await;
        assert_eq!(seq(pool, SequenceTable::Membre).await, 1);
    }

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        let db = Database::new_in_memory().await.unwrap();
        db.close().await;
        // Must return normally even though the pool is gone
        reclaim(db.pool(), SequenceTable::Presence, 1).await;
    }

    #[test]
    fn test_policy_from_flag() {
        assert_eq!(SequencePolicy::from_enabled(true), SequencePolicy::Reclaim);
        assert_eq!(SequencePolicy::from_enabled(false), SequencePolicy::Keep);
        assert_eq!(SequencePolicy::default(), SequencePolicy::Reclaim);
    }
}
