//! SQLite-backed admin credential lookup.
//!
//! Passwords are stored and compared as plaintext, as in the existing
//! databases this register opens. Moving to hashed passwords needs a
//! rewrite of every `admin` row and is tracked separately.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::domain::{Admin, DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};
use crate::persistence::traits::AdminRepository;
use crate::persistence::RegisterError;

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: i64,
    username: String,
    password: String,
}

impl From<AdminRow> for Admin {
    fn from(r: AdminRow) -> Self {
        Self {
            id: r.id,
            username: r.username,
            password: r.password,
        }
    }
}

/// SQLite implementation of [`AdminRepository`].
pub struct SqliteAdminRepository {
    pool: SqlitePool,
}

impl SqliteAdminRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AdminRepository for SqliteAdminRepository {
    async fn login(&self, username: &str, password: &str) -> Result<Option<Admin>, RegisterError> {
        let row: Option<AdminRow> = sqlx::query_as(
            "SELECT id, username, password FROM admin WHERE username = ? AND password = ?",
        )
        .bind(username.trim())
        .bind(password)
        .fetch_optional(&self.pool)
        .await?;

        debug!(matched = row.is_some(), "Admin credential check");
        Ok(row.map(Admin::from))
    }

    async fn admin_exists(&self, username: &str) -> Result<bool, RegisterError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM admin WHERE username = ?")
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

/// Insert the default admin when the `admin` table is empty.
///
/// A single conditional INSERT, so concurrent or repeated opens can never
/// add a second default row. Returns whether a row was inserted.
pub(crate) async fn seed_default_admin(pool: &SqlitePool) -> Result<bool, RegisterError> {
    let result = sqlx::query(
        r#"
        INSERT INTO admin (username, password)
        SELECT ?, ?
        WHERE NOT EXISTS (SELECT 1 FROM admin)
        "#,
    )
    .bind(DEFAULT_ADMIN_USERNAME)
    .bind(DEFAULT_ADMIN_PASSWORD)
    .execute(pool)
    .await?;

    let seeded = result.rows_affected() > 0;
    if seeded {
        info!(username = DEFAULT_ADMIN_USERNAME, "Default admin account created");
    }
    Ok(seeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sqlite::Database;

    async fn test_db() -> (Database, SqliteAdminRepository) {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqliteAdminRepository::new(db.pool().clone());
        (db, repo)
    }

    #[tokio::test]
    async fn test_default_admin_can_log_in() {
        let (_db, repo) = test_db().await;
        let admin = repo
            .login(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.username, "Culte");
    }

    #[tokio::test]
    async fn test_username_is_trimmed_password_is_not() {
        let (_db, repo) = test_db().await;
        assert!(repo
            .login("  Culte ", DEFAULT_ADMIN_PASSWORD)
            .await
            .unwrap()
            .is_some());
        assert!(repo
            .login("Culte", " Culte@Pr0t3ction")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user() {
        let (_db, repo) = test_db().await;
        assert!(repo.login("Culte", "culte@pr0t3ction").await.unwrap().is_none());
        assert!(repo.login("culte", DEFAULT_ADMIN_PASSWORD).await.unwrap().is_none());
        assert!(repo.login("root", "root").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_admin_exists() {
        let (_db, repo) = test_db().await;
        assert!(repo.admin_exists("Culte").await.unwrap());
        assert!(repo.admin_exists(" Culte ").await.unwrap());
        assert!(!repo.admin_exists("someone").await.unwrap());
    }

    #[tokio::test]
    async fn test_seed_runs_once() {
        let (db, _repo) = test_db().await;
        // Already seeded by Database::new_in_memory
        assert!(!seed_default_admin(db.pool()).await.unwrap());

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admin")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_seed_skipped_when_other_admin_exists() {
        let (db, _repo) = test_db().await;
        sqlx::query("DELETE FROM admin").execute(db.pool()).await.unwrap();
        sqlx::query("INSERT INTO admin (username, password) VALUES ('pasteur', 'secret')")
            .execute(db.pool())
            .await
            .unwrap();

        assert!(!seed_default_admin(db.pool()).await.unwrap());
        let repo = SqliteAdminRepository::new(db.pool().clone());
        assert!(!repo.admin_exists(DEFAULT_ADMIN_USERNAME).await.unwrap());
    }
}
