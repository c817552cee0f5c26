//! SQLite-backed repository implementations.
//!
//! ## Database setup
//!
//! [`Database`] wraps a `sqlx::SqlitePool` configured with:
//! - **WAL mode** — allows one writer and multiple concurrent readers.
//! - **Foreign keys enabled** — `presence.member` cascades on member delete.
//! - **Embedded migrations** — `sqlx::migrate!` runs `migrations/001_initial_schema.sql`
//!   automatically when [`Database::open`] is called. The schema is idempotent.
//! - **Default admin seed** — inserted once, only while the `admin` table is empty.
//!
//! The handle is opened once at startup, cloned into each repository, and
//! closed explicitly with [`Database::close`].
//!
//! ## Repository types
//!
//! | Type | Trait |
//! |------|-------|
//! | [`SqliteMemberRepository`] | `MemberRepository` |
//! | [`SqliteAttendanceRepository`] | `AttendanceRepository` |
//! | [`SqliteAdminRepository`] | `AdminRepository` |
//!
//! The `presence` boolean is stored as `INTEGER` 0/1 and round-tripped
//! through [`helpers`]. Uniqueness and foreign-key violations raised by
//! SQLite are translated into domain errors there as well.
//!
//! ## Sequence reclamation
//!
//! After deletes, [`sequence`] decrements `sqlite_sequence` so ids stay
//! dense. It runs after commit and only ever logs its failures.

mod admin_repo;
mod attendance_repo;
mod database;
mod member_repo;
pub mod sequence;
pub(crate) mod helpers;

pub use admin_repo::SqliteAdminRepository;
pub use attendance_repo::SqliteAttendanceRepository;
pub use database::Database;
pub use member_repo::SqliteMemberRepository;
pub use sequence::SequencePolicy;
