//! Shared encode/decode helpers for SQLite ↔ domain type conversions.
//!
//! These functions bridge the gap between domain values and the integer
//! and nullable text columns of the schema, and classify constraint
//! failures so repositories can report them as domain errors.

use crate::domain::{MISSING_PHONE, UNKNOWN_NAME};

// ── presence flag ──────────────────────────────────────────────────────

/// Encode the present/absent flag for the `presence.presence` column.
pub fn encode_presence(present: bool) -> i64 {
    if present {
        1
    } else {
        0
    }
}

/// Decode the `presence.presence` column. Anything but 1 reads as absent.
pub fn decode_presence(value: i64) -> bool {
    value == 1
}

// ── joined member columns ─────────────────────────────────────────────

/// `"{nom} {prenom}"` for a joined member row, `"Inconnu"` when both are
/// missing or blank.
pub fn display_name(nom: Option<&str>, prenom: Option<&str>) -> String {
    let full = format!("{} {}", nom.unwrap_or(""), prenom.unwrap_or(""));
    let full = full.trim();
    if full.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        full.to_string()
    }
}

/// Phone number for display, `"N/A"` when missing or blank.
pub fn display_phone(numero: Option<String>) -> String {
    numero
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| MISSING_PHONE.to_string())
}

/// Treat an empty stored `pkabsence` the same as NULL.
pub fn decode_reason(reason: Option<String>) -> Option<String> {
    reason.filter(|r| !r.trim().is_empty())
}

// ── constraint classification ──────────────────────────────────────────

/// True when SQLite rejected the statement because of a UNIQUE constraint.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// True when SQLite rejected the statement because of a FOREIGN KEY
/// constraint.
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_foreign_key_violation(),
        _ => false,
    }
}
