//! Request-scoped engagement lifecycle and billing engine.
//!
//! Every function takes the actor id it is acting for and scopes all reads
//! and writes to rows that actor owns. Rows owned by someone else are
//! reported exactly like missing rows. Each mutation runs inside one
//! transaction that locks the row it changes, so a failure partway through
//! leaves the store untouched.
//!
//! - [`engagements`] -- create, edit, transition and delete engagements.
//! - [`invoices`] -- generate, create, update and delete invoices.
//! - [`todos`] -- attach tasks to engagements and rank them.
//! - [`stats`] -- single-query dashboards.

pub mod engagements;
pub mod invoices;
pub mod stats;
pub mod todos;

use influberry_core::error::CoreError;
use influberry_core::types::DbId;

use crate::error::AppError;

pub(crate) fn not_found(entity: &'static str, id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity, id })
}

/// `true` if `err` is a unique violation (SQLSTATE 23505) on `constraint`.
pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505") && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

/// `true` if `err` is a primary-key or unique violation of any kind.
pub(crate) fn is_any_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}
