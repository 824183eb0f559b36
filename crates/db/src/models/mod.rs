//! Row models and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO carrying already-validated values for inserts
//! - An update DTO (all `Option` fields) for patches

pub mod engagement;
pub mod invoice;
pub mod stats;
pub mod task;
pub mod user;
