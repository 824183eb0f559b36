//! Domain logic for sponsor engagements, invoices and todos.
//!
//! Nothing in this crate touches the database. Repositories and the HTTP
//! layer pass plain values in and get typed results or [`error::CoreError`]
//! back.

pub mod clock;
pub mod engagement;
pub mod error;
pub mod invoice;
pub mod money;
pub mod pagination;
pub mod stats;
pub mod task;
pub mod types;
