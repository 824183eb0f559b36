//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Reads that
//! never run inside a transaction take `&PgPool`; everything the engine calls
//! mid-transaction accepts any `PgExecutor`, so callers pass either the pool
//! or `&mut *tx`.

pub mod engagement_repo;
pub mod invoice_repo;
pub mod invoice_sequence_repo;
pub mod task_repo;
pub mod user_repo;

pub use engagement_repo::EngagementRepo;
pub use invoice_repo::InvoiceRepo;
pub use invoice_sequence_repo::InvoiceSequenceRepo;
pub use task_repo::TaskRepo;
pub use user_repo::UserRepo;
