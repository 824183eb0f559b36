use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The entity does not exist or belongs to another actor. Both cases
    /// produce the same error so ownership is never leaked.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Lookup by a natural key such as an invoice number.
    #[error("Entity not found: {entity} '{key}'")]
    NotFoundByKey { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invoice {existing_invoice_id} already exists for engagement {engagement_id}")]
    DuplicateInvoice {
        engagement_id: DbId,
        existing_invoice_id: DbId,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_invoice_message_names_both_ids() {
        let err = CoreError::DuplicateInvoice {
            engagement_id: 7,
            existing_invoice_id: 42,
        };
        assert_eq!(
            err.to_string(),
            "Invoice 42 already exists for engagement 7"
        );
    }

    #[test]
    fn not_found_message() {
        let err = CoreError::NotFound {
            entity: "Invoice",
            id: 3,
        };
        assert_eq!(err.to_string(), "Entity not found: Invoice with id 3");
    }
}
