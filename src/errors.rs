//! Unified error type for Zarzify.
//!
//! Every fallible operation in the crate returns [`Result`]. The API layer maps
//! variants onto HTTP status codes in `api::response`.

use thiserror::Error;

/// Every error the crate can return.
#[derive(Debug, Error)]
pub enum Error {
    /// Settings file or environment override could not be used
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Any SeaORM failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// JSON encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Socket or file failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Create request without one or more required fields
    #[error("Missing required fields: {}", fields.join(", "))]
    MissingFields { fields: Vec<String> },

    /// Update or delete request without an `id`
    #[error("Missing document id")]
    MissingId,

    /// Body that is not a JSON object
    #[error("Invalid request body: {message}")]
    InvalidBody { message: String },

    /// No such document, or one outside the caller's scope
    #[error("Document {id} not found in {collection}")]
    NotFound { collection: String, id: String },

    /// Request names a parent other than the scope it runs under
    #[error("Request is scoped to {field} {scope}, not {requested}")]
    TenantMismatch {
        field: String,
        scope: String,
        requested: String,
    },

    /// Table outside the inspection whitelist
    #[error("Unknown table: {name}")]
    UnknownTable { name: String },

    /// Backend the schema report cannot describe
    #[error("Unsupported database backend: {backend}")]
    UnsupportedBackend { backend: String },
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
