//! Core module - framework-agnostic document, resource and maintenance operations.
//! The HTTP layer and the CLI both call into these functions.

pub mod backfill;
pub mod documents;
pub mod inspect;
pub mod migrate;
pub mod resources;
pub mod values;

pub use documents::{DocumentStore, Fields, StoredDocument};
pub use resources::Resource;
