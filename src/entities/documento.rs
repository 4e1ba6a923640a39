//! Documento entity - Backing table of the document store.
//!
//! Each row is one document: the collection it belongs to, its generated
//! identifier, and its fields as a JSON object. Timestamps live inside the
//! fields, the way the document store stamps them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Document database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documentos")]
pub struct Model {
    /// Collection name (e.g. `"ventas"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub coleccion: String,
    /// Document identifier, unique within its collection
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Document fields as a JSON object
    #[sea_orm(column_type = "Json")]
    pub datos: Json,
}

/// Documents have no relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
