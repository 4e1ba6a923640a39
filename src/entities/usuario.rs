//! Usuario entity - Application users in the relational schema.
//!
//! A user owns zero or more businesses.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usuarios")]
pub struct Model {
    /// Identifier carried over from the document store
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name
    pub nombre: String,
    /// Login email
    pub email: String,
    /// Role (e.g. `"usuario"`, `"admin"`)
    pub rol: String,
    /// When the user was created
    pub created_at: DateTimeUtc,
    /// When the user was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Usuario and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user owns many businesses
    #[sea_orm(has_many = "super::negocio::Entity")]
    Negocios,
}

impl Related<super::negocio::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Negocios.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
