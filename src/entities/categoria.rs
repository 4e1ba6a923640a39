//! Categoria entity - Product categories, scoped to a business.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categorias")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Business this category belongs to
    pub negocio_id: String,
    pub nombre: String,
    pub descripcion: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::negocio::Entity",
        from = "Column::NegocioId",
        to = "super::negocio::Column::Id"
    )]
    Negocio,
    #[sea_orm(has_many = "super::producto::Entity")]
    Productos,
}

impl Related<super::negocio::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Negocio.def()
    }
}

impl Related<super::producto::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Productos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
