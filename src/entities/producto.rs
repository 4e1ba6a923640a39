//! Producto entity - Products sold by a business.
//!
//! A product belongs to a business and optionally to one of its categories.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "productos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Business this product belongs to
    pub negocio_id: String,
    /// Optional category, NULL when uncategorized
    pub categoria_id: Option<String>,
    pub nombre: String,
    /// Unit price
    pub precio: f64,
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
    #[sea_orm(
        belongs_to = "super::categoria::Entity",
        from = "Column::CategoriaId",
        to = "super::categoria::Column::Id"
    )]
    Categoria,
}

impl Related<super::negocio::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Negocio.def()
    }
}

impl Related<super::categoria::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categoria.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
