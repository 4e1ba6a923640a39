//! Cliente entity - Customers of a business.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Client database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clientes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub negocio_id: String,
    pub nombre: String,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
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
    #[sea_orm(has_many = "super::venta::Entity")]
    Ventas,
}

impl Related<super::negocio::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Negocio.def()
    }
}

impl Related<super::venta::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ventas.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
