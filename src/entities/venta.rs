//! Venta entity - Sales recorded by a business.
//!
//! Each sale has a total, a timestamp (`fecha`), a status and a payment method.
//! Its line items are stored in `detalle_ventas`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ventas")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Business that made the sale
    pub negocio_id: String,
    /// Client, NULL for walk-in sales
    pub cliente_id: Option<String>,
    /// Sale total
    pub total: f64,
    /// When the sale happened
    pub fecha: DateTimeUtc,
    /// Status (e.g. `"completada"`)
    pub estado: String,
    /// Payment method (e.g. `"efectivo"`)
    pub metodo_pago: String,
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
        belongs_to = "super::cliente::Entity",
        from = "Column::ClienteId",
        to = "super::cliente::Column::Id"
    )]
    Cliente,
    /// One sale has many line items
    #[sea_orm(has_many = "super::detalle_venta::Entity")]
    Detalles,
}

impl Related<super::negocio::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Negocio.def()
    }
}

impl Related<super::cliente::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cliente.def()
    }
}

impl Related<super::detalle_venta::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Detalles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
