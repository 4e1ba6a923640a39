//! Detalle de venta entity - Line items of a sale (`detalle_ventas`).
//!
//! This is the line-item table the migration writes. `producto_id` carries no
//! foreign key because synthesized sample items reference products that do not exist.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Line item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "detalle_ventas")]
pub struct Model {
    /// `<venta_id>-<position>`
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub venta_id: String,
    /// Position of the item within the sale, starting at 1
    pub posicion: i32,
    pub producto_id: Option<String>,
    pub nombre: String,
    pub cantidad: f64,
    pub precio_unitario: f64,
    pub subtotal: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::venta::Entity",
        from = "Column::VentaId",
        to = "super::venta::Column::Id",
        on_delete = "Cascade"
    )]
    Venta,
}

impl Related<super::venta::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Venta.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
