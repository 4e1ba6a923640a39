//! Legacy line-item table (`detalles_venta`).
//!
//! It duplicates `detalle_ventas` and has never been reconciled with it. The
//! table is modelled so it exists in the schema and inspection can report on
//! it. Nothing in the crate writes to it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "detalles_venta")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub venta_id: String,
    pub producto_id: Option<String>,
    pub cantidad: f64,
    pub precio_unitario: f64,
    pub subtotal: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
