//! Egreso entity - Expenses recorded by a business.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "egresos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub negocio_id: String,
    pub descripcion: String,
    /// Amount spent
    pub monto: f64,
    pub fecha: DateTimeUtc,
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
}

impl Related<super::negocio::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Negocio.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
