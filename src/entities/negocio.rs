//! Negocio entity - A business, the tenant unit that owns all operational data.
//!
//! Each business is owned by exactly one user and owns categories, products,
//! clients, sales and expenses.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Business database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "negocios")]
pub struct Model {
    /// Identifier carried over from the document store
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning user
    pub usuario_id: String,
    /// Business name
    pub nombre: String,
    pub descripcion: String,
    pub direccion: String,
    pub telefono: String,
    pub email: String,
    /// When the business was created
    pub created_at: DateTimeUtc,
    /// When the business was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Negocio and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each business belongs to one user
    #[sea_orm(
        belongs_to = "super::usuario::Entity",
        from = "Column::UsuarioId",
        to = "super::usuario::Column::Id"
    )]
    Usuario,
    #[sea_orm(has_many = "super::categoria::Entity")]
    Categorias,
    #[sea_orm(has_many = "super::producto::Entity")]
    Productos,
    #[sea_orm(has_many = "super::cliente::Entity")]
    Clientes,
    #[sea_orm(has_many = "super::venta::Entity")]
    Ventas,
    #[sea_orm(has_many = "super::egreso::Entity")]
    Egresos,
}

impl Related<super::usuario::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Usuario.def()
    }
}

impl Related<super::categoria::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categorias.def()
    }
}

impl Related<super::producto::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Productos.def()
    }
}

impl Related<super::cliente::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clientes.def()
    }
}

impl Related<super::venta::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ventas.def()
    }
}

impl Related<super::egreso::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Egresos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
