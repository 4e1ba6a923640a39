//! Entity module - Contains all SeaORM entity definitions for the database.
//! `documento` backs the document store; the rest form the relational schema.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod categoria;
pub mod cliente;
pub mod detalle_venta;
pub mod detalles_venta;
pub mod documento;
pub mod egreso;
pub mod negocio;
pub mod producto;
pub mod usuario;
pub mod venta;

// Re-export specific types to avoid conflicts
pub use categoria::{Entity as Categoria, Model as CategoriaModel};
pub use cliente::{Entity as Cliente, Model as ClienteModel};
pub use detalle_venta::{Entity as DetalleVenta, Model as DetalleVentaModel};
pub use detalles_venta::{Entity as DetallesVentaLegacy, Model as DetallesVentaLegacyModel};
pub use documento::{Column as DocumentoColumn, Entity as Documento, Model as DocumentoModel};
pub use egreso::{Entity as Egreso, Model as EgresoModel};
pub use negocio::{Entity as Negocio, Model as NegocioModel};
pub use producto::{Entity as Producto, Model as ProductoModel};
pub use usuario::{Entity as Usuario, Model as UsuarioModel};
pub use venta::{Entity as Venta, Model as VentaModel};
