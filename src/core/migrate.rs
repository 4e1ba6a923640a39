//! Document store → relational store migration.
//!
//! Copies every collection into its table in dependency order, upserting by
//! id, so the command can be re-run as the document store keeps changing.
//! Sale line items are flattened into `detalle_ventas`, which is replaced for
//! each migrated sale and cleared for a skipped one. Documents whose parent is
//! missing are skipped and counted. Dangling optional references are written
//! as NULL.

use crate::{
    core::{
        backfill::LINE_ITEMS_FIELD,
        documents::{CREATED_AT, DocumentStore, StoredDocument, UPDATED_AT},
        values::{coerce_amount, coerce_timestamp, non_blank},
    },
    entities::{
        Categoria, Cliente, DetalleVenta, Egreso, Negocio, Producto, Usuario, Venta, categoria,
        cliente, detalle_venta, egreso, negocio, producto, usuario, venta,
    },
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

/// Per-collection outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionReport {
    /// Rows written
    pub migrated: usize,
    /// Documents left out
    pub skipped: usize,
}

/// Outcome of a migration run, keyed by collection name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Counts per collection name
    pub collections: BTreeMap<String, CollectionReport>,
    /// Rows written to `detalle_ventas`
    pub line_items: usize,
}

impl MigrationReport {
    /// Report for one collection (zeroes if it was never visited).
    #[must_use]
    pub fn collection(&self, name: &str) -> CollectionReport {
        self.collections.get(name).copied().unwrap_or_default()
    }

    fn record(&mut self, collection: &str, migrated: bool) {
        let entry = self.collections.entry(collection.to_string()).or_default();
        if migrated {
            entry.migrated += 1;
        } else {
            entry.skipped += 1;
        }
    }
}

/// Ids migrated so far, per collection, for parent checks.
#[derive(Default)]
struct Migrated {
    usuarios: HashSet<String>,
    negocios: HashSet<String>,
    categorias: HashSet<String>,
    clientes: HashSet<String>,
}

struct Stamps {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn stamps(doc: &StoredDocument) -> Stamps {
    let created_at = coerce_timestamp(doc.fields.get(CREATED_AT)).unwrap_or_else(Utc::now);
    let updated_at = coerce_timestamp(doc.fields.get(UPDATED_AT)).unwrap_or(created_at);
    Stamps {
        created_at,
        updated_at,
    }
}

fn text_or_empty(doc: &StoredDocument, field: &str) -> String {
    non_blank(doc.fields.get(field)).unwrap_or_default()
}

/// Parent id of a document if present and already migrated.
fn parent<'a>(doc: &StoredDocument, field: &str, known: &'a HashSet<String>) -> Option<&'a String> {
    non_blank(doc.fields.get(field)).and_then(|id| known.get(&id))
}

/// Inserts a row or overwrites the existing row with the same primary key.
async fn upsert<A>(db: &DatabaseConnection, model: A, exists: bool) -> Result<()>
where
    A: ActiveModelTrait + sea_orm::ActiveModelBehavior + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    if exists {
        model.update(db).await?;
    } else {
        model.insert(db).await?;
    }
    Ok(())
}

fn skip(report: &mut MigrationReport, collection: &str, doc: &StoredDocument, reason: &str) {
    warn!("Skipping {} {}: {}", collection, doc.id, reason);
    report.record(collection, false);
}

async fn migrate_usuarios(
    store: &DocumentStore,
    db: &DatabaseConnection,
    migrated: &mut Migrated,
    report: &mut MigrationReport,
) -> Result<()> {
    for doc in store.scan("usuarios").await? {
        let Some(email) = non_blank(doc.fields.get("email")) else {
            skip(report, "usuarios", &doc, "no email");
            continue;
        };
        let stamps = stamps(&doc);
        let exists = Usuario::find_by_id(doc.id.clone()).one(db).await?.is_some();
        let model = usuario::ActiveModel {
            id: Set(doc.id.clone()),
            nombre: Set(text_or_empty(&doc, "nombre")),
            email: Set(email),
            rol: Set(non_blank(doc.fields.get("rol")).unwrap_or_else(|| "usuario".to_string())),
            created_at: Set(stamps.created_at),
            updated_at: Set(stamps.updated_at),
        };
        upsert(db, model, exists).await?;
        migrated.usuarios.insert(doc.id);
        report.record("usuarios", true);
    }
    Ok(())
}

async fn migrate_negocios(
    store: &DocumentStore,
    db: &DatabaseConnection,
    migrated: &mut Migrated,
    report: &mut MigrationReport,
) -> Result<()> {
    for doc in store.scan("negocios").await? {
        let Some(usuario_id) = parent(&doc, "usuarioId", &migrated.usuarios).cloned() else {
            skip(report, "negocios", &doc, "owner not migrated");
            continue;
        };
        let stamps = stamps(&doc);
        let exists = Negocio::find_by_id(doc.id.clone()).one(db).await?.is_some();
        let model = negocio::ActiveModel {
            id: Set(doc.id.clone()),
            usuario_id: Set(usuario_id),
            nombre: Set(text_or_empty(&doc, "nombre")),
            descripcion: Set(text_or_empty(&doc, "descripcion")),
            direccion: Set(text_or_empty(&doc, "direccion")),
            telefono: Set(text_or_empty(&doc, "telefono")),
            email: Set(text_or_empty(&doc, "email")),
            created_at: Set(stamps.created_at),
            updated_at: Set(stamps.updated_at),
        };
        upsert(db, model, exists).await?;
        migrated.negocios.insert(doc.id);
        report.record("negocios", true);
    }
    Ok(())
}

async fn migrate_categorias(
    store: &DocumentStore,
    db: &DatabaseConnection,
    migrated: &mut Migrated,
    report: &mut MigrationReport,
) -> Result<()> {
    for doc in store.scan("categorias").await? {
        let Some(negocio_id) = parent(&doc, "negocioId", &migrated.negocios).cloned() else {
            skip(report, "categorias", &doc, "business not migrated");
            continue;
        };
        let stamps = stamps(&doc);
        let exists = Categoria::find_by_id(doc.id.clone()).one(db).await?.is_some();
        let model = categoria::ActiveModel {
            id: Set(doc.id.clone()),
            negocio_id: Set(negocio_id),
            nombre: Set(text_or_empty(&doc, "nombre")),
            descripcion: Set(text_or_empty(&doc, "descripcion")),
            created_at: Set(stamps.created_at),
            updated_at: Set(stamps.updated_at),
        };
        upsert(db, model, exists).await?;
        migrated.categorias.insert(doc.id);
        report.record("categorias", true);
    }
    Ok(())
}

async fn migrate_productos(
    store: &DocumentStore,
    db: &DatabaseConnection,
    migrated: &Migrated,
    report: &mut MigrationReport,
) -> Result<()> {
    for doc in store.scan("productos").await? {
        let Some(negocio_id) = parent(&doc, "negocioId", &migrated.negocios).cloned() else {
            skip(report, "productos", &doc, "business not migrated");
            continue;
        };
        let stamps = stamps(&doc);
        let exists = Producto::find_by_id(doc.id.clone()).one(db).await?.is_some();
        let model = producto::ActiveModel {
            id: Set(doc.id.clone()),
            negocio_id: Set(negocio_id),
            categoria_id: Set(parent(&doc, "categoriaId", &migrated.categorias).cloned()),
            nombre: Set(text_or_empty(&doc, "nombre")),
            precio: Set(coerce_amount(doc.fields.get("precio"))),
            created_at: Set(stamps.created_at),
            updated_at: Set(stamps.updated_at),
        };
        upsert(db, model, exists).await?;
        report.record("productos", true);
    }
    Ok(())
}

async fn migrate_clientes(
    store: &DocumentStore,
    db: &DatabaseConnection,
    migrated: &mut Migrated,
    report: &mut MigrationReport,
) -> Result<()> {
    for doc in store.scan("clientes").await? {
        let Some(negocio_id) = parent(&doc, "negocioId", &migrated.negocios).cloned() else {
            skip(report, "clientes", &doc, "business not migrated");
            continue;
        };
        let stamps = stamps(&doc);
        let exists = Cliente::find_by_id(doc.id.clone()).one(db).await?.is_some();
        let model = cliente::ActiveModel {
            id: Set(doc.id.clone()),
            negocio_id: Set(negocio_id),
            nombre: Set(text_or_empty(&doc, "nombre")),
            email: Set(non_blank(doc.fields.get("email"))),
            telefono: Set(non_blank(doc.fields.get("telefono"))),
            direccion: Set(non_blank(doc.fields.get("direccion"))),
            created_at: Set(stamps.created_at),
            updated_at: Set(stamps.updated_at),
        };
        upsert(db, model, exists).await?;
        migrated.clientes.insert(doc.id);
        report.record("clientes", true);
    }
    Ok(())
}

/// Builds the `detalle_ventas` rows of one sale. Non-object entries are dropped.
fn line_item_rows(venta_id: &str, items: Option<&Value>) -> Vec<detalle_venta::ActiveModel> {
    let Some(items) = items.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| item.is_object())
        .zip(1_i32..)
        .map(|(item, position)| {
            let cantidad = coerce_amount(item.get("cantidad"));
            let precio_unitario = coerce_amount(item.get("precioUnitario").or_else(|| item.get("precio")));
            let subtotal = match item.get("subtotal") {
                Some(value) => coerce_amount(Some(value)),
                None => cantidad * precio_unitario,
            };
            detalle_venta::ActiveModel {
                id: Set(format!("{venta_id}-{position}")),
                venta_id: Set(venta_id.to_string()),
                posicion: Set(position),
                producto_id: Set(non_blank(item.get("productoId"))),
                nombre: Set(non_blank(item.get("nombre")).unwrap_or_default()),
                cantidad: Set(cantidad),
                precio_unitario: Set(precio_unitario),
                subtotal: Set(subtotal),
            }
        })
        .collect()
}

/// Drops a sale's `detalle_ventas` rows. A skipped sale loses its items too,
/// while its `ventas` row from an earlier run stays in place.
async fn clear_line_items(db: &DatabaseConnection, venta_id: &str) -> Result<()> {
    DetalleVenta::delete_many()
        .filter(detalle_venta::Column::VentaId.eq(venta_id))
        .exec(db)
        .await?;
    Ok(())
}

async fn migrate_ventas(
    store: &DocumentStore,
    db: &DatabaseConnection,
    migrated: &Migrated,
    report: &mut MigrationReport,
) -> Result<()> {
    for doc in store.scan("ventas").await? {
        let Some(negocio_id) = parent(&doc, "negocioId", &migrated.negocios).cloned() else {
            clear_line_items(db, &doc.id).await?;
            skip(report, "ventas", &doc, "business not migrated");
            continue;
        };
        let stamps = stamps(&doc);
        let exists = Venta::find_by_id(doc.id.clone()).one(db).await?.is_some();
        let model = venta::ActiveModel {
            id: Set(doc.id.clone()),
            negocio_id: Set(negocio_id),
            cliente_id: Set(parent(&doc, "clienteId", &migrated.clientes).cloned()),
            total: Set(coerce_amount(doc.fields.get("total"))),
            fecha: Set(coerce_timestamp(doc.fields.get("fecha")).unwrap_or(stamps.created_at)),
            estado: Set(text_or_empty(&doc, "estado")),
            metodo_pago: Set(text_or_empty(&doc, "metodoPago")),
            created_at: Set(stamps.created_at),
            updated_at: Set(stamps.updated_at),
        };
        upsert(db, model, exists).await?;

        clear_line_items(db, &doc.id).await?;
        let rows = line_item_rows(&doc.id, doc.fields.get(LINE_ITEMS_FIELD));
        report.line_items += rows.len();
        for row in rows {
            row.insert(db).await?;
        }
        report.record("ventas", true);
    }
    Ok(())
}

async fn migrate_egresos(
    store: &DocumentStore,
    db: &DatabaseConnection,
    migrated: &Migrated,
    report: &mut MigrationReport,
) -> Result<()> {
    for doc in store.scan("egresos").await? {
        let Some(negocio_id) = parent(&doc, "negocioId", &migrated.negocios).cloned() else {
            skip(report, "egresos", &doc, "business not migrated");
            continue;
        };
        let stamps = stamps(&doc);
        let exists = Egreso::find_by_id(doc.id.clone()).one(db).await?.is_some();
        let model = egreso::ActiveModel {
            id: Set(doc.id.clone()),
            negocio_id: Set(negocio_id),
            descripcion: Set(text_or_empty(&doc, "descripcion")),
            monto: Set(coerce_amount(doc.fields.get("monto"))),
            fecha: Set(coerce_timestamp(doc.fields.get("fecha")).unwrap_or(stamps.created_at)),
            created_at: Set(stamps.created_at),
            updated_at: Set(stamps.updated_at),
        };
        upsert(db, model, exists).await?;
        report.record("egresos", true);
    }
    Ok(())
}

/// Copies every document collection into the relational store.
///
/// # Errors
/// Returns the first database error; rows written before it stay written.
pub async fn migrate_documents(
    store: &DocumentStore,
    db: &DatabaseConnection,
) -> Result<MigrationReport> {
    let mut migrated = Migrated::default();
    let mut report = MigrationReport::default();

    migrate_usuarios(store, db, &mut migrated, &mut report).await?;
    migrate_negocios(store, db, &mut migrated, &mut report).await?;
    migrate_categorias(store, db, &mut migrated, &mut report).await?;
    migrate_productos(store, db, &migrated, &mut report).await?;
    migrate_clientes(store, db, &mut migrated, &mut report).await?;
    migrate_ventas(store, db, &migrated, &mut report).await?;
    migrate_egresos(store, db, &migrated, &mut report).await?;

    info!("{}", format_migration_summary(&report));
    Ok(report)
}

/// Human-readable summary of a migration run.
#[must_use]
pub fn format_migration_summary(report: &MigrationReport) -> String {
    let mut parts: Vec<String> = report
        .collections
        .iter()
        .map(|(name, counts)| {
            format!("{name}: {} migrated, {} skipped", counts.migrated, counts.skipped)
        })
        .collect();
    parts.push(format!("detalle_ventas: {} rows", report.line_items));
    format!("Migration: {}", parts.join("; "))
}
