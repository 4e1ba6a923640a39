//! Read-only reporting over the relational store.
//!
//! Three reports: the schema (tables and their columns), record counts down
//! the ownership hierarchy (users → businesses → products, clients, sales,
//! expenses), and raw row dumps of a single table. Nothing here writes.

use crate::{
    entities::{
        Cliente, DetalleVenta, DetallesVentaLegacy, Egreso, Negocio, Producto, Usuario, Venta,
        cliente, egreso, negocio, producto, usuario, venta,
    },
    errors::{Error, Result},
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, FromQueryResult,
    JsonValue, PaginatorTrait, QueryFilter, QueryOrder, Statement,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Tables that `dump_rows` will read.
pub const KNOWN_TABLES: &[&str] = &[
    "usuarios",
    "negocios",
    "categorias",
    "productos",
    "clientes",
    "ventas",
    "detalle_ventas",
    "detalles_venta",
    "egresos",
];

/// Default number of rows in a dump.
pub const DEFAULT_ROW_LIMIT: u64 = 20;

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Type as the backend reports it
    pub data_type: String,
    /// Whether NULL is allowed
    pub nullable: bool,
}

/// A table and its columns in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    /// Table name
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnInfo>,
}

/// Record counts for one business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusinessCounts {
    pub id: String,
    pub nombre: String,
    /// Products
    pub productos: u64,
    /// Clients
    pub clientes: u64,
    /// Sales
    pub ventas: u64,
    /// Expenses
    pub egresos: u64,
}

/// A user and the counts of each business they own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserCounts {
    pub id: String,
    pub nombre: String,
    pub email: String,
    /// Businesses owned by the user
    pub negocios: Vec<BusinessCounts>,
}

/// Row counts of the two line-item tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineItemTables {
    /// Rows in `detalle_ventas`
    pub detalle_ventas: u64,
    /// Rows in the legacy `detalles_venta`
    pub detalles_venta: u64,
}

impl LineItemTables {
    /// Both tables hold rows, so neither can be trusted as the complete set.
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        self.detalle_ventas > 0 && self.detalles_venta > 0
    }
}

/// Full hierarchy report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountsReport {
    /// Users ordered by name
    pub usuarios: Vec<UserCounts>,
    /// Line-item table sizes
    pub line_items: LineItemTables,
}

/// Lists every table with its columns.
///
/// # Errors
/// Returns `Error::UnsupportedBackend` for backends other than `PostgreSQL` and `SQLite`.
pub async fn describe_schema(db: &DatabaseConnection) -> Result<Vec<TableSchema>> {
    match db.get_database_backend() {
        DbBackend::Postgres => describe_postgres(db).await,
        DbBackend::Sqlite => describe_sqlite(db).await,
        other => Err(Error::UnsupportedBackend {
            backend: format!("{other:?}"),
        }),
    }
}

async fn describe_postgres(db: &DatabaseConnection) -> Result<Vec<TableSchema>> {
    let rows = db
        .query_all(Statement::from_string(
            DbBackend::Postgres,
            "SELECT table_name::text AS table_name, column_name::text AS column_name, \
             data_type::text AS data_type, is_nullable::text AS is_nullable \
             FROM information_schema.columns \
             WHERE table_schema = 'public' \
             ORDER BY table_name, ordinal_position",
        ))
        .await?;

    let mut tables: BTreeMap<String, Vec<ColumnInfo>> = BTreeMap::new();
    for row in rows {
        let table: String = row.try_get("", "table_name")?;
        let nullable: String = row.try_get("", "is_nullable")?;
        tables.entry(table).or_default().push(ColumnInfo {
            name: row.try_get("", "column_name")?,
            data_type: row.try_get("", "data_type")?,
            nullable: nullable.eq_ignore_ascii_case("yes"),
        });
    }

    Ok(tables
        .into_iter()
        .map(|(name, columns)| TableSchema { name, columns })
        .collect())
}

async fn describe_sqlite(db: &DatabaseConnection) -> Result<Vec<TableSchema>> {
    let table_rows = db
        .query_all(Statement::from_string(
            DbBackend::Sqlite,
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        ))
        .await?;

    let mut tables = Vec::with_capacity(table_rows.len());
    for table_row in table_rows {
        let name: String = table_row.try_get("", "name")?;
        let column_rows = db
            .query_all(Statement::from_sql_and_values(
                DbBackend::Sqlite,
                "SELECT name, type AS data_type, \"notnull\" AS not_null \
                 FROM pragma_table_info(?) ORDER BY cid",
                [name.clone().into()],
            ))
            .await?;

        let mut columns = Vec::with_capacity(column_rows.len());
        for row in column_rows {
            let not_null: i64 = row.try_get("", "not_null")?;
            columns.push(ColumnInfo {
                name: row.try_get("", "name")?,
                data_type: row.try_get("", "data_type")?,
                nullable: not_null == 0,
            });
        }
        tables.push(TableSchema { name, columns });
    }
    Ok(tables)
}

/// Counts records down the ownership hierarchy.
pub async fn hierarchy_counts(db: &DatabaseConnection) -> Result<CountsReport> {
    let usuarios = Usuario::find()
        .order_by_asc(usuario::Column::Nombre)
        .all(db)
        .await?;

    let mut report = Vec::with_capacity(usuarios.len());
    for user in usuarios {
        let negocios = Negocio::find()
            .filter(negocio::Column::UsuarioId.eq(user.id.as_str()))
            .order_by_asc(negocio::Column::Nombre)
            .all(db)
            .await?;

        let mut businesses = Vec::with_capacity(negocios.len());
        for business in negocios {
            businesses.push(BusinessCounts {
                productos: Producto::find()
                    .filter(producto::Column::NegocioId.eq(business.id.as_str()))
                    .count(db)
                    .await?,
                clientes: Cliente::find()
                    .filter(cliente::Column::NegocioId.eq(business.id.as_str()))
                    .count(db)
                    .await?,
                ventas: Venta::find()
                    .filter(venta::Column::NegocioId.eq(business.id.as_str()))
                    .count(db)
                    .await?,
                egresos: Egreso::find()
                    .filter(egreso::Column::NegocioId.eq(business.id.as_str()))
                    .count(db)
                    .await?,
                id: business.id,
                nombre: business.nombre,
            });
        }

        report.push(UserCounts {
            id: user.id,
            nombre: user.nombre,
            email: user.email,
            negocios: businesses,
        });
    }

    Ok(CountsReport {
        usuarios: report,
        line_items: LineItemTables {
            detalle_ventas: DetalleVenta::find().count(db).await?,
            detalles_venta: DetallesVentaLegacy::find().count(db).await?,
        },
    })
}

/// Dumps up to `limit` raw rows of a known table as JSON objects.
///
/// # Errors
/// Returns `Error::UnknownTable` for tables outside [`KNOWN_TABLES`].
pub async fn dump_rows(db: &DatabaseConnection, table: &str, limit: u64) -> Result<Vec<JsonValue>> {
    let Some(table) = KNOWN_TABLES.iter().find(|known| **known == table) else {
        return Err(Error::UnknownTable {
            name: table.to_string(),
        });
    };

    let backend = db.get_database_backend();
    JsonValue::find_by_statement(Statement::from_string(
        backend,
        format!("SELECT * FROM {table} LIMIT {limit}"),
    ))
    .all(db)
    .await
    .map_err(Into::into)
}

/// Renders the schema report as indented text.
#[must_use]
pub fn format_schema(tables: &[TableSchema]) -> String {
    let mut lines = Vec::new();
    for table in tables {
        lines.push(format!("{} ({} columns)", table.name, table.columns.len()));
        for column in &table.columns {
            let null = if column.nullable { "NULL" } else { "NOT NULL" };
            lines.push(format!("  {} {} {}", column.name, column.data_type, null));
        }
    }
    lines.join("\n")
}

/// Renders the hierarchy report as an indented tree.
#[must_use]
pub fn format_counts(report: &CountsReport) -> String {
    let mut lines = Vec::new();
    for user in &report.usuarios {
        lines.push(format!(
            "{} <{}> [{}]: {} negocios",
            user.nombre,
            user.email,
            user.id,
            user.negocios.len()
        ));
        for business in &user.negocios {
            lines.push(format!(
                "  {} [{}]: {} productos, {} clientes, {} ventas, {} egresos",
                business.nombre,
                business.id,
                business.productos,
                business.clientes,
                business.ventas,
                business.egresos
            ));
        }
    }
    lines.push(format!(
        "detalle_ventas: {} rows, detalles_venta: {} rows",
        report.line_items.detalle_ventas, report.line_items.detalles_venta
    ));
    if report.line_items.is_ambiguous() {
        lines.push(
            "warning: both line-item tables hold rows; they have not been reconciled".to_string(),
        );
    }
    lines.join("\n")
}
