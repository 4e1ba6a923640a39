//! Shared test utilities for Zarzify.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test documents and rows with sensible defaults.

use crate::{
    core::{
        documents::{DocumentStore, Fields, StoredDocument},
        resources,
    },
    entities::{negocio, usuario, venta},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::Value;

/// Converts a `json!` object literal into document fields.
/// Anything other than an object yields empty fields.
#[must_use]
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

/// Creates an in-memory `SQLite` document store with its table initialized.
pub async fn setup_document_store() -> Result<DocumentStore> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_document_tables(&db).await?;
    Ok(DocumentStore::new(db))
}

/// Creates an in-memory `SQLite` relational store with every table initialized.
pub async fn setup_relational_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_relational_tables(&db).await?;
    Ok(db)
}

/// Creates a category through the resource operations.
///
/// # Defaults
/// * `descripcion`: `""`
pub async fn create_test_category(
    store: &DocumentStore,
    nombre: &str,
    negocio_id: &str,
) -> Result<StoredDocument> {
    let mut body = Fields::new();
    body.insert("nombre".to_string(), Value::from(nombre));
    body.insert("negocioId".to_string(), Value::from(negocio_id));
    resources::create(store, &resources::CATEGORIAS, body, None).await
}

/// Inserts a user row with sensible defaults.
///
/// # Defaults
/// * `email`: `"<id>@example.com"`
/// * `rol`: `"usuario"`
pub async fn insert_test_usuario(
    db: &DatabaseConnection,
    id: &str,
    nombre: &str,
) -> Result<usuario::Model> {
    let now = Utc::now();
    usuario::ActiveModel {
        id: Set(id.to_string()),
        nombre: Set(nombre.to_string()),
        email: Set(format!("{id}@example.com")),
        rol: Set("usuario".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts a business row owned by `usuario_id`, with empty contact fields.
pub async fn insert_test_negocio(
    db: &DatabaseConnection,
    id: &str,
    usuario_id: &str,
    nombre: &str,
) -> Result<negocio::Model> {
    let now = Utc::now();
    negocio::ActiveModel {
        id: Set(id.to_string()),
        usuario_id: Set(usuario_id.to_string()),
        nombre: Set(nombre.to_string()),
        descripcion: Set(String::new()),
        direccion: Set(String::new()),
        telefono: Set(String::new()),
        email: Set(String::new()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts a sale row for `negocio_id` with no client.
///
/// # Defaults
/// * `estado`: `"completada"`
/// * `metodo_pago`: `"efectivo"`
pub async fn insert_test_venta(
    db: &DatabaseConnection,
    id: &str,
    negocio_id: &str,
    total: f64,
) -> Result<venta::Model> {
    let now = Utc::now();
    venta::ActiveModel {
        id: Set(id.to_string()),
        negocio_id: Set(negocio_id.to_string()),
        cliente_id: Set(None),
        total: Set(total),
        fecha: Set(now),
        estado: Set("completada".to_string()),
        metodo_pago: Set("efectivo".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}
