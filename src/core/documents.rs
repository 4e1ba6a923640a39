//! Document store client.
//!
//! A small collection/document store on top of SeaORM. Documents are JSON
//! objects grouped by collection and keyed by a generated identifier. The store
//! owns timestamping: `insert` stamps `createdAt` and `updatedAt`, and `update`
//! stamps `updatedAt`. Callers never set them.
//!
//! The client is constructed once by the process entry point and handed to
//! whatever needs it. It is cheap to clone.

use crate::{
    entities::{Documento, DocumentoColumn, documento},
    errors::{Error, Result},
};
use chrono::{SecondsFormat, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use tracing::debug;
use uuid::Uuid;

/// Field names the store manages itself.
pub const CREATED_AT: &str = "createdAt";
/// See [`CREATED_AT`].
pub const UPDATED_AT: &str = "updatedAt";

/// Length of generated document identifiers.
const ID_LENGTH: usize = 20;

/// A document's fields.
pub type Fields = Map<String, Value>;

/// A document read from or written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Identifier within the collection
    pub id: String,
    /// Stored fields, without `id`
    pub fields: Fields,
}

impl StoredDocument {
    /// JSON form returned to clients: the fields plus `id`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert("id".to_string(), Value::String(self.id.clone()));
        Value::Object(object)
    }

    /// String value of a field, if the field holds a string.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    fn from_model(model: documento::Model) -> Self {
        let fields = match model.datos {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: model.id,
            fields,
        }
    }
}

/// Equality filter on one field.
#[derive(Debug, Clone, Copy)]
pub struct FieldFilter<'a> {
    /// Field to compare
    pub field: &'a str,
    /// Required value
    pub value: &'a Value,
}

/// Generates a new document identifier.
#[must_use]
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()[..ID_LENGTH].to_string()
}

/// Current time as the store writes it.
#[must_use]
pub fn server_timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Handle to the document store.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    db: DatabaseConnection,
}

impl DocumentStore {
    /// Wraps an open connection whose `documentos` table already exists.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Every document of a collection in ascending id order.
    pub async fn scan(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let models = Documento::find()
            .filter(DocumentoColumn::Coleccion.eq(collection))
            .order_by_asc(DocumentoColumn::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(StoredDocument::from_model).collect())
    }

    /// Documents of a collection, optionally filtered on one field and ordered by another.
    ///
    /// Documents missing the order field sort after those that have it. Ties
    /// keep scan order.
    pub async fn list(
        &self,
        collection: &str,
        filter: Option<FieldFilter<'_>>,
        order_by: Option<&str>,
    ) -> Result<Vec<StoredDocument>> {
        let mut documents = self.scan(collection).await?;
        if let Some(filter) = filter {
            documents.retain(|doc| doc.fields.get(filter.field) == Some(filter.value));
        }
        if let Some(field) = order_by {
            documents.sort_by(|a, b| compare_field(a.fields.get(field), b.fields.get(field)));
        }
        debug!("Listed {} documents from '{}'", documents.len(), collection);
        Ok(documents)
    }

    /// A single document, or `None` if it does not exist in that collection.
    pub async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>> {
        let model = Documento::find_by_id((collection.to_string(), id.to_string()))
            .one(&self.db)
            .await?;
        Ok(model.map(StoredDocument::from_model))
    }

    /// Inserts a new document under a generated id.
    pub async fn insert(&self, collection: &str, fields: Fields) -> Result<StoredDocument> {
        self.insert_with_id(collection, &generate_id(), fields).await
    }

    /// Inserts a new document under a caller-chosen id.
    pub async fn insert_with_id(
        &self,
        collection: &str,
        id: &str,
        mut fields: Fields,
    ) -> Result<StoredDocument> {
        let now = server_timestamp();
        fields.insert(CREATED_AT.to_string(), now.clone());
        fields.insert(UPDATED_AT.to_string(), now);

        let model = documento::ActiveModel {
            id: Set(id.to_string()),
            coleccion: Set(collection.to_string()),
            datos: Set(Value::Object(fields)),
        };
        let inserted = model.insert(&self.db).await?;
        debug!("Inserted document {} into '{}'", id, collection);
        Ok(StoredDocument::from_model(inserted))
    }

    /// Merges `patch` into an existing document and stamps `updatedAt`.
    ///
    /// # Errors
    /// Returns `Error::NotFound` if the document does not exist.
    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Fields,
    ) -> Result<StoredDocument> {
        let existing = self
            .get(collection, id)
            .await?
            .ok_or_else(|| Error::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        let mut fields = existing.fields;
        for (key, value) in patch {
            fields.insert(key, value);
        }
        fields.insert(UPDATED_AT.to_string(), server_timestamp());

        let model = documento::ActiveModel {
            id: Set(id.to_string()),
            coleccion: Set(collection.to_string()),
            datos: Set(Value::Object(fields)),
        };
        let updated = model.update(&self.db).await?;
        debug!("Updated document {} in '{}'", id, collection);
        Ok(StoredDocument::from_model(updated))
    }

    /// Deletes a document unconditionally. Returns whether it existed.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let result = Documento::delete_many()
            .filter(DocumentoColumn::Id.eq(id))
            .filter(DocumentoColumn::Coleccion.eq(collection))
            .exec(&self.db)
            .await?;
        debug!("Deleted document {} from '{}'", id, collection);
        Ok(result.rows_affected > 0)
    }
}

fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare_values(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

// Mixed-type ordering: null < bool < number < string < array < object.
const fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_stamps_timestamps() -> Result<()> {
        let store = setup_document_store().await?;

        let doc = store
            .insert("categorias", fields(json!({"nombre": "Bebidas"})))
            .await?;

        assert_eq!(doc.id.len(), 20);
        assert_eq!(doc.text("nombre"), Some("Bebidas"));
        assert!(doc.text(CREATED_AT).is_some());
        assert_eq!(doc.text(CREATED_AT), doc.text(UPDATED_AT));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_is_scoped_to_collection() -> Result<()> {
        let store = setup_document_store().await?;
        let doc = store
            .insert("categorias", fields(json!({"nombre": "Bebidas"})))
            .await?;

        assert!(store.get("categorias", &doc.id).await?.is_some());
        assert!(store.get("negocios", &doc.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_same_id_in_two_collections() -> Result<()> {
        let store = setup_document_store().await?;
        store
            .insert_with_id("usuarios", "uid1", fields(json!({"nombre": "Ana"})))
            .await?;
        store
            .insert_with_id("negocios", "uid1", fields(json!({"nombre": "Panadería"})))
            .await?;

        store
            .update("usuarios", "uid1", fields(json!({"nombre": "Ana María"})))
            .await?;
        let negocio = store.get("negocios", "uid1").await?.unwrap();
        assert_eq!(negocio.text("nombre"), Some("Panadería"));

        assert!(store.delete("negocios", "uid1").await?);
        let usuario = store.get("usuarios", "uid1").await?.unwrap();
        assert_eq!(usuario.text("nombre"), Some("Ana María"));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() -> Result<()> {
        let store = setup_document_store().await?;
        store
            .insert("categorias", fields(json!({"nombre": "Snacks", "negocioId": "n1"})))
            .await?;
        store
            .insert("categorias", fields(json!({"nombre": "Bebidas", "negocioId": "n1"})))
            .await?;
        store
            .insert("categorias", fields(json!({"nombre": "Aseo", "negocioId": "n2"})))
            .await?;
        store
            .insert("categorias", fields(json!({"negocioId": "n1"})))
            .await?;

        let value = json!("n1");
        let docs = store
            .list(
                "categorias",
                Some(FieldFilter {
                    field: "negocioId",
                    value: &value,
                }),
                Some("nombre"),
            )
            .await?;

        let names: Vec<Option<&str>> = docs.iter().map(|d| d.text("nombre")).collect();
        assert_eq!(names, vec![Some("Bebidas"), Some("Snacks"), None]);
        Ok(())
    }

    #[tokio::test]
    async fn test_scan_returns_id_order() -> Result<()> {
        let store = setup_document_store().await?;
        store.insert_with_id("ventas", "b", Fields::new()).await?;
        store.insert_with_id("ventas", "a", Fields::new()).await?;
        store.insert_with_id("ventas", "c", Fields::new()).await?;

        let ids: Vec<String> = store
            .scan("ventas")
            .await?
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_merges_fields() -> Result<()> {
        let store = setup_document_store().await?;
        let doc = store
            .insert(
                "negocios",
                fields(json!({"nombre": "Tienda", "telefono": "123"})),
            )
            .await?;

        let updated = store
            .update("negocios", &doc.id, fields(json!({"telefono": "456"})))
            .await?;

        assert_eq!(updated.text("nombre"), Some("Tienda"));
        assert_eq!(updated.text("telefono"), Some("456"));
        assert_eq!(updated.text(CREATED_AT), doc.text(CREATED_AT));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_document() -> Result<()> {
        let store = setup_document_store().await?;
        let result = store.update("negocios", "nope", Fields::new()).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_is_unconditional() -> Result<()> {
        let store = setup_document_store().await?;
        let doc = store.insert("usuarios", Fields::new()).await?;

        assert!(store.delete("usuarios", &doc.id).await?);
        assert!(!store.delete("usuarios", &doc.id).await?);
        assert!(store.get("usuarios", &doc.id).await?.is_none());
        Ok(())
    }

    #[test]
    fn test_to_json_includes_id() {
        let doc = StoredDocument {
            id: "abc".to_string(),
            fields: fields(json!({"nombre": "Ana"})),
        };
        assert_eq!(doc.to_json(), json!({"id": "abc", "nombre": "Ana"}));
    }

    #[test]
    fn test_compare_numbers_before_strings() {
        assert_eq!(compare_values(&json!(5), &json!("a")), Ordering::Less);
        assert_eq!(compare_values(&json!(2), &json!(10)), Ordering::Less);
    }
}
