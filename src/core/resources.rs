//! CRUD operations over the document collections exposed by the API.
//!
//! Each collection is described by a [`Resource`]: its name, the parent field
//! used for listing and tenant scoping, the display field used for ordering,
//! and the fields it accepts. The four operations are written once against
//! that descriptor, so categories, businesses and users share one
//! implementation.
//!
//! Tenant scoping is optional. When a caller passes a scope (the parent id the
//! request is confined to), every operation checks it here rather than leaving
//! it to the HTTP layer.

use crate::{
    core::documents::{DocumentStore, FieldFilter, Fields, StoredDocument},
    errors::{Error, Result},
};
use serde_json::Value;
use tracing::info;

/// Default for an optional field missing from a create request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    /// `""`
    Empty,
    /// `null`
    Null,
    /// A fixed string
    Text(&'static str),
}

impl FieldDefault {
    fn to_value(self) -> Value {
        match self {
            Self::Empty => Value::String(String::new()),
            Self::Null => Value::Null,
            Self::Text(text) => Value::String(text.to_string()),
        }
    }
}

/// Description of one API collection.
#[derive(Debug)]
pub struct Resource {
    /// Document collection
    pub collection: &'static str,
    /// Singular label used in messages
    pub label: &'static str,
    /// Field (and query parameter) used for the list filter
    pub filter_field: &'static str,
    /// Whether `filter_field` is the tenant parent that scoping applies to
    pub scoped: bool,
    /// Field the list is ordered by
    pub order_field: &'static str,
    /// Fields a create request must carry
    pub required: &'static [&'static str],
    /// Fields a create request may carry, with their defaults
    pub optional: &'static [(&'static str, FieldDefault)],
}

/// Categories, scoped to a business.
pub static CATEGORIAS: Resource = Resource {
    collection: "categorias",
    label: "Category",
    filter_field: "negocioId",
    scoped: true,
    order_field: "nombre",
    required: &["nombre", "negocioId"],
    optional: &[("descripcion", FieldDefault::Empty)],
};

/// Businesses, scoped to their owning user.
pub static NEGOCIOS: Resource = Resource {
    collection: "negocios",
    label: "Business",
    filter_field: "usuarioId",
    scoped: true,
    order_field: "nombre",
    required: &["nombre", "usuarioId"],
    optional: &[
        ("descripcion", FieldDefault::Empty),
        ("direccion", FieldDefault::Empty),
        ("telefono", FieldDefault::Empty),
        ("email", FieldDefault::Empty),
    ],
};

/// Users. The list filter is an email lookup; users are never scoped.
pub static USUARIOS: Resource = Resource {
    collection: "usuarios",
    label: "User",
    filter_field: "email",
    scoped: false,
    order_field: "nombre",
    required: &["nombre", "email"],
    optional: &[
        ("rol", FieldDefault::Text("usuario")),
        ("telefono", FieldDefault::Null),
    ],
};

impl Resource {
    /// Whether a field is one this resource stores.
    #[must_use]
    pub fn accepts(&self, field: &str) -> bool {
        self.required.contains(&field) || self.optional.iter().any(|(name, _)| *name == field)
    }

    /// The scope to enforce, ignoring it for unscoped resources.
    fn effective_scope<'a>(&self, scope: Option<&'a str>) -> Option<&'a str> {
        if self.scoped { scope } else { None }
    }

    fn mismatch(&self, scope: &str, requested: &str) -> Error {
        Error::TenantMismatch {
            field: self.filter_field.to_string(),
            scope: scope.to_string(),
            requested: requested.to_string(),
        }
    }
}

fn trimmed(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        other => other,
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Keeps only the fields a resource accepts, with string values trimmed.
fn accepted_fields(resource: &Resource, body: Fields) -> Fields {
    body.into_iter()
        .filter(|(key, _)| resource.accepts(key))
        .map(|(key, value)| (key, trimmed(value)))
        .collect()
}

fn request_id(body: &Fields) -> Result<String> {
    match body.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(id.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(Error::MissingId),
    }
}

/// Loads a document for update or delete, hiding documents outside the scope.
async fn load_in_scope(
    store: &DocumentStore,
    resource: &Resource,
    id: &str,
    scope: &str,
) -> Result<StoredDocument> {
    store
        .get(resource.collection, id)
        .await?
        .filter(|doc| doc.text(resource.filter_field) == Some(scope))
        .ok_or_else(|| Error::NotFound {
            collection: resource.collection.to_string(),
            id: id.to_string(),
        })
}

/// Lists a collection, optionally filtered on the resource's filter field.
///
/// # Errors
/// Returns `Error::TenantMismatch` if `filter` names a different parent than `scope`.
pub async fn list(
    store: &DocumentStore,
    resource: &Resource,
    filter: Option<&str>,
    scope: Option<&str>,
) -> Result<Vec<StoredDocument>> {
    let filter = filter.map(str::trim).filter(|f| !f.is_empty());
    let effective = match (resource.effective_scope(scope), filter) {
        (Some(scope), Some(requested)) if scope != requested => {
            return Err(resource.mismatch(scope, requested));
        }
        (Some(scope), _) => Some(scope),
        (None, requested) => requested,
    };

    let value = effective.map(|v| Value::String(v.to_string()));
    let field_filter = value.as_ref().map(|value| FieldFilter {
        field: resource.filter_field,
        value,
    });
    store
        .list(resource.collection, field_filter, Some(resource.order_field))
        .await
}

/// Creates a document from a request body.
///
/// # Errors
/// Returns `Error::MissingFields` (nothing written) if any required field is
/// absent or blank, and `Error::TenantMismatch` if the parent conflicts with `scope`.
pub async fn create(
    store: &DocumentStore,
    resource: &Resource,
    body: Fields,
    scope: Option<&str>,
) -> Result<StoredDocument> {
    let mut fields = accepted_fields(resource, body);

    if let Some(scope) = resource.effective_scope(scope) {
        let requested = fields
            .get(resource.filter_field)
            .and_then(Value::as_str)
            .filter(|requested| !requested.is_empty())
            .map(str::to_string);
        if let Some(requested) = requested.filter(|requested| requested != scope) {
            return Err(resource.mismatch(scope, &requested));
        }
        fields.insert(
            resource.filter_field.to_string(),
            Value::String(scope.to_string()),
        );
    }

    let missing: Vec<String> = resource
        .required
        .iter()
        .filter(|name| is_blank(fields.get(**name)))
        .map(|name| (*name).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingFields { fields: missing });
    }

    for (name, default) in resource.optional {
        fields
            .entry((*name).to_string())
            .or_insert_with(|| default.to_value());
    }

    let created = store.insert(resource.collection, fields).await?;
    info!("{} {} created", resource.label, created.id);
    Ok(created)
}

/// Applies a partial update. Required fields are not re-validated.
///
/// # Errors
/// Returns `Error::MissingId` (nothing written) without an `id`, `Error::NotFound`
/// for unknown or out-of-scope documents, and `Error::TenantMismatch` when the
/// update would move the document to another parent.
pub async fn update(
    store: &DocumentStore,
    resource: &Resource,
    body: Fields,
    scope: Option<&str>,
) -> Result<StoredDocument> {
    let id = request_id(&body)?;
    let patch = accepted_fields(resource, body);

    if let Some(scope) = resource.effective_scope(scope) {
        load_in_scope(store, resource, &id, scope).await?;
        match patch.get(resource.filter_field) {
            None => {}
            Some(Value::String(requested)) if requested == scope => {}
            Some(Value::String(requested)) => return Err(resource.mismatch(scope, requested)),
            Some(other) => return Err(resource.mismatch(scope, &other.to_string())),
        }
    }

    let updated = store.update(resource.collection, &id, patch).await?;
    info!("{} {} updated", resource.label, updated.id);
    Ok(updated)
}

/// Hard-deletes a document. Returns the deleted id.
///
/// # Errors
/// Returns `Error::MissingId` without an `id` and `Error::NotFound` for
/// documents outside `scope`.
pub async fn delete(
    store: &DocumentStore,
    resource: &Resource,
    body: &Fields,
    scope: Option<&str>,
) -> Result<String> {
    let id = request_id(body)?;

    if let Some(scope) = resource.effective_scope(scope) {
        load_in_scope(store, resource, &id, scope).await?;
    }

    store.delete(resource.collection, &id).await?;
    info!("{} {} deleted", resource.label, id);
    Ok(id)
}
