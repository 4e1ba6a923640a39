//! Request handlers shared by every resource route.
//!
//! The resource a route serves arrives as an `Extension<&'static Resource>`,
//! so one handler per verb covers all collections.

use crate::{
    api::{
        ApiState,
        response::{Envelope, Reply},
    },
    core::{Fields, Resource, StoredDocument, resources},
    errors::{Error, Result},
};
use axum::{
    Extension,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::collections::HashMap;

/// Header that scopes category requests to one business.
pub const NEGOCIO_HEADER: &str = "x-negocio-id";
/// Header that scopes business requests to one user.
pub const USUARIO_HEADER: &str = "x-usuario-id";

/// Scope header for a resource, if it is tenant-scoped.
fn scope_header(resource: &Resource) -> Option<&'static str> {
    if !resource.scoped {
        return None;
    }
    match resource.filter_field {
        "negocioId" => Some(NEGOCIO_HEADER),
        "usuarioId" => Some(USUARIO_HEADER),
        _ => None,
    }
}

fn scope<'a>(resource: &Resource, headers: &'a HeaderMap) -> Option<&'a str> {
    scope_header(resource)
        .and_then(|name| headers.get(name))
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Parses a request body into document fields. An empty body is an empty object.
fn parse_body(body: &Bytes) -> Result<Fields> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Fields::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(Error::InvalidBody {
            message: "expected a JSON object".to_string(),
        }),
        Err(e) => Err(Error::InvalidBody {
            message: e.to_string(),
        }),
    }
}

fn respond(state: &ApiState, outcome: Result<Reply>) -> Response {
    outcome
        .unwrap_or_else(|err| Reply::from_error(&err, state.expose_error_details))
        .into_response()
}

fn document_reply(doc: &StoredDocument) -> Envelope {
    Envelope::data(doc.to_json())
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

/// `GET`: lists the collection, filtered by the query parameter named after
/// the resource's filter field.
pub async fn list(
    State(state): State<ApiState>,
    Extension(resource): Extension<&'static Resource>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let filter = params.get(resource.filter_field).map(String::as_str);
    let outcome = resources::list(&state.documents, resource, filter, scope(resource, &headers))
        .await
        .map(|docs| {
            let data = docs.iter().map(StoredDocument::to_json).collect();
            Reply::ok(Envelope::data(Value::Array(data)))
        });
    respond(&state, outcome)
}

/// `POST`: creates a document and answers 201.
pub async fn create(
    State(state): State<ApiState>,
    Extension(resource): Extension<&'static Resource>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let outcome = async {
        let fields = parse_body(&body)?;
        let created =
            resources::create(&state.documents, resource, fields, scope(resource, &headers))
                .await?;
        Ok::<_, Error>(Reply::created(document_reply(&created)))
    }
    .await;
    respond(&state, outcome)
}

/// `PUT`: partial update of the document named by `id`.
pub async fn update(
    State(state): State<ApiState>,
    Extension(resource): Extension<&'static Resource>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let outcome = async {
        let fields = parse_body(&body)?;
        let updated =
            resources::update(&state.documents, resource, fields, scope(resource, &headers))
                .await?;
        Ok::<_, Error>(Reply::ok(document_reply(&updated)))
    }
    .await;
    respond(&state, outcome)
}

/// `DELETE`: removes the document named by `id`.
pub async fn delete(
    State(state): State<ApiState>,
    Extension(resource): Extension<&'static Resource>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let outcome = async {
        let fields = parse_body(&body)?;
        let id =
            resources::delete(&state.documents, resource, &fields, scope(resource, &headers))
                .await?;
        Ok::<_, Error>(Reply::ok(Envelope {
            data: Some(serde_json::json!({ "id": id })),
            ..Envelope::message(format!("{} deleted successfully", resource.label))
        }))
    }
    .await;
    respond(&state, outcome)
}

/// Plain `OPTIONS` requests get an empty 200. CORS preflights are answered by
/// the CORS layer before reaching this.
pub async fn options() -> StatusCode {
    StatusCode::OK
}

/// Fallback for any other verb.
pub async fn method_not_allowed() -> Reply {
    Reply::method_not_allowed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body() {
        assert!(parse_body(&Bytes::from_static(b"  ")).unwrap_or_default().is_empty());
        let fields = parse_body(&Bytes::from_static(br#"{"id": "a"}"#)).unwrap_or_default();
        assert_eq!(fields.get("id"), Some(&Value::from("a")));
        assert!(matches!(
            parse_body(&Bytes::from_static(b"[1]")),
            Err(Error::InvalidBody { .. })
        ));
        assert!(matches!(
            parse_body(&Bytes::from_static(b"{nope")),
            Err(Error::InvalidBody { .. })
        ));
    }

    #[test]
    fn test_scope_header_only_for_scoped_resources() {
        assert_eq!(scope_header(&resources::CATEGORIAS), Some(NEGOCIO_HEADER));
        assert_eq!(scope_header(&resources::NEGOCIOS), Some(USUARIO_HEADER));
        assert_eq!(scope_header(&resources::USUARIOS), None);
    }
}
