//! CRUD handlers shared by `/invoices` and `/vouchers`.
//!
//! Each nested router carries its [`DocumentKind`] as an extension; a document
//! of the other kind is reported as not found.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::Response,
    routing::get,
};

use wayfarer_core::DocumentId;
use wayfarer_documents::{DocumentKind, DocumentPatch, NewDocument, NumberedDocument};
use wayfarer_infra::NumberingError;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router(kind: DocumentKind) -> Router {
    Router::new()
        .route("/", get(list_documents).post(create_document))
        .route(
            "/:id",
            get(get_document).put(update_document).delete(delete_document),
        )
        .layer(Extension(kind))
}

pub async fn create_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<DocumentKind>,
    body: Result<Json<NewDocument>, JsonRejection>,
) -> Response {
    let Json(draft) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", e.body_text()),
    };

    if draft.family().kind() != kind {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_family",
            format!("a {} document cannot be created here", draft.family()),
        );
    }

    match services.documents.create(draft).await {
        Ok(doc) => errors::json_ok(StatusCode::CREATED, dto::document_to_json(&doc)),
        Err(e) => errors::numbering_error_to_response(e),
    }
}

pub async fn list_documents(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<DocumentKind>,
    query: Result<Query<dto::ListQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_query", e.body_text()),
    };
    let (filter, sort, pagination) = match query.into_parts(kind) {
        Ok(parts) => parts,
        Err(res) => return res,
    };

    match services.documents.list(&filter, sort, pagination).await {
        Ok(page) => errors::json_ok(StatusCode::OK, dto::page_to_json(&page)),
        Err(e) => errors::numbering_error_to_response(e),
    }
}

pub async fn get_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<DocumentKind>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match find_of_kind(&services, kind, id).await {
        Ok(doc) => errors::json_ok(StatusCode::OK, dto::document_to_json(&doc)),
        Err(e) => errors::numbering_error_to_response(e),
    }
}

pub async fn update_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<DocumentKind>,
    Path(id): Path<String>,
    body: Result<Json<DocumentPatch>, JsonRejection>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Json(patch) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", e.body_text()),
    };

    if let Err(e) = find_of_kind(&services, kind, id).await {
        return errors::numbering_error_to_response(e);
    }
    match services.documents.update(id, patch).await {
        Ok(doc) => errors::json_ok(StatusCode::OK, dto::document_to_json(&doc)),
        Err(e) => errors::numbering_error_to_response(e),
    }
}

pub async fn delete_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<DocumentKind>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    if let Err(e) = find_of_kind(&services, kind, id).await {
        return errors::numbering_error_to_response(e);
    }
    match services.documents.delete(id).await {
        Ok(doc) => errors::json_ok(StatusCode::OK, dto::document_to_json(&doc)),
        Err(e) => errors::numbering_error_to_response(e),
    }
}

fn parse_id(raw: &str) -> Result<DocumentId, Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid document id"))
}

/// Families never change after creation, so a kind check before a write stays valid.
async fn find_of_kind(
    services: &AppServices,
    kind: DocumentKind,
    id: DocumentId,
) -> Result<NumberedDocument, NumberingError> {
    let doc = services.documents.get(id).await?;
    if doc.family().kind() != kind {
        return Err(NumberingError::NotFound);
    }
    Ok(doc)
}
