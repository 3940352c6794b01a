use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;

use wayfarer_documents::{DocumentFamily, DocumentKind, DocumentStatus, NextNumber, NumberedDocument};
use wayfarer_infra::store::{
    DocumentFilter, DocumentSort, Page, Pagination, SortDirection, SortField,
};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// Query string of the listing endpoints.
///
/// `family` narrows within the endpoint's kind (`hotel`/`tour` under `/invoices`).
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub family: Option<String>,
    pub status: Option<String>,
    /// Customer or payee substring, case-insensitive.
    pub party: Option<String>,
    /// `created_at` (default) or `number`.
    pub sort: Option<String>,
    /// `asc` or `desc` (default).
    pub order: Option<String>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl ListQuery {
    pub fn into_parts(
        self,
        kind: DocumentKind,
    ) -> Result<(DocumentFilter, DocumentSort, Pagination), Response> {
        let families = match self.family.as_deref() {
            None | Some("") => families_of(kind),
            Some(raw) => {
                let family: DocumentFamily = raw.parse().map_err(|e: wayfarer_core::DomainError| {
                    errors::json_error(StatusCode::BAD_REQUEST, "invalid_family", e.to_string())
                })?;
                if family.kind() != kind {
                    return Err(errors::json_error(
                        StatusCode::BAD_REQUEST,
                        "invalid_family",
                        format!("family '{family}' is not served by this endpoint"),
                    ));
                }
                vec![family]
            }
        };

        let status = match self.status.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(DocumentStatus::parse(raw).ok_or_else(|| {
                errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_status",
                    "status must be one of: pending, paid, overdue",
                )
            })?),
        };

        let field = match self.sort.as_deref() {
            None | Some("") | Some("created_at") => SortField::CreatedAt,
            Some("number") => SortField::Number,
            Some(_) => {
                return Err(errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_sort",
                    "sort must be one of: created_at, number",
                ));
            }
        };
        let direction = match self.order.as_deref() {
            None | Some("") | Some("desc") => SortDirection::Desc,
            Some("asc") => SortDirection::Asc,
            Some(_) => {
                return Err(errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_order",
                    "order must be one of: asc, desc",
                ));
            }
        };

        let filter = DocumentFilter {
            families,
            status,
            party: self.party.filter(|p| !p.trim().is_empty()),
        };
        Ok((
            filter,
            DocumentSort { field, direction },
            Pagination::new(self.limit, self.skip),
        ))
    }
}

pub fn families_of(kind: DocumentKind) -> Vec<DocumentFamily> {
    DocumentFamily::ALL
        .into_iter()
        .filter(|f| f.kind() == kind)
        .collect()
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn document_to_json(doc: &NumberedDocument) -> serde_json::Value {
    serde_json::json!({
        "id": doc.id_typed().to_string(),
        "family": doc.family(),
        "number": doc.number(),
        "details": doc.details(),
        "total": doc.total(),
        "amount_paid_in_advance": doc.amount_paid_in_advance(),
        "due_amount": doc.due_amount(),
        "status": doc.status(),
        "notes": doc.notes(),
        "issued_on": doc.issued_on(),
        "created_at": doc.created_at(),
        "updated_at": doc.updated_at(),
    })
}

pub fn page_to_json(page: &Page) -> serde_json::Value {
    serde_json::json!({
        "items": page.items.iter().map(document_to_json).collect::<Vec<_>>(),
        "total": page.total,
        "skip": page.pagination.offset,
        "limit": page.pagination.limit,
        "has_more": page.has_more,
    })
}

pub fn next_number_to_json(family: DocumentFamily, next: &NextNumber) -> serde_json::Value {
    serde_json::json!({
        "family": family,
        "number": next.number,
        "value": next.value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_lists_every_family_of_the_kind() {
        let (filter, sort, pagination) = ListQuery::default()
            .into_parts(DocumentKind::Invoice)
            .unwrap();
        assert_eq!(filter.families, vec![DocumentFamily::Hotel, DocumentFamily::Tour]);
        assert_eq!(sort, DocumentSort::default());
        assert_eq!(pagination, Pagination::default());
    }

    #[test]
    fn family_outside_the_kind_is_rejected() {
        let query = ListQuery {
            family: Some("hotel".to_string()),
            ..Default::default()
        };
        let res = query.into_parts(DocumentKind::PaymentVoucher).unwrap_err();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn limit_is_capped() {
        let query = ListQuery {
            limit: Some(10_000),
            skip: Some(20),
            sort: Some("number".to_string()),
            order: Some("asc".to_string()),
            ..Default::default()
        };
        let (_, sort, pagination) = query.into_parts(DocumentKind::Invoice).unwrap();
        assert_eq!(pagination.limit, Pagination::MAX_LIMIT);
        assert_eq!(pagination.offset, 20);
        assert_eq!(sort.field, SortField::Number);
        assert_eq!(sort.direction, SortDirection::Asc);
    }
}
