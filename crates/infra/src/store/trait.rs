//! Storage contract for numbered documents.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use wayfarer_core::{DocumentId, DomainError};
use wayfarer_documents::{
    DocumentFamily, DocumentNumber, DocumentPatch, DocumentStatus, NumberedDocument,
};

/// Document store operation error.
///
/// `DuplicateNumber` is the only variant the numbering service recovers from;
/// everything else is propagated to the caller unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The `(family, number)` uniqueness constraint rejected an insert.
    #[error("document number {number} already exists in family {family}")]
    DuplicateNumber {
        family: DocumentFamily,
        number: DocumentNumber,
    },

    #[error("document not found")]
    NotFound,

    /// A domain rule rejected the document while the store was building or patching it.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Backend unreachable or failed (network, pool, lock poisoning).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A persisted record could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn is_duplicate_number(&self) -> bool {
        matches!(self, StoreError::DuplicateNumber { .. })
    }
}

/// Pagination parameters for listings (`skip`/`limit`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

impl Pagination {
    pub const MAX_LIMIT: u32 = 1000;

    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(50).min(Self::MAX_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

/// Listing filter. Empty `families` means every family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub families: Vec<DocumentFamily>,
    pub status: Option<DocumentStatus>,
    /// Case-insensitive substring of the customer (invoices) or payee (vouchers).
    pub party: Option<String>,
}

impl DocumentFilter {
    pub fn matches(&self, doc: &NumberedDocument) -> bool {
        if !self.families.is_empty() && !self.families.contains(&doc.family()) {
            return false;
        }
        if let Some(status) = self.status {
            if doc.status() != status {
                return false;
            }
        }
        if let Some(party) = &self.party {
            let needle = party.to_lowercase();
            if !doc.details().party_name().to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentSort {
    pub field: SortField,
    pub direction: SortDirection,
}

/// One page of a listing.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<NumberedDocument>,
    /// Number of documents matching the filter across all pages.
    pub total: u64,
    pub pagination: Pagination,
    pub has_more: bool,
}

/// Persistent collection of numbered documents.
///
/// ## Uniqueness
///
/// Implementations must reject an insert whose `(family, number)` pair already
/// exists with [`StoreError::DuplicateNumber`], atomically: a rejected insert
/// leaves nothing behind. This constraint is the only thing standing between
/// two concurrent creators that computed the same next number.
///
/// ## Maximum lookup
///
/// `find_max_number` returns the family's greatest number ordered by
/// [`DocumentNumber::sort_key`] (length, then lexicographic), whatever its shape.
/// Malformed numbers are returned as-is; interpreting them is the caller's job.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_max_number(
        &self,
        family: DocumentFamily,
    ) -> Result<Option<DocumentNumber>, StoreError>;

    /// Insert a new document, enforcing `(family, number)` uniqueness.
    async fn insert_unique(
        &self,
        document: NumberedDocument,
    ) -> Result<NumberedDocument, StoreError>;

    async fn find_by_id(&self, id: DocumentId) -> Result<Option<NumberedDocument>, StoreError>;

    /// Apply `patch` to the stored document atomically (read, patch, write as one step).
    async fn update(
        &self,
        id: DocumentId,
        patch: DocumentPatch,
        now: DateTime<Utc>,
    ) -> Result<NumberedDocument, StoreError>;

    /// Hard delete. Returns the removed document.
    async fn delete(&self, id: DocumentId) -> Result<NumberedDocument, StoreError>;

    async fn find_page(
        &self,
        filter: &DocumentFilter,
        sort: DocumentSort,
        pagination: Pagination,
    ) -> Result<Page, StoreError>;
}

#[async_trait::async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn find_max_number(
        &self,
        family: DocumentFamily,
    ) -> Result<Option<DocumentNumber>, StoreError> {
        (**self).find_max_number(family).await
    }

    async fn insert_unique(
        &self,
        document: NumberedDocument,
    ) -> Result<NumberedDocument, StoreError> {
        (**self).insert_unique(document).await
    }

    async fn find_by_id(&self, id: DocumentId) -> Result<Option<NumberedDocument>, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn update(
        &self,
        id: DocumentId,
        patch: DocumentPatch,
        now: DateTime<Utc>,
    ) -> Result<NumberedDocument, StoreError> {
        (**self).update(id, patch, now).await
    }

    async fn delete(&self, id: DocumentId) -> Result<NumberedDocument, StoreError> {
        (**self).delete(id).await
    }

    async fn find_page(
        &self,
        filter: &DocumentFilter,
        sort: DocumentSort,
        pagination: Pagination,
    ) -> Result<Page, StoreError> {
        (**self).find_page(filter, sort, pagination).await
    }
}
