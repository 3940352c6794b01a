//! In-memory document store for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use wayfarer_core::DocumentId;
use wayfarer_documents::{DocumentFamily, DocumentNumber, DocumentPatch, NumberedDocument};

use super::r#trait::{
    DocumentFilter, DocumentSort, DocumentStore, Page, Pagination, SortDirection, SortField,
    StoreError,
};

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<DocumentId, NumberedDocument>,
    numbers: HashMap<(DocumentFamily, DocumentNumber), DocumentId>,
}

/// In-memory document store.
///
/// Intended for tests/dev. Not optimized for performance: maximum lookups and
/// listings scan every document.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    inner: RwLock<Inner>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.documents.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("lock poisoned".to_string())
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find_max_number(
        &self,
        family: DocumentFamily,
    ) -> Result<Option<DocumentNumber>, StoreError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner
            .numbers
            .keys()
            .filter(|(f, _)| *f == family)
            .map(|(_, number)| number)
            .max_by(|a, b| a.sort_key().cmp(&b.sort_key()))
            .cloned())
    }

    async fn insert_unique(
        &self,
        document: NumberedDocument,
    ) -> Result<NumberedDocument, StoreError> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;

        let key = (document.family(), document.number().clone());
        if inner.numbers.contains_key(&key) {
            let (family, number) = key;
            return Err(StoreError::DuplicateNumber { family, number });
        }
        if inner.documents.contains_key(&document.id_typed()) {
            return Err(StoreError::Unavailable(format!(
                "document id {} already stored",
                document.id_typed()
            )));
        }

        inner.numbers.insert(key, document.id_typed());
        inner
            .documents
            .insert(document.id_typed(), document.clone());
        Ok(document)
    }

    async fn find_by_id(&self, id: DocumentId) -> Result<Option<NumberedDocument>, StoreError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner.documents.get(&id).cloned())
    }

    async fn update(
        &self,
        id: DocumentId,
        patch: DocumentPatch,
        now: DateTime<Utc>,
    ) -> Result<NumberedDocument, StoreError> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;
        let stored = inner.documents.get_mut(&id).ok_or(StoreError::NotFound)?;

        // Patch a copy so a rejected patch leaves the stored document untouched.
        let mut updated = stored.clone();
        updated.apply_patch(patch, now)?;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: DocumentId) -> Result<NumberedDocument, StoreError> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;
        let removed = inner.documents.remove(&id).ok_or(StoreError::NotFound)?;
        inner
            .numbers
            .remove(&(removed.family(), removed.number().clone()));
        Ok(removed)
    }

    async fn find_page(
        &self,
        filter: &DocumentFilter,
        sort: DocumentSort,
        pagination: Pagination,
    ) -> Result<Page, StoreError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;

        let mut matching: Vec<&NumberedDocument> = inner
            .documents
            .values()
            .filter(|d| filter.matches(d))
            .collect();

        matching.sort_by(|a, b| {
            let ord = match sort.field {
                SortField::CreatedAt => a
                    .created_at()
                    .cmp(&b.created_at())
                    .then_with(|| a.id_typed().cmp(&b.id_typed())),
                SortField::Number => a
                    .family()
                    .cmp(&b.family())
                    .then_with(|| a.number().sort_key().cmp(&b.number().sort_key())),
            };
            match sort.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });

        let total = matching.len() as u64;
        let items: Vec<NumberedDocument> = matching
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .cloned()
            .collect();
        let has_more = total > u64::from(pagination.offset) + u64::from(pagination.limit);

        Ok(Page {
            items,
            total,
            pagination,
            has_more,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wayfarer_core::Amount;
    use wayfarer_documents::{
        Customer, DocumentDetails, DocumentStatus, NewDocument, TourBooking,
    };

    fn tour_draft(customer: &str, total: u64) -> NewDocument {
        NewDocument {
            details: DocumentDetails::Tour(TourBooking {
                customer: Customer {
                    name: customer.to_string(),
                    phone: None,
                    email: None,
                    address: None,
                },
                package_name: "Naran Kaghan 3D".to_string(),
                destination: Some("Naran".to_string()),
                travel_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
                return_date: None,
                travellers: 2,
            }),
            total: Amount::from_minor(total),
            amount_paid_in_advance: Amount::ZERO,
            status: None,
            notes: None,
            issued_on: None,
        }
    }

    fn tour_doc(number: &str, customer: &str) -> NumberedDocument {
        tour_draft(customer, 1000)
            .into_document(DocumentId::new(), DocumentNumber::new(number), Utc::now())
            .unwrap()
    }

    #[tokio::test]
    async fn duplicate_number_in_same_family_is_rejected_atomically() {
        let store = InMemoryDocumentStore::new();
        store.insert_unique(tour_doc("TUR0001", "A")).await.unwrap();

        let err = store.insert_unique(tour_doc("TUR0001", "B")).await.unwrap_err();
        assert!(err.is_duplicate_number());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn max_number_orders_by_length_then_text() {
        let store = InMemoryDocumentStore::new();
        for n in ["TUR0042", "TUR9999", "TUR10000", "TUR0007"] {
            store.insert_unique(tour_doc(n, "A")).await.unwrap();
        }
        let max = store.find_max_number(DocumentFamily::Tour).await.unwrap();
        assert_eq!(max.unwrap().as_str(), "TUR10000");
        assert_eq!(store.find_max_number(DocumentFamily::Hotel).await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_of_missing_document_is_not_found() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .update(DocumentId::new(), DocumentPatch::default(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn delete_frees_the_number() {
        let store = InMemoryDocumentStore::new();
        let doc = store.insert_unique(tour_doc("TUR0001", "A")).await.unwrap();
        store.delete(doc.id_typed()).await.unwrap();
        assert!(store.find_by_id(doc.id_typed()).await.unwrap().is_none());
        store.insert_unique(tour_doc("TUR0001", "B")).await.unwrap();
        assert!(matches!(
            store.delete(doc.id_typed()).await.unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[tokio::test]
    async fn page_filters_sorts_and_reports_more() {
        let store = InMemoryDocumentStore::new();
        for (n, who) in [("TUR0001", "Hamza"), ("TUR0002", "Sana"), ("TUR0003", "hamza ali")] {
            store.insert_unique(tour_doc(n, who)).await.unwrap();
        }

        let filter = DocumentFilter {
            families: vec![DocumentFamily::Tour],
            status: Some(DocumentStatus::Pending),
            party: Some("HAMZA".to_string()),
        };
        let sort = DocumentSort {
            field: SortField::Number,
            direction: SortDirection::Desc,
        };
        let page = store
            .find_page(&filter, sort, Pagination::new(Some(1), None))
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert!(page.has_more);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].number().as_str(), "TUR0003");
    }
}
