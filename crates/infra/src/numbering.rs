//! Document numbering service.
//!
//! Hands out sequential, family-scoped document numbers and persists the
//! documents that carry them.
//!
//! ## Creation Flow
//!
//! ```text
//! NewDocument
//!   ↓
//! 1. Validate details (nothing is numbered for a rejected draft)
//!   ↓
//! 2. Allocate a number (store maximum + 1, or a reserved counter value)
//!   ↓
//! 3. Build the document under that number and insert it
//!   ↓
//! 4. DuplicateNumber? allocate again and retry, up to the attempt ceiling
//! ```
//!
//! There is no in-process lock around steps 2 and 3. Two creators may compute
//! the same number; the store's `(family, number)` constraint lets exactly one
//! of them commit and the other one retries against the new maximum.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use wayfarer_core::{DocumentId, DomainError};
use wayfarer_documents::{
    DocumentFamily, DocumentNumber, DocumentPatch, NewDocument, NextNumber, NumberedDocument,
    NumberingScheme, next_number,
};

use crate::config::{NumberingConfig, NumberingStrategy};
use crate::store::{
    DocumentFilter, DocumentSort, DocumentStore, InMemorySequenceCounter, Page, Pagination,
    SequenceCounter, StoreError,
};

#[derive(Debug, Error)]
pub enum NumberingError {
    /// Every attempt collided with a number committed by another writer.
    #[error("no unique {family} number after {attempts} attempts")]
    Exhausted {
        family: DocumentFamily,
        attempts: u32,
        #[source]
        last: StoreError,
    },

    #[error("document not found")]
    NotFound,

    #[error(transparent)]
    Domain(DomainError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for NumberingError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => NumberingError::NotFound,
            StoreError::Domain(err) => err.into(),
            other => NumberingError::Store(other),
        }
    }
}

impl From<DomainError> for NumberingError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound => NumberingError::NotFound,
            other => NumberingError::Domain(other),
        }
    }
}

enum Allocator {
    MaxScan,
    Counter(Arc<dyn SequenceCounter>),
}

/// Creates, updates and lists numbered documents over a [`DocumentStore`].
pub struct NumberedDocumentService<S> {
    store: S,
    schemes: HashMap<DocumentFamily, NumberingScheme>,
    config: NumberingConfig,
    allocator: Allocator,
}

impl<S> NumberedDocumentService<S>
where
    S: DocumentStore,
{
    /// Service with the default `HTL`/`TUR`/`PAY` schemes.
    ///
    /// Under [`NumberingStrategy::Counter`] an in-memory counter is used until
    /// [`with_counter`](Self::with_counter) installs a shared one.
    pub fn new(store: S, config: NumberingConfig) -> Self {
        let schemes = DocumentFamily::ALL
            .into_iter()
            .map(|family| (family, family.default_scheme()))
            .collect();
        let allocator = match config.strategy {
            NumberingStrategy::MaxScan => Allocator::MaxScan,
            NumberingStrategy::Counter => {
                Allocator::Counter(Arc::new(InMemorySequenceCounter::new()))
            }
        };
        Self {
            store,
            schemes,
            config,
            allocator,
        }
    }

    /// Switch to reserve-then-use numbering backed by `counter`.
    pub fn with_counter(mut self, counter: Arc<dyn SequenceCounter>) -> Self {
        self.config.strategy = NumberingStrategy::Counter;
        self.allocator = Allocator::Counter(counter);
        self
    }

    pub fn with_scheme(mut self, family: DocumentFamily, scheme: NumberingScheme) -> Self {
        self.schemes.insert(family, scheme);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &NumberingConfig {
        &self.config
    }

    pub fn scheme(&self, family: DocumentFamily) -> NumberingScheme {
        self.schemes
            .get(&family)
            .cloned()
            .unwrap_or_else(|| family.default_scheme())
    }

    /// The number following the family's current maximum under `scheme`.
    ///
    /// Reads only; nothing is reserved.
    pub async fn next_identifier(
        &self,
        family: DocumentFamily,
        scheme: &NumberingScheme,
    ) -> Result<NextNumber, NumberingError> {
        let current_max = self.store.find_max_number(family).await?;
        let next = next_number(scheme, current_max.as_ref(), self.config.malformed)?;
        if let Some(malformed) = &next.restarted_from {
            warn!(
                family = %family,
                current_max = %malformed,
                next = %next.number,
                "stored maximum is not a valid document number, restarting sequence"
            );
        }
        Ok(next)
    }

    /// [`next_identifier`](Self::next_identifier) under the family's configured scheme.
    pub async fn next_number(&self, family: DocumentFamily) -> Result<NextNumber, NumberingError> {
        let scheme = self.scheme(family);
        self.next_identifier(family, &scheme).await
    }

    async fn allocate(
        &self,
        family: DocumentFamily,
        scheme: &NumberingScheme,
        resync: bool,
    ) -> Result<DocumentNumber, NumberingError> {
        match &self.allocator {
            Allocator::MaxScan => Ok(self.next_identifier(family, scheme).await?.number),
            Allocator::Counter(counter) => {
                // After a collision the counter is behind the store: fast-forward
                // it past the stored maximum.
                let floor = if resync {
                    self.next_identifier(family, scheme).await?.value - 1
                } else {
                    0
                };
                let value = counter.reserve(family, floor).await?;
                Ok(scheme.format(value))
            }
        }
    }

    /// Allocate a number, hand it to `build`, retry on `DuplicateNumber`.
    ///
    /// `build` must persist through an insert that enforces `(family, number)`
    /// uniqueness. Any error other than `DuplicateNumber` ends the loop at once.
    /// After the configured number of collisions the last one is returned inside
    /// [`NumberingError::Exhausted`].
    pub async fn create_with_retry<T, F, Fut>(
        &self,
        family: DocumentFamily,
        mut build: F,
    ) -> Result<T, NumberingError>
    where
        F: FnMut(DocumentNumber) -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let scheme = self.scheme(family);
        let max_attempts = self.config.retry.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let number = self.allocate(family, &scheme, attempt > 1).await?;

            match build(number.clone()).await {
                Ok(created) => return Ok(created),
                Err(err) if err.is_duplicate_number() => {
                    if attempt >= max_attempts {
                        warn!(
                            family = %family,
                            number = %number,
                            attempts = attempt,
                            "document number collisions exhausted the retry budget"
                        );
                        return Err(NumberingError::Exhausted {
                            family,
                            attempts: attempt,
                            last: err,
                        });
                    }

                    let delay = self.config.retry.delay_after(attempt);
                    warn!(
                        family = %family,
                        number = %number,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "document number already taken, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Validate, number and persist a new document.
    #[instrument(skip(self, draft), fields(family = %draft.family()), err)]
    pub async fn create(&self, draft: NewDocument) -> Result<NumberedDocument, NumberingError> {
        draft.validate()?;

        let family = draft.family();
        let id = DocumentId::new();
        let now = Utc::now();
        let store = &self.store;

        let document = self
            .create_with_retry(family, move |number| {
                let draft = draft.clone();
                async move {
                    let document = draft.into_document(id, number, now)?;
                    store.insert_unique(document).await
                }
            })
            .await?;

        info!(
            family = %family,
            number = %document.number(),
            id = %document.id_typed(),
            "document created"
        );
        Ok(document)
    }

    pub async fn get(&self, id: DocumentId) -> Result<NumberedDocument, NumberingError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(NumberingError::NotFound)
    }

    /// Apply a partial update; due amount and status are recomputed against
    /// the persisted values.
    #[instrument(skip(self, patch), fields(id = %id), err)]
    pub async fn update(
        &self,
        id: DocumentId,
        patch: DocumentPatch,
    ) -> Result<NumberedDocument, NumberingError> {
        Ok(self.store.update(id, patch, Utc::now()).await?)
    }

    #[instrument(skip(self), fields(id = %id), err)]
    pub async fn delete(&self, id: DocumentId) -> Result<NumberedDocument, NumberingError> {
        let removed = self.store.delete(id).await?;
        info!(family = %removed.family(), number = %removed.number(), "document deleted");
        Ok(removed)
    }

    pub async fn list(
        &self,
        filter: &DocumentFilter,
        sort: DocumentSort,
        pagination: Pagination,
    ) -> Result<Page, NumberingError> {
        Ok(self.store.find_page(filter, sort, pagination).await?)
    }
}
