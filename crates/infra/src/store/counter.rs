//! Per-family sequence counters for the reserve-then-use numbering strategy.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use wayfarer_documents::DocumentFamily;

use super::r#trait::StoreError;

/// Atomic increment-and-fetch over one counter per family.
///
/// A reserved value is consumed whether or not the document using it commits,
/// so this strategy may leave gaps in the printed sequence.
#[async_trait::async_trait]
pub trait SequenceCounter: Send + Sync {
    /// Atomically set the family counter to `max(current, floor) + 1` and return it.
    ///
    /// `floor` lets callers resynchronize a counter that fell behind documents
    /// inserted by other means (imports, legacy data).
    async fn reserve(&self, family: DocumentFamily, floor: u64) -> Result<u64, StoreError>;
}

#[async_trait::async_trait]
impl<C> SequenceCounter for Arc<C>
where
    C: SequenceCounter + ?Sized,
{
    async fn reserve(&self, family: DocumentFamily, floor: u64) -> Result<u64, StoreError> {
        (**self).reserve(family, floor).await
    }
}

/// In-memory counters for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySequenceCounter {
    values: Mutex<HashMap<DocumentFamily, u64>>,
}

impl InMemorySequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self, family: DocumentFamily) -> u64 {
        self.values
            .lock()
            .map(|v| v.get(&family).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl SequenceCounter for InMemorySequenceCounter {
    async fn reserve(&self, family: DocumentFamily, floor: u64) -> Result<u64, StoreError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        let slot = values.entry(family).or_insert(0);
        let next = (*slot).max(floor).checked_add(1).ok_or_else(|| {
            StoreError::Unavailable(format!("sequence counter for {family} exhausted"))
        })?;
        *slot = next;
        Ok(next)
    }
}
