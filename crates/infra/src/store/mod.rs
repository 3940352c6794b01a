//! Document persistence.

pub mod counter;
pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use counter::{InMemorySequenceCounter, SequenceCounter};
pub use in_memory::InMemoryDocumentStore;
pub use postgres::{PostgresDocumentStore, PostgresSequenceCounter};
pub use r#trait::{
    DocumentFilter, DocumentSort, DocumentStore, Page, Pagination, SortDirection, SortField,
    StoreError,
};
