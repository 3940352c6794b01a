//! Infrastructure layer: document storage, numbering service, configuration.

pub mod config;
pub mod numbering;
pub mod retry;
pub mod store;

pub use config::{AppConfig, ConfigError, NumberingConfig, NumberingStrategy};
pub use numbering::{NumberedDocumentService, NumberingError};
pub use retry::{BackoffStrategy, RetryPolicy};
pub use store::{DocumentStore, InMemoryDocumentStore, StoreError};
