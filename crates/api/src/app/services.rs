//! Store and numbering service construction.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use wayfarer_infra::store::{PostgresDocumentStore, SequenceCounter};
use wayfarer_infra::{
    AppConfig, DocumentStore, InMemoryDocumentStore, NumberedDocumentService, NumberingConfig,
    NumberingStrategy,
};

/// Store behind the service, erased so in-memory and Postgres wiring share one type.
pub type SharedStore = Arc<dyn DocumentStore>;

pub struct AppServices {
    pub documents: NumberedDocumentService<SharedStore>,
}

impl AppServices {
    /// In-memory wiring (dev/test).
    pub fn in_memory(numbering: NumberingConfig) -> Self {
        let store: SharedStore = Arc::new(InMemoryDocumentStore::new());
        Self {
            documents: NumberedDocumentService::new(store, numbering),
        }
    }
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    if !config.use_persistent_stores {
        tracing::info!("using in-memory document store");
        return Ok(AppServices::in_memory(config.numbering.clone()));
    }

    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")?;

    let store = PostgresDocumentStore::new(pool);
    store
        .ensure_schema()
        .await
        .context("failed to prepare document schema")?;
    tracing::info!("using Postgres document store");

    let counter: Arc<dyn SequenceCounter> = Arc::new(store.counters());
    let strategy = config.numbering.strategy;
    let store: SharedStore = Arc::new(store);

    let mut documents = NumberedDocumentService::new(store, config.numbering.clone());
    if strategy == NumberingStrategy::Counter {
        documents = documents.with_counter(counter);
    }

    Ok(AppServices { documents })
}
