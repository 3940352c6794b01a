//! Postgres-backed document store and sequence counters.
//!
//! ## Error Mapping
//!
//! | SQLx error | PostgreSQL code | StoreError |
//! |------------|-----------------|------------|
//! | unique violation on `numbered_documents_family_number_key` | `23505` | `DuplicateNumber` |
//! | other unique / check violations | `23505`, `23514` | `Unavailable` |
//! | pool closed / timed out, IO, TLS | n/a | `Unavailable` |
//! | row decode failures | n/a | `Corrupt` |
//!
//! ## Thread Safety
//!
//! `PostgresDocumentStore` is `Send + Sync`; all operations go through the SQLx pool.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::{Span, instrument};

use wayfarer_core::{Amount, DocumentId};
use wayfarer_documents::{
    DocumentDetails, DocumentFamily, DocumentNumber, DocumentPatch, DocumentStatus,
    NumberedDocument,
};

use super::counter::SequenceCounter;
use super::r#trait::{
    DocumentFilter, DocumentSort, DocumentStore, Page, Pagination, SortDirection, SortField,
    StoreError,
};

const NUMBER_UNIQUE_INDEX: &str = "numbered_documents_family_number_key";

/// Idempotent schema, applied statement by statement by [`PostgresDocumentStore::ensure_schema`].
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS numbered_documents (
        id UUID PRIMARY KEY,
        family TEXT NOT NULL,
        number TEXT NOT NULL,
        details JSONB NOT NULL,
        party_name TEXT NOT NULL,
        total BIGINT NOT NULL CHECK (total >= 0),
        amount_paid_in_advance BIGINT NOT NULL CHECK (amount_paid_in_advance >= 0),
        due_amount BIGINT NOT NULL CHECK (due_amount >= 0),
        status TEXT NOT NULL,
        notes TEXT,
        issued_on DATE NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS numbered_documents_family_number_key
        ON numbered_documents (family, number)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS numbered_documents_family_created_idx
        ON numbered_documents (family, created_at DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS document_counters (
        family TEXT PRIMARY KEY,
        value BIGINT NOT NULL CHECK (value >= 0)
    )
    "#,
];

const SELECT_COLUMNS: &str = r#"
    id, number, details, total, amount_paid_in_advance, status, notes,
    issued_on, created_at, updated_at
"#;

/// Postgres-backed document store.
///
/// Uniqueness of `(family, number)` is enforced by a unique index, so two
/// processes racing for the same number cannot both commit.
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: Arc<PgPool>,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create tables and indexes if they do not exist.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    /// Counter handle sharing this store's pool.
    pub fn counters(&self) -> PostgresSequenceCounter {
        PostgresSequenceCounter {
            pool: self.pool.clone(),
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[instrument(skip(self), fields(family = %family), err)]
    async fn find_max_number(
        &self,
        family: DocumentFamily,
    ) -> Result<Option<DocumentNumber>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT number
            FROM numbered_documents
            WHERE family = $1
            ORDER BY char_length(number) DESC, number COLLATE "C" DESC
            LIMIT 1
            "#,
        )
        .bind(family.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_max_number", e))?;

        row.map(|r| {
            r.try_get::<String, _>("number")
                .map(DocumentNumber::new)
                .map_err(|e| StoreError::Corrupt(format!("number column: {e}")))
        })
        .transpose()
    }

    #[instrument(
        skip(self, document),
        fields(family = %document.family(), number = %document.number()),
        err
    )]
    async fn insert_unique(
        &self,
        document: NumberedDocument,
    ) -> Result<NumberedDocument, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO numbered_documents (
                id, family, number, details, party_name,
                total, amount_paid_in_advance, due_amount, status, notes,
                issued_on, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(document.id_typed().as_uuid())
        .bind(document.family().as_str())
        .bind(document.number().as_str())
        .bind(Json(document.details()))
        .bind(document.details().party_name())
        .bind(to_column(document.total())?)
        .bind(to_column(document.amount_paid_in_advance())?)
        .bind(to_column(document.due_amount())?)
        .bind(document.status().as_str())
        .bind(document.notes())
        .bind(document.issued_on())
        .bind(document.created_at())
        .bind(document.updated_at())
        .execute(&*self.pool)
        .await;

        match result {
            Ok(_) => Ok(document),
            Err(e) if is_number_violation(&e) => Err(StoreError::DuplicateNumber {
                family: document.family(),
                number: document.number().clone(),
            }),
            Err(e) => Err(map_sqlx_error("insert_unique", e)),
        }
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn find_by_id(&self, id: DocumentId) -> Result<Option<NumberedDocument>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM numbered_documents WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_id", e))?;

        row.as_ref().map(document_from_row).transpose()
    }

    #[instrument(skip(self, patch), fields(id = %id), err)]
    async fn update(
        &self,
        id: DocumentId,
        patch: DocumentPatch,
        now: DateTime<Utc>,
    ) -> Result<NumberedDocument, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Row lock: concurrent updates of one document apply in sequence,
        // each against the values the previous one committed.
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM numbered_documents WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_document", e))?;

        let Some(row) = row else {
            return Err(StoreError::NotFound);
        };
        let mut document = document_from_row(&row)?;
        document.apply_patch(patch, now)?;

        sqlx::query(
            r#"
            UPDATE numbered_documents
            SET details = $2,
                party_name = $3,
                total = $4,
                amount_paid_in_advance = $5,
                due_amount = $6,
                status = $7,
                notes = $8,
                issued_on = $9,
                updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(Json(document.details()))
        .bind(document.details().party_name())
        .bind(to_column(document.total())?)
        .bind(to_column(document.amount_paid_in_advance())?)
        .bind(to_column(document.due_amount())?)
        .bind(document.status().as_str())
        .bind(document.notes())
        .bind(document.issued_on())
        .bind(document.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_document", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(document)
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn delete(&self, id: DocumentId) -> Result<NumberedDocument, StoreError> {
        let row = sqlx::query(&format!(
            "DELETE FROM numbered_documents WHERE id = $1 RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_document", e))?;

        match row {
            Some(row) => document_from_row(&row),
            None => Err(StoreError::NotFound),
        }
    }

    #[instrument(
        skip(self, filter),
        fields(document_count = tracing::field::Empty),
        err
    )]
    async fn find_page(
        &self,
        filter: &DocumentFilter,
        sort: DocumentSort,
        pagination: Pagination,
    ) -> Result<Page, StoreError> {
        let span = Span::current();

        let families: Option<Vec<String>> = if filter.families.is_empty() {
            None
        } else {
            Some(filter.families.iter().map(|f| f.as_str().to_string()).collect())
        };
        let status: Option<&str> = filter.status.map(|s| s.as_str());
        let party: Option<String> = filter
            .party
            .as_ref()
            .map(|p| format!("%{}%", escape_like(p)));

        const WHERE: &str = r#"
            WHERE ($1::text[] IS NULL OR family = ANY($1))
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR party_name ILIKE $3)
        "#;

        let count_row = sqlx::query(&format!(
            "SELECT COUNT(*) AS total FROM numbered_documents {WHERE}"
        ))
        .bind(&families)
        .bind(status)
        .bind(&party)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_documents", e))?;

        let total: i64 = count_row
            .try_get("total")
            .map_err(|e| StoreError::Corrupt(format!("failed to read count: {e}")))?;

        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM numbered_documents {WHERE} ORDER BY {} LIMIT $4 OFFSET $5",
            order_by(sort)
        ))
        .bind(&families)
        .bind(status)
        .bind(&party)
        .bind(i64::from(pagination.limit))
        .bind(i64::from(pagination.offset))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_page", e))?;

        let items = rows
            .iter()
            .map(document_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        span.record("document_count", items.len());

        let total = total.max(0) as u64;
        let has_more = total > u64::from(pagination.offset) + u64::from(pagination.limit);

        Ok(Page {
            items,
            total,
            pagination,
            has_more,
        })
    }
}

/// Counter table backed by `INSERT .. ON CONFLICT DO UPDATE .. RETURNING`, a
/// single atomic statement per reservation.
#[derive(Debug, Clone)]
pub struct PostgresSequenceCounter {
    pool: Arc<PgPool>,
}

#[async_trait::async_trait]
impl SequenceCounter for PostgresSequenceCounter {
    #[instrument(skip(self), fields(family = %family), err)]
    async fn reserve(&self, family: DocumentFamily, floor: u64) -> Result<u64, StoreError> {
        let floor = i64::try_from(floor)
            .map_err(|_| StoreError::Unavailable(format!("counter floor {floor} out of range")))?;

        let row = sqlx::query(
            r#"
            INSERT INTO document_counters (family, value)
            VALUES ($1, $2 + 1)
            ON CONFLICT (family)
            DO UPDATE SET value = GREATEST(document_counters.value, $2) + 1
            RETURNING value
            "#,
        )
        .bind(family.as_str())
        .bind(floor)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("reserve_counter", e))?;

        let value: i64 = row
            .try_get("value")
            .map_err(|e| StoreError::Corrupt(format!("counter value: {e}")))?;
        u64::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative counter {value}")))
    }
}

fn order_by(sort: DocumentSort) -> &'static str {
    match (sort.field, sort.direction) {
        (SortField::CreatedAt, SortDirection::Asc) => "created_at ASC, id ASC",
        (SortField::CreatedAt, SortDirection::Desc) => "created_at DESC, id DESC",
        (SortField::Number, SortDirection::Asc) => {
            r#"family ASC, char_length(number) ASC, number COLLATE "C" ASC"#
        }
        (SortField::Number, SortDirection::Desc) => {
            r#"family DESC, char_length(number) DESC, number COLLATE "C" DESC"#
        }
    }
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn to_column(amount: Amount) -> Result<i64, StoreError> {
    i64::try_from(amount.minor()).map_err(|_| {
        StoreError::Domain(wayfarer_core::DomainError::validation(format!(
            "amount {amount} exceeds storable range"
        )))
    })
}

fn from_column(column: &str, value: i64) -> Result<Amount, StoreError> {
    u64::try_from(value)
        .map(Amount::from_minor)
        .map_err(|_| StoreError::Corrupt(format!("negative {column}: {value}")))
}

fn document_from_row(row: &PgRow) -> Result<NumberedDocument, StoreError> {
    let corrupt = |column: &str, e: sqlx::Error| StoreError::Corrupt(format!("{column}: {e}"));

    let id: uuid::Uuid = row.try_get("id").map_err(|e| corrupt("id", e))?;
    let number: String = row.try_get("number").map_err(|e| corrupt("number", e))?;
    let Json(details): Json<DocumentDetails> =
        row.try_get("details").map_err(|e| corrupt("details", e))?;
    let total: i64 = row.try_get("total").map_err(|e| corrupt("total", e))?;
    let advance: i64 = row
        .try_get("amount_paid_in_advance")
        .map_err(|e| corrupt("amount_paid_in_advance", e))?;
    let status: String = row.try_get("status").map_err(|e| corrupt("status", e))?;
    let notes: Option<String> = row.try_get("notes").map_err(|e| corrupt("notes", e))?;
    let issued_on: NaiveDate = row.try_get("issued_on").map_err(|e| corrupt("issued_on", e))?;
    let created_at: DateTime<Utc> =
        row.try_get("created_at").map_err(|e| corrupt("created_at", e))?;
    let updated_at: DateTime<Utc> =
        row.try_get("updated_at").map_err(|e| corrupt("updated_at", e))?;

    let status = DocumentStatus::parse(&status)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown status '{status}'")))?;

    Ok(NumberedDocument::restore(
        DocumentId::from_uuid(id),
        DocumentNumber::new(number),
        details,
        from_column("total", total)?,
        from_column("amount_paid_in_advance", advance)?,
        status,
        notes,
        issued_on,
        created_at,
        updated_at,
    ))
}

/// True for a unique violation on the `(family, number)` index.
fn is_number_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        let unique = db_err.code().is_some_and(|code| code == "23505");
        return unique && db_err.constraint() == Some(NUMBER_UNIQUE_INDEX);
    }
    false
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();
            StoreError::Unavailable(format!(
                "database error in {operation} (code {code}): {}",
                db_err.message()
            ))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {operation}"))
        }
        sqlx::Error::ColumnDecode { index, source } => {
            StoreError::Corrupt(format!("column {index} in {operation}: {source}"))
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        other => StoreError::Unavailable(format!("sqlx error in {operation}: {other}")),
    }
}
