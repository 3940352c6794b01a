//! Numbered documents, new-document drafts and partial updates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use wayfarer_core::{Amount, DocumentId, DomainError, DomainResult, Entity};

use crate::details::DocumentDetails;
use crate::due::{DocumentStatus, DueSummary, derive_due_and_status};
use crate::family::DocumentFamily;
use crate::number::DocumentNumber;

/// A persisted invoice or payment voucher.
///
/// Fields are private so `due_amount` can never drift from `total` and
/// `amount_paid_in_advance`; every mutation goes through [`NumberedDocument::apply_patch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberedDocument {
    id: DocumentId,
    number: DocumentNumber,
    details: DocumentDetails,
    total: Amount,
    amount_paid_in_advance: Amount,
    due_amount: Amount,
    status: DocumentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    issued_on: NaiveDate,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Caller input for a new document, before a number is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewDocument {
    pub details: DocumentDetails,
    pub total: Amount,
    #[serde(default)]
    pub amount_paid_in_advance: Amount,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub issued_on: Option<NaiveDate>,
}

/// Partial update. Absent fields keep their stored value.
///
/// `notes` distinguishes absent (`None`, keep) from an explicit JSON `null`
/// (`Some(None)`, clear).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DocumentPatch {
    #[serde(default)]
    pub details: Option<DocumentDetails>,
    #[serde(default)]
    pub total: Option<Amount>,
    #[serde(default)]
    pub amount_paid_in_advance: Option<Amount>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
    #[serde(default, deserialize_with = "present")]
    pub notes: Option<Option<String>>,
    #[serde(default)]
    pub issued_on: Option<NaiveDate>,
}

/// Wraps whatever is present (including `null`) in `Some`; absence is left to
/// `#[serde(default)]`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl DocumentPatch {
    pub fn touches_amounts(&self) -> bool {
        self.total.is_some() || self.amount_paid_in_advance.is_some()
    }
}

impl NewDocument {
    pub fn family(&self) -> DocumentFamily {
        self.details.family()
    }

    pub fn validate(&self) -> DomainResult<()> {
        self.details.validate()
    }

    /// Materialize the document under an assigned number.
    pub fn into_document(
        self,
        id: DocumentId,
        number: DocumentNumber,
        now: DateTime<Utc>,
    ) -> DomainResult<NumberedDocument> {
        self.validate()?;
        let DueSummary { due_amount, status } =
            derive_due_and_status(self.total, self.amount_paid_in_advance, self.status);

        Ok(NumberedDocument {
            id,
            number,
            details: self.details,
            total: self.total,
            amount_paid_in_advance: self.amount_paid_in_advance,
            due_amount,
            status,
            notes: self.notes,
            issued_on: self.issued_on.unwrap_or_else(|| now.date_naive()),
            created_at: now,
            updated_at: now,
        })
    }
}

impl NumberedDocument {
    /// Rebuild a document from storage columns. Due amount is recomputed rather
    /// than trusted, the stored status is kept as-is.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: DocumentId,
        number: DocumentNumber,
        details: DocumentDetails,
        total: Amount,
        amount_paid_in_advance: Amount,
        status: DocumentStatus,
        notes: Option<String>,
        issued_on: NaiveDate,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            number,
            details,
            total,
            amount_paid_in_advance,
            due_amount: total.saturating_sub(amount_paid_in_advance),
            status,
            notes,
            issued_on,
            created_at,
            updated_at,
        }
    }

    pub fn id_typed(&self) -> DocumentId {
        self.id
    }

    pub fn family(&self) -> DocumentFamily {
        self.details.family()
    }

    pub fn number(&self) -> &DocumentNumber {
        &self.number
    }

    pub fn details(&self) -> &DocumentDetails {
        &self.details
    }

    pub fn total(&self) -> Amount {
        self.total
    }

    pub fn amount_paid_in_advance(&self) -> Amount {
        self.amount_paid_in_advance
    }

    pub fn due_amount(&self) -> Amount {
        self.due_amount
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn issued_on(&self) -> NaiveDate {
        self.issued_on
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply a partial update against the current stored values.
    ///
    /// Amounts missing from the patch are read from `self`, so changing only the
    /// advance recomputes against the stored total. An explicit status always
    /// wins; otherwise status is re-derived when an amount changed and kept when
    /// none did. The number and the family never change.
    pub fn apply_patch(&mut self, patch: DocumentPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(details) = &patch.details {
            if details.family() != self.family() {
                return Err(DomainError::validation(format!(
                    "document family cannot change from {} to {}",
                    self.family(),
                    details.family()
                )));
            }
            details.validate()?;
        }

        let total = patch.total.unwrap_or(self.total);
        let advance = patch.amount_paid_in_advance.unwrap_or(self.amount_paid_in_advance);
        let explicit = match (patch.status, patch.touches_amounts()) {
            (Some(status), _) => Some(status),
            (None, true) => None,
            (None, false) => Some(self.status),
        };
        let DueSummary { due_amount, status } = derive_due_and_status(total, advance, explicit);

        if let Some(details) = patch.details {
            self.details = details;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        if let Some(issued_on) = patch.issued_on {
            self.issued_on = issued_on;
        }
        self.total = total;
        self.amount_paid_in_advance = advance;
        self.due_amount = due_amount;
        self.status = status;
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for NumberedDocument {
    type Id = DocumentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
