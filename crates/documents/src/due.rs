//! Outstanding balance and payment status.

use serde::{Deserialize, Serialize};

use wayfarer_core::Amount;

/// Payment status of a document.
///
/// Any status may be set explicitly at any time. When the caller leaves it out,
/// it defaults from the due amount; `Overdue` is never derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Paid,
    Overdue,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Paid => "paid",
            DocumentStatus::Overdue => "overdue",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DocumentStatus::Pending),
            "paid" => Some(DocumentStatus::Paid),
            "overdue" => Some(DocumentStatus::Overdue),
            _ => None,
        }
    }

    /// Status implied by an outstanding balance.
    pub fn from_due(due_amount: Amount) -> Self {
        if due_amount.is_zero() {
            DocumentStatus::Paid
        } else {
            DocumentStatus::Pending
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueSummary {
    pub due_amount: Amount,
    pub status: DocumentStatus,
}

/// `due = max(0, total - advance)`; status is the explicit one, or derived from `due`.
pub fn derive_due_and_status(
    total: Amount,
    amount_paid_in_advance: Amount,
    explicit_status: Option<DocumentStatus>,
) -> DueSummary {
    let due_amount = total.saturating_sub(amount_paid_in_advance);
    DueSummary {
        due_amount,
        status: explicit_status.unwrap_or_else(|| DocumentStatus::from_due(due_amount)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn amt(v: u64) -> Amount {
        Amount::from_minor(v)
    }

    #[test]
    fn fully_paid_in_advance_is_paid() {
        let s = derive_due_and_status(amt(1000), amt(1000), None);
        assert_eq!(s.due_amount, amt(0));
        assert_eq!(s.status, DocumentStatus::Paid);
    }

    #[test]
    fn partial_advance_leaves_balance_pending() {
        let s = derive_due_and_status(amt(1000), amt(400), None);
        assert_eq!(s.due_amount, amt(600));
        assert_eq!(s.status, DocumentStatus::Pending);
    }

    #[test]
    fn overpayment_clamps_to_zero() {
        let s = derive_due_and_status(amt(1000), amt(1500), None);
        assert_eq!(s.due_amount, amt(0));
        assert_eq!(s.status, DocumentStatus::Paid);
    }

    #[test]
    fn explicit_status_wins_over_derivation() {
        let s = derive_due_and_status(amt(1000), amt(1000), Some(DocumentStatus::Overdue));
        assert_eq!(s.due_amount, amt(0));
        assert_eq!(s.status, DocumentStatus::Overdue);
    }

    #[test]
    fn status_parses_lowercase_names_only() {
        assert_eq!(DocumentStatus::parse("overdue"), Some(DocumentStatus::Overdue));
        assert_eq!(DocumentStatus::parse("Paid"), None);
    }

    proptest! {
        #[test]
        fn derived_status_is_never_overdue(total in any::<u64>(), advance in any::<u64>()) {
            let s = derive_due_and_status(amt(total), amt(advance), None);
            prop_assert!(s.due_amount <= amt(total));
            prop_assert_ne!(s.status, DocumentStatus::Overdue);
            prop_assert_eq!(s.status == DocumentStatus::Paid, advance >= total);
        }
    }
}
