//! Business document numbers (`HTL0042`, `PAY007`) and next-number computation.

use serde::{Deserialize, Serialize};

use wayfarer_core::{DomainError, DomainResult, ValueObject};

use crate::family::NumberingScheme;

/// Printed, family-unique document number. Immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentNumber(String);

impl ValueObject for DocumentNumber {}

impl DocumentNumber {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ordering used to pick a family's current maximum: longer numbers first,
    /// then lexicographic. For numbers of one scheme this equals numeric order,
    /// including values that outgrew the pad width (`HTL10000` > `HTL9999`).
    pub fn sort_key(&self) -> (usize, &str) {
        (self.0.len(), self.0.as_str())
    }
}

impl core::fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What to do when the family's current maximum carries a non-numeric suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedNumberPolicy {
    /// Start over from 1, as the legacy numbering did.
    #[default]
    Restart,
    /// Surface `DomainError::MalformedNumber`.
    Reject,
}

/// Outcome of a next-number computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextNumber {
    pub number: DocumentNumber,
    pub value: u64,
    /// Set when the maximum could not be parsed and the sequence restarted at 1.
    pub restarted_from: Option<DocumentNumber>,
}

/// Compute the number that follows `current_max` under `scheme`.
///
/// - no existing document: value 1
/// - parseable maximum: value `parsed + 1`
/// - malformed maximum: value 1 (`Restart`) or an error (`Reject`)
pub fn next_number(
    scheme: &NumberingScheme,
    current_max: Option<&DocumentNumber>,
    policy: MalformedNumberPolicy,
) -> DomainResult<NextNumber> {
    let (value, restarted_from) = match current_max {
        None => (1, None),
        Some(max) => match scheme.parse_value(max) {
            Ok(parsed) => {
                let next = parsed
                    .checked_add(1)
                    .ok_or_else(|| DomainError::invariant("document number sequence exhausted"))?;
                (next, None)
            }
            Err(err) => match policy {
                MalformedNumberPolicy::Restart => (1, Some(max.clone())),
                MalformedNumberPolicy::Reject => return Err(err),
            },
        },
    };

    Ok(NextNumber {
        number: scheme.format(value),
        value,
        restarted_from,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::DocumentFamily;

    fn hotel() -> NumberingScheme {
        DocumentFamily::Hotel.default_scheme()
    }

    #[test]
    fn empty_family_starts_at_one() {
        let next = next_number(&hotel(), None, MalformedNumberPolicy::Restart).unwrap();
        assert_eq!(next.value, 1);
        assert_eq!(next.number.as_str(), "HTL0001");
        assert_eq!(next.restarted_from, None);
    }

    #[test]
    fn hotel_sequence_continues_after_current_maximum() {
        let max = DocumentNumber::new("HTL0042");
        let next = next_number(&hotel(), Some(&max), MalformedNumberPolicy::Restart).unwrap();
        assert_eq!(next.number.as_str(), "HTL0043");
    }

    #[test]
    fn voucher_sequence_uses_three_digit_padding() {
        let scheme = DocumentFamily::PaymentVoucher.default_scheme();
        let max = DocumentNumber::new("PAY007");
        let next = next_number(&scheme, Some(&max), MalformedNumberPolicy::Restart).unwrap();
        assert_eq!(next.number.as_str(), "PAY008");
    }

    #[test]
    fn sequence_grows_past_the_pad_width() {
        let max = DocumentNumber::new("HTL9999");
        let next = next_number(&hotel(), Some(&max), MalformedNumberPolicy::Restart).unwrap();
        assert_eq!(next.number.as_str(), "HTL10000");
    }

    #[test]
    fn malformed_maximum_restarts_at_one_by_default() {
        let max = DocumentNumber::new("HTL00AB");
        let next = next_number(&hotel(), Some(&max), MalformedNumberPolicy::Restart).unwrap();
        assert_eq!(next.number.as_str(), "HTL0001");
        assert_eq!(next.restarted_from, Some(max));
    }

    #[test]
    fn malformed_maximum_is_an_error_under_reject_policy() {
        let max = DocumentNumber::new("HTL00AB");
        let err = next_number(&hotel(), Some(&max), MalformedNumberPolicy::Reject).unwrap_err();
        match err {
            DomainError::MalformedNumber { number, prefix } => {
                assert_eq!(number, "HTL00AB");
                assert_eq!(prefix, "HTL");
            }
            other => panic!("expected MalformedNumber, got {other:?}"),
        }
    }

    #[test]
    fn sort_key_orders_numerically_across_widths() {
        let mut numbers = vec![
            DocumentNumber::new("HTL9999"),
            DocumentNumber::new("HTL10000"),
            DocumentNumber::new("HTL0042"),
        ];
        numbers.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
        assert_eq!(numbers[0].as_str(), "HTL10000");
        assert_eq!(numbers[2].as_str(), "HTL0042");
    }
}
