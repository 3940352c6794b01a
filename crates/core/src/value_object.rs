//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Amounts, document numbers and numbering schemes are compared by value:
/// two `HTL0042` numbers are the same number no matter which request built them.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Amount(u64);
///
/// impl ValueObject for Amount {}
///
/// assert_eq!(Amount(100), Amount(100));
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
