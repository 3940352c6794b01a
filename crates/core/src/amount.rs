//! Monetary amounts.

use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// Non-negative monetary amount in the smallest currency unit (e.g. paisa, cents).
///
/// Negative amounts are unrepresentable; subtraction saturates at zero, which is
/// exactly the clamping rule outstanding balances follow.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_minor(units: u64) -> Self {
        Self(units)
    }

    pub const fn minor(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `self - other`, clamped at zero.
    pub const fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }
}

impl ValueObject for Amount {}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn subtraction_clamps_at_zero() {
        let total = Amount::from_minor(1_000);
        assert_eq!(total.saturating_sub(Amount::from_minor(400)), Amount::from_minor(600));
        assert_eq!(total.saturating_sub(Amount::from_minor(1_500)), Amount::ZERO);
    }

    #[test]
    fn displays_with_two_decimals() {
        assert_eq!(Amount::from_minor(123_456).to_string(), "1234.56");
        assert_eq!(Amount::from_minor(7).to_string(), "0.07");
    }

    proptest! {
        #[test]
        fn saturating_sub_never_exceeds_minuend(a in any::<u64>(), b in any::<u64>()) {
            let diff = Amount::from_minor(a).saturating_sub(Amount::from_minor(b));
            prop_assert!(diff <= Amount::from_minor(a));
        }
    }
}
