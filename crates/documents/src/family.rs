use core::str::FromStr;

use serde::{Deserialize, Serialize};

use wayfarer_core::{DomainError, ValueObject};

use crate::number::DocumentNumber;

/// Numbering scope of a document. Numbers are unique per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFamily {
    Hotel,
    Tour,
    #[serde(alias = "paymentVoucher")]
    PaymentVoucher,
}

/// Coarse grouping used by the HTTP surface (`/invoices` vs `/vouchers`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    PaymentVoucher,
}

impl DocumentFamily {
    pub const ALL: [DocumentFamily; 3] = [
        DocumentFamily::Hotel,
        DocumentFamily::Tour,
        DocumentFamily::PaymentVoucher,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentFamily::Hotel => "hotel",
            DocumentFamily::Tour => "tour",
            DocumentFamily::PaymentVoucher => "payment_voucher",
        }
    }

    pub fn kind(self) -> DocumentKind {
        match self {
            DocumentFamily::Hotel | DocumentFamily::Tour => DocumentKind::Invoice,
            DocumentFamily::PaymentVoucher => DocumentKind::PaymentVoucher,
        }
    }

    /// Prefix and padding the business uses for this family.
    pub fn default_scheme(self) -> NumberingScheme {
        match self {
            DocumentFamily::Hotel => NumberingScheme::new("HTL", 4),
            DocumentFamily::Tour => NumberingScheme::new("TUR", 4),
            DocumentFamily::PaymentVoucher => NumberingScheme::new("PAY", 3),
        }
    }
}

impl core::fmt::Display for DocumentFamily {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentFamily {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hotel" => Ok(DocumentFamily::Hotel),
            "tour" => Ok(DocumentFamily::Tour),
            "payment_voucher" | "paymentVoucher" => Ok(DocumentFamily::PaymentVoucher),
            other => Err(DomainError::validation(format!(
                "unknown document family '{other}' (expected hotel, tour or payment_voucher)"
            ))),
        }
    }
}

/// `<prefix><zero-padded value>` formatting rule of a family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NumberingScheme {
    prefix: String,
    pad_width: usize,
}

impl ValueObject for NumberingScheme {}

impl NumberingScheme {
    pub fn new(prefix: impl Into<String>, pad_width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            pad_width,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn pad_width(&self) -> usize {
        self.pad_width
    }

    /// Render a sequence value. Padding never truncates: `12345` at width 4 stays `12345`.
    pub fn format(&self, value: u64) -> DocumentNumber {
        DocumentNumber::new(format!(
            "{}{:0>width$}",
            self.prefix,
            value,
            width = self.pad_width
        ))
    }

    /// Numeric suffix of a number issued under this scheme.
    pub fn parse_value(&self, number: &DocumentNumber) -> Result<u64, DomainError> {
        let malformed = || DomainError::malformed_number(number.as_str(), &self.prefix);

        let digits = number
            .as_str()
            .strip_prefix(self.prefix.as_str())
            .ok_or_else(malformed)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        digits.parse::<u64>().map_err(|_| malformed())
    }
}
