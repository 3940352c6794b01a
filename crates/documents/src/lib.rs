//! Numbered business documents of the travel back office.
//!
//! Hotel and tour invoices and payment vouchers share one shape: a prefixed,
//! zero-padded number unique within its family, a total, an advance payment and
//! a derived outstanding balance. This crate holds the rules for those values as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod details;
pub mod document;
pub mod due;
pub mod family;
pub mod number;

pub use details::{Customer, DocumentDetails, HotelStay, PaymentMethod, TourBooking, VoucherDetails};
pub use document::{DocumentPatch, NewDocument, NumberedDocument};
pub use due::{DocumentStatus, DueSummary, derive_due_and_status};
pub use family::{DocumentFamily, DocumentKind, NumberingScheme};
pub use number::{DocumentNumber, MalformedNumberPolicy, NextNumber, next_number};
