//! Family-specific document contents.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use wayfarer_core::{DomainError, DomainResult};

use crate::family::DocumentFamily;

/// Billed party of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Hotel booking billed on a `HTL` invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelStay {
    pub customer: Customer,
    pub hotel_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub rooms: u32,
    pub guests: u32,
}

impl HotelStay {
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}

/// Tour package billed on a `TUR` invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourBooking {
    pub customer: Customer,
    pub package_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    pub travel_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<NaiveDate>,
    pub travellers: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
    Cheque,
}

/// Outgoing payment recorded on a `PAY` voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherDetails {
    pub paid_to: String,
    pub purpose: String,
    pub payment_method: PaymentMethod,
    pub payment_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Contents of a document. The variant fixes the numbering family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentDetails {
    Hotel(HotelStay),
    Tour(TourBooking),
    #[serde(alias = "paymentVoucher")]
    PaymentVoucher(VoucherDetails),
}

impl DocumentDetails {
    pub fn family(&self) -> DocumentFamily {
        match self {
            DocumentDetails::Hotel(_) => DocumentFamily::Hotel,
            DocumentDetails::Tour(_) => DocumentFamily::Tour,
            DocumentDetails::PaymentVoucher(_) => DocumentFamily::PaymentVoucher,
        }
    }

    /// Name printed as the counterparty: the customer on invoices, the payee on vouchers.
    pub fn party_name(&self) -> &str {
        match self {
            DocumentDetails::Hotel(h) => &h.customer.name,
            DocumentDetails::Tour(t) => &t.customer.name,
            DocumentDetails::PaymentVoucher(v) => &v.paid_to,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        match self {
            DocumentDetails::Hotel(h) => {
                validate_customer(&h.customer)?;
                require_text("hotel_name", &h.hotel_name)?;
                if h.check_out <= h.check_in {
                    return Err(DomainError::validation("check_out must be after check_in"));
                }
                require_positive("rooms", h.rooms)?;
                require_positive("guests", h.guests)
            }
            DocumentDetails::Tour(t) => {
                validate_customer(&t.customer)?;
                require_text("package_name", &t.package_name)?;
                if let Some(ret) = t.return_date {
                    if ret < t.travel_date {
                        return Err(DomainError::validation(
                            "return_date must not be before travel_date",
                        ));
                    }
                }
                require_positive("travellers", t.travellers)
            }
            DocumentDetails::PaymentVoucher(v) => {
                require_text("paid_to", &v.paid_to)?;
                require_text("purpose", &v.purpose)
            }
        }
    }
}

fn validate_customer(customer: &Customer) -> DomainResult<()> {
    require_text("customer.name", &customer.name)?;
    if let Some(email) = &customer.email {
        if !email.contains('@') {
            return Err(DomainError::validation("customer.email is not an email address"));
        }
    }
    Ok(())
}

fn require_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_positive(field: &str, value: u32) -> DomainResult<()> {
    if value == 0 {
        return Err(DomainError::validation(format!("{field} must be positive")));
    }
    Ok(())
}
