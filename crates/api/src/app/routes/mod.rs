use axum::{Router, routing::get};

use wayfarer_documents::DocumentKind;

pub mod documents;
pub mod numbering;
pub mod system;

/// Router for the document endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/invoices", documents::router(DocumentKind::Invoice))
        .nest("/vouchers", documents::router(DocumentKind::PaymentVoucher))
        .route("/numbering/:family/next", get(numbering::preview_next))
}
