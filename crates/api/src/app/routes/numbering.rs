use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
};

use wayfarer_documents::DocumentFamily;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Next number of a family as it stands now. Nothing is reserved, so a
/// concurrent create may take it first.
pub async fn preview_next(
    Extension(services): Extension<Arc<AppServices>>,
    Path(family): Path<String>,
) -> Response {
    let family: DocumentFamily = match family.parse() {
        Ok(f) => f,
        Err(e) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_family",
                format!("{e}"),
            );
        }
    };

    match services.documents.next_number(family).await {
        Ok(next) => errors::json_ok(StatusCode::OK, dto::next_number_to_json(family, &next)),
        Err(e) => errors::numbering_error_to_response(e),
    }
}
