use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use stockbook_auth::Capability;
use stockbook_core::PurchaseId;
use stockbook_ledger::NewPurchase;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_purchases).post(record_purchase))
        .route("/:id", get(get_purchase))
}

/// Posts the purchase, then answers with the joined view of what was stored.
pub async fn record_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<NewPurchase>, JsonRejection>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::RecordTransactions) {
        return denied;
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::rejection_to_response(e),
    };

    let purchase = match services.engine.record_purchase(body).await {
        Ok(p) => p,
        Err(e) => return errors::service_error_to_response(e),
    };
    match services.query.purchase_view(purchase).await {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_purchases(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::RecordTransactions) {
        return denied;
    }
    match services.query.list_purchases().await {
        Ok(views) => Json(views).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::RecordTransactions) {
        return denied;
    }
    let id: PurchaseId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.query.get_purchase(id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
