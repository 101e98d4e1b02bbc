use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query, rejection::QueryRejection},
    response::IntoResponse,
};

use stockbook_auth::Capability;
use stockbook_ledger::LedgerFilter;

use crate::app::dto::KardexQuery;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

/// `GET /api/kardex?product_id=&from=&to=`, newest first.
pub async fn list_entries(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<KardexQuery>, QueryRejection>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::ReadLedger) {
        return denied;
    }
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection_to_response(rejection),
    };
    let filter = match LedgerFilter::parse(
        query.product_id.as_deref(),
        query.from.as_deref(),
        query.to.as_deref(),
    ) {
        Ok(f) => f,
        Err(e) => return errors::service_error_to_response(e.into()),
    };

    match services.query.list_ledger_entries(&filter).await {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
