use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use stockbook_auth::Capability;
use stockbook_catalog::{NewSupplier, SupplierPatch};
use stockbook_core::SupplierId;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route("/:id", get(get_supplier).put(update_supplier))
}

pub async fn create_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<NewSupplier>, JsonRejection>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::ManageCatalog) {
        return denied;
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::rejection_to_response(e),
    };

    match services.catalog.create_supplier(body).await {
        Ok(supplier) => (StatusCode::CREATED, Json(supplier)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_suppliers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::ReadCatalog) {
        return denied;
    }
    match services.catalog.list_suppliers().await {
        Ok(suppliers) => Json(suppliers).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::ReadCatalog) {
        return denied;
    }
    let id: SupplierId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.catalog.get_supplier(id).await {
        Ok(supplier) => Json(supplier).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<SupplierPatch>, JsonRejection>,
) -> axum::response::Response {
    if let Err(denied) = authz::require(&principal, Capability::ManageCatalog) {
        return denied;
    }
    let id: SupplierId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(patch) = match body {
        Ok(b) => b,
        Err(e) => return errors::rejection_to_response(e),
    };

    match services.catalog.update_supplier(id, patch).await {
        Ok(supplier) => Json(supplier).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
