use axum::{Json, http::StatusCode, response::IntoResponse};

use crate::app::dto::ServiceInfo;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn info() -> impl IntoResponse {
    Json(ServiceInfo::current())
}
