use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use stockbook_auth::UserProfile;

use crate::app::dto::{LoginRequest, LoginResponse};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::rejection_to_response(e),
    };

    match services.auth.login(&body.username, &body.password).await {
        Ok(outcome) => (StatusCode::OK, Json(LoginResponse::from(outcome))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn me(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    Json(UserProfile::from(principal.principal()))
}
