use crate::errors::AppError;
use crate::models::*;
use crate::services::EnrollmentService;
use axum::{
    async_trait,
    extract::{FromRequestParts, Query, State},
    http::{request::Parts, StatusCode},
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Header carrying the authenticated user id, set by the auth gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Enrollment service wired to the configured repositories and ViaCEP.
    pub enrollment_service: Arc<EnrollmentService>,
}

/// The user on whose behalf the request is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("missing X-User-Id header".to_string()))?;

        raw.to_str()
            .ok()
            .and_then(|value| value.trim().parse::<i32>().ok())
            .map(AuthenticatedUser)
            .ok_or_else(|| AppError::Unauthorized("malformed X-User-Id header".to_string()))
    }
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "enrollment-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /enrollments
///
/// Returns the caller's enrollment with its address, 404 if they have none.
pub async fn get_enrollment(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Json<EnrollmentWithAddressResponse>, AppError> {
    tracing::info!("GET /enrollments - user {}", user_id);

    let enrollment = state
        .enrollment_service
        .get_one_with_address_by_user_id(user_id)
        .await?;

    Ok(Json(enrollment))
}

/// POST /enrollments
///
/// Creates or overwrites the caller's enrollment and address.
pub async fn post_enrollment(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(body): Json<EnrollmentRequest>,
) -> Result<StatusCode, AppError> {
    tracing::info!("POST /enrollments - user {}", user_id);

    state
        .enrollment_service
        .create_or_update_enrollment_with_address(body.for_user(user_id))
        .await?;

    Ok(StatusCode::OK)
}

/// GET /enrollments/cep?cep=01310100
///
/// Resolves a CEP into street, neighborhood, city and state for the form.
pub async fn get_address_from_cep(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CepQueryParams>,
) -> Result<Json<AddressLookupResult>, AppError> {
    tracing::info!("GET /enrollments/cep - cep {}", params.cep);

    let address = state
        .enrollment_service
        .get_address_from_cep(&params.cep)
        .await?;

    Ok(Json(address))
}
