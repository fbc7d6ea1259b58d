//! Request handlers for the `/benefits` routes.

use crate::{
    api::{
        AppState,
        error::{ApiError, ApiResult, ErrorBody},
    },
    core::{benefit, transfer},
    errors::Error,
    models::{Benefit, BenefitInput, TransferRequest},
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `GET /health` body
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    status: String,
}

/// Body of a successful transfer
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Transfer completed successfully")]
    message: String,
}

/// Query string of `GET /benefits/search`
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    name: String,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "System"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Lists all active benefits
#[utoipa::path(
    get,
    path = "/benefits",
    responses(
        (status = 200, description = "Active benefits ordered by id", body = [Benefit])
    ),
    tag = "Benefits"
)]
pub async fn list_benefits(State(state): State<AppState>) -> ApiResult<Json<Vec<Benefit>>> {
    let benefits = benefit::list_active(&state.database).await?;
    Ok(Json(benefits))
}

/// Fetches one active benefit
#[utoipa::path(
    get,
    path = "/benefits/{id}",
    params(
        ("id" = i64, Path, description = "Benefit id")
    ),
    responses(
        (status = 200, description = "The benefit", body = Benefit),
        (status = 400, description = "Malformed id", body = ErrorBody),
        (status = 404, description = "Missing or soft deleted", body = ErrorBody)
    ),
    tag = "Benefits"
)]
pub async fn get_benefit(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Benefit>> {
    let Path(id) = id?;
    benefit::get(&state.database, id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::BenefitNotFound { id }.into())
}

/// Creates a benefit
#[utoipa::path(
    post,
    path = "/benefits",
    request_body = BenefitInput,
    responses(
        (status = 201, description = "Benefit created", body = Benefit),
        (status = 400, description = "Validation failed", body = ErrorBody)
    ),
    tag = "Benefits"
)]
pub async fn create_benefit(
    State(state): State<AppState>,
    body: Result<Json<BenefitInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Benefit>)> {
    let Json(input) = body?;
    let created = benefit::create(&state.database, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Replaces an active benefit's fields
#[utoipa::path(
    put,
    path = "/benefits/{id}",
    params(
        ("id" = i64, Path, description = "Benefit id")
    ),
    request_body = BenefitInput,
    responses(
        (status = 200, description = "Benefit updated", body = Benefit),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Missing or soft deleted", body = ErrorBody),
        (status = 409, description = "Stale version", body = ErrorBody)
    ),
    tag = "Benefits"
)]
pub async fn update_benefit(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<BenefitInput>, JsonRejection>,
) -> ApiResult<Json<Benefit>> {
    let Path(id) = id?;
    let Json(input) = body?;
    benefit::update(&state.database, id, input)
        .await?
        .map(Json)
        .ok_or_else(|| Error::BenefitNotFound { id }.into())
}

/// Soft deletes a benefit; 200 with an empty body
#[utoipa::path(
    delete,
    path = "/benefits/{id}",
    params(
        ("id" = i64, Path, description = "Benefit id")
    ),
    responses(
        (status = 200, description = "Benefit deactivated"),
        (status = 404, description = "Missing or already deleted", body = ErrorBody),
        (status = 409, description = "Concurrent modification", body = ErrorBody)
    ),
    tag = "Benefits"
)]
pub async fn delete_benefit(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    if benefit::delete(&state.database, id).await? {
        Ok(StatusCode::OK)
    } else {
        Err(Error::BenefitNotFound { id }.into())
    }
}

/// Active benefits whose name contains `name`, case-sensitively
#[utoipa::path(
    get,
    path = "/benefits/search",
    params(
        ("name" = Option<String>, Query, description = "Substring to look for; empty matches all")
    ),
    responses(
        (status = 200, description = "Matching active benefits", body = [Benefit])
    ),
    tag = "Benefits"
)]
pub async fn search_benefits(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Benefit>>> {
    let Query(params) = params?;
    let benefits = benefit::search_by_name(&state.database, &params.name).await?;
    Ok(Json(benefits))
}

/// Moves value from one benefit to another
///
/// Uses the transfer status mapping, where a conflict is a 400.
#[utoipa::path(
    post,
    path = "/benefits/transfer",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer completed", body = MessageResponse),
        (status = 400, description = "Invalid request, insufficient balance, inactive participant or concurrent modification", body = ErrorBody),
        (status = 404, description = "Source or target benefit not found", body = ErrorBody)
    ),
    tag = "Transfer"
)]
pub async fn transfer_value(
    State(state): State<AppState>,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(request) = body?;
    let (from_id, to_id, amount) = request
        .into_parts()
        .map_err(ApiError::from_transfer_error)?;

    transfer::transfer(&state.database, from_id, to_id, amount)
        .await
        .map_err(ApiError::from_transfer_error)?;

    Ok(Json(MessageResponse {
        message: "Transfer completed successfully".to_string(),
    }))
}
