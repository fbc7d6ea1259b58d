//! OpenAPI description of the REST surface.
//!
//! - Swagger UI: `/docs`
//! - OpenAPI JSON: `/api-docs/openapi.json`

use crate::{
    api::{
        error::ErrorBody,
        handlers::{HealthResponse, MessageResponse},
    },
    models::{Benefit, BenefitInput, TransferRequest},
};
use utoipa::OpenApi;

/// Path of the generated OpenAPI document
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// Main API documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Benefit Service API",
        version = "0.1.0",
        description = "CRUD over benefits with soft delete, name search and value transfers under optimistic locking."
    ),
    paths(
        crate::api::handlers::health,
        crate::api::handlers::list_benefits,
        crate::api::handlers::get_benefit,
        crate::api::handlers::create_benefit,
        crate::api::handlers::update_benefit,
        crate::api::handlers::delete_benefit,
        crate::api::handlers::search_benefits,
        crate::api::handlers::transfer_value,
    ),
    components(
        schemas(
            Benefit,
            BenefitInput,
            TransferRequest,
            MessageResponse,
            HealthResponse,
            ErrorBody,
        )
    ),
    tags(
        (name = "Benefits", description = "Benefit management"),
        (name = "Transfer", description = "Moving value between benefits"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;
