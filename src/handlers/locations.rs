use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    auth::AuthUser,
    entities::location::{self, ProductAllocation},
    errors::ApiError,
    handlers::AppState,
    services::locations::{AssignmentReport, CreateLocationInput, LocationAssignment},
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationResponse {
    pub id: Uuid,
    pub location_code: String,
    pub capacity: i32,
    pub current_load: i32,
    pub stock: i32,
    pub products: Vec<ProductAllocation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<location::Model> for LocationResponse {
    fn from(model: location::Model) -> Self {
        Self {
            id: model.id,
            location_code: model.location_code,
            capacity: model.capacity,
            current_load: model.current_load,
            stock: model.stock,
            products: model.products.0,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignLocationRequest {
    pub grn_id: Uuid,
    #[serde(default)]
    pub updates: Vec<LocationAssignment>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLocationStockRequest {
    pub stock: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLocationCapacityRequest {
    pub capacity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetLocationProductRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Create a storage location
#[utoipa::path(
    post,
    path = "/api/v1/locations",
    request_body = CreateLocationInput,
    responses(
        (status = 201, description = "Location created", body = LocationResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Location code already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn create_location(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<CreateLocationInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let created = state
        .services
        .locations
        .create_location(payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(LocationResponse::from(created)))
}

/// List storage locations
#[utoipa::path(
    get,
    path = "/api/v1/locations",
    responses((status = 200, description = "All locations", body = [LocationResponse])),
    tag = "locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let locations = state
        .services
        .locations
        .list_locations()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(
        locations
            .into_iter()
            .map(LocationResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// Assign receipt items to storage locations
#[utoipa::path(
    patch,
    path = "/api/v1/locations/update-location",
    request_body = AssignLocationRequest,
    responses(
        (status = 200, description = "Per-item outcome of the assignment", body = AssignmentReport),
        (status = 404, description = "GRN not found", body = crate::errors::ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn assign_location(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<AssignLocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .services
        .locations
        .assign_location(payload.grn_id, payload.updates)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(report))
}

/// Set a location's stock figure
#[utoipa::path(
    patch,
    path = "/api/v1/locations/{id}/stock",
    params(("id" = Uuid, Path, description = "Location id")),
    request_body = UpdateLocationStockRequest,
    responses(
        (status = 200, description = "Stock updated", body = LocationResponse),
        (status = 404, description = "Location not found", body = crate::errors::ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn update_location_stock(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationStockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let location = state
        .services
        .locations
        .update_stock(id, payload.stock)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(LocationResponse::from(location)))
}

/// Set a location's capacity
#[utoipa::path(
    patch,
    path = "/api/v1/locations/{id}/capacity",
    params(("id" = Uuid, Path, description = "Location id")),
    request_body = UpdateLocationCapacityRequest,
    responses(
        (status = 200, description = "Capacity updated", body = LocationResponse),
        (status = 400, description = "Invalid capacity value", body = crate::errors::ErrorResponse),
        (status = 404, description = "Location not found", body = crate::errors::ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn update_location_capacity(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationCapacityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let location = state
        .services
        .locations
        .update_capacity(id, payload.capacity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(LocationResponse::from(location)))
}

/// Set the quantity of a product held at a location
#[utoipa::path(
    patch,
    path = "/api/v1/locations/{id}/products",
    params(("id" = Uuid, Path, description = "Location id")),
    request_body = SetLocationProductRequest,
    responses(
        (status = 200, description = "Allocation stored", body = LocationResponse),
        (status = 404, description = "Location or product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn set_location_product(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetLocationProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let location = state
        .services
        .locations
        .set_location_product(id, payload.product_id, payload.quantity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(LocationResponse::from(location)))
}
