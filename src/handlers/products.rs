use super::common::{
    created_response, map_service_error, success_response, validate_input, PaginationParams,
};
use crate::{
    auth::AuthUser,
    entities::product,
    errors::ApiError,
    handlers::AppState,
    services::inventory::{CreateProductInput, UpdateProductInput},
    PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub min_stock_level: i32,
    pub max_stock_level: i32,
    pub total_stock: i32,
    pub amount: Decimal,
    pub location_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            sku: model.sku,
            description: model.description,
            min_stock_level: model.min_stock_level,
            max_stock_level: model.max_stock_level,
            total_stock: model.total_stock,
            amount: model.amount,
            location_id: model.location_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetProductLocationRequest {
    pub location_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteProductsRequest {
    #[serde(default)]
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteProductsResponse {
    pub deleted: u64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SkuQuery {
    pub sku: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SkuCountResponse {
    pub count: u64,
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductInput,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid request or unknown location", body = crate::errors::ErrorResponse),
        (status = 409, description = "SKU already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<CreateProductInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let created = state
        .services
        .inventory
        .create_product(payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(ProductResponse::from(created)))
}

/// List products
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(PaginationParams),
    responses((status = 200, description = "Page of products", body = PaginatedResponse<ProductResponse>)),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = params.resolve(
        state.config.api_default_page_size,
        state.config.api_max_page_size,
    );

    let (products, total) = state
        .services
        .inventory
        .list_products(page, limit)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        products.into_iter().map(ProductResponse::from).collect(),
        total,
        page,
        limit,
    )))
}

/// Update product fields
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductInput,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let updated = state
        .services
        .inventory
        .update_product(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductResponse::from(updated)))
}

/// Set a product's primary storage location
#[utoipa::path(
    patch,
    path = "/api/v1/products/{id}/location",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = SetProductLocationRequest,
    responses(
        (status = 200, description = "Location set", body = ProductResponse),
        (status = 400, description = "Invalid location ID", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn set_product_location(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetProductLocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .inventory
        .set_product_location(id, payload.location_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductResponse::from(updated)))
}

/// Delete several products at once
#[utoipa::path(
    delete,
    path = "/api/v1/products",
    request_body = DeleteProductsRequest,
    responses(
        (status = 200, description = "Products deleted", body = DeleteProductsResponse),
        (status = 404, description = "No matching products", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn delete_products(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<DeleteProductsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .services
        .inventory
        .delete_products(&payload.ids)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(DeleteProductsResponse { deleted }))
}

/// Count products carrying a SKU
#[utoipa::path(
    get,
    path = "/api/v1/products/count",
    params(SkuQuery),
    responses((status = 200, description = "Number of products with the SKU", body = SkuCountResponse)),
    tag = "products"
)]
pub async fn count_by_sku(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<SkuQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let count = state
        .services
        .inventory
        .count_by_sku(&query.sku)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(SkuCountResponse { count }))
}
