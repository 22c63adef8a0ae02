use super::common::{
    created_response, map_service_error, no_content_response, parse_status, success_response,
    total_pages, validate_input, PaginationParams,
};
use crate::{
    auth::AuthUser,
    entities::grn::{self, GrnItem, QuantitySplit, ReceiptStatus},
    errors::ApiError,
    handlers::AppState,
    services::grn::{CreateGrnInput, GrnHeaderUpdate, GrnListFilter},
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrnResponse {
    pub id: Uuid,
    pub po_number: String,
    pub receiving_no: String,
    pub status: ReceiptStatus,
    pub receiving_date: DateTime<Utc>,
    pub supplier: String,
    pub ok_quantity: i32,
    pub rejected_quantity: i32,
    pub items: Vec<GrnItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<grn::Model> for GrnResponse {
    fn from(model: grn::Model) -> Self {
        Self {
            id: model.id,
            po_number: model.po_number,
            receiving_no: model.receiving_no,
            status: model.status,
            receiving_date: model.receiving_date,
            supplier: model.supplier,
            ok_quantity: model.ok_quantity,
            rejected_quantity: model.rejected_quantity,
            items: model.items.0,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrnListResponse {
    pub grns: Vec<GrnResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct GrnListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Pending, OK or Rejected
    pub status: Option<String>,
    /// Case-insensitive substring of the purchase order number
    pub po_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGrnRequest {
    #[validate(length(min = 1))]
    pub po_number: Option<String>,
    pub supplier: Option<String>,
    pub receiving_date: Option<DateTime<Utc>>,
    /// OK or Rejected
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateGrnStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDockLocationRequest {
    #[serde(default)]
    pub item_ids: Vec<Uuid>,
    #[serde(default)]
    #[validate(length(min = 1, message = "dockLocation is required"))]
    pub dock_location: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemStatusRequest {
    pub status: String,
    pub ok_quantity: Option<i32>,
    pub rejected_quantity: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemLocationRequest {
    #[serde(alias = "dockLocation")]
    pub dock_code: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemQuantitiesRequest {
    pub ok_quantity: Option<i32>,
    pub rejected_quantity: Option<i32>,
    pub current_quantity: Option<i32>,
}

impl From<UpdateItemQuantitiesRequest> for QuantitySplit {
    fn from(request: UpdateItemQuantitiesRequest) -> Self {
        Self {
            ok_quantity: request.ok_quantity,
            rejected_quantity: request.rejected_quantity,
            current_quantity: request.current_quantity,
        }
    }
}

/// Create a goods receipt note
#[utoipa::path(
    post,
    path = "/api/v1/grn",
    request_body = CreateGrnInput,
    responses(
        (status = 201, description = "GRN created", body = GrnResponse),
        (status = 400, description = "Missing fields or an item number outside the master list", body = crate::errors::ErrorResponse),
        (status = 409, description = "Receiving number already used", body = crate::errors::ErrorResponse)
    ),
    tag = "grn"
)]
pub async fn create_grn(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<CreateGrnInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let created = state
        .services
        .grn
        .create(payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(GrnResponse::from(created)))
}

/// List goods receipt notes
#[utoipa::path(
    get,
    path = "/api/v1/grn",
    params(GrnListQuery),
    responses(
        (status = 200, description = "Page of GRNs", body = GrnListResponse),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse)
    ),
    tag = "grn"
)]
pub async fn list_grns(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<GrnListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = PaginationParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(
        state.config.api_default_page_size,
        state.config.api_max_page_size,
    );

    let filter = GrnListFilter {
        status: query.status.as_deref().map(parse_status).transpose()?,
        po_number: query.po_number,
    };

    let (grns, total) = state
        .services
        .grn
        .list(filter, page, limit)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(GrnListResponse {
        grns: grns.into_iter().map(GrnResponse::from).collect(),
        total,
        page,
        limit,
        total_pages: total_pages(total, limit),
    }))
}

/// Get a goods receipt note by id
#[utoipa::path(
    get,
    path = "/api/v1/grn/{id}",
    params(("id" = Uuid, Path, description = "GRN id")),
    responses(
        (status = 200, description = "GRN found", body = GrnResponse),
        (status = 404, description = "GRN not found", body = crate::errors::ErrorResponse)
    ),
    tag = "grn"
)]
pub async fn get_grn(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let grn = state.services.grn.get(id).await.map_err(map_service_error)?;
    Ok(success_response(GrnResponse::from(grn)))
}

/// Update GRN header fields
#[utoipa::path(
    put,
    path = "/api/v1/grn/{id}",
    params(("id" = Uuid, Path, description = "GRN id")),
    request_body = UpdateGrnRequest,
    responses(
        (status = 200, description = "GRN updated", body = GrnResponse),
        (status = 400, description = "Invalid update", body = crate::errors::ErrorResponse),
        (status = 404, description = "GRN not found", body = crate::errors::ErrorResponse)
    ),
    tag = "grn"
)]
pub async fn update_grn(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGrnRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let update = GrnHeaderUpdate {
        po_number: payload.po_number,
        supplier: payload.supplier,
        receiving_date: payload.receiving_date,
        status: payload.status.as_deref().map(parse_status).transpose()?,
    };

    let grn = state
        .services
        .grn
        .update_header(id, update)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(GrnResponse::from(grn)))
}

/// Delete a goods receipt note
#[utoipa::path(
    delete,
    path = "/api/v1/grn/{id}",
    params(("id" = Uuid, Path, description = "GRN id")),
    responses(
        (status = 204, description = "GRN deleted"),
        (status = 404, description = "GRN not found", body = crate::errors::ErrorResponse)
    ),
    tag = "grn"
)]
pub async fn delete_grn(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.grn.delete(id).await.map_err(map_service_error)?;
    Ok(no_content_response())
}

/// Set the receipt-level status
#[utoipa::path(
    patch,
    path = "/api/v1/grn/{id}/status",
    params(("id" = Uuid, Path, description = "GRN id")),
    request_body = UpdateGrnStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = GrnResponse),
        (status = 400, description = "Unknown status", body = crate::errors::ErrorResponse),
        (status = 404, description = "GRN not found", body = crate::errors::ErrorResponse)
    ),
    tag = "grn"
)]
pub async fn update_grn_status(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGrnStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = parse_status(&payload.status)?;
    let grn = state
        .services
        .grn
        .set_status(id, status)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(GrnResponse::from(grn)))
}

/// Move a set of items to a dock
#[utoipa::path(
    patch,
    path = "/api/v1/grn/{id}/location",
    params(("id" = Uuid, Path, description = "GRN id")),
    request_body = UpdateDockLocationRequest,
    responses(
        (status = 200, description = "Dock codes updated", body = GrnResponse),
        (status = 404, description = "GRN not found", body = crate::errors::ErrorResponse)
    ),
    tag = "grn"
)]
pub async fn update_dock_location(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDockLocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let grn = state
        .services
        .grn
        .update_dock_location(id, &payload.item_ids, &payload.dock_location)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(GrnResponse::from(grn)))
}

/// Set an item's status and OK/rejected split
#[utoipa::path(
    patch,
    path = "/api/v1/grn/{id}/item/{item_id}/status",
    params(
        ("id" = Uuid, Path, description = "GRN id"),
        ("item_id" = Uuid, Path, description = "Item id")
    ),
    request_body = UpdateItemStatusRequest,
    responses(
        (status = 200, description = "Item updated", body = GrnResponse),
        (status = 400, description = "Unknown status or quantities above the item quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "GRN or item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "grn"
)]
pub async fn update_item_status(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateItemStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = parse_status(&payload.status)?;
    let grn = state
        .services
        .grn
        .update_item_status(
            id,
            item_id,
            status,
            payload.ok_quantity,
            payload.rejected_quantity,
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(GrnResponse::from(grn)))
}

/// Set an item's dock code and/or status
#[utoipa::path(
    patch,
    path = "/api/v1/grn/{id}/item/{item_id}/location",
    params(
        ("id" = Uuid, Path, description = "GRN id"),
        ("item_id" = Uuid, Path, description = "Item id")
    ),
    request_body = UpdateItemLocationRequest,
    responses(
        (status = 200, description = "Item updated", body = GrnResponse),
        (status = 404, description = "GRN or item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "grn"
)]
pub async fn update_item_location(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateItemLocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = payload.status.as_deref().map(parse_status).transpose()?;
    let grn = state
        .services
        .grn
        .update_item_location(id, item_id, payload.dock_code, status)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(GrnResponse::from(grn)))
}

/// Update an item's OK, rejected and current quantities
#[utoipa::path(
    patch,
    path = "/api/v1/grn/{id}/item/{item_id}",
    params(
        ("id" = Uuid, Path, description = "GRN id"),
        ("item_id" = Uuid, Path, description = "Item id")
    ),
    request_body = UpdateItemQuantitiesRequest,
    responses(
        (status = 200, description = "Quantities updated", body = GrnResponse),
        (status = 400, description = "No quantity given or quantities above the item quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "GRN or item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "grn"
)]
pub async fn update_item_quantities(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateItemQuantitiesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let grn = state
        .services
        .grn
        .update_item_quantities(id, item_id, payload.into())
        .await
        .map_err(map_service_error)?;

    Ok(success_response(GrnResponse::from(grn)))
}

/// Remove the first item with the given item number
#[utoipa::path(
    delete,
    path = "/api/v1/grn/{id}/item/{item_no}",
    params(
        ("id" = Uuid, Path, description = "GRN id"),
        ("item_no" = String, Path, description = "Item number")
    ),
    responses(
        (status = 200, description = "Item removed", body = GrnResponse),
        (status = 404, description = "GRN or item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "grn"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((id, item_no)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let grn = state
        .services
        .grn
        .delete_item(id, &item_no)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(GrnResponse::from(grn)))
}
