use super::common::{created_response, map_service_error, success_response};
use crate::{auth::AuthUser, errors::ApiError, handlers::AppState};
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceMasterListRequest {
    /// Item numbers parsed from the uploaded sheet
    #[serde(default)]
    pub item_nos: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReplaceMasterListResponse {
    pub message: String,
    pub count: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMasterListItemRequest {
    #[serde(default)]
    pub item_no: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMasterListItemResponse {
    pub message: String,
    pub item_no: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MasterListResponse {
    pub item_nos: Vec<String>,
}

/// Replace the whole master list (admin only)
#[utoipa::path(
    put,
    path = "/api/v1/master-list",
    request_body = ReplaceMasterListRequest,
    responses(
        (status = 200, description = "Master list replaced", body = ReplaceMasterListResponse),
        (status = 403, description = "Caller is not an admin", body = crate::errors::ErrorResponse)
    ),
    tag = "master-list"
)]
pub async fn replace_master_list(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<ReplaceMasterListRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let count = state
        .services
        .master_list
        .replace(payload.item_nos)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ReplaceMasterListResponse {
        message: "Master list updated successfully".to_string(),
        count,
    }))
}

/// Add one item number to the master list (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/master-list/items",
    request_body = AddMasterListItemRequest,
    responses(
        (status = 201, description = "Item added", body = AddMasterListItemResponse),
        (status = 400, description = "Item number is required", body = crate::errors::ErrorResponse),
        (status = 409, description = "Item number already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "master-list"
)]
pub async fn add_master_list_item(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<AddMasterListItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let item_no = state
        .services
        .master_list
        .add_item(&payload.item_no)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(AddMasterListItemResponse {
        message: "Item added successfully".to_string(),
        item_no,
    }))
}

/// List all master list item numbers
#[utoipa::path(
    get,
    path = "/api/v1/master-list",
    responses((status = 200, description = "Authorised item numbers", body = MasterListResponse)),
    tag = "master-list"
)]
pub async fn list_master_list(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let item_nos = state
        .services
        .master_list
        .list()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(MasterListResponse { item_nos }))
}
