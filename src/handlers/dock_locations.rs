use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{
    auth::AuthUser, entities::dock_location, errors::ApiError, handlers::AppState,
    services::locations::CreateDockLocationInput,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DockLocationResponse {
    pub id: Uuid,
    pub dock_code: String,
    pub capacity: i32,
    pub description: Option<String>,
    pub location_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<dock_location::Model> for DockLocationResponse {
    fn from(model: dock_location::Model) -> Self {
        Self {
            id: model.id,
            dock_code: model.dock_code,
            capacity: model.capacity,
            description: model.description,
            location_code: model.location_code,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Register a receiving dock
#[utoipa::path(
    post,
    path = "/api/v1/dock-locations",
    request_body = CreateDockLocationInput,
    responses(
        (status = 201, description = "Dock location created", body = DockLocationResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Dock or location code already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "dock-locations"
)]
pub async fn create_dock_location(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<CreateDockLocationInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let created = state
        .services
        .locations
        .create_dock_location(payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(DockLocationResponse::from(created)))
}

/// List receiving docks
#[utoipa::path(
    get,
    path = "/api/v1/dock-locations",
    responses((status = 200, description = "All dock locations", body = [DockLocationResponse])),
    tag = "dock-locations"
)]
pub async fn list_dock_locations(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let docks = state
        .services
        .locations
        .list_dock_locations()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(
        docks
            .into_iter()
            .map(DockLocationResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// Remove a receiving dock (admin only)
#[utoipa::path(
    delete,
    path = "/api/v1/dock-locations/{id}",
    params(("id" = Uuid, Path, description = "Dock location id")),
    responses(
        (status = 204, description = "Dock location deleted"),
        (status = 403, description = "Caller is not an admin", body = crate::errors::ErrorResponse),
        (status = 404, description = "Dock location not found", body = crate::errors::ErrorResponse)
    ),
    tag = "dock-locations"
)]
pub async fn delete_dock_location(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .locations
        .delete_dock_location(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}
