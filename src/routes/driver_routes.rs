use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::driver_controller::DriverController;
use crate::dto::common::ApiResponse;
use crate::dto::driver_dto::{AssignVehiclesRequest, AssignVehiclesResponse, DriverRequest, DriverResponse};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_driver_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_drivers).post(create_driver))
        .route("/:id", get(get_driver).put(update_driver).delete(delete_driver))
        .route("/:id/assign-vehicles", put(assign_vehicles))
}

async fn list_drivers(State(state): State<AppState>) -> Result<Json<Vec<DriverResponse>>, AppError> {
    let controller = DriverController::new(state.pool.clone());
    Ok(Json(controller.list().await?))
}

async fn get_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DriverResponse>, AppError> {
    let controller = DriverController::new(state.pool.clone());
    Ok(Json(controller.get_by_id(id).await?))
}

async fn create_driver(
    State(state): State<AppState>,
    Json(request): Json<DriverRequest>,
) -> Result<(StatusCode, Json<DriverResponse>), AppError> {
    let controller = DriverController::new(state.pool.clone());
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn update_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DriverRequest>,
) -> Result<Json<DriverResponse>, AppError> {
    let controller = DriverController::new(state.pool.clone());
    Ok(Json(controller.update(id, request).await?))
}

async fn assign_vehicles(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignVehiclesRequest>,
) -> Result<Json<AssignVehiclesResponse>, AppError> {
    let controller = DriverController::new(state.pool.clone());
    Ok(Json(controller.assign_vehicles(id, request.vehicle_ids).await?))
}

async fn delete_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = DriverController::new(state.pool.clone());
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message("Driver deleted successfully")))
}
