use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::vehicle_controller::VehicleController;
use crate::dto::common::ApiResponse;
use crate::dto::vehicle_dto::{
    AssignDriverRequest, AssignDriverResponse, AvailableDriver, ScheduleQuery, VehicleRequest, VehicleResponse,
    VehicleScheduleResponse, VehicleStatusEntry,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route("/available-drivers", get(available_drivers))
        .route("/status", get(vehicles_status))
        .route("/:id", get(get_vehicle).put(update_vehicle).delete(delete_vehicle))
        .route("/:id/assign-driver", post(assign_driver))
        .route("/:id/schedule", get(vehicle_schedule))
}

async fn list_vehicles(State(state): State<AppState>) -> Result<Json<Vec<VehicleResponse>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    Ok(Json(controller.list().await?))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<VehicleResponse>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    Ok(Json(controller.get_by_id(id).await?))
}

async fn create_vehicle(
    State(state): State<AppState>,
    Json(request): Json<VehicleRequest>,
) -> Result<(StatusCode, Json<VehicleResponse>), AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<VehicleRequest>,
) -> Result<Json<VehicleResponse>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message("Vehicle deleted successfully")))
}

async fn assign_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignDriverRequest>,
) -> Result<Json<AssignDriverResponse>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    let driver_id = request.driver_id.flatten();
    Ok(Json(controller.assign_driver(id, driver_id).await?))
}

async fn available_drivers(State(state): State<AppState>) -> Result<Json<Vec<AvailableDriver>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    Ok(Json(controller.available_drivers().await?))
}

async fn vehicle_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<VehicleScheduleResponse>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    Ok(Json(controller.schedule(id, query).await?))
}

async fn vehicles_status(State(state): State<AppState>) -> Result<Json<Vec<VehicleStatusEntry>>, AppError> {
    let controller = VehicleController::new(state.pool.clone());
    Ok(Json(controller.status().await?))
}
