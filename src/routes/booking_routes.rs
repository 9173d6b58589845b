use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::booking_controller::BookingController;
use crate::dto::booking_dto::{BookingCreatedResponse, BookingRequest, BookingResponse};
use crate::dto::common::ApiResponse;
use crate::models::ServiceType;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_booking_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route("/service-types", get(service_types))
        .route("/:id", get(get_booking).put(update_booking).delete(delete_booking))
}

async fn list_bookings(State(state): State<AppState>) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    Ok(Json(controller.list().await?))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    Ok(Json(controller.get_by_id(id).await?))
}

async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingCreatedResponse>), AppError> {
    let controller = BookingController::new(state.pool.clone());
    let id = controller.create(request).await?;
    state.dashboard_cache.invalidate().await;

    Ok((
        StatusCode::CREATED,
        Json(BookingCreatedResponse {
            message: "Booking added successfully".to_string(),
            id,
        }),
    ))
}

async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    controller.update(id, request).await?;
    state.dashboard_cache.invalidate().await;
    Ok(Json(ApiResponse::message("Booking updated successfully")))
}

async fn delete_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = BookingController::new(state.pool.clone());
    controller.delete(id).await?;
    state.dashboard_cache.invalidate().await;
    Ok(Json(ApiResponse::message("Booking and all related data deleted successfully")))
}

async fn service_types() -> Json<Vec<&'static str>> {
    Json(ServiceType::OFFERED.iter().map(|t| t.as_str()).collect())
}
