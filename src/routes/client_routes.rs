use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::client_controller::ClientController;
use crate::dto::client_dto::{ClientBookingsResponse, ClientRequest, ClientResponse, PaymentRequest};
use crate::dto::common::ApiResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_client_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route("/:id", get(get_client).put(update_client).delete(delete_client))
        .route("/:id/bookings", get(client_bookings))
        .route("/:id/payment", put(update_payment))
}

async fn list_clients(State(state): State<AppState>) -> Result<Json<Vec<ClientResponse>>, AppError> {
    let controller = ClientController::new(state.pool.clone());
    Ok(Json(controller.list().await?))
}

async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClientResponse>, AppError> {
    let controller = ClientController::new(state.pool.clone());
    Ok(Json(controller.get_by_id(id).await?))
}

async fn create_client(
    State(state): State<AppState>,
    Json(request): Json<ClientRequest>,
) -> Result<(StatusCode, Json<ClientResponse>), AppError> {
    let controller = ClientController::new(state.pool.clone());
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ClientRequest>,
) -> Result<Json<ClientResponse>, AppError> {
    let controller = ClientController::new(state.pool.clone());
    Ok(Json(controller.update(id, request).await?))
}

async fn update_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<ClientResponse>, AppError> {
    let controller = ClientController::new(state.pool.clone());
    Ok(Json(controller.update_payment(id, request).await?))
}

async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = ClientController::new(state.pool.clone());
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message("Client deleted successfully")))
}

async fn client_bookings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClientBookingsResponse>, AppError> {
    let controller = ClientController::new(state.pool.clone());
    Ok(Json(controller.bookings(id).await?))
}
