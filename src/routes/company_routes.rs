use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::company_controller::CompanyController;
use crate::dto::common::ApiResponse;
use crate::dto::company_dto::{
    CompanyClientsDetailedResponse, CompanyClientsResponse, CompanyRequest, CompanyResponse, PeriodQuery,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_company_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_companies).post(create_company))
        .route("/:id", get(get_company).put(update_company).delete(delete_company))
        .route("/:id/clients", get(company_clients))
        .route("/:id/clients/detailed", get(company_clients_detailed))
}

async fn list_companies(State(state): State<AppState>) -> Result<Json<Vec<CompanyResponse>>, AppError> {
    let controller = CompanyController::new(state.pool.clone());
    Ok(Json(controller.list().await?))
}

async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompanyResponse>, AppError> {
    let controller = CompanyController::new(state.pool.clone());
    Ok(Json(controller.get_by_id(id).await?))
}

async fn create_company(
    State(state): State<AppState>,
    Json(request): Json<CompanyRequest>,
) -> Result<(StatusCode, Json<CompanyResponse>), AppError> {
    let controller = CompanyController::new(state.pool.clone());
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CompanyRequest>,
) -> Result<Json<CompanyResponse>, AppError> {
    let controller = CompanyController::new(state.pool.clone());
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = CompanyController::new(state.pool.clone());
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message("Company deleted successfully")))
}

async fn company_clients(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompanyClientsResponse>, AppError> {
    let controller = CompanyController::new(state.pool.clone());
    Ok(Json(controller.clients(id).await?))
}

async fn company_clients_detailed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<CompanyClientsDetailedResponse>, AppError> {
    let controller = CompanyController::new(state.pool.clone());
    Ok(Json(controller.clients_detailed(id, query).await?))
}
