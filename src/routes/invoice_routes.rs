use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::invoice_controller::{GenerationOutcome, InvoiceController, InvoiceRef};
use crate::dto::common::{ApiResponse, MessageResponse};
use crate::dto::invoice_dto::{
    ClientInvoiceRequest, InvoiceListEntry, MonthlyInvoiceRequest, MonthlyInvoiceResponse,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_invoice_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices))
        .route("/monthly-company", get(monthly_company_invoices))
        .route("/monthly/generate", post(generate_monthly))
        .route("/monthly/:id", delete(delete_monthly))
        .route("/client/:client_id/generate", post(generate_for_client))
        .route("/download/:filename", get(download_invoice))
        .route("/:id", delete(delete_invoice))
}

fn controller(state: &AppState) -> InvoiceController {
    InvoiceController::new(state.pool.clone(), &state.config)
}

async fn list_invoices(State(state): State<AppState>) -> Result<Json<Vec<InvoiceListEntry>>, AppError> {
    Ok(Json(controller(&state).list().await?))
}

async fn monthly_company_invoices(
    State(state): State<AppState>,
) -> Result<Json<Vec<MonthlyInvoiceResponse>>, AppError> {
    Ok(Json(controller(&state).monthly_with_items().await?))
}

fn outcome_response(outcome: GenerationOutcome) -> Response {
    match outcome {
        GenerationOutcome::Generated(body) => (StatusCode::CREATED, Json(body)).into_response(),
        GenerationOutcome::NothingToInvoice(message) => {
            (StatusCode::OK, Json(MessageResponse::new(message))).into_response()
        }
    }
}

async fn generate_monthly(
    State(state): State<AppState>,
    Json(request): Json<MonthlyInvoiceRequest>,
) -> Result<Response, AppError> {
    let outcome = controller(&state).generate_monthly(request).await?;
    Ok(outcome_response(outcome))
}

async fn generate_for_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    request: Option<Json<ClientInvoiceRequest>>,
) -> Result<Response, AppError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let outcome = controller(&state).generate_for_client(client_id, request).await?;
    Ok(outcome_response(outcome))
}

async fn download_invoice(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let bytes = controller(&state).download(&filename).await?;
    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let reference = InvoiceRef::parse(&id)?;
    controller(&state).delete(reference).await?;
    Ok(Json(ApiResponse::message("Invoice deleted successfully")))
}

async fn delete_monthly(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    controller(&state).delete(InvoiceRef::Monthly(id)).await?;
    Ok(Json(ApiResponse::message("Monthly invoice deleted successfully")))
}
