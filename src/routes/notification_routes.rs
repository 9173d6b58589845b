use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::notification_controller::NotificationController;
use crate::dto::common::MessageResponse;
use crate::dto::notification_dto::{
    AdminSettingsRequest, AdminSettingsResponse, CompanyNotificationRequest, CompanyNotificationResponse,
    FormattedNotificationRequest, NotificationResponse, ScheduleResponse, SendNotificationRequest,
    SendResultResponse, TestNotificationRequest, UpcomingNotificationsResponse, WebhookVerifyQuery,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

const SIGNATURE_HEADER: &str = "x-hub-signature-256";

pub fn create_notification_router() -> Router<AppState> {
    Router::new()
        .route("/send", post(send_notification))
        .route("/send-formatted", post(send_formatted))
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .route("/driver/:driver_id", get(driver_notifications))
        .route("/company/:company_id", post(notify_company))
        .route("/schedule", post(schedule_notifications))
        .route("/upcoming", get(upcoming_notifications))
        .route("/test", post(test_notification))
        .route("/admin-settings", get(admin_settings).post(update_admin_settings))
}

fn controller(state: &AppState) -> NotificationController {
    NotificationController::new(state.pool.clone(), state.notifier.clone())
}

async fn send_notification(
    State(state): State<AppState>,
    Json(request): Json<SendNotificationRequest>,
) -> Result<(StatusCode, Json<NotificationResponse>), AppError> {
    let notification = controller(&state).send(request).await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

async fn send_formatted(
    State(state): State<AppState>,
    Json(request): Json<FormattedNotificationRequest>,
) -> Result<Response, AppError> {
    let response = controller(&state).send_formatted(request).await?;
    let status = if response.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    Ok((status, Json(response)).into_response())
}

async fn verify_webhook(
    State(state): State<AppState>,
    Query(query): Query<WebhookVerifyQuery>,
) -> Result<String, AppError> {
    controller(&state).verify_webhook(query).await
}

async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    controller(&state).receive_webhook(signature, &body).await?;
    Ok("OK")
}

async fn driver_notifications(
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    Ok(Json(controller(&state).list_for_driver(driver_id).await?))
}

async fn notify_company(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    request: Option<Json<CompanyNotificationRequest>>,
) -> Result<Json<CompanyNotificationResponse>, AppError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(controller(&state).notify_company(company_id, request).await?))
}

async fn schedule_notifications(State(state): State<AppState>) -> Result<Json<ScheduleResponse>, AppError> {
    Ok(Json(controller(&state).schedule().await?))
}

async fn upcoming_notifications(
    State(state): State<AppState>,
) -> Result<Json<UpcomingNotificationsResponse>, AppError> {
    Ok(Json(controller(&state).upcoming().await?))
}

async fn test_notification(
    State(state): State<AppState>,
    Json(request): Json<TestNotificationRequest>,
) -> Result<Json<SendResultResponse>, AppError> {
    Ok(Json(controller(&state).send_test(request).await?))
}

async fn admin_settings(State(state): State<AppState>) -> Result<Json<AdminSettingsResponse>, AppError> {
    Ok(Json(controller(&state).admin_settings().await?))
}

async fn update_admin_settings(
    State(state): State<AppState>,
    Json(request): Json<AdminSettingsRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    controller(&state).update_admin_settings(request).await?;
    Ok(Json(MessageResponse::new("Bildirim ayarları başarıyla güncellendi")))
}
