use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{Map, Value};

use crate::controllers::settings_controller::SettingsController;
use crate::dto::common::MessageResponse;
use crate::dto::notification_dto::SendResultResponse;
use crate::dto::settings_dto::{
    AdminPhonesRequest, AdminPhonesResponse, BackupResponse, EmailSettingsView, MetaWhatsappSettingsView,
    RestoreRequest, SettingValueRequest, TestTemplateRequest, TestWhatsappRequest,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_settings_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_settings))
        .route("/meta-whatsapp", get(meta_whatsapp).post(update_meta_whatsapp))
        .route("/admin-phones", get(admin_phones).post(update_admin_phones))
        .route("/email", get(email_settings).post(update_email_settings))
        .route("/test-meta-whatsapp", post(test_meta_whatsapp))
        .route("/test-turkish-template", post(test_turkish_template))
        .route("/backup", get(backup_settings))
        .route("/restore", post(restore_settings))
        .route("/:key", get(get_setting).post(update_setting))
}

fn controller(state: &AppState) -> SettingsController {
    SettingsController::new(state.pool.clone(), state.notifier.clone())
}

async fn list_settings(State(state): State<AppState>) -> Result<Json<Map<String, Value>>, AppError> {
    Ok(Json(controller(&state).list().await?))
}

async fn get_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Map<String, Value>>, AppError> {
    Ok(Json(controller(&state).get(&key).await?))
}

async fn update_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<SettingValueRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let message = controller(&state).update(&key, &request.value).await?;
    Ok(Json(MessageResponse::new(message)))
}

async fn meta_whatsapp(State(state): State<AppState>) -> Result<Json<MetaWhatsappSettingsView>, AppError> {
    Ok(Json(controller(&state).meta_whatsapp().await?))
}

async fn update_meta_whatsapp(
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<MessageResponse>, AppError> {
    controller(&state).update_meta_whatsapp(&body).await?;
    Ok(Json(MessageResponse::new("Meta WhatsApp ayarları başarıyla güncellendi")))
}

async fn admin_phones(State(state): State<AppState>) -> Result<Json<AdminPhonesResponse>, AppError> {
    Ok(Json(controller(&state).admin_phones().await?))
}

async fn update_admin_phones(
    State(state): State<AppState>,
    Json(request): Json<AdminPhonesRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    controller(&state).update_admin_phones(&request.phone_numbers).await?;
    Ok(Json(MessageResponse::new("Yönetici telefon numaraları başarıyla güncellendi")))
}

async fn email_settings(State(state): State<AppState>) -> Result<Json<EmailSettingsView>, AppError> {
    Ok(Json(controller(&state).email().await?))
}

async fn update_email_settings(
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<MessageResponse>, AppError> {
    controller(&state).update_email(&body).await?;
    Ok(Json(MessageResponse::new("E-posta ayarları başarıyla güncellendi")))
}

async fn test_meta_whatsapp(
    State(state): State<AppState>,
    Json(request): Json<TestWhatsappRequest>,
) -> Result<Json<SendResultResponse>, AppError> {
    Ok(Json(controller(&state).test_whatsapp(request.test_phone).await?))
}

async fn test_turkish_template(
    State(state): State<AppState>,
    Json(request): Json<TestTemplateRequest>,
) -> Result<Json<SendResultResponse>, AppError> {
    Ok(Json(controller(&state).test_turkish_template(request).await?))
}

async fn backup_settings(State(state): State<AppState>) -> Result<Json<BackupResponse>, AppError> {
    Ok(Json(controller(&state).backup().await?))
}

async fn restore_settings(
    State(state): State<AppState>,
    Json(request): Json<RestoreRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    controller(&state).restore(&request.settings).await?;
    Ok(Json(MessageResponse::new("Ayarlar başarıyla geri yüklendi")))
}
