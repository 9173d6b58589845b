use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::controllers::dashboard_controller::DashboardController;
use crate::dto::dashboard_dto::{
    AccommodationStats, DashboardStats, DashboardSummary, SummaryQuery, TodayBookingEntry, UpcomingBookingEntry,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_dashboard_router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(summary))
        .route("/stats", get(stats))
        .route("/upcoming-bookings", get(upcoming_bookings))
        .route("/todays-bookings", get(todays_bookings))
        .route("/accommodation-stats", get(accommodation_stats))
}

fn controller(state: &AppState) -> DashboardController {
    DashboardController::new(state.pool.clone(), state.dashboard_cache.clone())
}

async fn summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<DashboardSummary>, AppError> {
    Ok(Json(controller(&state).summary(query).await?))
}

async fn stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(controller(&state).stats().await?))
}

async fn upcoming_bookings(State(state): State<AppState>) -> Result<Json<Vec<UpcomingBookingEntry>>, AppError> {
    Ok(Json(controller(&state).upcoming_bookings().await?))
}

async fn todays_bookings(State(state): State<AppState>) -> Result<Json<Vec<TodayBookingEntry>>, AppError> {
    Ok(Json(controller(&state).todays_bookings().await?))
}

async fn accommodation_stats(State(state): State<AppState>) -> Result<Json<AccommodationStats>, AppError> {
    Ok(Json(controller(&state).accommodation_stats().await?))
}
