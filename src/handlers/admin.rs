use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::models::{AcademySettings, AppointmentStatus};
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/appointments
#[derive(Deserialize)]
pub struct AppointmentsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct AppointmentResponse {
    id: String,
    name: String,
    phone: String,
    email: String,
    class_type: String,
    scheduled_date: String,
    scheduled_time: String,
    status: String,
    notes: Option<String>,
    created_at: String,
}

pub async fn get_appointments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<Vec<AppointmentResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let status_filter = query.status.as_deref().map(AppointmentStatus::parse);

    let appointments = {
        let db = db::lock(&state.db)?;
        queries::list_appointments(&db, status_filter, limit)?
    };

    let response = appointments
        .into_iter()
        .map(|a| AppointmentResponse {
            id: a.id,
            name: a.name,
            phone: a.phone,
            email: a.email,
            class_type: a.class_type,
            scheduled_date: a.scheduled_date.format("%Y-%m-%d").to_string(),
            scheduled_time: a.scheduled_time,
            status: a.status.as_str().to_string(),
            notes: a.notes,
            created_at: a.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();

    Ok(Json(response))
}

// GET /api/admin/settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AcademySettings>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = db::lock(&state.db)?;
    Ok(Json(queries::get_settings(&db)?))
}

// POST /api/admin/settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(mut settings): Json<AcademySettings>,
) -> Result<Json<AcademySettings>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    settings.whatsapp = settings
        .whatsapp
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if settings.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }
    if settings.whatsapp.is_empty() {
        return Err(AppError::BadRequest(
            "whatsapp must contain digits".to_string(),
        ));
    }

    {
        let db = db::lock(&state.db)?;
        queries::save_settings(&db, &settings)?;
    }
    tracing::info!(name = %settings.name, "academy settings updated");

    Ok(Json(settings))
}
