//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};

use super::dto::{CreatePlanRequest, HealthResponse, MoonPhaseQuery, MoonPhaseResponse, OpticsQuery};
use super::error::AppError;
use super::state::AppState;
use crate::models::{OpticsProfile, Plan, SessionInput};
use crate::services::moon_phase_for_date_str;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.planner.settings().model.clone(),
    }))
}

// =============================================================================
// Deterministic lookups
// =============================================================================

/// GET /v1/optics?equipment=...
///
/// Resolve an equipment name to its optics profile. A missing or empty name
/// yields the generic telescope.
pub async fn get_optics(
    State(state): State<AppState>,
    Query(query): Query<OpticsQuery>,
) -> HandlerResult<OpticsProfile> {
    Ok(Json(state.planner.lookup_optics(query.equipment.as_deref())))
}

/// GET /v1/moon-phase?date=YYYY-MM-DD
pub async fn get_moon_phase(Query(query): Query<MoonPhaseQuery>) -> HandlerResult<MoonPhaseResponse> {
    let reading = moon_phase_for_date_str(&query.date)?;
    Ok(Json(MoonPhaseResponse {
        date: query.date.trim().to_string(),
        display: reading.display(),
        reading,
    }))
}

// =============================================================================
// Planning
// =============================================================================

/// POST /v1/plan
///
/// Produce a session plan. Only invalid input is reported as an HTTP error
/// (including a body that is not valid JSON for [`CreatePlanRequest`]);
/// service problems come back as a 200 with a fallback plan and `error` set.
pub async fn create_plan(
    State(state): State<AppState>,
    body: Result<Json<CreatePlanRequest>, JsonRejection>,
) -> HandlerResult<Plan> {
    let Json(request) = body?;
    let input = SessionInput::from(request);
    let plan = state.planner.plan_session(&input).await?;
    Ok(Json(plan))
}
