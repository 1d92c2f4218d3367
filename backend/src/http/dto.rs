//! Data Transfer Objects for the HTTP API.
//!
//! Plans and optics profiles are returned as-is since the domain types already
//! carry the wire names. Only the envelopes that have no domain counterpart
//! live here.

use serde::{Deserialize, Serialize};

use crate::models::{MoonPhaseReading, SessionInput};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Crate version
    pub version: String,
    /// Primary reasoning model
    pub model: String,
}

/// Query parameters for `GET /v1/optics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpticsQuery {
    #[serde(default)]
    pub equipment: Option<String>,
}

/// Query parameters for `GET /v1/moon-phase`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoonPhaseQuery {
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: String,
}

/// Moon reading plus the string the planner writes into plan summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoonPhaseResponse {
    pub date: String,
    #[serde(flatten)]
    pub reading: MoonPhaseReading,
    pub display: String,
}

/// Request body for `POST /v1/plan`.
///
/// Every field defaults to empty so a missing field is reported by the
/// planner's own validation (400 with the field name) instead of a
/// deserialization rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreatePlanRequest {
    pub location: String,
    pub equipment: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// `YYYY-MM`
    pub calendar_month: Option<String>,
}

impl From<CreatePlanRequest> for SessionInput {
    fn from(body: CreatePlanRequest) -> Self {
        SessionInput {
            location: body.location,
            equipment: body.equipment,
            date: body.date,
            start_time: body.start_time,
            end_time: body.end_time,
            calendar_month: body.calendar_month,
        }
    }
}
