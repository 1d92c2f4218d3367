//! Canonical plan shape handed to the presentation layer.
//!
//! Field names serialize in camelCase so a plan round-trips through the same
//! JSON contract the reasoning service is asked to produce.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Camera IR-cut filter mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IrMode {
    #[default]
    Astro,
    Vis,
}

impl IrMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IrMode::Astro => "Astro",
            IrMode::Vis => "Vis",
        }
    }

    /// Case-insensitive parse of the two accepted tokens.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "astro" => Some(IrMode::Astro),
            "vis" => Some(IrMode::Vis),
            _ => None,
        }
    }
}

impl fmt::Display for IrMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSettings {
    pub exposure: String,
    pub gain: String,
    pub filter: String,
    pub binning: String,
    pub ir_mode: IrMode,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObservingTarget {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub why: String,
    pub settings: CaptureSettings,
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub date: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub desc: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub moon_phase: String,
    pub weather: String,
    /// Suitability score, 0..=100.
    pub score: u8,
    pub strategy: String,
}

impl Default for SessionSummary {
    fn default() -> Self {
        Self {
            moon_phase: String::new(),
            weather: "Check your local forecast before heading out.".to_string(),
            score: 50,
            strategy: "Favour bright, high-altitude targets and confirm conditions on site."
                .to_string(),
        }
    }
}

/// A complete observing plan.
///
/// `summary` and `targets` are always present; a degraded plan carries the
/// reason in `error`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub summary: SessionSummary,
    pub targets: Vec<ObservingTarget>,
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
    #[serde(default)]
    pub calendar_display: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Plan {
    /// Whether this plan is a degraded fallback.
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}
