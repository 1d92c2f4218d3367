//! Reply normalization and repair.
//!
//! The reasoning service returns text that is usually, but not reliably, a JSON
//! plan. [`normalize`] is total: it extracts the bracketed payload, repairs
//! missing top-level keys, coerces fields leniently, and falls back to a fixed
//! plan when nothing usable is left. Moon phase and calendar display are always
//! overwritten with values computed locally.
//!
//! Repair only reshapes the top level. Deeper problems (a number where a string
//! belongs, an unknown `irMode`) are coerced, never a reason to fall back.

use log::{debug, warn};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{ErrorContext, PlannerError, PlannerResult};
use crate::models::{
    CalendarEvent, CalendarFocus, CaptureSettings, IrMode, MoonPhaseReading, ObservingTarget, Plan,
    PlanRequest, SessionSummary,
};
use crate::services::moon_phase::compute_moon_phase;
use crate::services::reasoning::{FailureKind, ReasoningReply, ServiceFailure};

/// Locally computed values that override whatever the service claims.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundTruth {
    pub moon: MoonPhaseReading,
    pub calendar_focus: CalendarFocus,
}

impl GroundTruth {
    pub fn new(moon: MoonPhaseReading, calendar_focus: CalendarFocus) -> Self {
        Self {
            moon,
            calendar_focus,
        }
    }

    /// Compute the ground truth for a validated request.
    pub fn for_request(request: &PlanRequest) -> Self {
        Self::new(compute_moon_phase(request.session_date), request.calendar_focus)
    }
}

/// Why a fallback plan was substituted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    MalformedOutput,
    ServiceUnavailable,
    QuotaExceeded,
}

impl FailureCategory {
    pub const ALL: [FailureCategory; 3] = [
        FailureCategory::MalformedOutput,
        FailureCategory::ServiceUnavailable,
        FailureCategory::QuotaExceeded,
    ];

    /// Category of an error text produced by [`FailureCategory::describe`].
    pub fn of_error_text(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| text.starts_with(c.label()))
    }

    fn label(&self) -> &'static str {
        match self {
            FailureCategory::MalformedOutput => "Malformed output",
            FailureCategory::ServiceUnavailable => "Service unavailable",
            FailureCategory::QuotaExceeded => "Quota exceeded",
        }
    }

    /// Error text attached to a fallback plan.
    pub fn describe(&self, detail: &str) -> String {
        if detail.is_empty() {
            self.label().to_string()
        } else {
            format!("{}: {}", self.label(), detail)
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<FailureKind> for FailureCategory {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::RateLimited => FailureCategory::QuotaExceeded,
            FailureKind::Unavailable | FailureKind::Timeout => FailureCategory::ServiceUnavailable,
        }
    }
}

// =============================================================================
// Extraction
// =============================================================================

fn span_between(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    (end > start).then(|| &raw[start..=end])
}

/// Candidate JSON spans, preferred first. An array is preferred when its
/// opening bracket comes before the first brace.
fn candidate_spans(raw: &str) -> Vec<&str> {
    let object = span_between(raw, '{', '}');
    let array = span_between(raw, '[', ']');
    let array_first = match (raw.find('['), raw.find('{')) {
        (Some(a), Some(o)) => a < o,
        (Some(_), None) => true,
        _ => false,
    };

    let ordered = if array_first {
        [array, object]
    } else {
        [object, array]
    };
    ordered.into_iter().flatten().collect()
}

/// Locate the outermost JSON object or array in free text (prose, code fences).
pub fn extract_json_span(raw: &str) -> Option<&str> {
    candidate_spans(raw).into_iter().next()
}

// =============================================================================
// Lenient field coercion
// =============================================================================

fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| coerce_string(Some(v)))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}

fn coerce_score(value: Option<&Value>, default: u8) -> u8 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s
            .trim()
            .trim_end_matches('%')
            .trim_end_matches("/100")
            .trim()
            .parse::<f64>()
            .ok(),
        _ => None,
    };
    match raw {
        Some(v) if v.is_finite() => v.round().clamp(0.0, 100.0) as u8,
        _ => default,
    }
}

fn coerce_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| coerce_string(Some(v)))
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

fn summary_from(value: Option<&Value>) -> SessionSummary {
    let defaults = SessionSummary::default();
    let Some(Value::Object(obj)) = value else {
        return defaults;
    };
    SessionSummary {
        moon_phase: coerce_string(obj.get("moonPhase")),
        weather: or_default(coerce_string(obj.get("weather")), &defaults.weather),
        score: coerce_score(obj.get("score"), defaults.score),
        strategy: or_default(coerce_string(obj.get("strategy")), &defaults.strategy),
    }
}

fn settings_from(value: Option<&Value>) -> CaptureSettings {
    let Some(Value::Object(obj)) = value else {
        return CaptureSettings::default();
    };
    CaptureSettings {
        exposure: coerce_string(obj.get("exposure")),
        gain: coerce_string(obj.get("gain")),
        filter: coerce_string(obj.get("filter")),
        binning: coerce_string(obj.get("binning")),
        ir_mode: obj
            .get("irMode")
            .and_then(Value::as_str)
            .and_then(IrMode::parse)
            .unwrap_or_default(),
    }
}

fn target_from(value: &Value) -> Option<ObservingTarget> {
    match value {
        Value::Object(obj) => Some(ObservingTarget {
            name: coerce_string(obj.get("name")),
            kind: coerce_string(obj.get("type")),
            why: coerce_string(obj.get("why")),
            settings: settings_from(obj.get("settings")),
            tips: coerce_string_list(obj.get("tips")),
        }),
        Value::String(name) if !name.trim().is_empty() => Some(ObservingTarget {
            name: name.trim().to_string(),
            ..Default::default()
        }),
        _ => None,
    }
}

fn event_from(value: &Value) -> Option<CalendarEvent> {
    let Value::Object(obj) = value else {
        return None;
    };
    Some(CalendarEvent {
        date: coerce_string(obj.get("date")),
        name: coerce_string(obj.get("name")),
        kind: coerce_string(obj.get("type")),
        desc: coerce_string(obj.get("desc")),
    })
}

fn targets_from(items: &[Value]) -> Vec<ObservingTarget> {
    items.iter().filter_map(target_from).collect()
}

// =============================================================================
// Shape repair
// =============================================================================

/// Find the targets list in a parsed object, adopting the first other
/// list-valued key (events excluded) when `targets` is missing.
fn locate_targets(obj: &Map<String, Value>) -> Vec<ObservingTarget> {
    match obj.get("targets") {
        Some(Value::Array(items)) => return targets_from(items),
        Some(single @ Value::Object(_)) => {
            debug!("wrapping single target object into a list");
            return target_from(single).into_iter().collect();
        }
        _ => {}
    }

    let adopted = obj
        .iter()
        .filter(|(key, _)| key.as_str() != "events" && key.as_str() != "targets")
        .find_map(|(key, value)| value.as_array().map(|items| (key, items)));

    match adopted {
        Some((key, items)) => {
            debug!("adopting list-valued key '{}' as targets", key);
            targets_from(items)
        }
        None => Vec::new(),
    }
}

/// An `error` field survives only when it is one of our own fallback texts;
/// anything else the service wrote there is dropped.
fn payload_error(obj: &Map<String, Value>) -> Option<String> {
    let text = obj.get("error").and_then(Value::as_str)?;
    match FailureCategory::of_error_text(text) {
        Some(_) => Some(text.to_string()),
        None => {
            warn!("ignoring unrecognised error field in reply: {:?}", text);
            None
        }
    }
}

fn repair_object(obj: &Map<String, Value>) -> Plan {
    if !obj.contains_key("summary") {
        debug!("reply missing summary; synthesizing default");
    }
    let events = match obj.get("events") {
        Some(Value::Array(items)) => items.iter().filter_map(event_from).collect(),
        _ => {
            debug!("reply missing events; defaulting to empty");
            Vec::new()
        }
    };

    Plan {
        summary: summary_from(obj.get("summary")),
        targets: locate_targets(obj),
        events,
        calendar_display: String::new(),
        error: payload_error(obj),
    }
}

fn repair_value(value: &Value) -> PlannerResult<Plan> {
    let plan = match value {
        Value::Array(items) => {
            debug!("reply is a bare list; wrapping as targets");
            Plan {
                summary: SessionSummary::default(),
                targets: targets_from(items),
                ..Default::default()
            }
        }
        Value::Object(obj) => repair_object(obj),
        other => {
            return Err(PlannerError::malformed_output_with_context(
                format!("expected an object or list, got {}", json_kind(other)),
                ErrorContext::new("repair_plan"),
            ))
        }
    };

    if plan.targets.is_empty() {
        return Err(PlannerError::malformed_output_with_context(
            "reply contained no observing targets",
            ErrorContext::new("repair_plan"),
        ));
    }
    Ok(plan)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Extract, parse and repair a reply into a plan without ground truth applied.
/// Errors are always [`PlannerError::MalformedOutput`].
pub fn try_repair(raw: &str) -> PlannerResult<Plan> {
    let spans = candidate_spans(raw);
    if spans.is_empty() {
        return Err(PlannerError::malformed_output_with_context(
            "no JSON object or list found in reply",
            ErrorContext::new("extract_json_span"),
        ));
    }

    let mut last_parse_error = String::new();
    for span in spans {
        match serde_json::from_str::<Value>(span) {
            Ok(value) => return repair_value(&value),
            Err(e) => last_parse_error = e.to_string(),
        }
    }

    Err(PlannerError::malformed_output_with_context(
        "reply could not be parsed as JSON",
        ErrorContext::new("parse_reply").with_details(last_parse_error),
    ))
}

// =============================================================================
// Fallback and ground truth
// =============================================================================

fn fallback_target(
    name: &str,
    kind: &str,
    why: &str,
    settings: (&str, &str, &str, &str, IrMode),
    tip: &str,
) -> ObservingTarget {
    let (exposure, gain, filter, binning, ir_mode) = settings;
    ObservingTarget {
        name: name.to_string(),
        kind: kind.to_string(),
        why: why.to_string(),
        settings: CaptureSettings {
            exposure: exposure.to_string(),
            gain: gain.to_string(),
            filter: filter.to_string(),
            binning: binning.to_string(),
            ir_mode,
        },
        tips: vec![tip.to_string()],
    }
}

/// Fixed plan substituted when no usable reply exists.
pub fn fallback_plan(category: FailureCategory, detail: &str, truth: &GroundTruth) -> Plan {
    let mut plan = Plan {
        summary: SessionSummary {
            moon_phase: String::new(),
            weather: "Unknown. Live planning was not available; check your local forecast.".to_string(),
            score: 50,
            strategy: "Showing bright, forgiving showpiece targets. Try again later for a plan \
                       tailored to tonight."
                .to_string(),
        },
        targets: vec![
            fallback_target(
                "Orion Nebula (M42)",
                "Emission Nebula",
                "Bright enough to cut through moonlight and light pollution.",
                ("10s", "80", "Dual-band", "2x2", IrMode::Astro),
                "Keep subs short to avoid blowing out the Trapezium core.",
            ),
            fallback_target(
                "Pleiades (M45)",
                "Open Cluster",
                "Brilliant blue stars that frame well in any field of view.",
                ("10s", "60", "None", "1x1", IrMode::Vis),
                "Dark skies reveal the faint reflection nebulosity around the stars.",
            ),
            fallback_target(
                "Andromeda Galaxy (M31)",
                "Galaxy",
                "The brightest large galaxy in the northern sky.",
                ("15s", "80", "None", "2x2", IrMode::Vis),
                "Stack for at least an hour to bring out the dust lanes.",
            ),
        ],
        events: Vec::new(),
        calendar_display: String::new(),
        error: Some(category.describe(detail)),
    };
    apply_ground_truth(&mut plan, truth);
    plan
}

/// Overwrite the fields the service is never trusted with.
pub fn apply_ground_truth(plan: &mut Plan, truth: &GroundTruth) {
    plan.summary.moon_phase = truth.moon.display();
    plan.calendar_display = truth.calendar_focus.display();
}

/// Turn raw reply text into a canonical plan. Never fails.
pub fn normalize(raw: &str, truth: &GroundTruth) -> Plan {
    match try_repair(raw) {
        Ok(mut plan) => {
            apply_ground_truth(&mut plan, truth);
            plan
        }
        Err(err) => {
            warn!("substituting fallback plan: {}", err);
            fallback_plan(FailureCategory::MalformedOutput, err.message(), truth)
        }
    }
}

/// Turn the adapter outcome into a canonical plan. Never fails.
pub fn resolve_outcome(outcome: Result<ReasoningReply, ServiceFailure>, truth: &GroundTruth) -> Plan {
    match outcome {
        Ok(reply) => normalize(&reply.text, truth),
        Err(failure) => {
            warn!("substituting fallback plan: {}", failure);
            fallback_plan(FailureCategory::from(failure.kind), &failure.message, truth)
        }
    }
}
