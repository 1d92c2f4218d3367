//! Service layer for the planning pipeline.
//!
//! The deterministic calculators (`moon_phase`, `optics`) feed the brief
//! builder, the reasoning adapter sends the brief out, and the normalizer turns
//! whatever comes back into a canonical [`crate::models::Plan`]. The `planner`
//! module wires the stages together.

pub mod brief;
pub mod moon_phase;
pub mod normalizer;
pub mod optics;
pub mod planner;
pub mod reasoning;

pub use brief::{build_brief, MissionBrief, PromptProfile};
pub use moon_phase::{compute_moon_phase, moon_phase_for_age, moon_phase_for_date_str, parse_session_date};
pub use normalizer::{
    apply_ground_truth, extract_json_span, fallback_plan, normalize, resolve_outcome, try_repair,
    FailureCategory, GroundTruth,
};
pub use optics::{lookup_optics, resolve_optics};
pub use planner::{ServiceSettings, SessionPlanner};
pub use reasoning::{
    FailureKind, GeminiReasoningService, ModelInfo, ReasoningReply, ReasoningRequest,
    ReasoningService, ServiceFailure,
};
