//! Mission brief assembly.
//!
//! Pure string building: the session facts and computed moon data become the
//! primary content, and the rule set plus schema contract become the steering
//! instruction. No I/O happens here.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::PlannerResult;
use crate::models::{MoonPhaseReading, OpticsProfile, PlanRequest};

/// Built-in prompt profile version.
pub const DEFAULT_PROMPT_VERSION: &str = "v3";

/// Domain rules the reasoning service must honour.
pub const DEFAULT_RULE_SET: &str = r#"You are "Starlight", an expert astrophotography session planner.
Assess the night sky conditions, equipment and location, then recommend the best deep-sky targets.

LOGIC RULES (strict adherence required)
1. MOONLIGHT IMPACT
   - Moon illumination > 50%: reduce gain/ISO to prevent sky background washout.
   - Moon illumination > 75%: avoid faint broadband targets (galaxies, reflection nebulae). Prioritise emission nebulae with narrowband or dual-band filters.
   - Moon illumination < 40%: broadband targets (galaxies) are safe.
   - The moon phase, illumination and cycle age in the brief are ground truth. Do not recompute them.
2. DEVICE CONSTRAINTS
   - Dwarf II: maximum exposure 15 s. Binning 2x2 (2K) for deep-sky objects. UHC/dual-band filter if the Moon is bright.
   - Dwarf 3: exposures of 15 s to 20 s.
   - Seestar S50 / S30: exposures of 10 s, 20 s or 30 s only. Enable the dual-band filter for nebulae. Gain: high.
3. SETTINGS FORMAT
   - irMode must be exactly "Astro" or "Vis".
   - gain must be numeric only (for example "80"), never words.
   - filter must name a physical filter (for example "Dual-band", "UHC", "L-eXtreme") or "None". Never a sensor mode.
4. TARGETS
   - Exactly 3 targets, high in the sky for the given location during the session window.
   - Give a suitability score from 0 to 100 based on the moon and expected weather.
5. EVENTS
   - List astronomical events in the requested calendar month only.
   - Events must agree with the supplied moon age: never list a full or new moon as upcoming if the age shows it has already passed.
6. OUTPUT
   - Respond with a single JSON object that follows the schema contract. No prose, no code fences."#;

/// Required JSON shape of a plan.
pub const DEFAULT_SCHEMA_CONTRACT: &str = r#"{
  "summary": { "moonPhase": "string", "weather": "string", "score": 0, "strategy": "string" },
  "targets": [
    {
      "name": "string",
      "type": "string",
      "why": "string",
      "settings": { "exposure": "string", "gain": "string", "filter": "string", "binning": "string", "irMode": "Astro | Vis" },
      "tips": ["string"]
    }
  ],
  "events": [ { "date": "YYYY-MM-DD", "name": "string", "type": "string", "desc": "string" } ]
}"#;

/// Swappable prompt pieces. Variants of the pipeline differ only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptProfile {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_rule_set")]
    pub rule_set: String,
    #[serde(default = "default_schema_contract")]
    pub schema_contract: String,
}

fn default_version() -> String {
    DEFAULT_PROMPT_VERSION.to_string()
}

fn default_rule_set() -> String {
    DEFAULT_RULE_SET.to_string()
}

fn default_schema_contract() -> String {
    DEFAULT_SCHEMA_CONTRACT.to_string()
}

impl Default for PromptProfile {
    fn default() -> Self {
        Self {
            version: default_version(),
            rule_set: default_rule_set(),
            schema_contract: default_schema_contract(),
        }
    }
}

impl PromptProfile {
    /// Steering instruction: rule set followed by the schema contract.
    pub fn instruction(&self) -> String {
        format!(
            "{}\n\nSCHEMA CONTRACT (prompt {})\n{}",
            self.rule_set.trim_end(),
            self.version,
            self.schema_contract.trim()
        )
    }
}

/// Brief ready to send to the reasoning service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionBrief {
    /// Session facts and tonight's directives.
    pub content: String,
    /// Rule set and schema contract.
    pub instruction: String,
}

impl MissionBrief {
    /// SHA-256 hex digest over content and instruction, for log correlation.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.content.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.instruction.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Assemble the mission brief for one request.
pub fn build_brief(
    request: &PlanRequest,
    moon: &MoonPhaseReading,
    optics: &OpticsProfile,
    profile: &PromptProfile,
) -> PlannerResult<MissionBrief> {
    request.validate()?;

    let mut lines = vec![
        "MISSION BRIEF".to_string(),
        format!("Session date: {}", request.session_date.format("%Y-%m-%d")),
    ];
    match (request.start_time, request.end_time) {
        (Some(start), Some(end)) => {
            lines.push(format!("Time window: {} to {}", start.format("%H:%M"), end.format("%H:%M")))
        }
        (Some(start), None) => lines.push(format!("Time window: from {}", start.format("%H:%M"))),
        (None, Some(end)) => lines.push(format!("Time window: until {}", end.format("%H:%M"))),
        (None, None) => {}
    }
    lines.push(format!(
        "Moon (ground truth, trust this over your own estimate): {}, {}% illuminated, cycle age {:.1} days",
        moon.phase.name(),
        moon.illumination_percent,
        moon.cycle_age_days
    ));
    lines.push(format!("Location: {}", request.location));
    lines.push(format!(
        "Equipment: {} (identified as {}, field of view {})",
        request.equipment_id, optics.canonical_name, optics.field_of_view_descriptor
    ));
    lines.push(format!("Calendar focus: {}", request.calendar_focus.display()));

    lines.push(String::new());
    lines.push("TONIGHT'S DIRECTIVES".to_string());
    lines.extend(directives(request, moon, optics).into_iter().map(|d| format!("- {}", d)));

    lines.push(String::new());
    lines.push("Return exactly 3 targets as a single JSON object following the schema contract.".to_string());

    let mut content = lines.join("\n");
    content.push('\n');

    Ok(MissionBrief {
        content,
        instruction: profile.instruction(),
    })
}

fn directives(request: &PlanRequest, moon: &MoonPhaseReading, optics: &OpticsProfile) -> Vec<String> {
    let pct = moon.illumination_percent;
    let mut out = Vec::new();

    if pct > 50 {
        out.push(format!(
            "Moon is {}% illuminated: reduce gain to prevent sky background washout.",
            pct
        ));
    }
    if pct > 75 {
        out.push(
            "Moon is above 75%: deprioritise broadband targets (galaxies, reflection nebulae). \
             Recommend emission nebulae with narrowband filters only (dual-band or UHC)."
                .to_string(),
        );
    } else if pct < 40 {
        out.push(format!(
            "Moon is {}% illuminated: broadband targets, including galaxies, are unrestricted.",
            pct
        ));
    }

    if let Some(rule) = &optics.exposure_rule {
        out.push(rule.clone());
    }

    out.push(format!(
        "List events for {} only.",
        request.calendar_focus.display()
    ));
    out.push(format!(
        "Next full moon is {:.0} days after the session date and next new moon {:.0} days after it; \
         do not list lunar events that contradict this.",
        moon.days_until_full(),
        moon.days_until_new()
    ));

    out
}
