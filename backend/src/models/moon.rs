use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean length of the synodic month in days.
pub const SYNODIC_MONTH_DAYS: f64 = 29.53059;

/// The eight named lunar phases, in cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoonPhase {
    New,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    Full,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    /// Human-readable phase name.
    pub fn name(&self) -> &'static str {
        match self {
            MoonPhase::New => "New Moon",
            MoonPhase::WaxingCrescent => "Waxing Crescent",
            MoonPhase::FirstQuarter => "First Quarter",
            MoonPhase::WaxingGibbous => "Waxing Gibbous",
            MoonPhase::Full => "Full Moon",
            MoonPhase::WaningGibbous => "Waning Gibbous",
            MoonPhase::LastQuarter => "Last Quarter",
            MoonPhase::WaningCrescent => "Waning Crescent",
        }
    }
}

impl fmt::Display for MoonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Moon state for one calendar date. Recomputed per request, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoonPhaseReading {
    pub phase: MoonPhase,
    /// Illuminated fraction of the disc, 0..=100.
    pub illumination_percent: u8,
    /// Days since the most recent new moon, in `[0, SYNODIC_MONTH_DAYS)`.
    pub cycle_age_days: f64,
}

impl MoonPhaseReading {
    /// Display string written into `summary.moonPhase`, e.g. `"Waxing Gibbous (95%)"`.
    pub fn display(&self) -> String {
        format!("{} ({}%)", self.phase.name(), self.illumination_percent)
    }

    /// Days until the next full moon; zero while the moon is in its full band.
    pub fn days_until_full(&self) -> f64 {
        let half = SYNODIC_MONTH_DAYS / 2.0;
        if self.phase == MoonPhase::Full {
            0.0
        } else {
            (half - self.cycle_age_days).rem_euclid(SYNODIC_MONTH_DAYS)
        }
    }

    /// Days until the next new moon.
    pub fn days_until_new(&self) -> f64 {
        SYNODIC_MONTH_DAYS - self.cycle_age_days
    }
}

impl fmt::Display for MoonPhaseReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}
