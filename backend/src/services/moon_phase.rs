//! Approximate lunar phase from a calendar date.
//!
//! Uses a mean synodic month counted from a fixed reference new moon. This is a
//! planning aid, not an ephemeris: expect errors of up to a day.

use chrono::NaiveDate;

use crate::error::{ErrorContext, PlannerError, PlannerResult};
use crate::models::{MoonPhase, MoonPhaseReading, SYNODIC_MONTH_DAYS};

/// Reference new moon (2025-11-20).
pub const REFERENCE_NEW_MOON: (i32, u32, u32) = (2025, 11, 20);

/// Half-width in days of the quarter and full bands.
const NAMED_BAND_HALF_WIDTH: f64 = 0.5;

/// Width in days of the new-moon band at the start of the cycle.
const NEW_BAND_WIDTH: f64 = 1.0;

fn reference_new_moon() -> NaiveDate {
    let (y, m, d) = REFERENCE_NEW_MOON;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// Parse a `YYYY-MM-DD` session date.
pub fn parse_session_date(value: &str) -> PlannerResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        PlannerError::invalid_input_with_context(
            format!("'{}' is not a YYYY-MM-DD date", value),
            ErrorContext::new("parse_session_date")
                .with_field("date")
                .with_details(e.to_string()),
        )
    })
}

/// Signed whole days from the reference new moon to `date`.
pub fn days_since_reference(date: NaiveDate) -> i64 {
    (date - reference_new_moon()).num_days()
}

/// Moon phase for a calendar date.
pub fn compute_moon_phase(date: NaiveDate) -> MoonPhaseReading {
    moon_phase_for_days(days_since_reference(date) as f64)
}

/// Moon phase for a `YYYY-MM-DD` string.
pub fn moon_phase_for_date_str(value: &str) -> PlannerResult<MoonPhaseReading> {
    parse_session_date(value).map(compute_moon_phase)
}

/// Moon phase for a (possibly negative, possibly fractional) day offset from
/// the reference new moon.
pub fn moon_phase_for_days(days: f64) -> MoonPhaseReading {
    // Floored modulo: dates before the reference must still land in [0, S)
    let mut age = days.rem_euclid(SYNODIC_MONTH_DAYS);
    if age >= SYNODIC_MONTH_DAYS {
        age = 0.0;
    }
    moon_phase_for_age(age)
}

/// Classify a cycle age in `[0, SYNODIC_MONTH_DAYS)` into a phase and an
/// illumination percentage.
pub fn moon_phase_for_age(age: f64) -> MoonPhaseReading {
    let quarter = SYNODIC_MONTH_DAYS / 4.0;
    let half = SYNODIC_MONTH_DAYS / 2.0;
    let last_quarter = 3.0 * quarter;
    let w = NAMED_BAND_HALF_WIDTH;

    let waxing_pct = || ramp_percent(age / half);
    let waning_pct = || ramp_percent((SYNODIC_MONTH_DAYS - age) / half);

    let (phase, illumination_percent) = if age < NEW_BAND_WIDTH {
        (MoonPhase::New, 0)
    } else if age < quarter - w {
        (MoonPhase::WaxingCrescent, waxing_pct())
    } else if age < quarter + w {
        (MoonPhase::FirstQuarter, 50)
    } else if age < half - w {
        (MoonPhase::WaxingGibbous, waxing_pct())
    } else if age < half + w {
        (MoonPhase::Full, 100)
    } else if age < last_quarter - w {
        (MoonPhase::WaningGibbous, waning_pct())
    } else if age < last_quarter + w {
        (MoonPhase::LastQuarter, 50)
    } else {
        (MoonPhase::WaningCrescent, waning_pct())
    };

    MoonPhaseReading {
        phase,
        illumination_percent,
        cycle_age_days: age,
    }
}

fn ramp_percent(fraction: f64) -> u8 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_reference_date_is_new_moon() {
        let r = compute_moon_phase(date(2025, 11, 20));
        assert_eq!(r.phase, MoonPhase::New);
        assert_eq!(r.illumination_percent, 0);
        assert_eq!(r.cycle_age_days, 0.0);
    }

    #[test]
    fn test_fourteen_days_after_reference() {
        let r = moon_phase_for_date_str("2025-12-04").unwrap();
        assert!((r.cycle_age_days - 14.0).abs() < 1e-9);
        assert_eq!(r.phase, MoonPhase::WaxingGibbous);
        assert_eq!(r.illumination_percent, 95);
        assert_eq!(r.display(), "Waxing Gibbous (95%)");
    }

    #[test]
    fn test_day_before_reference_wraps_forward() {
        let r = compute_moon_phase(date(2025, 11, 19));
        assert!((r.cycle_age_days - (SYNODIC_MONTH_DAYS - 1.0)).abs() < 1e-9);
        assert_eq!(r.phase, MoonPhase::WaningCrescent);
        assert_eq!(r.illumination_percent, 7);
    }

    #[test]
    fn test_far_past_date_is_in_range() {
        let r = compute_moon_phase(date(1969, 7, 20));
        assert!(r.cycle_age_days >= 0.0);
        assert!(r.cycle_age_days < SYNODIC_MONTH_DAYS);
    }

    #[test]
    fn test_named_bands_are_fixed() {
        let quarter = SYNODIC_MONTH_DAYS / 4.0;
        assert_eq!(moon_phase_for_age(quarter).phase, MoonPhase::FirstQuarter);
        assert_eq!(moon_phase_for_age(quarter).illumination_percent, 50);
        assert_eq!(moon_phase_for_age(2.0 * quarter).phase, MoonPhase::Full);
        assert_eq!(moon_phase_for_age(2.0 * quarter).illumination_percent, 100);
        assert_eq!(moon_phase_for_age(3.0 * quarter).phase, MoonPhase::LastQuarter);
        assert_eq!(moon_phase_for_age(3.0 * quarter).illumination_percent, 50);
        assert_eq!(moon_phase_for_age(0.5).phase, MoonPhase::New);
    }

    #[test]
    fn test_bands_are_ordered() {
        let expected = [
            (0.2, MoonPhase::New),
            (3.0, MoonPhase::WaxingCrescent),
            (7.4, MoonPhase::FirstQuarter),
            (11.0, MoonPhase::WaxingGibbous),
            (14.8, MoonPhase::Full),
            (18.0, MoonPhase::WaningGibbous),
            (22.1, MoonPhase::LastQuarter),
            (26.0, MoonPhase::WaningCrescent),
            (29.5, MoonPhase::WaningCrescent),
        ];
        for (age, phase) in expected {
            assert_eq!(moon_phase_for_age(age).phase, phase, "age {}", age);
        }
    }

    #[test]
    fn test_waxing_illumination_increases() {
        let a = moon_phase_for_age(2.0).illumination_percent;
        let b = moon_phase_for_age(5.0).illumination_percent;
        let c = moon_phase_for_age(10.0).illumination_percent;
        assert!(a < b && b < c);
        assert!(c < 100);
    }

    #[test]
    fn test_waning_illumination_decreases() {
        let a = moon_phase_for_age(17.0).illumination_percent;
        let b = moon_phase_for_age(20.0).illumination_percent;
        let c = moon_phase_for_age(27.0).illumination_percent;
        assert!(a > b && b > c);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "tomorrow", "2025-13-01", "2025-02-30", "04/12/2025"] {
            let err = parse_session_date(bad).unwrap_err();
            assert!(err.is_invalid_input(), "{}", bad);
        }
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(parse_session_date(" 2025-12-04 ").unwrap(), date(2025, 12, 4));
    }

    proptest! {
        #[test]
        fn prop_cycle_age_in_range(days in -200_000i64..200_000i64) {
            let r = moon_phase_for_days(days as f64);
            prop_assert!(r.cycle_age_days >= 0.0);
            prop_assert!(r.cycle_age_days < SYNODIC_MONTH_DAYS);
            prop_assert!(r.illumination_percent <= 100);
        }

        #[test]
        fn prop_periodic_over_synodic_month(days in -100_000i64..100_000i64) {
            let a = moon_phase_for_days(days as f64);
            let b = moon_phase_for_days(days as f64 + SYNODIC_MONTH_DAYS);
            let diff = (a.cycle_age_days - b.cycle_age_days).abs();
            let circular = diff.min(SYNODIC_MONTH_DAYS - diff);
            prop_assert!(circular < 1e-6);
            prop_assert!((a.illumination_percent as i16 - b.illumination_percent as i16).abs() <= 1);
        }

        #[test]
        fn prop_dates_before_reference_are_valid(offset in 1i64..50_000i64) {
            let d = reference_new_moon() - chrono::Duration::days(offset);
            let r = compute_moon_phase(d);
            prop_assert!(r.cycle_age_days >= 0.0 && r.cycle_age_days < SYNODIC_MONTH_DAYS);
        }
    }
}
