//! Performance, quality and OEE composition.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::window::TimeWindow;

/// Round to two decimals, halves away from zero, as the decimal literal
/// reads: `1.005` rounds to `1.01` even though its binary value is just
/// below the half. The scaled value is nudged by a few ulps before rounding,
/// so only values within that distance of a half move.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    let nudged = scaled + scaled.signum() * scaled.abs() * 4.0 * f64::EPSILON;
    nudged.round() / 100.0
}

/// Source of rejected (scrap) production for the quality ratio.
///
/// No rejection telemetry exists yet; [`NoRejects`] reports zero. A real
/// implementation plugs in here without touching the quality formula.
pub trait RejectedProduction: Send + Sync {
    /// Rejected weight in tonnes for a device over a window.
    fn rejected_weight(&self, device_id: &str, window: &TimeWindow) -> Result<f64>;
}

/// Reports no rejected production.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRejects;

impl RejectedProduction for NoRejects {
    fn rejected_weight(&self, _device_id: &str, _window: &TimeWindow) -> Result<f64> {
        Ok(0.0)
    }
}

/// `actual / target × 100`, or `0` without a target.
pub fn performance(actual_weight: f64, target_weight: f64) -> f64 {
    if target_weight == 0.0 {
        0.0
    } else {
        actual_weight / target_weight * 100.0
    }
}

/// `actual / (actual + rejected) × 100`, or `100` when nothing was produced.
pub fn quality(actual_weight: f64, rejected_weight: f64) -> f64 {
    if actual_weight == 0.0 {
        100.0
    } else {
        actual_weight / (actual_weight + rejected_weight) * 100.0
    }
}

/// `availability × performance / 100`, or `0` when either factor is zero.
pub fn oee(availability: f64, performance: f64) -> f64 {
    if availability == 0.0 || performance == 0.0 {
        0.0
    } else {
        availability * performance / 100.0
    }
}

/// The dashboard KPI record, every figure rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OeeReport {
    #[serde(rename = "OEE")]
    pub oee: f64,
    #[serde(rename = "Availability")]
    pub availability: f64,
    #[serde(rename = "Performance")]
    pub performance: f64,
    #[serde(rename = "Quality")]
    pub quality: f64,
}

impl OeeReport {
    /// Compose the report from unrounded inputs. Rounding happens once, at
    /// the end, so OEE is built from the unrounded factors.
    pub fn compose(
        availability: f64,
        actual_weight: f64,
        target_weight: f64,
        rejected_weight: f64,
    ) -> Self {
        let perf = performance(actual_weight, target_weight);
        let report = Self {
            oee: round2(oee(availability, perf)),
            availability: round2(availability),
            performance: round2(perf),
            quality: round2(quality(actual_weight, rejected_weight)),
        };
        if report.availability > 100.0 || report.performance > 100.0 {
            log::warn!(
                "KPI above 100 %: availability={} performance={} (actual={actual_weight}, target={target_weight})",
                report.availability,
                report.performance
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.346), 12.35);
        assert_eq!(round2(12.344), 12.34);
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(99.999), 100.0);
    }

    #[test]
    fn test_round2_decimal_halves() {
        assert_eq!(round2(1.005), 1.01);
        assert_eq!(round2(2.675), 2.68);
        assert_eq!(round2(-1.005), -1.01);
        assert_eq!(round2(1.0049), 1.0);
        assert_eq!(round2(83.333_333), 83.33);
    }

    #[test]
    fn test_performance_zero_target() {
        assert_eq!(performance(5.0, 0.0), 0.0);
        assert!((performance(1.0, 4.0) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_quality_defaults() {
        assert_eq!(quality(0.0, 0.0), 100.0);
        assert_eq!(quality(3.0, 0.0), 100.0);
        assert!((quality(3.0, 1.0) - 75.0).abs() < 1e-12);
    }

    #[test]
    fn test_oee_zero_factors() {
        assert_eq!(oee(0.0, 80.0), 0.0);
        assert_eq!(oee(80.0, 0.0), 0.0);
        assert!((oee(80.0, 50.0) - 40.0).abs() < 1e-12);
    }

    #[test]
    fn test_compose_rounds_every_figure() {
        let r = OeeReport::compose(66.666_666, 1.0, 3.0, 0.0);
        assert_eq!(r.availability, 66.67);
        assert_eq!(r.performance, 33.33);
        assert_eq!(r.quality, 100.0);
        // 66.666666 × 33.333333 / 100 = 22.2222
        assert_eq!(r.oee, 22.22);
    }

    #[test]
    fn test_compose_does_not_clamp() {
        let r = OeeReport::compose(100.0, 2.0, 1.0, 0.0);
        assert_eq!(r.performance, 200.0);
        assert_eq!(r.oee, 200.0);
    }

    #[test]
    fn test_report_field_names() {
        let r = OeeReport::compose(50.0, 1.0, 2.0, 0.0);
        let v = serde_json::to_value(r).unwrap();
        assert_eq!(v["OEE"], 25.0);
        assert_eq!(v["Availability"], 50.0);
        assert_eq!(v["Performance"], 50.0);
        assert_eq!(v["Quality"], 100.0);
    }

    #[test]
    fn test_no_rejects_is_zero() {
        use chrono::{TimeZone, Utc};
        let t = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let w = TimeWindow::new(t, t).unwrap();
        assert_eq!(NoRejects.rejected_weight("d", &w).unwrap(), 0.0);
    }
}
