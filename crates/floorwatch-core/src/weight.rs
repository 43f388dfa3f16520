//! Production weight estimation.
//!
//! Output mass is the volume of drawn material times its density:
//!
//! ```text
//! weight [t] = π · (diameter_mm / 2000)² · length · density / 1000
//! ```
//!
//! The actual weight integrates line speed over the time between adjacent
//! samples. The target weight replaces the observed speed with the best speed
//! seen that day, scaled by how much of each minute the machine was running.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use chrono::NaiveDate;
use serde::Serialize;

use crate::availability::bucket_by_minute;
use crate::config::{DiameterPolicy, EngineConfig};
use crate::sample::Sample;

/// Mass in tonnes of `length` units of material with the given diameter in mm.
pub fn mass(diameter_mm: f64, length: f64, density: f64) -> f64 {
    let radius_m = diameter_mm / 2000.0;
    PI * radius_m * radius_m * length * density / 1000.0
}

// ---------------------------------------------------------------------------
// Actual weight
// ---------------------------------------------------------------------------

/// Sum of per-interval masses over chronologically adjacent samples that
/// carry a line speed. An interval contributes only when both of its samples
/// report a numeric line speed and diameter; the opening sample's values are
/// used for the interval. The last sample closes nothing.
pub fn actual_weight(samples: &[Sample], config: &EngineConfig) -> f64 {
    let keys = &config.keys;
    let series: Vec<&Sample> = samples.iter().filter(|s| s.has(&keys.line_speed)).collect();

    series
        .windows(2)
        .filter_map(|pair| {
            let (open, close) = (pair[0], pair[1]);
            let speed = open.number(&keys.line_speed)?;
            let diameter = open.number(&keys.diameter)?;
            close.number(&keys.line_speed)?;
            close.number(&keys.diameter)?;
            let elapsed = (close.timestamp - open.timestamp).num_milliseconds() as f64 / 60_000.0;
            Some(mass(diameter, elapsed * speed, config.density))
        })
        .sum()
}

// ---------------------------------------------------------------------------
// Target weight
// ---------------------------------------------------------------------------

/// Theoretical output at the best observed speed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TargetEstimate {
    /// Σ uptime_ratio × day_max_speed × bucket_span over all minute buckets.
    pub target_length: f64,
    pub target_weight: f64,
    /// Number of distinct diameters observed in the window.
    pub distinct_diameters: usize,
    /// Number of minute buckets the target length was built from.
    pub buckets: usize,
}

/// Distinct numeric diameters in order of first appearance.
pub fn distinct_diameters(samples: &[Sample], config: &EngineConfig) -> Vec<f64> {
    let mut seen: Vec<f64> = Vec::new();
    for d in samples.iter().filter_map(|s| s.number(&config.keys.diameter)) {
        if !seen.iter().any(|x| x.to_bits() == d.to_bits()) {
            seen.push(d);
        }
    }
    seen
}

/// Target length over the window from minute buckets of samples carrying
/// both status and line speed. Returns `(length, bucket_count)`.
pub fn target_length(samples: &[Sample], config: &EngineConfig) -> (f64, usize) {
    let keys = &config.keys;
    let buckets = bucket_by_minute(
        samples
            .iter()
            .filter(|s| s.has(&keys.status) && s.has(&keys.line_speed)),
        keys,
    );

    let mut day_max: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for b in &buckets {
        if let Some(speed) = b.max_line_speed {
            day_max
                .entry(b.day())
                .and_modify(|m| *m = m.max(speed))
                .or_insert(speed);
        }
    }

    let length = buckets
        .iter()
        .filter_map(|b| {
            let max_speed = day_max.get(&b.day())?;
            Some(b.uptime_ratio() * max_speed * b.span_minutes())
        })
        .sum();
    (length, buckets.len())
}

/// Target length converted to weight with the diameter(s) chosen by the
/// configured [`DiameterPolicy`].
pub fn target_weight(samples: &[Sample], config: &EngineConfig) -> TargetEstimate {
    let (length, buckets) = target_length(samples, config);
    let diameters = distinct_diameters(samples, config);

    if diameters.len() > 1 {
        log::warn!(
            "{} distinct diameters in window ({:?}); target weight uses policy '{}'",
            diameters.len(),
            diameters,
            config.diameter_policy
        );
    }

    let chosen: &[f64] = match config.diameter_policy {
        DiameterPolicy::First => &diameters[..diameters.len().min(1)],
        DiameterPolicy::SumDistinct => &diameters,
    };
    let weight = if length == 0.0 {
        0.0
    } else {
        chosen.iter().map(|&d| mass(d, length, config.density)).sum()
    };

    TargetEstimate {
        target_length: length,
        target_weight: weight,
        distinct_diameters: diameters.len(),
        buckets,
    }
}
