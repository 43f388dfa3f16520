//! Produced length per month and reel-change counting.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use crate::config::TelemetryKeys;
use crate::sample::Sample;

/// Production of one device in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyProduction {
    pub year: i32,
    pub month: u32,
    pub min_counter: f64,
    pub max_counter: f64,
}

impl MonthlyProduction {
    pub fn produced(&self) -> f64 {
        self.max_counter - self.min_counter
    }
}

/// Group the month-production counter by `(year, month)`.
///
/// The device resets its counter at month boundaries, so `max - min` is only
/// meaningful inside one group.
pub fn monthly_production(samples: &[Sample], keys: &TelemetryKeys) -> Vec<MonthlyProduction> {
    let mut months: BTreeMap<(i32, u32), MonthlyProduction> = BTreeMap::new();
    for sample in samples {
        let Some(counter) = sample.number(&keys.month_production) else {
            continue;
        };
        let (year, month) = (sample.timestamp.year(), sample.timestamp.month());
        months
            .entry((year, month))
            .and_modify(|m| {
                m.min_counter = m.min_counter.min(counter);
                m.max_counter = m.max_counter.max(counter);
            })
            .or_insert(MonthlyProduction {
                year,
                month,
                min_counter: counter,
                max_counter: counter,
            });
    }
    months.into_values().collect()
}

/// Produced length over the window: Σ (max − min) per month, rounded.
pub fn produced_length(samples: &[Sample], keys: &TelemetryKeys) -> i64 {
    monthly_production(samples, keys)
        .iter()
        .map(MonthlyProduction::produced)
        .sum::<f64>()
        .round() as i64
}

/// Count `0 → 1` transitions of the reel-change indicator.
///
/// Only samples that report the indicator take part; the comparison is always
/// against the previous reported value, however far back it is.
pub fn reel_count(samples: &[Sample], keys: &TelemetryKeys) -> u64 {
    let mut prev: Option<String> = None;
    let mut count = 0;
    for current in samples.iter().filter_map(|s| s.text(&keys.reel_change)) {
        if prev.as_deref() == Some("0") && current == "1" {
            count += 1;
        }
        prev = Some(current);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    fn keys() -> TelemetryKeys {
        TelemetryKeys::default()
    }

    fn counter(month: u32, day: u32, v: f64) -> Sample {
        Sample::new("d", Utc.with_ymd_and_hms(2025, month, day, 12, 0, 0).unwrap())
            .with("This Month Production", v)
    }

    fn reel(min: u32, v: Value) -> Sample {
        Sample::new("d", Utc.with_ymd_and_hms(2025, 3, 1, 8, min, 0).unwrap())
            .with("P_DT_BOBIN_FORMER_CHANGE", v)
    }

    // -----------------------------------------------------------------------
    // Produced length
    // -----------------------------------------------------------------------

    #[test]
    fn test_month_boundary_groups_separately() {
        let samples = vec![
            counter(1, 10, 10.0),
            counter(1, 30, 50.0),
            counter(2, 2, 5.0),
            counter(2, 20, 30.0),
        ];
        assert_eq!(produced_length(&samples, &keys()), 65);
        let months = monthly_production(&samples, &keys());
        assert_eq!(months.len(), 2);
        assert_eq!((months[0].year, months[0].month), (2025, 1));
        assert_eq!(months[1].produced(), 25.0);
    }

    #[test]
    fn test_produced_length_rounds() {
        let samples = vec![counter(3, 1, 0.0), counter(3, 2, 10.6)];
        assert_eq!(produced_length(&samples, &keys()), 11);
    }

    #[test]
    fn test_produced_length_ignores_missing_counter() {
        let samples = vec![
            counter(3, 1, 100.0),
            Sample::new("d", Utc.with_ymd_and_hms(2025, 3, 5, 0, 0, 0).unwrap()),
            counter(3, 9, 140.0),
        ];
        assert_eq!(produced_length(&samples, &keys()), 40);
    }

    #[test]
    fn test_produced_length_empty() {
        assert_eq!(produced_length(&[], &keys()), 0);
    }

    // -----------------------------------------------------------------------
    // Reel count
    // -----------------------------------------------------------------------

    #[test]
    fn test_reel_transitions() {
        let samples: Vec<Sample> = ["0", "0", "1", "1", "0", "1"]
            .iter()
            .enumerate()
            .map(|(i, v)| reel(i as u32, Value::from(*v)))
            .collect();
        assert_eq!(reel_count(&samples, &keys()), 2);
    }

    #[test]
    fn test_reel_gaps_do_not_break_transition() {
        let samples = vec![
            reel(0, Value::from("0")),
            Sample::new("d", Utc.with_ymd_and_hms(2025, 3, 1, 8, 1, 0).unwrap()),
            reel(2, Value::Null),
            reel(3, Value::from("1")),
        ];
        assert_eq!(reel_count(&samples, &keys()), 1);
    }

    #[test]
    fn test_reel_numeric_values() {
        let samples = vec![reel(0, Value::from(0)), reel(1, Value::from(1))];
        assert_eq!(reel_count(&samples, &keys()), 1);
    }

    #[test]
    fn test_reel_first_value_one_is_not_a_transition() {
        let samples = vec![reel(0, Value::from("1")), reel(1, Value::from("1"))];
        assert_eq!(reel_count(&samples, &keys()), 0);
    }
}
