//! Per-minute bucketing and period availability.
//!
//! Sensor polling is not fixed-rate, so availability weights each minute by
//! its uptime *ratio* rather than by raw sample counts:
//!
//! ```text
//! availability = Σ uptime_ratio / (Σ uptime_ratio + Σ downtime_ratio) × 100
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::config::TelemetryKeys;
use crate::sample::Sample;

/// Truncate an instant to the start of its minute.
pub fn truncate_to_minute(ts: DateTime<Utc>) -> DateTime<Utc> {
    let secs = ts.timestamp();
    DateTime::from_timestamp(secs - secs.rem_euclid(60), 0).unwrap_or(ts)
}

/// Samples of one device that fell into the same minute.
#[derive(Debug, Clone, PartialEq)]
pub struct MinuteBucket {
    pub minute: DateTime<Utc>,
    pub data_points: u32,
    /// Samples reporting status `1`.
    pub uptime_points: u32,
    /// Samples reporting status `0`.
    pub downtime_points: u32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Highest line speed reported inside the minute.
    pub max_line_speed: Option<f64>,
}

impl MinuteBucket {
    fn empty(minute: DateTime<Utc>, ts: DateTime<Utc>) -> Self {
        Self {
            minute,
            data_points: 0,
            uptime_points: 0,
            downtime_points: 0,
            first_seen: ts,
            last_seen: ts,
            max_line_speed: None,
        }
    }

    fn fold(&mut self, sample: &Sample, keys: &TelemetryKeys) {
        self.data_points += 1;
        match sample.number(&keys.status) {
            Some(v) if v == 1.0 => self.uptime_points += 1,
            Some(v) if v == 0.0 => self.downtime_points += 1,
            _ => {}
        }
        self.first_seen = self.first_seen.min(sample.timestamp);
        self.last_seen = self.last_seen.max(sample.timestamp);
        if let Some(speed) = sample.number(&keys.line_speed) {
            self.max_line_speed = Some(self.max_line_speed.map_or(speed, |m| m.max(speed)));
        }
    }

    pub fn uptime_ratio(&self) -> f64 {
        ratio(self.uptime_points, self.data_points)
    }

    pub fn downtime_ratio(&self) -> f64 {
        ratio(self.downtime_points, self.data_points)
    }

    /// Minutes between the first and last sample inside the bucket.
    pub fn span_minutes(&self) -> f64 {
        (self.last_seen - self.first_seen).num_milliseconds() as f64 / 60_000.0
    }

    /// Calendar day (UTC) the bucket belongs to.
    pub fn day(&self) -> NaiveDate {
        self.minute.date_naive()
    }
}

fn ratio(points: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        points as f64 / total as f64
    }
}

/// Group samples into minute buckets, ascending by minute.
///
/// Every sample passed in is counted; callers pre-filter for the attributes
/// the bucket must carry. Buckets only exist for minutes with samples.
pub fn bucket_by_minute<'a>(
    samples: impl IntoIterator<Item = &'a Sample>,
    keys: &TelemetryKeys,
) -> Vec<MinuteBucket> {
    let mut buckets: BTreeMap<DateTime<Utc>, MinuteBucket> = BTreeMap::new();
    for sample in samples {
        let minute = truncate_to_minute(sample.timestamp);
        buckets
            .entry(minute)
            .or_insert_with(|| MinuteBucket::empty(minute, sample.timestamp))
            .fold(sample, keys);
    }
    buckets.into_values().collect()
}

/// Buckets of the samples that carry a status attribute.
pub fn status_buckets(samples: &[Sample], keys: &TelemetryKeys) -> Vec<MinuteBucket> {
    bucket_by_minute(samples.iter().filter(|s| s.has(&keys.status)), keys)
}

/// Period availability in percent; `0` when no bucket has a defined state.
pub fn availability(buckets: &[MinuteBucket]) -> f64 {
    let up: f64 = buckets.iter().map(MinuteBucket::uptime_ratio).sum();
    let down: f64 = buckets.iter().map(MinuteBucket::downtime_ratio).sum();
    let denom = up + down;
    if denom == 0.0 { 0.0 } else { up / denom * 100.0 }
}
