//! Telemetry reader seam and the in-memory store.
//!
//! Every component of the engine consumes samples through [`TelemetryReader`],
//! which yields a device's samples in ascending timestamp order. Ties keep
//! store insertion order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::catalog::{Machine, MachineCatalog};
use crate::error::Result;
use crate::sample::{Sample, sort_chronologically};
use crate::window::TimeWindow;

/// Read access to per-device telemetry.
pub trait TelemetryReader: Send + Sync {
    /// Samples of `device_id` with `window.start <= timestamp <= window.end`,
    /// ascending by timestamp.
    fn read(&self, device_id: &str, window: &TimeWindow) -> Result<Vec<Sample>>;

    /// The most recent sample of `device_id` at or after `since`.
    fn latest(&self, device_id: &str, since: DateTime<Utc>) -> Result<Option<Sample>>;
}

/// Filter and order one device's samples. Shared by the store implementations.
pub(crate) fn select_window<'a>(
    samples: impl IntoIterator<Item = &'a Sample>,
    window: &TimeWindow,
) -> Vec<Sample> {
    let mut out: Vec<Sample> = samples
        .into_iter()
        .filter(|s| window.contains(s.timestamp))
        .cloned()
        .collect();
    sort_chronologically(&mut out);
    out
}

/// Pick the last sample at or after `since`; the later insertion wins a tie.
pub(crate) fn select_latest<'a>(
    samples: impl IntoIterator<Item = &'a Sample>,
    since: DateTime<Utc>,
) -> Option<Sample> {
    let mut best: Option<&Sample> = None;
    for s in samples.into_iter().filter(|s| s.timestamp >= since) {
        if best.is_none_or(|b| s.timestamp >= b.timestamp) {
            best = Some(s);
        }
    }
    best.cloned()
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Telemetry and catalog held in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    samples: HashMap<String, Vec<Sample>>,
    machines: Vec<Machine>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_sample(&mut self, sample: Sample) {
        self.samples
            .entry(sample.device_id.clone())
            .or_default()
            .push(sample);
    }

    pub fn extend_samples(&mut self, samples: impl IntoIterator<Item = Sample>) {
        for s in samples {
            self.push_sample(s);
        }
    }

    pub fn add_machine(&mut self, machine: Machine) {
        self.machines.push(machine);
    }

    /// Total number of samples across all devices.
    pub fn sample_count(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }

    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }
}

impl TelemetryReader for MemoryStore {
    fn read(&self, device_id: &str, window: &TimeWindow) -> Result<Vec<Sample>> {
        Ok(self
            .samples
            .get(device_id)
            .map(|v| select_window(v, window))
            .unwrap_or_default())
    }

    fn latest(&self, device_id: &str, since: DateTime<Utc>) -> Result<Option<Sample>> {
        Ok(self
            .samples
            .get(device_id)
            .and_then(|v| select_latest(v, since)))
    }
}

impl MachineCatalog for MemoryStore {
    fn machines_by_company(&self, company_id: &str) -> Result<Vec<Machine>> {
        Ok(self
            .machines
            .iter()
            .filter(|m| m.company_id == company_id)
            .cloned()
            .collect())
    }

    fn machine(&self, machine_uid: &str) -> Result<Option<Machine>> {
        Ok(self
            .machines
            .iter()
            .find(|m| m.machine_uid == machine_uid)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, min, 0).unwrap()
    }

    fn store() -> MemoryStore {
        let mut s = MemoryStore::new();
        s.push_sample(Sample::new("a", ts(5)).with("k", 5));
        s.push_sample(Sample::new("a", ts(1)).with("k", 1));
        s.push_sample(Sample::new("b", ts(2)).with("k", 2));
        s.push_sample(Sample::new("a", ts(9)).with("k", 9));
        s
    }

    #[test]
    fn test_read_filters_and_orders() {
        let w = TimeWindow::new(ts(0), ts(5)).unwrap();
        let got = store().read("a", &w).unwrap();
        let ks: Vec<_> = got.iter().map(|s| s.number("k").unwrap()).collect();
        assert_eq!(ks, vec![1.0, 5.0]);
    }

    #[test]
    fn test_read_unknown_device_is_empty() {
        let w = TimeWindow::new(ts(0), ts(59)).unwrap();
        assert!(store().read("zzz", &w).unwrap().is_empty());
    }

    #[test]
    fn test_latest_since() {
        let s = store();
        assert_eq!(s.latest("a", ts(0)).unwrap().unwrap().timestamp, ts(9));
        assert!(s.latest("a", ts(10)).unwrap().is_none());
        assert!(s.latest("b", ts(3)).unwrap().is_none());
    }

    #[test]
    fn test_counts() {
        let s = store();
        assert_eq!(s.sample_count(), 4);
        assert_eq!(s.machine_count(), 0);
    }
}
