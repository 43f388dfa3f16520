//! KPI query engine.
//!
//! Pipeline per query:
//! 1. Read the device's samples for the window from the [`TelemetryReader`]
//! 2. Bucket them per minute
//! 3. Fold buckets and sample pairs into availability and weights
//! 4. Compose performance, quality and OEE
//!
//! The engine keeps no state between queries. Every call recomputes from
//! raw samples, so repeated calls over the same data give identical results.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::availability::{availability, status_buckets};
use crate::catalog::{Machine, MachineCatalog};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::oee::{NoRejects, OeeReport, RejectedProduction};
use crate::production::{produced_length, reel_count};
use crate::status::{MachineStatus, live_status};
use crate::telemetry::TelemetryReader;
use crate::weight::{TargetEstimate, actual_weight, target_weight};
use crate::window::TimeWindow;

/// Everything behind one device KPI record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiBreakdown {
    pub device_id: String,
    pub window: TimeWindow,
    pub samples: usize,
    /// Minute buckets with a status reading.
    pub status_buckets: usize,
    /// Unrounded availability in percent.
    pub availability: f64,
    /// Tonnes.
    pub actual_weight: f64,
    pub target: TargetEstimate,
    /// Tonnes.
    pub rejected_weight: f64,
    pub report: OeeReport,
}

/// Dashboard row for one machine of a company.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineSummary {
    #[serde(flatten)]
    pub machine: Machine,
    pub status: MachineStatus,
    pub produced_length: i64,
    pub produced_reels: u64,
}

/// Stateless KPI engine over a telemetry reader and a machine catalog.
pub struct KpiEngine {
    telemetry: Arc<dyn TelemetryReader>,
    catalog: Arc<dyn MachineCatalog>,
    rejects: Box<dyn RejectedProduction>,
    config: EngineConfig,
}

impl KpiEngine {
    /// Create an engine. Rejected production defaults to [`NoRejects`].
    pub fn new(
        telemetry: Arc<dyn TelemetryReader>,
        catalog: Arc<dyn MachineCatalog>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            telemetry,
            catalog,
            rejects: Box::new(NoRejects),
            config,
        })
    }

    /// Create an engine over one store serving both telemetry and catalog.
    pub fn from_store<S>(store: S, config: EngineConfig) -> Result<Self>
    where
        S: TelemetryReader + MachineCatalog + 'static,
    {
        let store = Arc::new(store);
        Self::new(store.clone(), store, config)
    }

    /// Replace the rejected-production source.
    pub fn with_rejects(mut self, rejects: impl RejectedProduction + 'static) -> Self {
        self.rejects = Box::new(rejects);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // dataByDeviceId
    // -----------------------------------------------------------------------

    /// OEE, availability, performance and quality of a device over a window.
    pub fn device_kpis(&self, device_id: &str, window: &TimeWindow) -> Result<OeeReport> {
        Ok(self.device_breakdown(device_id, window)?.report)
    }

    /// [`device_kpis`](Self::device_kpis) with every intermediate figure.
    pub fn device_breakdown(&self, device_id: &str, window: &TimeWindow) -> Result<KpiBreakdown> {
        validate_id("device id", device_id)?;
        let samples = self.telemetry.read(device_id, window)?;
        if samples.is_empty() {
            return Err(EngineError::NotFound(format!(
                "no data for device {device_id} in {window}"
            )));
        }

        let buckets = status_buckets(&samples, &self.config.keys);
        let avail = availability(&buckets);
        let actual = actual_weight(&samples, &self.config);
        let target = target_weight(&samples, &self.config);
        let rejected = self.rejects.rejected_weight(device_id, window)?;
        let report = OeeReport::compose(avail, actual, target.target_weight, rejected);

        log::debug!(
            "kpis {device_id} {window}: samples={} buckets={} actual={actual:.4}t target={:.4}t -> {report:?}",
            samples.len(),
            buckets.len(),
            target.target_weight
        );

        Ok(KpiBreakdown {
            device_id: device_id.to_string(),
            window: *window,
            samples: samples.len(),
            status_buckets: buckets.len(),
            availability: avail,
            actual_weight: actual,
            target,
            rejected_weight: rejected,
            report,
        })
    }

    // -----------------------------------------------------------------------
    // machineByCompanyId
    // -----------------------------------------------------------------------

    /// Dashboard rows for every machine of a company, live status as of now.
    pub fn machine_summaries(
        &self,
        company_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<MachineSummary>> {
        self.machine_summaries_at(company_id, window, Utc::now())
    }

    /// Dashboard rows with live status evaluated at `now`.
    ///
    /// Machines are summarized in parallel on at most one thread per available
    /// core, each thread taking a contiguous run of the catalog. The result keeps
    /// catalog order and fails as a whole if any machine fails.
    pub fn machine_summaries_at(
        &self,
        company_id: &str,
        window: &TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<MachineSummary>> {
        validate_id("company id", company_id)?;
        let machines = self.catalog.machines_by_company(company_id)?;
        if machines.is_empty() {
            return Err(EngineError::NotFound(format!(
                "no machines found for company {company_id}"
            )));
        }

        let chunk_size = machines.len().div_ceil(worker_count(machines.len()));
        let results: Vec<Result<Vec<MachineSummary>>> = std::thread::scope(|s| {
            let handles: Vec<_> = machines
                .chunks(chunk_size)
                .map(|chunk| {
                    s.spawn(move || {
                        chunk
                            .iter()
                            .map(|machine| self.summarize(machine.clone(), window, now))
                            .collect::<Result<Vec<_>>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| {
                    h.join().unwrap_or_else(|_| {
                        Err(EngineError::TransientFailure(
                            "machine summary worker panicked".to_string(),
                        ))
                    })
                })
                .collect()
        });

        let mut rows = Vec::with_capacity(machines.len());
        for chunk in results {
            rows.extend(chunk?);
        }
        Ok(rows)
    }

    fn summarize(
        &self,
        machine: Machine,
        window: &TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<MachineSummary> {
        let device_id = machine.machine_id.as_str();
        let status = live_status(self.telemetry.as_ref(), device_id, now, &self.config)?;
        let samples = self.telemetry.read(device_id, window)?;
        let produced_length = produced_length(&samples, &self.config.keys);
        let produced_reels = reel_count(&samples, &self.config.keys);
        Ok(MachineSummary {
            machine,
            status,
            produced_length,
            produced_reels,
        })
    }

    // -----------------------------------------------------------------------
    // getMachineName / live status
    // -----------------------------------------------------------------------

    /// Metadata of a single machine.
    pub fn machine(&self, machine_uid: &str) -> Result<Machine> {
        validate_id("machine id", machine_uid)?;
        self.catalog
            .machine(machine_uid)?
            .ok_or_else(|| EngineError::NotFound(format!("no machine {machine_uid}")))
    }

    /// Live status of a device as of `now`.
    pub fn device_status(&self, device_id: &str, now: DateTime<Utc>) -> Result<MachineStatus> {
        validate_id("device id", device_id)?;
        live_status(self.telemetry.as_ref(), device_id, now, &self.config)
    }
}

/// Threads used for `jobs` independent machine summaries.
fn worker_count(jobs: usize) -> usize {
    let cores = std::thread::available_parallelism().map_or(4, |n| n.get());
    cores.min(jobs).max(1)
}

fn validate_id(what: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() || id.chars().any(char::is_control) {
        return Err(EngineError::InvalidInput(format!("malformed {what} '{id}'")));
    }
    Ok(())
}
