//! # floorwatch-core
//!
//! **Overall Equipment Effectiveness from raw machine telemetry.**
//!
//! `floorwatch-core` turns irregular, sparse, per-device telemetry samples into
//! the figures a factory-floor dashboard shows: availability, performance,
//! quality, OEE, produced length, reel count, and live machine status.
//!
//! ## Quick Start
//!
//! ```no_run
//! use floorwatch_core::{EngineConfig, FileStore, KpiEngine, TimeWindow};
//!
//! let store = FileStore::open("data").unwrap();
//! let engine = KpiEngine::from_store(store, EngineConfig::default()).unwrap();
//!
//! let window = TimeWindow::parse("2025-03-01 00:00:00", "2025-03-01 23:59:59").unwrap();
//! let kpis = engine.device_kpis("wd-01", &window).unwrap();
//! println!("OEE {:.2} %", kpis.oee);
//! ```
//!
//! ## Architecture
//!
//! Telemetry Reader → minute buckets → availability / weights → OEE
//!
//! Each stage is a pure function over in-memory samples:
//! - [`status`]: latest sample → discrete machine state
//! - [`availability`]: per-minute uptime ratios → availability %
//! - [`weight`]: line speed × diameter → actual and target tonnes
//! - [`oee`]: performance, quality and OEE composition
//! - [`production`]: monthly produced length and reel changes
//!
//! Absent metrics and zero denominators never fail a query; only a bad window,
//! a missing entity, or an unreadable store do (see [`EngineError`]).

pub mod availability;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod oee;
pub mod production;
pub mod sample;
pub mod status;
pub mod store;
pub mod telemetry;
pub mod weight;
pub mod window;

pub use availability::{MinuteBucket, availability, bucket_by_minute, status_buckets};
pub use catalog::{Machine, MachineCatalog, MachinePart};
pub use config::{DiameterPolicy, EngineConfig, ServerConfig, Settings, StoreConfig, TelemetryKeys};
pub use engine::{KpiBreakdown, KpiEngine, MachineSummary};
pub use error::{EngineError, Result};
pub use oee::{NoRejects, OeeReport, RejectedProduction, round2};
pub use production::{MonthlyProduction, monthly_production, produced_length, reel_count};
pub use sample::Sample;
pub use status::{MachineStatus, classify, live_status};
pub use store::FileStore;
pub use telemetry::{MemoryStore, TelemetryReader};
pub use weight::{TargetEstimate, actual_weight, mass, target_weight};
pub use window::{TimeWindow, parse_instant};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
