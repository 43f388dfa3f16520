//! Directory-backed telemetry store and machine catalog.
//!
//! # Storage Format
//!
//! A store is a directory containing:
//! - `machines.json`: JSON array of [`Machine`] records
//! - `samples.jsonl`: one [`Sample`] per line, appended in arrival order
//!
//! Every query re-reads the files, so a running server always sees samples
//! appended by `floorwatch ingest`. A missing file is an empty store.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::catalog::{Machine, MachineCatalog};
use crate::error::{EngineError, Result};
use crate::sample::Sample;
use crate::telemetry::{TelemetryReader, select_latest, select_window};
use crate::window::TimeWindow;

pub const MACHINES_FILE: &str = "machines.json";
pub const SAMPLES_FILE: &str = "samples.jsonl";

/// Telemetry store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open an existing store directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(EngineError::TransientFailure(format!(
                "store directory {} does not exist",
                dir.display()
            )));
        }
        log::debug!("opened file store at {}", dir.display());
        Ok(Self { dir })
    }

    /// Open a store directory, creating it if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append samples to `samples.jsonl`. Returns the number written.
    pub fn append_samples<'a>(&self, samples: impl IntoIterator<Item = &'a Sample>) -> Result<usize> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(SAMPLES_FILE))?;
        let mut writer = BufWriter::new(file);
        let mut n = 0;
        for sample in samples {
            serde_json::to_writer(&mut writer, sample)?;
            writer.write_all(b"\n")?;
            n += 1;
        }
        writer.flush()?;
        Ok(n)
    }

    /// Replace `machines.json` with the given catalog.
    pub fn write_machines(&self, machines: &[Machine]) -> Result<()> {
        let json = serde_json::to_string_pretty(machines)?;
        fs::write(self.dir.join(MACHINES_FILE), json)?;
        Ok(())
    }

    /// Stream every stored sample of one device through `visit`.
    fn scan_device(&self, device_id: &str, mut visit: impl FnMut(Sample)) -> Result<()> {
        let path = self.dir.join(SAMPLES_FILE);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let sample: Sample = serde_json::from_str(&line).map_err(|e| {
                EngineError::TransientFailure(format!(
                    "{} line {}: {e}",
                    path.display(),
                    idx + 1
                ))
            })?;
            if sample.device_id == device_id {
                visit(sample);
            }
        }
        Ok(())
    }

    fn load_machines(&self) -> Result<Vec<Machine>> {
        let path = self.dir.join(MACHINES_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }
}

impl TelemetryReader for FileStore {
    fn read(&self, device_id: &str, window: &TimeWindow) -> Result<Vec<Sample>> {
        let mut device_samples = Vec::new();
        self.scan_device(device_id, |s| {
            if window.contains(s.timestamp) {
                device_samples.push(s);
            }
        })?;
        let out = select_window(&device_samples, window);
        log::debug!("read {} samples for {device_id} in {window}", out.len());
        Ok(out)
    }

    fn latest(&self, device_id: &str, since: DateTime<Utc>) -> Result<Option<Sample>> {
        let mut recent = Vec::new();
        self.scan_device(device_id, |s| {
            if s.timestamp >= since {
                recent.push(s);
            }
        })?;
        Ok(select_latest(&recent, since))
    }
}

impl MachineCatalog for FileStore {
    fn machines_by_company(&self, company_id: &str) -> Result<Vec<Machine>> {
        Ok(self
            .load_machines()?
            .into_iter()
            .filter(|m| m.company_id == company_id)
            .collect())
    }

    fn machine(&self, machine_uid: &str) -> Result<Option<Machine>> {
        Ok(self
            .load_machines()?
            .into_iter()
            .find(|m| m.machine_uid == machine_uid))
    }
}
