//! Live machine status classification.
//!
//! The most recent sample inside the lookback window decides the state.
//! Rules are evaluated top to bottom and the first match wins:
//!
//! | State          | Code | Condition                                          |
//! |----------------|------|----------------------------------------------------|
//! | Offline        | 2    | no sample in the lookback window, or no status     |
//! | Stopped        | 0    | status is `0`                                      |
//! | Idle           | 3    | status is `1` and speed is `0`                     |
//! | Reduced speed  | 4    | status is `1` and speed < ratio × target speed     |
//! | Running        | 1    | status is `1` and speed ≥ ratio × target speed     |
//! | Unknown        | 2    | anything else                                      |

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::sample::Sample;
use crate::telemetry::TelemetryReader;

/// Discrete operating state of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineStatus {
    Stopped,
    Running,
    Offline,
    Idle,
    ReducedSpeed,
    Unknown,
}

impl MachineStatus {
    /// Dashboard code. Offline and Unknown share code `2`.
    pub fn code(self) -> u8 {
        match self {
            Self::Stopped => 0,
            Self::Running => 1,
            Self::Offline | Self::Unknown => 2,
            Self::Idle => 3,
            Self::ReducedSpeed => 4,
        }
    }
}

impl std::fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Running => write!(f, "running"),
            Self::Offline => write!(f, "offline"),
            Self::Idle => write!(f, "idle"),
            Self::ReducedSpeed => write!(f, "reduced_speed"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl Serialize for MachineStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Classify the latest sample of a device (or its absence).
pub fn classify(latest: Option<&Sample>, config: &EngineConfig) -> MachineStatus {
    let Some(sample) = latest else {
        return MachineStatus::Offline;
    };
    let keys = &config.keys;
    if sample.text(&keys.status).is_none() {
        return MachineStatus::Offline;
    }

    let status = sample.number(&keys.status);
    if status == Some(0.0) {
        return MachineStatus::Stopped;
    }
    if status != Some(1.0) {
        return MachineStatus::Unknown;
    }

    let Some(speed) = sample.number(&keys.actual_speed) else {
        return MachineStatus::Unknown;
    };
    if speed == 0.0 {
        return MachineStatus::Idle;
    }
    // Target speed only separates reduced speed from running.
    let Some(target) = sample.number(&keys.target_speed) else {
        return MachineStatus::Unknown;
    };
    if speed < config.reduced_speed_ratio * target {
        MachineStatus::ReducedSpeed
    } else {
        MachineStatus::Running
    }
}

/// Status of a device as of `now`, looking back `live_lookback_minutes`.
pub fn live_status<R: TelemetryReader + ?Sized>(
    reader: &R,
    device_id: &str,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Result<MachineStatus> {
    let since = Duration::try_minutes(config.live_lookback_minutes)
        .and_then(|lookback| now.checked_sub_signed(lookback))
        .ok_or_else(|| {
            EngineError::InvalidInput(format!(
                "live lookback of {} minutes before {now} is out of range",
                config.live_lookback_minutes
            ))
        })?;
    let latest = reader.latest(device_id, since)?;
    Ok(classify(latest.as_ref(), config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::MemoryStore;
    use chrono::TimeZone;
    use serde_json::Value;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn sample() -> Sample {
        Sample::new("d", now())
    }

    fn code(s: Sample) -> u8 {
        classify(Some(&s), &EngineConfig::default()).code()
    }

    // -----------------------------------------------------------------------
    // Classification table
    // -----------------------------------------------------------------------

    #[test]
    fn test_idle_when_running_at_zero_speed() {
        let s = sample().with("MC_STATUS", "1").with("Act Speed", "0").with("Target Speed", "100");
        assert_eq!(code(s), 3);
    }

    #[test]
    fn test_idle_without_target_speed() {
        let s = sample().with("MC_STATUS", "1").with("Act Speed", 0);
        assert_eq!(classify(Some(&s), &EngineConfig::default()), MachineStatus::Idle);
        assert_eq!(code(s), 3);
    }

    #[test]
    fn test_reduced_speed_below_half_target() {
        let s = sample().with("MC_STATUS", "1").with("Act Speed", 40).with("Target Speed", 100);
        assert_eq!(code(s), 4);
    }

    #[test]
    fn test_running_at_or_above_half_target() {
        let s = sample().with("MC_STATUS", "1").with("Act Speed", 60).with("Target Speed", 100);
        assert_eq!(code(s), 1);
        let s = sample().with("MC_STATUS", "1").with("Act Speed", 50).with("Target Speed", 100);
        assert_eq!(code(s), 1);
    }

    #[test]
    fn test_stopped() {
        assert_eq!(code(sample().with("MC_STATUS", "0")), 0);
        assert_eq!(code(sample().with("MC_STATUS", 0)), 0);
    }

    #[test]
    fn test_no_sample_is_offline() {
        let status = classify(None, &EngineConfig::default());
        assert_eq!(status, MachineStatus::Offline);
        assert_eq!(status.code(), 2);
    }

    #[test]
    fn test_missing_or_null_status_is_offline() {
        assert_eq!(
            classify(Some(&sample().with("Act Speed", 10)), &EngineConfig::default()),
            MachineStatus::Offline
        );
        assert_eq!(
            classify(Some(&sample().with("MC_STATUS", Value::Null)), &EngineConfig::default()),
            MachineStatus::Offline
        );
    }

    #[test]
    fn test_running_without_speed_falls_back_to_unknown() {
        let s = sample().with("MC_STATUS", "1").with("Target Speed", 100);
        assert_eq!(classify(Some(&s), &EngineConfig::default()), MachineStatus::Unknown);
        assert_eq!(code(s), 2);
        let s = sample().with("MC_STATUS", "1").with("Act Speed", 30);
        assert_eq!(code(s), 2);
    }

    #[test]
    fn test_unexpected_status_value_is_unknown() {
        let s = sample().with("MC_STATUS", "7");
        assert_eq!(classify(Some(&s), &EngineConfig::default()), MachineStatus::Unknown);
    }

    #[test]
    fn test_ratio_is_configurable() {
        let config = EngineConfig {
            reduced_speed_ratio: 0.8,
            ..Default::default()
        };
        let s = sample().with("MC_STATUS", "1").with("Act Speed", 60).with("Target Speed", 100);
        assert_eq!(classify(Some(&s), &config), MachineStatus::ReducedSpeed);
    }

    // -----------------------------------------------------------------------
    // Live lookback
    // -----------------------------------------------------------------------

    #[test]
    fn test_live_status_ignores_stale_samples() {
        let mut store = MemoryStore::new();
        store.push_sample(
            Sample::new("d", now() - Duration::minutes(16)).with("MC_STATUS", "1"),
        );
        let status = live_status(&store, "d", now(), &EngineConfig::default()).unwrap();
        assert_eq!(status, MachineStatus::Offline);
    }

    #[test]
    fn test_live_status_out_of_range_lookback_is_invalid() {
        let config = EngineConfig {
            live_lookback_minutes: i64::MAX,
            ..Default::default()
        };
        let err = live_status(&MemoryStore::new(), "d", now(), &config).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn test_live_status_uses_most_recent() {
        let mut store = MemoryStore::new();
        store.push_sample(Sample::new("d", now() - Duration::minutes(10)).with("MC_STATUS", "1"));
        store.push_sample(Sample::new("d", now() - Duration::minutes(2)).with("MC_STATUS", "0"));
        let status = live_status(&store, "d", now(), &EngineConfig::default()).unwrap();
        assert_eq!(status, MachineStatus::Stopped);
    }

    #[test]
    fn test_status_serializes_as_code() {
        let json = serde_json::to_string(&MachineStatus::ReducedSpeed).unwrap();
        assert_eq!(json, "4");
    }
}
