use chrono::Utc;

use floorwatch_core::{MachineStatus, Settings, parse_instant};

pub fn run(settings: &Settings, device_id: &str, at: Option<&str>) {
    let now = match at {
        Some(raw) => super::or_exit(parse_instant(raw)),
        None => Utc::now(),
    };
    let engine = super::make_engine(settings);
    let status = super::or_exit(engine.device_status(device_id, now));

    println!(
        "{device_id}: {status} (code {}) as of {}",
        status.code(),
        now.to_rfc3339()
    );
    if status == MachineStatus::Offline {
        println!(
            "  no status reading in the last {} minutes",
            settings.engine.live_lookback_minutes
        );
    }
}
