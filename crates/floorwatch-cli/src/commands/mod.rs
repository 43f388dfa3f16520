pub mod ingest;
pub mod machine;
pub mod machines;
pub mod oee;
pub mod serve;
pub mod status;

use std::path::Path;

use floorwatch_core::{EngineError, FileStore, KpiEngine, Settings};

/// Print an error and exit with status 1.
pub fn fail(err: EngineError) -> ! {
    log::debug!("command failed ({})", err.kind());
    eprintln!("Error: {err}");
    std::process::exit(1);
}

/// Unwrap a result or [`fail`].
pub fn or_exit<T>(result: floorwatch_core::Result<T>) -> T {
    result.unwrap_or_else(|e| fail(e))
}

/// Settings file plus command-line overrides.
pub fn try_load_settings(config: &Path, data_dir: Option<&Path>) -> floorwatch_core::Result<Settings> {
    let mut settings = Settings::load(config)?;
    if let Some(dir) = data_dir {
        settings.store.data_dir = dir.to_path_buf();
    }
    Ok(settings)
}

pub fn load_settings(config: &Path, data_dir: Option<&Path>) -> Settings {
    or_exit(try_load_settings(config, data_dir))
}

/// Build an engine over the configured file store.
pub fn try_make_engine(settings: &Settings) -> floorwatch_core::Result<KpiEngine> {
    let store = FileStore::open(&settings.store.data_dir)?;
    KpiEngine::from_store(store, settings.engine.clone())
}

pub fn make_engine(settings: &Settings) -> KpiEngine {
    or_exit(try_make_engine(settings))
}
