use std::sync::Arc;

use floorwatch_core::{EngineError, Settings};

pub fn run(mut settings: Settings, host: Option<&str>, port: Option<u16>) {
    if let Some(host) = host {
        settings.server.host = host.to_string();
    }
    if let Some(port) = port {
        settings.server.port = port;
    }
    let engine = Arc::new(super::make_engine(&settings));

    let server = &settings.server;
    let base = format!("http://{}:{}", server.host, server.port);

    println!("Floorwatch KPI Server v{}", floorwatch_core::VERSION);
    println!("   {base}");
    println!("   store: {}", settings.store.data_dir.display());
    println!(
        "   diameter policy: {}, live lookback: {} min",
        settings.engine.diameter_policy, settings.engine.live_lookback_minutes
    );
    println!();
    println!("   Endpoints:");
    println!("     GET /                                              API index");
    println!("     GET /machine_data/{{company}}/{{start}}/{{end}}         Company machines");
    println!("     GET /single_machine_data/{{machine}}                 One machine");
    println!("     GET /device_data/{{device}}/{{start}}/{{end}}           Device OEE");
    println!("     GET /health                                        Health check");
    println!();
    println!("   Examples:");
    println!("     curl {base}/machine_data/1/2025-03-01/2025-03-31");
    println!("     curl {base}/device_data/wd-01/2025-03-01T06:00:00Z/2025-03-01T14:00:00Z");
    println!();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => super::fail(EngineError::TransientFailure(format!(
            "cannot start runtime: {e}"
        ))),
    };
    if let Err(e) = rt.block_on(floorwatch_server::run_server(engine, server)) {
        log::error!("server stopped: {e}");
        super::fail(EngineError::TransientFailure(format!("server on {base}: {e}")));
    }
}
