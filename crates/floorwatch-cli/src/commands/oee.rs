//! `floorwatch oee`: KPI record of one device over a window.

use floorwatch_core::{KpiBreakdown, Settings, TimeWindow};

pub fn run(settings: &Settings, device_id: &str, start: &str, end: &str, json: bool, detail: bool) {
    let window = super::or_exit(TimeWindow::parse(start, end));
    let engine = super::make_engine(settings);
    let breakdown = super::or_exit(engine.device_breakdown(device_id, &window));

    if json {
        let out = if detail {
            serde_json::to_string_pretty(&breakdown)
        } else {
            serde_json::to_string_pretty(&breakdown.report)
        };
        match out {
            Ok(text) => println!("{text}"),
            Err(e) => super::fail(e.into()),
        }
        return;
    }

    print_report(&breakdown);
    if detail {
        println!();
        print_detail(&breakdown);
    }
}

fn print_report(b: &KpiBreakdown) {
    let r = &b.report;
    println!("Device {}  {}", b.device_id, b.window);
    println!();
    println!("  {:<14} {:>8.2} %", "OEE", r.oee);
    println!("  {:<14} {:>8.2} %", "Availability", r.availability);
    println!("  {:<14} {:>8.2} %", "Performance", r.performance);
    println!("  {:<14} {:>8.2} %", "Quality", r.quality);
}

fn print_detail(b: &KpiBreakdown) {
    println!("  {:<22} {}", "samples", b.samples);
    println!("  {:<22} {}", "status minutes", b.status_buckets);
    println!("  {:<22} {:.4}", "availability (raw)", b.availability);
    println!("  {:<22} {:.6} t", "actual weight", b.actual_weight);
    println!("  {:<22} {:.2}", "target length", b.target.target_length);
    println!("  {:<22} {:.6} t", "target weight", b.target.target_weight);
    println!("  {:<22} {}", "speed minutes", b.target.buckets);
    println!("  {:<22} {}", "distinct diameters", b.target.distinct_diameters);
    println!("  {:<22} {:.6} t", "rejected weight", b.rejected_weight);
    if b.target.distinct_diameters > 1 {
        println!();
        println!("  note: several diameters in window; see engine.diameter_policy");
    }
}
