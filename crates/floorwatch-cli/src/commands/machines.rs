//! `floorwatch machines`: dashboard rows for every machine of a company.

use floorwatch_core::{MachineSummary, Settings, TimeWindow};

pub fn run(settings: &Settings, company_id: &str, start: &str, end: &str, json: bool) {
    let window = super::or_exit(TimeWindow::parse(start, end));
    let engine = super::make_engine(settings);
    let rows = super::or_exit(engine.machine_summaries(company_id, &window));

    if json {
        match serde_json::to_string_pretty(&rows) {
            Ok(text) => println!("{text}"),
            Err(e) => super::fail(e.into()),
        }
        return;
    }

    println!("Company {company_id}  {window}");
    println!("{} machine(s):\n", rows.len());
    println!(
        "  {:<8} {:<24} {:<12} {:<14} {:>12} {:>6}",
        "UID", "NAME", "DEVICE", "STATUS", "LENGTH", "REELS"
    );
    for row in &rows {
        print_row(row);
    }
}

fn print_row(row: &MachineSummary) {
    let m = &row.machine;
    println!(
        "  {:<8} {:<24} {:<12} {:<14} {:>12} {:>6}",
        m.machine_uid,
        truncate(&m.machine_name, 24),
        truncate(&m.machine_id, 12),
        row.status.to_string(),
        row.produced_length,
        row.produced_reels
    );
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let cut: String = s.chars().take(width.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
