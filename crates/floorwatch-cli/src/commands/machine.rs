use floorwatch_core::Settings;

pub fn run(settings: &Settings, machine_uid: &str) {
    let engine = super::make_engine(settings);
    let m = super::or_exit(engine.machine(machine_uid));

    println!("Machine {}", m.machine_uid);
    println!("  {:<12} {}", "name", m.machine_name);
    println!("  {:<12} {}", "device", m.machine_id);
    println!("  {:<12} {}", "type", m.machine_type_name);
    println!("  {:<12} {}", "company", m.company_id);
    for (label, value) in [
        ("plant", &m.machine_plant),
        ("model", &m.machine_model),
        ("customer", &m.machine_customer),
        ("location", &m.machine_location),
    ] {
        if let Some(v) = value {
            println!("  {label:<12} {v}");
        }
    }
    if let (Some(lat), Some(lon)) = (m.machine_latitude, m.machine_longitude) {
        println!("  {:<12} {lat:.5}, {lon:.5}", "coordinates");
    }
    if !m.parts.is_empty() {
        println!("\n  Parts:");
        for part in &m.parts {
            println!(
                "    {:<10} {:<24} {}",
                part.machine_part_id, part.machine_part_name, part.machine_part_serial_no
            );
        }
    }
}
