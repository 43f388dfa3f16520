//! `floorwatch ingest`: load samples and the machine catalog into a store.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use floorwatch_core::{EngineError, FileStore, Machine, Sample, Settings};

pub fn run(settings: &Settings, samples: Option<&str>, machines: Option<&Path>) {
    if samples.is_none() && machines.is_none() {
        super::fail(EngineError::InvalidInput(
            "nothing to ingest: pass a samples file, '-' for stdin, or --machines".to_string(),
        ));
    }
    let store = super::or_exit(FileStore::create(&settings.store.data_dir));

    if let Some(path) = machines {
        let catalog = super::or_exit(read_machines(path));
        super::or_exit(store.write_machines(&catalog));
        println!("Wrote {} machine(s) to {}", catalog.len(), store.dir().display());
    }

    if let Some(source) = samples {
        let parsed = if source == "-" {
            parse_samples(std::io::stdin().lock())
        } else {
            match std::fs::File::open(source) {
                Ok(f) => parse_samples(f),
                Err(e) => Err(EngineError::InvalidInput(format!("cannot open {source}: {e}"))),
            }
        };
        let parsed = super::or_exit(parsed);
        let n = super::or_exit(store.append_samples(&parsed));
        log::info!("appended {n} samples from {source}");
        println!("Appended {n} sample(s) to {}", store.dir().display());
    }
}

/// Parse JSON-lines samples. Blank lines are skipped; any malformed line
/// rejects the whole input so a partial file is never appended.
pub fn parse_samples(input: impl Read) -> floorwatch_core::Result<Vec<Sample>> {
    let mut out = Vec::new();
    for (idx, line) in BufReader::new(input).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let sample: Sample = serde_json::from_str(&line)
            .map_err(|e| EngineError::InvalidInput(format!("line {}: {e}", idx + 1)))?;
        out.push(sample);
    }
    Ok(out)
}

fn read_machines(path: &Path) -> floorwatch_core::Result<Vec<Machine>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        EngineError::InvalidInput(format!("cannot read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&text)
        .map_err(|e| EngineError::InvalidInput(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_samples_skips_blank_lines() {
        let input = concat!(
            r#"{"device_id":"wd-01","timestamp":"2025-03-01T08:00:00Z","attributes":{"MC_STATUS":"1"}}"#,
            "\n\n",
            r#"{"device_id":"wd-01","timestamp":"2025-03-01T08:00:20Z"}"#,
            "\n",
        );
        let samples = parse_samples(input.as_bytes()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].text("MC_STATUS").as_deref(), Some("1"));
        assert!(samples[1].attributes.is_empty());
    }

    #[test]
    fn test_parse_samples_reports_bad_line() {
        let input = "{\"device_id\":\"d\",\"timestamp\":\"2025-03-01T08:00:00Z\"}\nnot json\n";
        let err = parse_samples(input.as_bytes()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_read_machines_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("machines.json");
        std::fs::write(
            &path,
            r#"[{"machine_uid":"1","machine_id":"wd-01","machine_name":"WD 1",
                "machine_type_name":"Wire Drawing","company_id":"acme"}]"#,
        )
        .unwrap();
        let machines = read_machines(&path).unwrap();
        assert_eq!(machines.len(), 1);
        assert!(machines[0].parts.is_empty());
        assert!(machines[0].machine_plant.is_none());
    }
}
