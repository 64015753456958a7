use gps_drift_filter::{
    evaluate_detection, export_result_json, load_from_json_str, parse_csv, parse_from_string,
    AnomalySimulator, DetectorConfig, DriftDetector, ParseOutcome, SimulatorConfig,
};
use std::env;
use std::error::Error;
use std::fs;
use std::process;

fn usage() -> ! {
    eprintln!("usage: gps-drift-filter <track-file> [options]");
    eprintln!();
    eprintln!("  <track-file>          JSON, CSV or plain-text trajectory");
    eprintln!("  --config <file>       detector configuration (JSON)");
    eprintln!("  --simulate <seed>     corrupt the track first, then filter it");
    eprintln!("  --compact             machine-readable single-line JSON output");
    process::exit(2);
}

struct CliOptions {
    input: String,
    config: Option<String>,
    simulate: Option<u64>,
    pretty: bool,
}

fn parse_args(args: &[String]) -> CliOptions {
    let mut input = None;
    let mut config = None;
    let mut simulate = None;
    let mut pretty = true;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                config = Some(args.get(i).cloned().unwrap_or_else(|| usage()));
            }
            "--simulate" => {
                i += 1;
                let seed = args.get(i).and_then(|s| s.parse::<u64>().ok());
                simulate = Some(seed.unwrap_or_else(|| usage()));
            }
            "--compact" => pretty = false,
            arg if arg.starts_with("--") => usage(),
            arg => {
                if input.replace(arg.to_string()).is_some() {
                    usage();
                }
            }
        }
        i += 1;
    }

    CliOptions { input: input.unwrap_or_else(|| usage()), config, simulate, pretty }
}

/// Dispatch on the file extension: `.json` and `.csv` get their dedicated
/// adapters, anything else goes through the line-oriented parser.
fn load_track(path: &str) -> Result<ParseOutcome, Box<dyn Error>> {
    let text = fs::read_to_string(path)?;
    let lower = path.to_ascii_lowercase();
    let outcome = if lower.ends_with(".json") {
        load_from_json_str(&text)?
    } else if lower.ends_with(".csv") {
        parse_csv(&text)?
    } else {
        parse_from_string(&text)
    };
    Ok(outcome)
}

fn load_detector(config_path: Option<&str>) -> Result<DriftDetector, Box<dyn Error>> {
    let config = match config_path {
        Some(path) => serde_json::from_str::<DetectorConfig>(&fs::read_to_string(path)?)?,
        None => DetectorConfig::default(),
    };
    Ok(DriftDetector::new(config)?)
}

fn run(options: &CliOptions) -> Result<(), Box<dyn Error>> {
    let outcome = load_track(&options.input)?;
    for warning in &outcome.warnings {
        eprintln!("warning: {}", warning);
    }

    let mut detector = load_detector(options.config.as_deref())?;

    match options.simulate {
        Some(seed) => {
            let simulator = AnomalySimulator::new(SimulatorConfig::default())?;
            let simulated = simulator.generate(&outcome.fixes, seed);
            let result = detector.process_trajectory(&simulated.points);
            let report = evaluate_detection(&outcome.fixes, &simulated, &result);
            eprintln!(
                "injected {} anomalies ({} corrupt fixes): detected {}, missed {}, falsely rejected {}, {} rebuilds",
                report.injected_anomaly_count,
                report.corrupted_count,
                report.detected_count,
                report.missed_count,
                report.false_rejection_count,
                report.rebuild_count,
            );
            println!("{}", export_result_json(&result, options.pretty)?);
        }
        None => {
            let result = detector.process_trajectory(&outcome.fixes);
            println!("{}", export_result_json(&result, options.pretty)?);
        }
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let options = parse_args(&args);
    if let Err(e) = run(&options) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_track_dispatches_on_extension() {
        let dir = std::env::temp_dir();

        let json_path = dir.join("drift_filter_test_track.json");
        fs::write(
            &json_path,
            r#"[{"lat": 39.9, "lng": 116.4, "timestamp": 1700000000000}]"#,
        )
        .unwrap();
        let outcome = load_track(json_path.to_str().unwrap()).unwrap();
        assert_eq!(outcome.fixes.len(), 1);
        let _ = fs::remove_file(json_path);

        let csv_path = dir.join("drift_filter_test_track.csv");
        fs::write(&csv_path, "lat,lng,timestamp\n39.9,116.4,1700000000000\n").unwrap();
        let outcome = load_track(csv_path.to_str().unwrap()).unwrap();
        assert_eq!(outcome.fixes.len(), 1);
        let _ = fs::remove_file(csv_path);

        let txt_path = dir.join("drift_filter_test_track.txt");
        fs::write(&txt_path, "39.9,116.4,1700000000000\n").unwrap();
        let outcome = load_track(txt_path.to_str().unwrap()).unwrap();
        assert_eq!(outcome.fixes.len(), 1);
        let _ = fs::remove_file(txt_path);
    }

    #[test]
    fn test_parse_args() {
        let args: Vec<String> = ["track.json", "--simulate", "42", "--compact"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let options = parse_args(&args);
        assert_eq!(options.input, "track.json");
        assert_eq!(options.simulate, Some(42));
        assert!(!options.pretty);
        assert!(options.config.is_none());
    }
}
