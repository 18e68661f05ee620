use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{WrapErr, eyre};
use nutriplan_core::Engine;
use nutriplan_core::model::OptimizationRequest;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod report;

#[derive(Parser, Debug)]
#[command(name = "nutriplan")]
#[command(about = "Multi-nutrient fertilizer optimization for row-crop fields")]
struct Args {
    /// Path to the optimization request (.yaml, .yml, or .json)
    #[arg(short, long)]
    request: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Text,
    Json,
}

fn init_logging(level: &str) {
    // RUST_LOG wins over the flag when set
    let default_filter = format!("nutriplan={level},nutriplan_core=warn");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(true),
        )
        .init();
}

/// JSON when the extension says so, YAML otherwise.
fn load_request(path: &Path) -> color_eyre::Result<OptimizationRequest> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read request file {}", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&raw)
            .wrap_err_with(|| format!("invalid JSON request in {}", path.display())),
        _ => serde_saphyr::from_str(&raw)
            .map_err(|err| eyre!("invalid YAML request in {}: {err}", path.display())),
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(&args.log_level);

    let request = load_request(&args.request)?;
    tracing::info!(
        "loaded request for field '{}' ({} nutrients, objective {:?})",
        request.field_id,
        request.requirements.len(),
        request.objective
    );

    let result = Engine::default().optimize(&request)?;
    tracing::info!(
        "solved via {:?} in {} ms ({} iterations)",
        result.solver.method,
        result.solver.elapsed_ms,
        result.solver.iterations
    );

    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => print!("{}", report::render(&request, &result)),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const CORN_YAML: &str = r#"
field_id: north-40
crop: corn
target_yield: 180.0
soil_ph: 6.5
organic_matter_pct: 3.2
budget: 150.0
soil_tests:
  - nutrient: nitrogen
    value: 25.0
    sampled: "2026-03-14"
requirements:
  - nutrient: nitrogen
    minimum: 100.0
    optimal: [120.0, 180.0]
    max_tolerance: 270.0
    uptake_efficiency: 0.65
limits:
  - nutrient: nitrogen
    max_rate: 200.0
"#;

    #[test]
    fn test_load_request_accepts_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corn.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(CORN_YAML.as_bytes()).unwrap();

        let request = load_request(&path).unwrap();
        assert_eq!(request.field_id, "north-40");
        assert_eq!(request.requirements.len(), 1);
        assert_eq!(request.budget, Some(150.0));
    }

    #[test]
    fn test_load_request_accepts_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corn.json");
        let json = serde_json::json!({
            "field_id": "east-12",
            "crop": "corn",
            "target_yield": 180.0,
            "soil_ph": 6.5,
            "organic_matter_pct": 3.2,
            "soil_tests": [
                {"nutrient": "nitrogen", "value": 25.0, "sampled": "2026-03-14"}
            ],
            "requirements": [
                {
                    "nutrient": "nitrogen",
                    "minimum": 100.0,
                    "optimal": [120.0, 180.0],
                    "max_tolerance": 270.0,
                    "uptake_efficiency": 0.65
                }
            ]
        });
        std::fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).unwrap();

        let request = load_request(&path).unwrap();
        assert_eq!(request.field_id, "east-12");
        assert!(request.limits.is_empty());
    }

    #[test]
    fn test_load_request_reports_missing_file() {
        let err = load_request(Path::new("/no/such/request.yaml")).unwrap_err();
        assert!(err.to_string().contains("request.yaml"));
    }
}
