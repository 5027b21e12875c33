use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use echo_calibration::calibration::{ThresholdCalibrator, ThresholdResult};
use echo_calibration::fixtures::{ExpectationDiff, FixtureCatalog};
use echo_calibration::ThresholdConfig;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "echo_cli",
    about = "Deterministic threshold calibration harness for recorded echo waveforms"
)]
struct Cli {
    /// Override directory containing fixture assets (defaults to ./fixtures)
    #[arg(long, global = true)]
    fixtures_dir: Option<PathBuf>,
    /// Threshold configuration JSON (defaults apply when missing or invalid)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Calibrate a fixture and optionally compare against expectations
    Calibrate {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        expect: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Emit every pipeline stage for a fixture as JSON
    Trace {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List available fixtures on disk
    DumpFixtures,
}

fn main() -> ExitCode {
    echo_calibration::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let catalog = cli
        .fixtures_dir
        .map(FixtureCatalog::new)
        .unwrap_or_else(FixtureCatalog::default);
    let config = cli
        .config
        .map(ThresholdConfig::load_from_file)
        .unwrap_or_default();
    let calibrator = ThresholdCalibrator::new(config);

    match cli.command {
        Commands::Calibrate {
            fixture,
            expect,
            output,
        } => run_calibrate(&catalog, &calibrator, &fixture, expect, output),
        Commands::Trace { fixture, output } => run_trace(&catalog, &calibrator, &fixture, output),
        Commands::DumpFixtures => run_dump(&catalog),
    }
}

fn run_calibrate(
    catalog: &FixtureCatalog,
    calibrator: &ThresholdCalibrator,
    fixture: &str,
    override_expect: Option<PathBuf>,
    output_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let data = catalog.load(fixture, override_expect)?;
    let result = calibrator
        .calibrate(&data.waveform)
        .with_context(|| format!("calibrating fixture {fixture}"))?;

    let report = CalibrationReportPayload {
        fixture: &data.metadata.name,
        sample_count: data.waveform.len(),
        result: &result,
    };
    write_json(&report, output_path)?;

    if let Some(expectations) = data.expectations {
        match expectations.verify(&result) {
            Ok(()) => Ok(ExitCode::from(0)),
            Err(diff) => {
                emit_diff(&diff)?;
                Ok(ExitCode::from(2))
            }
        }
    } else {
        Ok(ExitCode::from(0))
    }
}

fn run_trace(
    catalog: &FixtureCatalog,
    calibrator: &ThresholdCalibrator,
    fixture: &str,
    output_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let data = catalog.load(fixture, None)?;
    let trace = calibrator
        .trace(&data.waveform)
        .with_context(|| format!("tracing fixture {fixture}"))?;

    write_json(&trace, output_path)?;
    Ok(ExitCode::from(0))
}

fn run_dump(catalog: &FixtureCatalog) -> Result<ExitCode> {
    let fixtures = catalog.discover()?;
    if fixtures.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for metadata in fixtures {
        if let Some(expect) = metadata.expect_path {
            println!("{} -> {}", metadata.name, expect.display());
        } else {
            println!("{}", metadata.name);
        }
    }
    Ok(ExitCode::from(0))
}

fn write_json<T: Serialize>(payload: &T, output_path: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(payload)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json())?;
    eprintln!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct CalibrationReportPayload<'a> {
    fixture: &'a str,
    sample_count: usize,
    #[serde(flatten)]
    result: &'a ThresholdResult,
}
