//! Command-line driver: read a learner snapshot, print the study report.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Parser;

use study_engine::config::EngineConfig;
use study_engine::error::Result;
use study_engine::logging::init_tracing;
use study_engine::report::{build_report, Snapshot};

#[derive(Parser, Debug)]
#[command(
    name = "study-engine",
    version,
    about = "Decay, grade prediction and daily plan for a learner snapshot."
)]
struct Args {
    /// Snapshot JSON file, `-` for stdin
    snapshot: PathBuf,

    /// Seed for the exam simulator (overrides STUDY_SIM_SEED)
    #[arg(long)]
    seed: Option<u64>,

    /// Also compute the idealized-effort grade
    #[arg(long)]
    idealized: bool,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,

    /// Log filter (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

fn read_snapshot(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut config = EngineConfig::from_env();
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    if args.seed.is_some() {
        config.simulation_seed = args.seed;
    }
    let _log_guard = init_tracing(&config.log_level);
    config.validate()?;

    let mut snapshot = Snapshot::from_json(&read_snapshot(&args.snapshot)?)?;
    snapshot.idealized_effort |= args.idealized;
    tracing::debug!(
        path = %args.snapshot.display(),
        subjects = snapshot.subjects.len(),
        today = %snapshot.today,
        "snapshot loaded"
    );

    let report = build_report(&snapshot, &config);
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}
