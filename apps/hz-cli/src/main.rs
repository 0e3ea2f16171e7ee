use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use hz_aggregate::{CurveKind, HazardCurveSet, HazardMapSet};
use hz_app::{
    CalcError, CalcResult, CalculationOptions, get_progress, list_saved, load_saved,
    remove_saved, run_calculation_with_options,
};
use hz_core::CalculationId;
use hz_store::{HazardRepository, MemoryRepository, ResultStore};
use tracing::info;

#[derive(Parser)]
#[command(name = "hz-cli")]
#[command(about = "HazardFlow CLI - event-based seismic hazard calculations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a job file
    Validate {
        /// Path to the job file (YAML, or JSON by extension)
        job_path: PathBuf,
    },
    /// Run a calculation and save its results next to the job file
    Run {
        /// Path to the job file (YAML, or JSON by extension)
        job_path: PathBuf,
    },
    /// List saved calculations of a job
    Calculations {
        /// Path to the job file (YAML, or JSON by extension)
        job_path: PathBuf,
    },
    /// Show curves and maps of a saved calculation
    Show {
        /// Path to the job file (YAML, or JSON by extension)
        job_path: PathBuf,
        /// Calculation id
        calculation_id: u64,
        /// Print realization curves as well as statistics
        #[arg(long)]
        all: bool,
    },
    /// Delete a saved calculation
    Remove {
        /// Path to the job file (YAML, or JSON by extension)
        job_path: PathBuf,
        /// Calculation id
        calculation_id: u64,
    },
}

fn main() -> CalcResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { job_path } => cmd_validate(&job_path),
        Commands::Run { job_path } => cmd_run(&job_path),
        Commands::Calculations { job_path } => cmd_calculations(&job_path),
        Commands::Show {
            job_path,
            calculation_id,
            all,
        } => cmd_show(&job_path, calculation_id, all),
        Commands::Remove {
            job_path,
            calculation_id,
        } => cmd_remove(&job_path, calculation_id),
    }
}

fn cmd_validate(job_path: &Path) -> CalcResult<()> {
    println!("Validating job: {}", job_path.display());
    let job = hz_job::load_job(job_path)?;
    println!("✓ Job is valid");
    println!(
        "  {} sites, {} source models, {} logic tree paths",
        job.sites.len(),
        job.source_models.len(),
        job.logic_tree.path_count()
    );
    Ok(())
}

fn cmd_run(job_path: &Path) -> CalcResult<()> {
    let job = hz_job::load_job(job_path)?;
    let store = ResultStore::for_job(job_path)?;
    let repo: Arc<dyn HazardRepository> =
        Arc::new(MemoryRepository::with_first_id(store.next_calculation_id()?));
    let options = CalculationOptions {
        result_store: Some(store),
        ..CalculationOptions::default()
    };

    let handle = run_calculation_with_options(job, Arc::clone(&repo), options)?;
    let id = handle.id();
    info!(calculation = %id, job = %job_path.display(), "calculation started");
    println!("Running calculation {id}");

    while !handle.is_finished() {
        let snapshot = get_progress(repo.as_ref(), id)?;
        if snapshot.total > 0 {
            render_progress(snapshot.fraction(), snapshot.done, snapshot.total);
        }
        thread::sleep(Duration::from_millis(100));
    }
    let outcome = handle.join();
    clear_progress_line();
    let outcome = outcome?;

    let manifest = &outcome.manifest;
    println!("✓ Calculation {} completed in {:.2}s", id, outcome.elapsed_wall_s);
    println!("  Realizations: {}", manifest.realizations.len());
    println!(
        "  Complete logic tree investigation time: {} years",
        manifest.complete_lt_investigation_time
    );
    println!("  Curves: {}  Maps: {}", manifest.curve_count, manifest.map_count);
    Ok(())
}

fn cmd_calculations(job_path: &Path) -> CalcResult<()> {
    let store = ResultStore::for_job(job_path)?;
    let manifests = list_saved(&store)?;
    if manifests.is_empty() {
        println!("No saved calculations");
        return Ok(());
    }
    println!("Saved calculations:");
    for m in manifests {
        println!(
            "  {}  {:?}  {} realizations  {} curves  {}  {}",
            m.calculation_id,
            m.status,
            m.realizations.len(),
            m.curve_count,
            m.timestamp,
            m.description
        );
    }
    Ok(())
}

fn parse_calculation_id(value: u64) -> CalcResult<CalculationId> {
    CalculationId::from_value(value)
        .ok_or_else(|| CalcError::InvalidInput("calculation ids start at 1".to_string()))
}

fn cmd_remove(job_path: &Path, calculation_id: u64) -> CalcResult<()> {
    let id = parse_calculation_id(calculation_id)?;
    let store = ResultStore::for_job(job_path)?;
    remove_saved(&store, id)?;
    info!(calculation = %id, job = %job_path.display(), "calculation removed");
    println!("✓ Removed calculation {id}");
    Ok(())
}

fn cmd_show(job_path: &Path, calculation_id: u64, all: bool) -> CalcResult<()> {
    let id = parse_calculation_id(calculation_id)?;
    let store = ResultStore::for_job(job_path)?;
    let (manifest, curves, maps) = load_saved(&store, id)?;

    println!("Calculation {}: {}", manifest.calculation_id, manifest.description);
    println!("  Status: {:?}", manifest.status);
    println!("  Created: {}", manifest.timestamp);
    println!("  Engine: {}  Digest: {}", manifest.engine_version, manifest.digest);
    println!(
        "  Investigation time: {} years (complete logic tree: {})",
        manifest.investigation_time, manifest.complete_lt_investigation_time
    );
    for r in &manifest.realizations {
        println!(
            "  Realization {}: weight {:.4}  path {}",
            r.ordinal,
            r.weight,
            r.path.join(" / ")
        );
    }

    for curve in curves.iter().filter(|c| all || !matches!(c.kind, CurveKind::Realization(_))) {
        print_curve(curve);
    }
    for map in maps.iter().filter(|m| all || !matches!(m.kind, CurveKind::Realization(_))) {
        print_map(map);
    }
    Ok(())
}

fn print_curve(curve: &HazardCurveSet) {
    println!("\n{} {} hazard curves", curve.imt, curve.kind.label());
    let header: Vec<String> = curve.imls.iter().map(|l| format!("{l:>10.4}")).collect();
    println!("  {:>6} {}", "site", header.join(""));
    for (site, poes) in curve.sites.iter().zip(&curve.poes) {
        let row: Vec<String> = poes.iter().map(|p| format!("{p:>10.4e}")).collect();
        println!("  {:>6} {}", site, row.join(""));
    }
}

fn print_map(map: &HazardMapSet) {
    println!("\n{} {} hazard map, PoE {}", map.imt, map.kind.label(), map.poe);
    for (site, value) in map.sites.iter().zip(&map.values) {
        println!("  site {:>6}: {:.5}", site, value);
    }
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn render_progress(fraction: f64, done: u64, total: u64) {
    let width = 28usize;
    let filled = ((fraction * width as f64).round() as usize).min(width);
    let bar = format!(
        "{}{}",
        "#".repeat(filled),
        "-".repeat(width.saturating_sub(filled))
    );
    print!(
        "\r[{}] {:>6.2}%  sources={}/{}",
        bar,
        fraction * 100.0,
        done,
        total
    );
    let _ = io::stdout().flush();
}
