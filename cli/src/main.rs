use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use gcdsim_core::catalog::{Catalog, SimConfig, default_config_path, load_config, load_permutations};
use gcdsim_core::error::error_chain;
use gcdsim_core::formulas::{PotencyDamage, StandardTiming};
use gcdsim_core::rotation::BatchOutcome;
use gcdsim_core::timeline::{CompletedRun, DamageSummary};
use gcdsim_core::worker::{LOG_PATH_ENV, WorkerPool, WorkerPoolConfig};
use gcdsim_types::formatting::{format_compact, format_dps, format_sim_time};
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser)]
#[command(name = "gcdsim", version, about = "Combat rotation simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate every rotation of a config and report DPS
    Run {
        /// Sim config (defaults to <config_dir>/gcdsim/sim.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the action timeline of the best rotation
        #[arg(long)]
        timeline: bool,
    },
    /// Check a config without simulating
    Validate {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Evaluate stat permutations on a pool of worker processes
    Batch {
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// TOML file with [[permutation]] stat sheets
        #[arg(short, long)]
        permutations: PathBuf,

        /// Maximum concurrent worker processes
        #[arg(short, long, default_value_t = 4)]
        workers: usize,

        /// Permutations per worker task
        #[arg(long, default_value_t = 8)]
        chunk: usize,

        /// Worker binary (defaults to gcdsim-worker next to this executable)
        #[arg(long)]
        worker_exe: Option<PathBuf>,
    },
}

/// Initialize logging, appending to GCDSIM_LOG_PATH if set, otherwise stderr.
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    if let Ok(path) = std::env::var(LOG_PATH_ENV)
        && let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(file)
            .init();
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, timeline } => run(config, timeline),
        Commands::Validate { config } => validate(config),
        Commands::Batch {
            config,
            permutations,
            workers,
            chunk,
            worker_exe,
        } => batch(config, &permutations, workers, chunk, worker_exe).await,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

fn resolve_config(path: Option<PathBuf>) -> Result<(PathBuf, SimConfig), String> {
    let path = path
        .or_else(default_config_path)
        .ok_or("no --config given and no config directory found")?;
    let config = load_config(&path).map_err(|e| error_chain(&e))?;
    Ok((path, config))
}

fn run(config: Option<PathBuf>, timeline: bool) -> Result<(), String> {
    let (_, config) = resolve_config(config)?;
    let catalog = Catalog::compile(&config).map_err(|e| error_chain(&e))?;

    let timing = Arc::new(StandardTiming::for_level(catalog.stats.level));
    let damage = Arc::new(PotencyDamage::default());
    let mut runner = catalog.runner(timing, damage.clone());
    let outcome = runner.evaluate(&catalog.stats).map_err(|e| error_chain(&e))?;

    print_outcome(&outcome);

    if timeline
        && let Some(Ok(run)) = runner.cached_runs().and_then(|runs| runs.get(outcome.best))
    {
        println!();
        println!("Timeline of '{}':", outcome.best().name);
        println!("{:>10}  {:>10}", "used", "lands");
        print_timeline(run);

        let summary = run.summarize(&catalog.stats, damage.as_ref());
        print_cycles(&summary, catalog.settings.cycle_time);
    }
    Ok(())
}

fn validate(config: Option<PathBuf>) -> Result<(), String> {
    let (path, config) = resolve_config(config)?;
    let catalog = Catalog::compile(&config).map_err(|e| error_chain(&e))?;

    println!(
        "{}: {} abilities, {} buffs, {} rotations",
        path.display(),
        catalog.abilities.len(),
        catalog.buffs.len(),
        catalog.rotations.len()
    );
    Ok(())
}

async fn batch(
    config: Option<PathBuf>,
    permutations: &Path,
    workers: usize,
    chunk: usize,
    worker_exe: Option<PathBuf>,
) -> Result<(), String> {
    let (_, config) = resolve_config(config)?;
    // Fail fast instead of once per worker task
    Catalog::compile(&config).map_err(|e| error_chain(&e))?;
    let permutations = load_permutations(permutations).map_err(|e| error_chain(&e))?;

    let worker_exe = match worker_exe {
        Some(path) => path,
        None => default_worker_exe()?,
    };
    let mut pool_config = WorkerPoolConfig::new(worker_exe, workers);
    pool_config.log_path = std::env::var_os(LOG_PATH_ENV).map(PathBuf::from);

    let pool = WorkerPool::new(pool_config);
    let results = pool.evaluate(&config, &permutations, chunk).await;
    pool.shutdown().await;
    let results = results.map_err(|e| error_chain(&e))?;

    println!("{:>4}  {:>6}  {:>6}  {:<20}  {:>12}", "#", "crit", "sks", "best rotation", "dps");
    for result in &results {
        let (name, dps) = match (&result.best, &result.error) {
            (Some(best), _) => (best.name.as_str(), format_dps(best.dps)),
            (None, Some(error)) => ("failed", error.clone()),
            (None, None) => ("-", "-".to_string()),
        };
        println!(
            "{:>4}  {:>6}  {:>6}  {:<20}  {:>12}",
            result.index, result.stats.crit, result.stats.skill_speed, name, dps
        );
    }

    if let Some(top) = results
        .iter()
        .filter(|r| r.best.is_some())
        .max_by(|a, b| a.best_dps().total_cmp(&b.best_dps()))
    {
        println!();
        println!("Best permutation: #{} at {} dps", top.index, format_dps(top.best_dps()));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_outcome(outcome: &BatchOutcome) {
    println!("{:<24} {:>12} {:>10} {:>6} {:>9}", "rotation", "dps", "damage", "gcds", "warnings");
    for (i, result) in outcome.results.iter().enumerate() {
        let marker = if i == outcome.best { "*" } else { " " };
        match &result.error {
            Some(error) => println!("{marker}{:<23} failed: {error}", result.name),
            None => println!(
                "{marker}{:<23} {:>12} {:>10} {:>6.1} {:>9}",
                result.name,
                format_dps(result.dps),
                format_compact(result.total_damage),
                result.gcd_count,
                result.warnings
            ),
        }
    }
}

fn print_timeline(run: &CompletedRun) {
    for record in &run.records {
        let potency = record
            .potency
            .map_or_else(|| "-".to_string(), |p| format!("{p:.0}"));
        let buffs: Vec<&str> = record.buffs.iter().map(|b| b.name.as_str()).collect();
        println!(
            "{:>10}  {:>10}  {:<4} {:<24} {:>6}{}{}",
            format_sim_time(record.used_at),
            format_sim_time(record.lands_at),
            if record.is_gcd() { "GCD" } else { "oGCD" },
            record.ability.name,
            potency,
            if record.combo_continued { " combo" } else { "" },
            if buffs.is_empty() {
                String::new()
            } else {
                format!(" [{}]", buffs.join(", "))
            }
        );
    }
    for warning in &run.warnings {
        println!("warning: {warning:?}");
    }
}

fn print_cycles(summary: &DamageSummary, cycle_time: f64) {
    if summary.by_cycle.len() < 2 {
        return;
    }
    println!();
    for (i, damage) in summary.by_cycle.iter().enumerate() {
        println!(
            "cycle {:<3} from {:>10}  {:>10}",
            i,
            format_sim_time(i as f64 * cycle_time),
            format_compact(*damage)
        );
    }
}

fn default_worker_exe() -> Result<PathBuf, String> {
    let exe = std::env::current_exe().map_err(|e| e.to_string())?;
    let dir = exe.parent().ok_or("executable has no parent directory")?;
    Ok(dir.join(format!("gcdsim-worker{}", std::env::consts::EXE_SUFFIX)))
}
