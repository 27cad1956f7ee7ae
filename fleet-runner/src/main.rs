mod loader;
mod policy;
mod reports;
mod runner;
mod seeds;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use fleet_sim::FleetEngine;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use loader::FileLoader;
use policy::{PolicyStrategy, expand_policies};
use runner::{EpisodeRunner, EpisodeSummary};
use seeds::resolve_seed_inputs;
use util::split_csv;

#[derive(Debug, Parser)]
#[command(name = "fleet-runner", version = "0.1.0")]
#[command(about = "Headless episode runner for the fleet rotation simulator")]
struct Args {
    /// Simulation configuration JSON (defaults to the embedded config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ports JSON: { "CODE": { "latitude": .., "longitude": .. } }
    #[arg(long)]
    ports: Option<PathBuf>,

    /// Distance table JSON: { "FROM": { "TO": distance } }
    #[arg(long)]
    distances: Option<PathBuf>,

    /// Aircraft models JSON: { "MODEL": { "fuel": .., "capacity": .. } }
    #[arg(long)]
    models: Option<PathBuf>,

    /// Evaluation baselines JSON: { "FROM": { "TO": passengers } }
    #[arg(long)]
    baseline: Option<PathBuf>,

    /// Policies to run (comma-separated, or "all")
    #[arg(long, default_value = "greedy")]
    policy: String,

    /// List all available policies and exit
    #[arg(long)]
    list_policies: bool,

    /// Seeds to run (comma-separated; defaults to the configured seed)
    #[arg(long, default_value = "")]
    seeds: String,

    /// Episodes per seed
    #[arg(long, default_value_t = 1)]
    episodes: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_policies(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let engine = FleetEngine::new(FileLoader {
        ports: args.ports.clone(),
        distances: args.distances.clone(),
        models: args.models.clone(),
        config: args.config.clone(),
        baselines: args.baseline.clone(),
    });
    let sim = engine
        .create_simulation()
        .context("failed to build simulation")?;
    let policies = expand_policies(&split_csv(&args.policy))?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds), sim.config().seed)?;
    let episodes = args.episodes.max(1);

    println!(
        "🛫 {} ports, {} aircraft, horizon {}, reward {}",
        sim.registry().num_ports(),
        sim.registry().fleet_size(),
        sim.horizon(),
        sim.reward_model().name()
    );

    let mut runner = EpisodeRunner::new(sim, args.verbose);
    let mut all_results: Vec<EpisodeSummary> = Vec::new();
    for strategy in policies {
        println!("{} {}", "▶ Running".bright_yellow().bold(), strategy.label());
        all_results.extend(runner.run_policy(strategy, &seeds, episodes)?);
    }

    write_reports(&args, &all_results, start_time)?;

    if all_results.iter().any(|r| !r.passed()) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_policies(args: &Args) -> Result<bool> {
    if !args.list_policies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available policies:")?;
    for strategy in PolicyStrategy::ALL {
        writeln!(
            output_target.writer(),
            "  {:10} - {}",
            strategy.label(),
            strategy.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "✈️  Fleet Rotation Runner".bright_cyan().bold());
    println!("{}", "=========================".cyan());
}

fn write_reports(args: &Args, results: &[EpisodeSummary], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut output_target, results)?,
        "markdown" => reports::generate_markdown_report(&mut output_target, results)?,
        "csv" => reports::generate_csv_report(&mut output_target, results)?,
        _ => {
            let duration = start_time.elapsed();
            reports::generate_console_report(&mut output_target, results, duration)?;
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
