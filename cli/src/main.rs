use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use slotswap::config::load_json;
use slotswap::scheduler::schedule;
use slotswap::validate::{Roster, RosterValidator, Validator};
use slotswap::{find_shift_paths, Axis, Config, EnumerationOrder, GraphBuilder, PreferenceGraph, Request, ShiftQuery, Slot, Strategy};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "slotswap")]
#[command(about = "Propose section swaps that satisfy student requests without changing section sizes")]
struct Cli {
    /// Course configuration: compatibility table, search limits, default shifts.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Inputs {
    /// Normalized requests, as a JSON array.
    #[arg(long)]
    requests: PathBuf,

    /// Authoritative roster (JSON object of id -> sections); requests are checked against it first.
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Walk the graph in a seeded random order instead of by student id; rerun with other seeds for alternatives.
    #[arg(long)]
    seed: Option<u64>,

    /// Stop enumerating after this many cycles.
    #[arg(long)]
    max_cycles: Option<usize>,

    /// Print reports as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the best set of disjoint swap cycles
    Cycles {
        #[command(flatten)]
        inputs: Inputs,
        /// Run only this strategy; both run by default.
        #[arg(long)]
        strategy: Option<Strategy>,
    },
    /// Find chains of moves shifting one student from a section to another
    Shift {
        #[command(flatten)]
        inputs: Inputs,
        /// Sections to take a student from, e.g. "TR 11am-12pm with Hari Balakrishnan". Defaults to the configured shifts.
        #[arg(long, requires = "to")]
        from: Vec<Slot>,
        /// Sections to add a student to.
        #[arg(long, requires = "from")]
        to: Vec<Slot>,
        #[arg(long, default_value = "tutorial")]
        axis: Axis,
    },
}

fn load_graph(config: &Config, inputs: &Inputs) -> Result<PreferenceGraph> {
    let requests: Vec<Request> = load_json(&inputs.requests)?;
    info!(requests = requests.len(), "loaded requests");

    if let Some(path) = &inputs.roster {
        let roster: Roster = load_json(path)?;
        for issue in RosterValidator.validate(&requests, &roster, &config.compatibility) {
            warn!(%issue, "suspicious request");
        }
    }

    GraphBuilder::with_compatibility(config.compatibility.clone())
        .add_requests(requests)
        .build()
        .context("building the preference graph")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if config.compatibility.is_empty() {
        warn!("compatibility table is empty; every preference request will be dropped");
    }

    match cli.command {
        Commands::Cycles { inputs, strategy } => {
            apply_overrides(&mut config, &inputs);
            let graph = load_graph(&config, &inputs)?;

            let strategies = match strategy {
                Some(strategy) => vec![strategy],
                None => vec![Strategy::AppealsFirst, Strategy::ConflictFirst],
            };
            let reports = strategies.into_iter()
                .map(|strategy| schedule(&graph, strategy, &config.limits))
                .collect::<Vec<_>>();

            if inputs.json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    println!("{}", report);
                }
                println!("Remember to manually fix schedule conflicts and confirm special cases/exceptions!");
            }
        }
        Commands::Shift { inputs, from, to, axis } => {
            apply_overrides(&mut config, &inputs);
            let graph = load_graph(&config, &inputs)?;

            let queries = if from.is_empty() {
                std::mem::take(&mut config.shifts)
            } else {
                vec![ShiftQuery { from, to, axis }]
            };
            if queries.is_empty() {
                bail!("no shift given: pass --from and --to, or list shifts in the config");
            }

            let reports = queries.iter()
                .map(|query| find_shift_paths(&graph, query, &config.limits))
                .collect::<Vec<_>>();

            if inputs.json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    println!("{}", report);
                }
                println!("Paths only balance one axis; check the other section still works before applying.");
            }
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, inputs: &Inputs) {
    if let Some(seed) = inputs.seed {
        config.limits.order = EnumerationOrder::Shuffled { seed };
    }
    if let Some(max_cycles) = inputs.max_cycles {
        config.limits.max_cycles = max_cycles;
    }
}
