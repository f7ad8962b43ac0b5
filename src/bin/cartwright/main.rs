//! Cartwright CLI

use std::{
    fs::File,
    io::{self, BufWriter, IsTerminal, Write},
    process::ExitCode,
    time::Instant,
};

use anyhow::{Context, bail};
use cartwright::{
    fixtures::{read_items, read_listings, read_shipping},
    items::DesiredItems,
    offers::{builder::build_matrix, pruning::prune_offers},
    plan::PurchasePlan,
    solution::Solution,
    solvers::{Solver, milp::MilpSolver, path::PathSolver},
};
use humanize_duration::{Truncate, prelude::DurationExt};
use tracing::{error, info, warn};

use crate::config::{Config, SolverKind};

mod config;
mod observability;

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            // Prints help/version as well as usage errors.
            _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(err) = observability::init_subscriber(&config.logging) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "run failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> anyhow::Result<()> {
    let listings = read_listings(&config.listings)
        .with_context(|| format!("loading listings from {}", config.listings.display()))?;

    let mut tiers = read_shipping(&config.shipping)
        .with_context(|| format!("loading shipping from {}", config.shipping.display()))?;

    if let Some(cap) = config.value_cap {
        tiers = tiers.with_value_cap(cap);
    }

    let mut desired = desired_items(config)?;

    let matrix = build_matrix(&listings, &desired)?;

    if config.allow_partial {
        let shippable = matrix.retain_shippable(&tiers);

        for item in desired.retain_offered(|key| shippable.offers_item(key)) {
            warn!(item = %item, "no seller with shipping offers item, leaving it out");
        }
    }

    let pruned = prune_offers(&matrix);

    info!(
        listings = listings.len(),
        sellers = matrix.len(),
        survivors = pruned.len(),
        items = desired.len(),
        "prepared offers"
    );

    let started = Instant::now();

    let solution: Solution = match config.solver {
        SolverKind::Path => PathSolver::new(config.basis).solve(&pruned, &desired, &tiers)?,
        SolverKind::Milp => MilpSolver.solve(&pruned, &desired, &tiers)?,
    };

    let elapsed = started.elapsed();

    info!(elapsed = %elapsed.human(Truncate::Nano), "solved");

    let plan = PurchasePlan::new(&solution).with_currency(config.currency.iso());

    if let Some(path) = &config.output {
        let file = File::create(path)
            .with_context(|| format!("creating output file {}", path.display()))?;
        let mut out = BufWriter::new(file);

        plan.write_to(&mut out)?;
        out.flush()?;
    } else {
        let stdout = io::stdout();
        let color = stdout.is_terminal();
        let mut out = stdout.lock();

        plan.with_color(color).write_to(&mut out)?;
        writeln!(out, " Solved in {}", elapsed.human(Truncate::Nano))?;
    }

    Ok(())
}

fn desired_items(config: &Config) -> anyhow::Result<DesiredItems> {
    let mut desired = match &config.items_file {
        Some(path) => read_items(path)
            .with_context(|| format!("loading items from {}", path.display()))?,
        None => DesiredItems::new(),
    };

    for item in &config.items {
        desired.insert(item);
    }

    if desired.is_empty() {
        bail!("no desired items given; use --item or --items-file");
    }

    Ok(desired)
}
