//! Clique Sampling Demo
//!
//! Builds a pool of simulated devices, reports the largest clique each
//! topology supports and samples a ferromagnet or spin glass on it. With
//! `--fail-primary` the bound device goes offline before submission and
//! the sampler fails over.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

use arvak_adapter_anneal_sim::{SimDevice, SimulatedAnnealerPool};
use arvak_anneal::{ResilientCompositeSampler, SampleParams, SamplerConfig};
use arvak_demos::problems::{chain_break_fraction, ferromagnet, spin_glass};
use arvak_demos::{print_header, print_result, print_section, print_success, print_warning};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Problem {
    Ferromagnet,
    SpinGlass,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Topology {
    FourGroup,
    SixTile,
}

#[derive(Parser, Debug)]
#[command(name = "demo-clique")]
#[command(about = "Sample a clique problem on a simulated annealing device")]
struct Args {
    /// Hardware topology family
    #[arg(short, long, value_enum, default_value = "four-group")]
    topology: Topology,

    /// Grid size: rows and columns for four-group, size for six-tile
    #[arg(short, long, default_value = "4")]
    size: u32,

    /// Problem to sample
    #[arg(short, long, value_enum, default_value = "spin-glass")]
    problem: Problem,

    /// Number of logical variables (0 = largest clique)
    #[arg(short = 'n', long, default_value = "0")]
    variables: usize,

    /// Reads per submission
    #[arg(short, long, default_value = "20")]
    reads: u32,

    /// Seed for the problem and the simulator
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Take the primary device offline before sampling
    #[arg(long)]
    fail_primary: bool,

    /// Seconds between failovers (negative = single failover)
    #[arg(long, default_value = "-1", allow_hyphen_values = true)]
    retry_interval: f64,

    /// Let the sampler rescale out-of-range problems
    #[arg(long)]
    auto_scale: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn device(topology: Topology, name: &str, size: u32, dead: &[u32]) -> anyhow::Result<SimDevice> {
    let device = match topology {
        Topology::FourGroup => SimDevice::four_group(name, size, size, 4, dead.iter().copied())?,
        Topology::SixTile => SimDevice::six_tile(name, size, dead.iter().copied())?,
    };
    Ok(device)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    print_header("Resilient Clique Sampling Demo");

    let pool = Arc::new(
        SimulatedAnnealerPool::new([
            device(args.topology, "primary", args.size, &[])?,
            device(args.topology, "backup", args.size, &[0, 5, 17])?,
        ])?
        .with_seed(args.seed),
    );

    let config = SamplerConfig::new()
        .with_failover(true)
        .with_retry_interval(args.retry_interval)
        .with_auto_scale(args.auto_scale);
    let sampler = ResilientCompositeSampler::with_config(pool.clone(), config)?;

    print_section("Device");
    print_result("Topology", format!("{:?}", args.topology));
    print_result("Binding", sampler.binding());
    print_result("Working qubits", sampler.target_graph()?.num_nodes());
    let largest = sampler.largest_clique_size()?;
    print_result("Largest clique", largest);
    print_result("Longest chain", sampler.largest_clique()?.max_chain_length());

    let n = if args.variables == 0 { largest } else { args.variables };
    let bqm = match args.problem {
        Problem::Ferromagnet => ferromagnet(n)?,
        Problem::SpinGlass => spin_glass(n, &mut StdRng::seed_from_u64(args.seed))?,
    };

    print_section("Problem");
    print_result("Kind", format!("{:?}", args.problem));
    print_result("Variables", bqm.num_variables());
    print_result("Interactions", bqm.num_interactions());

    if args.fail_primary {
        pool.set_online("primary", false)?;
        print_warning("primary device taken offline");
    }

    let params = SampleParams::new().with_extra("num_reads", serde_json::json!(args.reads));
    let outcome = sampler
        .sample(&bqm, &params)
        .await
        .context("sampling failed")?;

    print_section("Result");
    print_result("Binding", &outcome.binding);
    print_result("Failovers", outcome.failovers);
    print_result("Chain strength", outcome.chain_strength);
    print_result("Scale", outcome.scale);
    print_result("Physical qubits", outcome.embedding.num_qubits());
    print_result("Distinct samples", outcome.sampleset.len());
    if let Some((_, energy)) = outcome.sampleset.lowest() {
        print_result("Lowest energy", format!("{energy:.4}"));
    }
    print_result(
        "Chain breaks",
        format!("{:.2}%", 100.0 * chain_break_fraction(&outcome)),
    );

    println!();
    print_success("Done");
    Ok(())
}
