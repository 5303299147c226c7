use anyhow::{Context, Result};
use bvn::EngineCfg;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::fmt::SubscriberBuilder;

#[derive(Parser)]
#[command(name = "bvn-round")]
#[command(about = "Round a fractional reviewer/paper assignment matrix to an integral one")]
struct Cmd {
    /// Path to a JSON document: {"npaps", "nrevs", "flows", "subsets"}
    #[arg(long)]
    input: PathBuf,

    /// Where to write the rounded JSON document
    #[arg(long)]
    out: PathBuf,

    /// Fix the RNG seed for a reproducible run instead of wall-clock seeding
    #[arg(long)]
    seed: Option<u64>,

    /// Override the iteration bound the engine gives up after
    #[arg(long)]
    max_iterations: Option<usize>,
}

#[derive(Deserialize)]
struct Input {
    npaps: usize,
    nrevs: usize,
    flows: Vec<f64>,
    subsets: Vec<i64>,
}

#[derive(Serialize)]
struct Output {
    npaps: usize,
    nrevs: usize,
    flows: Vec<f64>,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    run(cmd)
}

fn run(cmd: Cmd) -> Result<()> {
    let raw = std::fs::read_to_string(&cmd.input)
        .with_context(|| format!("reading {}", cmd.input.display()))?;
    let input: Input = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {} as a rounding input document", cmd.input.display()))?;

    tracing::info!(npaps = input.npaps, nrevs = input.nrevs, seed = ?cmd.seed, "round");

    let mut flows = input.flows;
    let cfg = EngineCfg {
        max_iterations: cmd
            .max_iterations
            .unwrap_or_else(|| EngineCfg::default().max_iterations),
    };

    let seed = cmd.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    });
    let mut rng = StdRng::seed_from_u64(seed);
    let _: f64 = rng.gen();

    let span = tracing::info_span!("engine");
    let _enter = span.enter();
    bvn::run_bvn_with(&mut flows, &input.subsets, input.npaps, input.nrevs, &cfg, &mut rng)
        .context("rounding engine failed")?;
    drop(_enter);

    if let Some(parent) = cmd.out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let output = Output {
        npaps: input.npaps,
        nrevs: input.nrevs,
        flows,
    };
    std::fs::write(&cmd.out, serde_json::to_string_pretty(&output)?)
        .with_context(|| format!("writing {}", cmd.out.display()))?;

    tracing::info!(out = %cmd.out.display(), "wrote rounded assignment");
    Ok(())
}
