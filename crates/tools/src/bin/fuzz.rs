use anyhow::{Context, Result, ensure};
use clap::Parser;
use stage_core::{FailureKind, Stage, ValidationOptions, replay_actions, validate};
use stage_tools::random_stage;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    /// Number of consecutive seeds to generate
    #[arg(short, long, default_value_t = 200)]
    count: u64,
    #[arg(long, default_value_t = 50_000)]
    node_budget: u64,
}

#[derive(Default)]
struct Tally {
    solved: u64,
    unsolvable: u64,
    exhausted: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("Fuzzing {} stage(s) from seed {}...", args.count, args.seed);
    let options =
        ValidationOptions { node_budget: Some(args.node_budget), ..ValidationOptions::default() };
    let mut tally = Tally::default();

    for seed in args.seed..args.seed.saturating_add(args.count) {
        let config = random_stage(seed);
        let first = validate(&config, &options);
        let second = validate(&config, &options);
        ensure!(first == second, "seed {seed}: repeated validation disagreed");

        if first.success {
            let stage = Stage::compile(&config)
                .with_context(|| format!("seed {seed}: solved stage failed to compile"))?;
            let trace = replay_actions(&stage, &first.solution)
                .with_context(|| format!("seed {seed}: reported solution does not replay"))?;
            ensure!(
                first.final_fingerprint == Some(trace.final_fingerprint()),
                "seed {seed}: final fingerprint differs from replay"
            );
            tally.solved += 1;
        } else if first.is_exhausted() {
            tally.exhausted += 1;
        } else {
            ensure!(
                first.failure != Some(FailureKind::Verification),
                "seed {seed}: found solution failed verification: {}",
                first.error.as_deref().unwrap_or("unknown")
            );
            ensure!(first.issues.is_empty(), "seed {seed}: generator produced an invalid stage");
            tally.unsolvable += 1;
        }
    }

    println!(
        "Fuzzing completed: {} solved, {} unsolvable, {} exhausted.",
        tally.solved, tally.unsolvable, tally.exhausted
    );
    Ok(())
}
