use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use stage_core::{ValidationOptions, validate};
use stage_tools::{load_options, load_stage};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the stage JSON file to validate
    stage: PathBuf,
    /// Optional TOML file with validation options
    #[arg(short, long)]
    options: Option<PathBuf>,
    /// Cap on expanded search nodes (default scales with the stage)
    #[arg(long)]
    node_budget: Option<u64>,
    /// Wall-clock search budget in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Skip the patrol strategy library and go straight to search
    #[arg(long)]
    no_patrol: bool,
    #[arg(long)]
    no_code: bool,
    #[arg(long)]
    no_analysis: bool,
    /// Print the full result as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    /// Flags win over the options file.
    fn apply_overrides(&self, mut options: ValidationOptions) -> ValidationOptions {
        if self.node_budget.is_some() {
            options.node_budget = self.node_budget;
        }
        if self.timeout_ms.is_some() {
            options.time_budget_ms = self.timeout_ms;
        }
        if self.no_patrol {
            options.use_patrol_validator = false;
        }
        if self.no_code {
            options.include_code = false;
        }
        if self.no_analysis {
            options.include_analysis = false;
        }
        options
    }
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();

    let config = load_stage(&args.stage)?;
    let options = args.apply_overrides(load_options(args.options.as_deref())?);
    log::info!("validating {} with {:?}", args.stage.display(), options);

    let result = validate(&config, &options);
    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .with_context(|| "Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print!("{}", result.summary());
        if let Some(code) = &result.code {
            println!();
            print!("{}", code.compact);
        }
    }

    Ok(if result.success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
