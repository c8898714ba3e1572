use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use super::{
    ApiError, LeverArgs, Result, SimulateArgs, StressPayload, build_levers, build_simulation,
    build_stress, run_http_server, run_levers, run_simulation, run_stress,
};

#[derive(Parser, Debug)]
#[command(
    name = "runway",
    about = "Revenue fan-chart simulator and cash-runway lever model"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API over HTTP.
    Serve {
        #[arg(long, env = "RUNWAY_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Simulate revenue paths and print percentile bands.
    Simulate(SimulateArgs),
    /// Recompute runway for a pair of lever positions.
    Levers(LeverArgs),
    /// Run the bear/base/bull stress test and survival score over a KPI file.
    Stress {
        #[arg(long, help = "JSON file: {\"snapshots\": [{\"mrr\": .., \"burnRate\": ..}]}")]
        input: PathBuf,
        #[arg(long)]
        simulations: Option<u32>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve { port } => {
            info!(port, "starting HTTP server");
            run_http_server(port).await?;
        }
        Command::Simulate(args) => {
            let request = build_simulation(args)?;
            let response = run_simulation(&request);
            if response.bands.is_empty() {
                info!("nothing to project: start value not positive or base target missing");
            }
            print_json(&response)?;
        }
        Command::Levers(args) => {
            let request = build_levers(args)?;
            print_json(&run_levers(&request))?;
        }
        Command::Stress {
            input,
            simulations,
            seed,
        } => {
            let raw = std::fs::read_to_string(&input)?;
            let mut payload: StressPayload = serde_json::from_str(&raw)?;
            if simulations.is_some() {
                payload.simulations = simulations;
            }
            if seed.is_some() {
                payload.seed = seed;
            }
            let request = build_stress(payload)?;
            print_json(&run_stress(&request))?;
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(ApiError::from)?;
    println!("{json}");
    Ok(())
}
