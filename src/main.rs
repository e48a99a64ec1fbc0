mod simulation;

use anyhow::Result;
use clap::Parser;

use simulation::{SimConfig, SimEnvironment};

#[derive(Parser)]
#[command(name = "lane_sim")]
#[command(about = "Multi-lane grid traffic simulation")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "200")]
    ticks: u64,

    /// Seed for reproducible runs; omit for OS randomness
    #[arg(long)]
    seed: Option<u64>,

    /// Grid height override
    #[arg(long)]
    rows: Option<usize>,

    /// Lane count override
    #[arg(long)]
    cols: Option<usize>,

    /// Number of vehicles to spawn
    #[arg(long)]
    cars: Option<usize>,

    /// Print a summary and map every N ticks
    #[arg(long, default_value = "20")]
    summary_every: u64,

    /// After the run, rewind this many ticks and show the restored state
    #[arg(long, default_value = "0")]
    rewind: u32,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = SimConfig::default();
    if let Some(rows) = cli.rows {
        config.rows = rows;
    }
    if let Some(cols) = cli.cols {
        config.cols = cols;
    }
    if let Some(cars) = cli.cars {
        config.num_cars_spawn = cars;
    }

    let mut environment = match cli.seed {
        Some(seed) => SimEnvironment::new_with_seed(config, seed)?,
        None => SimEnvironment::new(config)?,
    };

    println!("Initial state:");
    environment.print_summary();
    environment.draw_map();
    println!();

    for _ in 0..cli.ticks {
        environment.step()?;

        if environment.tick() % cli.summary_every == 0 {
            environment.print_summary();
            environment.draw_map();
            println!();
        }

        if environment.vehicles().is_empty() {
            println!("All vehicles have left the grid.");
            break;
        }
    }

    println!("=== Final state ===");
    environment.print_summary();
    environment.draw_map();

    if cli.rewind > 0 {
        for _ in 0..cli.rewind {
            if let Err(error) = environment.rewind() {
                println!("{error}");
                break;
            }
        }
        println!();
        println!("=== After rewinding up to {} ticks ===", cli.rewind);
        environment.print_summary();
        environment.draw_map();
    }

    Ok(())
}
