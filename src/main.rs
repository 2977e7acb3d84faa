use anyhow::{Context, Result};
use biosoup_lib::config::AppConfig;
use biosoup_lib::metrics::init_logging;
use biosoup_lib::soup::Soup;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the random seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Override the number of generations
    #[arg(short, long)]
    generations: Option<usize>,

    /// Override the population size
    #[arg(short, long)]
    population: Option<usize>,

    /// Print generation reports as JSON
    #[arg(long)]
    json: bool,
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            AppConfig::from_toml(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => AppConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.evolution.seed = seed;
    }
    if let Some(generations) = args.generations {
        config.evolution.generations = generations;
    }
    if let Some(population) = args.population {
        config.evolution.population = population;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    let config = load_config(&args)?;
    let generations = config.evolution.generations;

    let mut soup = Soup::new(config)?;
    let reports = soup.run(generations)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for r in &reports {
            println!(
                "gen {:>4}  pop {:>4}  species {:>3}  best {:>8.3}  mean {:>8.3}  cells {:>5.1}",
                r.generation, r.population, r.species_count, r.best_fitness, r.mean_fitness, r.mean_cells
            );
        }
    }
    soup.metrics().log_summary();
    Ok(())
}
