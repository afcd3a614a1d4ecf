use anyhow::{Context, Result};
use clap::Parser;
use evoalpha::config::{AppConfig, ConfigManager, DataSource};
use evoalpha::data::{CsvMarketData, MarketDataProvider, SyntheticMarketData};
use evoalpha::engines::generation::{EvolutionRun, LogProgressCallback};
use evoalpha::hypothesis::StaticHypotheses;
use evoalpha::registry::{AlphaRegistry, InMemoryRegistry, JsonlRegistry, RegistryFilter};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "evoalpha", about = "Evolutionary alpha discovery and validation")]
struct Args {
    /// TOML configuration file; `EVOALPHA__SECTION__FIELD` variables override it.
    #[arg(long, env = "EVOALPHA_CONFIG")]
    config: Option<PathBuf>,

    /// Seed for the first cycle; later cycles use seed + cycle index.
    #[arg(long)]
    seed: Option<u64>,

    /// JSON-lines registry file.
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Evolutionary cycles to run; 0 keeps running.
    #[arg(long, default_value_t = 1)]
    cycles: usize,

    /// Pause between cycles.
    #[arg(long, default_value_t = 60)]
    interval_secs: u64,

    /// Wide price CSV (date column plus one column per asset).
    #[arg(long, conflicts_with = "synthetic_assets")]
    csv: Option<PathBuf>,

    #[arg(long)]
    synthetic_assets: Option<usize>,

    #[arg(long)]
    synthetic_bars: Option<usize>,

    #[arg(long)]
    synthetic_seed: Option<u64>,

    /// Registry records to print after the last cycle.
    #[arg(long)]
    top: Option<usize>,
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let manager = ConfigManager::new();
    manager
        .load_layered(args.config.as_deref())
        .context("Failed to load configuration")?;

    manager
        .update(|config| {
            if let Some(seed) = args.seed {
                config.evolution.seed = Some(seed);
            }
            if let Some(path) = &args.registry {
                config.registry.path = Some(path.clone());
            }
            if let Some(top) = args.top {
                config.registry.top_n = top;
            }
            if let Some(path) = &args.csv {
                config.data.source = DataSource::Csv { path: path.clone() };
            } else if args.synthetic_assets.is_some()
                || args.synthetic_bars.is_some()
                || args.synthetic_seed.is_some()
            {
                let (assets, bars, seed) = match &config.data.source {
                    DataSource::Synthetic { assets, bars, seed } => (*assets, *bars, *seed),
                    DataSource::Csv { .. } => (3, 1500, 7),
                };
                config.data.source = DataSource::Synthetic {
                    assets: args.synthetic_assets.unwrap_or(assets),
                    bars: args.synthetic_bars.unwrap_or(bars),
                    seed: args.synthetic_seed.unwrap_or(seed),
                };
            }
        })
        .context("Invalid configuration")?;

    Ok(manager.get())
}

fn build_provider(config: &AppConfig) -> Result<Box<dyn MarketDataProvider>> {
    let provider: Box<dyn MarketDataProvider> = match &config.data.source {
        DataSource::Synthetic { assets, bars, seed } => {
            Box::new(SyntheticMarketData::new(*assets, *bars, *seed)?)
        }
        DataSource::Csv { path } => Box::new(
            CsvMarketData::load(path)
                .with_context(|| format!("Failed to load prices from {}", path.display()))?,
        ),
    };
    Ok(provider)
}

fn build_registry(config: &AppConfig) -> Result<Box<dyn AlphaRegistry>> {
    let registry: Box<dyn AlphaRegistry> = match &config.registry.path {
        Some(path) => Box::new(
            JsonlRegistry::open(path)
                .with_context(|| format!("Failed to open registry {}", path.display()))?,
        ),
        None => Box::new(InMemoryRegistry::new()),
    };
    Ok(registry)
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let provider = build_provider(&config)?;
    let registry = build_registry(&config)?;
    let hypotheses = StaticHypotheses;

    let mut cycle = 0;
    loop {
        let mut cycle_config = config.clone();
        cycle_config.evolution.seed = config.evolution.seed.map(|s| s.wrapping_add(cycle as u64));

        log::info!("Cycle {} starting", cycle + 1);
        let mut run = EvolutionRun::new(cycle_config)?;
        let report = run.run(
            provider.as_ref(),
            Some(registry.as_ref()),
            &hypotheses,
            &mut LogProgressCallback,
        );
        if let Some(error) = &report.data_error {
            log::warn!("Cycle {} ran without market data: {}", cycle + 1, error);
        }
        log::info!(
            "Cycle {} done: {} generations, {} accepted, {} saved, registry holds {}",
            cycle + 1,
            report.generations_completed,
            report.accepted.len(),
            report.saved,
            registry.len()
        );

        cycle += 1;
        if args.cycles != 0 && cycle >= args.cycles {
            break;
        }
        std::thread::sleep(Duration::from_secs(args.interval_secs));
    }

    let filter = RegistryFilter::from_config(&config.registry);
    let top = registry.top_n(config.registry.top_n, &filter);
    if top.is_empty() {
        println!("No registry records pass the top-{} filter", config.registry.top_n);
    }
    for (rank, record) in top.iter().enumerate() {
        println!(
            "{:>3}. {} {:<28} sharpe {:>6.3}  persistence {:.3}  diversity {:.3}  consistency {:.3}  {}",
            rank + 1,
            record.id,
            record.name,
            record.composite_sharpe,
            record.persistence_score,
            record.diversity,
            record.consistency,
            record.description
        );
    }

    Ok(())
}
