use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use bte_rs::prelude::*;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Run the bundled strategies concurrently against generated trades and quotes.
#[derive(Parser, Debug)]
#[command(name = "bte", version, about)]
struct Args {
    /// Number of ticks and quotes to generate.
    #[arg(env = "NUM_TICKS", default_value_t = 1_000)]
    num_ticks: usize,

    /// Cash every strategy starts with.
    #[arg(env = "INITIAL_CAPITAL", default_value_t = 10_000.0)]
    initial_capital: f64,

    /// Period between generated events.
    #[arg(long, value_enum, default_value_t = TimeFrame::Minute)]
    time_frame: TimeFrame,

    /// Seed for reproducible data.
    #[arg(long)]
    seed: Option<u64>,

    /// Directory receiving `<name>_pnl.csv` and `<name>_statistics.csv`.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Suppress console reports. Implied when `WEB_INTERFACE` is set.
    #[arg(long, short)]
    quiet: bool,
}

impl From<Args> for SimulationConfig {
    fn from(args: Args) -> Self {
        Self {
            num_ticks: args.num_ticks,
            initial_capital: args.initial_capital,
            time_frame: args.time_frame,
            seed: args.seed,
            output_dir: args.output_dir,
            quiet: args.quiet || std::env::var_os("WEB_INTERFACE").is_some(),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = SimulationConfig::from(Args::parse());
    config.validate().context("invalid simulation parameters")?;
    tracing::info!(
        num_ticks = config.num_ticks,
        initial_capital = config.initial_capital,
        time_frame = %config.time_frame,
        seed = ?config.seed,
        "starting simulation"
    );

    let start = Instant::now();

    // Distinct streams for trades and quotes when seeded.
    let ticks = GbmJumpGenerator::new(config.num_ticks, config.time_frame, GbmParams::default(), config.seed)
        .generate_ticks()
        .context("failed to generate ticks")?;
    let quotes = QuoteGbmJumpGenerator::new(
        config.num_ticks,
        config.time_frame,
        GbmParams::default(),
        SpreadParams::default(),
        config.seed.map(|seed| seed.wrapping_add(1)),
    )
    .generate_ticks()
    .context("failed to generate quotes")?;

    let sink = (!config.quiet).then(OutputSink::stdout);
    let mut engine = BacktestEngine::new();
    if let Some(sink) = &sink {
        engine = engine.with_sink(sink.clone());
    }
    if let Some(dir) = &config.output_dir {
        engine = engine.with_csv_dir(dir);
    }
    engine.set_ticks(ticks);
    engine.set_quotes(quotes);

    let capital = config.initial_capital;
    engine.add_strategy(
        "Mean_Reversion",
        StrategyKind::trade(MeanReversion::default()),
        config.time_frame,
        capital,
    )?;
    engine.add_strategy(
        "Breakout_Win20",
        StrategyKind::trade(Breakout::new(20, 1.0)),
        config.time_frame,
        capital,
    )?;
    engine.add_strategy("Spread", StrategyKind::quote(Spread::default()), config.time_frame, capital)?;

    let results = engine.run_all();
    let failed = results.iter().filter(|r| r.is_err()).count();

    if let Some(sink) = &sink {
        sink.line(format_args!("Backtest finished in {:.3?}", start.elapsed()))?;
    }
    tracing::info!(strategies = results.len(), failed, elapsed = ?start.elapsed(), "simulation finished");

    if failed > 0 {
        bail!("{failed} of {} strategies failed", results.len());
    }
    Ok(())
}
