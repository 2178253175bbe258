//! Binary entrypoint for the Wayfarer CLI.
//!
//! Commands:
//! - `start` - run the adventure engine loop until interrupted
//! - `init` - create a starter `config.toml` and seed the demo world
//! - `status` - print store counts and quest watermarks
//!
//! See the library crate docs for module-level details: `wayfarer::`.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};

use wayfarer::config::Config;
use wayfarer::game::{AdventureEngine, StandardBalance, WatermarkTracker};
use wayfarer::notify::LogNotifier;
use wayfarer::storage::GameStoreBuilder;

#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(about = "A persistent-world idle-adventure backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the adventure engine
    Start,
    /// Initialize a new configuration and seed the demo world
    Init,
    /// Show store and engine status
    Status,
}

fn init_logging(configured_level: &str, verbose: u8) {
    let level = match verbose {
        0 => configured_level.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            init_logging("info", cli.verbose);
            let config = Config::create_default(&cli.config).await?;
            info!("wrote starter configuration to {}", cli.config);
            let store = GameStoreBuilder::new(config.storage.store_path())
                .with_demo_world()
                .open()?;
            let counts = store.counts()?;
            info!(
                "store initialized at {}: {} zones, {} quests, {} events",
                config.storage.store_path().display(),
                counts.zones,
                counts.quests,
                counts.events
            );
            Ok(())
        }
        Commands::Start => {
            let config = Config::load(&cli.config).await?;
            init_logging(&config.logging.level, cli.verbose);
            info!("starting world '{}'", config.game.world_name);

            let mut builder = GameStoreBuilder::new(config.storage.store_path());
            if config.game.seed_demo_world {
                builder = builder.with_demo_world();
            }
            let store = Arc::new(builder.open()?);
            let watermarks =
                WatermarkTracker::load(WatermarkTracker::default_path(&config.storage.data_dir))?;
            let engine = AdventureEngine::new(
                store,
                Arc::new(LogNotifier),
                Arc::new(StandardBalance),
                watermarks,
                chrono::Duration::minutes(config.game.update_interval_minutes as i64),
            )
            .with_currency_name(&config.game.currency_name);

            let cadence = std::time::Duration::from_secs(config.game.tick_seconds as u64);
            tokio::select! {
                _ = engine.run_loop(cadence) => {}
                _ = tokio::signal::ctrl_c() => {
                    warn!("interrupt received, shutting down");
                }
            }
            let counters = wayfarer::metrics::snapshot();
            info!(
                "processed {} ticks this run ({} successes, {} failures, {} events)",
                counters.ticks_processed,
                counters.quest_successes,
                counters.quest_failures,
                counters.events_delivered
            );
            Ok(())
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            init_logging(&config.logging.level, cli.verbose);
            let store = GameStoreBuilder::new(config.storage.store_path()).open()?;
            let counts = store.counts()?;
            println!("world: {}", config.game.world_name);
            println!(
                "players: {}  guilds: {}  zones: {}  quests: {}  events: {}",
                counts.players, counts.guilds, counts.zones, counts.quests, counts.events
            );
            let watermarks =
                WatermarkTracker::load(WatermarkTracker::default_path(&config.storage.data_dir))?;
            if watermarks.is_empty() {
                println!("watermarks: none recorded yet");
            } else {
                for (zone, number) in watermarks.iter() {
                    println!("watermark: zone {zone} -> quest {number}");
                }
            }
            Ok(())
        }
    }
}
