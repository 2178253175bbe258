//! # Wayfarer - Persistent-World Idle-Adventure Backend
//!
//! Wayfarer is the server side of a persistent-world text game: players
//! advance through zones by running timed quests, periodically receive
//! random zone events, and accrue experience, currency, and guild prestige.
//! A chat front end (or any other transport) plugs in through the
//! [`notify::NotificationSink`] trait; everything else lives here.
//!
//! ## Features
//!
//! - **Tick-Driven Progression**: A scheduler finds adventures whose update
//!   interval has elapsed and resolves each to a quest success, a quest
//!   failure, or a zone event, with exactly one notification per tick.
//! - **Compact Progress Encoding**: Per-player zone progress is stored as a
//!   fixed-width binary blob of (zone id, progress) pairs.
//! - **Identity Caching**: Player and guild reads hand out shared handles,
//!   so in-place mutation plus write-through keeps cache and store aligned
//!   without invalidation traffic.
//! - **Pluggable Balance**: Success curves, rewards, prestige, and quest
//!   durations sit behind the [`game::BalancePolicy`] trait.
//! - **Durable Watermarks**: The highest completed quest per zone is
//!   persisted for content generation to build ahead of the players.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wayfarer::config::Config;
//! use wayfarer::game::{AdventureEngine, StandardBalance, WatermarkTracker};
//! use wayfarer::notify::LogNotifier;
//! use wayfarer::storage::GameStoreBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let store = Arc::new(
//!         GameStoreBuilder::new(config.storage.store_path())
//!             .with_demo_world()
//!             .open()?,
//!     );
//!     let watermarks =
//!         WatermarkTracker::load(WatermarkTracker::default_path(&config.storage.data_dir))?;
//!     let engine = AdventureEngine::new(
//!         store,
//!         Arc::new(LogNotifier),
//!         Arc::new(StandardBalance),
//!         watermarks,
//!         chrono::Duration::minutes(config.game.update_interval_minutes as i64),
//!     );
//!     engine.run_loop(std::time::Duration::from_secs(30)).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - Domain records, progress codec, balance policy, engine,
//!   and watermark tracking
//! - [`storage`] - Sled-backed persistence and the read-through caches
//! - [`notify`] - Notification sink trait and bundled implementations
//! - [`config`] - Configuration loading and validation
//! - [`metrics`] - Engine counters
//! - [`logutil`] - Log sanitization helpers

pub mod config;
pub mod game;
pub mod logutil;
pub mod metrics;
pub mod notify;
pub mod storage;
