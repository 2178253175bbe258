//! Test utilities & fixtures.
//! Builds throwaway seeded stores and engines with deterministic policies
//! and a recording notification sink.

// Each suite pulls in the subset it needs; silence the rest.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::Duration;
use tempfile::TempDir;

use wayfarer::game::{
    AdventureEngine, BalancePolicy, Player, QuestRoll, Reward, WatermarkTracker,
};
use wayfarer::notify::{NotificationSink, NotifyError};
use wayfarer::storage::{GameStore, GameStoreBuilder};

/// Collects every notification so tests can assert on count and content.
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<(u64, String)>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<(u64, String)> {
        self.messages.lock().expect("sink mutex").clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, player: &Player, text: &str) -> Result<(), NotifyError> {
        self.messages
            .lock()
            .expect("sink mutex")
            .push((player.id, text.to_string()));
        Ok(())
    }
}

/// A sink that always fails, for best-effort delivery tests.
pub struct FailingSink;

impl NotificationSink for FailingSink {
    fn notify(&self, _player: &Player, _text: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Sink("front end unreachable".to_string()))
    }
}

/// Deterministic balance: completion outcome and rewards are fixed, so
/// state-machine tests do not depend on dice.
pub struct ForcedOutcome {
    pub succeed: bool,
    pub duration_minutes: i64,
}

impl ForcedOutcome {
    pub fn success() -> Self {
        Self {
            succeed: true,
            duration_minutes: 0,
        }
    }

    pub fn failure() -> Self {
        Self {
            succeed: false,
            duration_minutes: 0,
        }
    }

    pub fn slow_success(duration_minutes: i64) -> Self {
        Self {
            succeed: true,
            duration_minutes,
        }
    }
}

impl BalancePolicy for ForcedOutcome {
    fn quest_success(
        &self,
        _rng: &mut dyn rand::RngCore,
        _player: &Player,
        _zone_level: u32,
        _quest_number: u16,
    ) -> QuestRoll {
        QuestRoll {
            roll: if self.succeed { 20 } else { 1 },
            target: 10,
            success: self.succeed,
        }
    }

    fn quest_rewards(&self, _player: &Player, _zone_level: u32, _quest_number: u16) -> Reward {
        Reward { xp: 100, coins: 50 }
    }

    fn event_rewards(&self, _player: &Player, _zone_level: u32) -> Reward {
        Reward { xp: 10, coins: 5 }
    }

    fn prestige_reward(&self, _zone_level: u32, _quest_number: u16) -> u64 {
        7
    }

    fn quest_duration(&self, _zone_level: u32, _quest_number: u16) -> Duration {
        Duration::minutes(self.duration_minutes)
    }
}

pub const UPDATE_INTERVAL_MINUTES: i64 = 30;

pub struct Fixture {
    // Held so the store directory outlives the test.
    _dir: TempDir,
    pub store: Arc<GameStore>,
    pub sink: Arc<RecordingSink>,
    pub engine: AdventureEngine,
}

/// Seeded store plus an engine wired to a recording sink and the given
/// policy. The watermark file lives in the same temp dir as the store.
pub fn fixture_with_policy(policy: impl BalancePolicy + 'static) -> Fixture {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(
        GameStoreBuilder::new(dir.path().join("world"))
            .with_demo_world()
            .open()
            .expect("store"),
    );
    let sink = Arc::new(RecordingSink::default());
    let watermarks =
        WatermarkTracker::load(WatermarkTracker::default_path(dir.path())).expect("watermarks");
    let engine = AdventureEngine::new(
        store.clone(),
        sink.clone(),
        Arc::new(policy),
        watermarks,
        Duration::minutes(UPDATE_INTERVAL_MINUTES),
    );
    Fixture {
        _dir: dir,
        store,
        sink,
        engine,
    }
}

/// Push a container's `last_update` far enough back that it is due.
pub fn backdate(store: &GameStore, player_id: u64) {
    let mut container = store.get_adventure(player_id).expect("container");
    container.last_update = chrono::Utc::now() - Duration::minutes(UPDATE_INTERVAL_MINUTES + 1);
    store.update_adventure(&container).expect("backdate");
}
