//! The adventure progression engine: tick state machine and scheduler.
//!
//! A container is either Idle (no quest) or Questing (quest plus pending
//! finish time). Each tick resolves to exactly one of three outcomes (the
//! quest completes, the quest fails, or a zone event is delivered) and
//! always (a) mutates the player aggregate in place, (b) writes it through
//! to the store, and (c) emits exactly one notification. The container's
//! `last_update` is advanced on every path, so a processed container drops
//! out of the due set until its interval elapses again.

use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info, warn};
use tokio::time::MissedTickBehavior;

use crate::game::errors::GameError;
use crate::game::policy::{BalancePolicy, Reward};
use crate::game::types::{AdventureContainer, Player, PlayerId, QuestId, ZoneId};
use crate::game::watermark::WatermarkTracker;
use crate::logutil::escape_log;
use crate::metrics;
use crate::notify::NotificationSink;
use crate::storage::GameStore;

/// What a single tick did to a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    QuestSucceeded { quest_id: QuestId, reward: Reward },
    QuestFailed { quest_id: QuestId },
    EventDelivered { reward: Reward },
}

/// Drives due adventures through the quest/event state machine.
///
/// All collaborators are injected: the store handle, the notification sink,
/// the balance policy, and the watermark tracker. The engine holds no other
/// state beyond the configured update interval.
pub struct AdventureEngine {
    store: Arc<GameStore>,
    notifier: Arc<dyn NotificationSink>,
    policy: Arc<dyn BalancePolicy>,
    watermarks: Mutex<WatermarkTracker>,
    update_interval: Duration,
    currency_name: String,
}

impl AdventureEngine {
    pub fn new(
        store: Arc<GameStore>,
        notifier: Arc<dyn NotificationSink>,
        policy: Arc<dyn BalancePolicy>,
        watermarks: WatermarkTracker,
        update_interval: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            policy,
            watermarks: Mutex::new(watermarks),
            update_interval,
            currency_name: "coins".to_string(),
        }
    }

    /// Override the currency noun used in reward lines.
    pub fn with_currency_name(mut self, name: &str) -> Self {
        self.currency_name = name.to_string();
        self
    }

    /// Every container whose update interval has elapsed.
    pub fn due_adventures(&self) -> Result<Vec<AdventureContainer>, GameError> {
        self.store.due_adventures(self.update_interval)
    }

    /// Assign the next quest in `zone_id` to an idle player and schedule
    /// its finish time. The ordinal picked is one past the player's
    /// furthest progress in that zone (0 for a first visit).
    pub fn embark(
        &self,
        player_id: PlayerId,
        zone_id: ZoneId,
    ) -> Result<AdventureContainer, GameError> {
        let mut container = self.store.get_adventure(player_id)?;
        if container.is_questing() {
            return Err(GameError::AlreadyQuesting(player_id));
        }
        let zone = self.store.get_zone(zone_id)?;
        let handle = self.store.get_player(player_id)?;
        let player = handle.lock().expect("player mutex poisoned");
        let next_number = player
            .progress
            .furthest(zone_id)
            .map_or(0, |reached| reached + 1);
        let quest = self.store.quest_from_number(zone_id, next_number)?;
        let now = Utc::now();
        container.quest_id = Some(quest.id);
        container.finish_time = now + self.policy.quest_duration(zone.level, quest.number);
        container.last_update = now;
        self.store.update_adventure(&container)?;
        info!(
            "player {} embarked on '{}' (zone {}, quest {})",
            player.name, quest.name, zone.name, quest.number
        );
        Ok(container)
    }

    /// Evaluate one due container: a finished quest rolls for completion,
    /// anything else receives a zone event.
    pub fn process(&self, container: AdventureContainer) -> Result<Outcome, GameError> {
        metrics::inc_ticks_processed();
        let now = Utc::now();
        match container.quest_id {
            Some(quest_id) if now >= container.finish_time => {
                self.complete_quest(container, quest_id, now)
            }
            _ => self.deliver_event(container, now),
        }
    }

    fn complete_quest(
        &self,
        mut container: AdventureContainer,
        quest_id: QuestId,
        now: DateTime<Utc>,
    ) -> Result<Outcome, GameError> {
        let quest = self.store.get_quest(quest_id)?;
        let zone = self.store.get_zone(quest.zone_id)?;
        let handle = self.store.get_player(container.player_id)?;
        let mut player = handle.lock().expect("player mutex poisoned");

        let roll =
            self.policy
                .quest_success(&mut rand::thread_rng(), &player, zone.level, quest.number);
        debug!(
            "quest roll for player {}: {} vs {} ({})",
            player.name,
            roll.roll,
            roll.target,
            if roll.success { "success" } else { "failure" }
        );

        // Either way the quest is over; the container goes back to idle.
        container.quest_id = None;
        container.last_update = now;

        if roll.success {
            let reward = self.policy.quest_rewards(&player, zone.level, quest.number);
            player.add_xp(reward.xp);
            player.coins = player.coins.saturating_add(reward.coins);
            player.progress.advance(zone.id, quest.number);
            self.store.update_player(&player)?;
            self.watermarks
                .lock()
                .expect("watermark mutex poisoned")
                .update(zone.id, quest.number)?;
            if let Some(guild_id) = player.guild_id {
                // The guild handle's lock serializes prestige updates from
                // concurrent members.
                let guild_handle = self.store.get_guild(guild_id)?;
                let mut guild = guild_handle.lock().expect("guild mutex poisoned");
                let prestige = self.policy.prestige_reward(zone.level, quest.number);
                guild.prestige = guild.prestige.saturating_add(prestige);
                self.store.update_guild(&guild)?;
            }
            self.store.update_adventure(&container)?;
            let text = format!("{}\n\n{}", quest.success_text, self.gain_line(reward));
            self.notify_best_effort(&player, &text);
            metrics::inc_quest_successes();
            Ok(Outcome::QuestSucceeded { quest_id, reward })
        } else {
            self.store.update_adventure(&container)?;
            self.notify_best_effort(&player, &quest.failure_text);
            metrics::inc_quest_failures();
            Ok(Outcome::QuestFailed { quest_id })
        }
    }

    fn deliver_event(
        &self,
        mut container: AdventureContainer,
        now: DateTime<Utc>,
    ) -> Result<Outcome, GameError> {
        let handle = self.store.get_player(container.player_id)?;
        let mut player = handle.lock().expect("player mutex poisoned");
        let zone_id = match container.quest_id {
            Some(quest_id) => self.store.get_quest(quest_id)?.zone_id,
            None => self.event_zone_for(&player)?,
        };
        let zone = self.store.get_zone(zone_id)?;
        let event = self.store.random_zone_event(zone_id)?;
        let reward = self.policy.event_rewards(&player, zone.level);
        player.add_xp(reward.xp);
        player.coins = player.coins.saturating_add(reward.coins);
        self.store.update_player(&player)?;
        container.last_update = now;
        self.store.update_adventure(&container)?;
        let text = format!("{}\n\n{}", event.event_text, self.gain_line(reward));
        self.notify_best_effort(&player, &text);
        metrics::inc_events_delivered();
        Ok(Outcome::EventDelivered { reward })
    }

    /// Zone context for an idle player's event: their furthest-progressed
    /// zone, or the lowest-level zone for a fresh character.
    fn event_zone_for(&self, player: &Player) -> Result<ZoneId, GameError> {
        if let Some(zone_id) = player.progress.furthest_zone() {
            return Ok(zone_id);
        }
        self.store
            .all_zones()?
            .into_iter()
            .min_by_key(|zone| (zone.level, zone.id))
            .map(|zone| zone.id)
            .ok_or_else(|| GameError::NotFound("any zone for event delivery".to_string()))
    }

    /// Run the due set once, isolating per-container failures so one
    /// dangling reference cannot stall everyone else. Returns the size of
    /// the due set.
    pub fn run_once(&self) -> usize {
        let due = match self.due_adventures() {
            Ok(due) => due,
            Err(err) => {
                error!("failed to query due adventures: {err}");
                return 0;
            }
        };
        let count = due.len();
        if count > 0 {
            debug!("processing {count} due adventure(s)");
        }
        for container in due {
            let player_id = container.player_id;
            match self.process(container) {
                Ok(outcome) => debug!("player {player_id}: {outcome:?}"),
                Err(err) => {
                    metrics::inc_update_errors();
                    warn!("adventure update for player {player_id} failed: {err}");
                }
            }
        }
        count
    }

    /// Periodic batch driver: invoke the scheduler on a fixed cadence
    /// until the task is cancelled.
    pub async fn run_loop(&self, cadence: StdDuration) {
        let mut ticker = tokio::time::interval(cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "adventure loop started (cadence {}s, update interval {}m)",
            cadence.as_secs(),
            self.update_interval.num_minutes()
        );
        loop {
            ticker.tick().await;
            self.run_once();
        }
    }

    /// Highest quest ordinal completed in a zone, from the watermark table.
    pub fn watermark(&self, zone_id: ZoneId) -> Option<u16> {
        self.watermarks
            .lock()
            .expect("watermark mutex poisoned")
            .get(zone_id)
    }

    fn gain_line(&self, reward: Reward) -> String {
        format!(
            "You gain {} xp & {} {}",
            reward.xp, reward.coins, self.currency_name
        )
    }

    fn notify_best_effort(&self, player: &Player, text: &str) {
        if let Err(err) = self.notifier.notify(player, text) {
            metrics::inc_notify_failures();
            warn!(
                "notification to player {} failed: {err} (text: {})",
                player.id,
                escape_log(text)
            );
        }
    }
}
