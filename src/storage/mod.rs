//! Sled-backed persistence for world data and live adventures.
//!
//! Records are bincode-serialized into per-entity trees and flushed on
//! every write. Player and guild reads go through identity caches: the
//! store hands out `Arc<Mutex<_>>` handles, callers mutate the aggregate in
//! place and then write it back through the store. That write-through is
//! the system's sole consistency guarantee: there is no transactional
//! rollback, so every mutation path must persist before the object is
//! considered durable. Callers must not keep an independently constructed
//! copy of an aggregate alongside its cached handle.

pub mod cache;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sled::IVec;

use crate::game::errors::GameError;
use crate::game::progress;
use crate::game::types::{
    AdventureContainer, EventId, Guild, GuildId, Player, PlayerId, Quest, QuestId, Zone, ZoneEvent,
    ZoneId, ADVENTURE_SCHEMA_VERSION, GUILD_SCHEMA_VERSION, PLAYER_SCHEMA_VERSION,
};

const TREE_PLAYERS: &str = "players";
const TREE_GUILDS: &str = "guilds";
const TREE_ZONES: &str = "zones";
const TREE_QUESTS: &str = "quests";
const TREE_QUEST_INDEX: &str = "quest_index";
const TREE_EVENTS: &str = "zone_events";
const TREE_ADVENTURES: &str = "adventures";

/// Shared, in-place-mutable handle to a player aggregate.
pub type SharedPlayer = Arc<Mutex<Player>>;
/// Shared handle to a guild aggregate. Locking it is the critical section
/// for prestige updates.
pub type SharedGuild = Arc<Mutex<Guild>>;

/// Stored form of a player. Progress travels as the codec blob, not as a
/// serialized map, so the on-disk layout matches the wire contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PlayerModel {
    id: PlayerId,
    name: String,
    description: String,
    guild_id: Option<GuildId>,
    level: u32,
    xp: u64,
    coins: u64,
    gear_level: u32,
    progress: Vec<u8>,
    schema_version: u8,
}

impl PlayerModel {
    fn from_player(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            description: player.description.clone(),
            guild_id: player.guild_id,
            level: player.level,
            xp: player.xp,
            coins: player.coins,
            gear_level: player.gear_level,
            progress: progress::encode(&player.progress),
            schema_version: PLAYER_SCHEMA_VERSION,
        }
    }

    fn into_player(self) -> Result<Player, GameError> {
        Ok(Player {
            id: self.id,
            name: self.name,
            description: self.description,
            guild_id: self.guild_id,
            level: self.level,
            xp: self.xp,
            coins: self.coins,
            gear_level: self.gear_level,
            progress: progress::decode(&self.progress)?,
        })
    }
}

/// Record counts for the `status` command.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreCounts {
    pub players: usize,
    pub guilds: usize,
    pub zones: usize,
    pub quests: usize,
    pub events: usize,
}

/// Helper builder so tests can easily create throwaway stores with custom
/// paths and skip demo-world seeding.
pub struct GameStoreBuilder {
    path: PathBuf,
    seed_demo_world: bool,
}

impl GameStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed_demo_world: false,
        }
    }

    /// Seed the two starter zones (with quests and events) if the store has
    /// no zones yet.
    pub fn with_demo_world(mut self) -> Self {
        self.seed_demo_world = true;
        self
    }

    pub fn open(self) -> Result<GameStore, GameError> {
        GameStore::open_with_options(self.path, self.seed_demo_world)
    }
}

/// Persistence and caching for the whole game world.
pub struct GameStore {
    db: sled::Db,
    players: sled::Tree,
    guilds: sled::Tree,
    zones: sled::Tree,
    quests: sled::Tree,
    quest_index: sled::Tree,
    events: sled::Tree,
    adventures: sled::Tree,

    player_cache: cache::ReadThroughCache<PlayerId, SharedPlayer>,
    guild_cache: cache::ReadThroughCache<GuildId, SharedGuild>,
    zone_cache: cache::ReadThroughCache<ZoneId, Zone>,
    quest_cache: cache::ReadThroughCache<QuestId, Quest>,
    quest_number_cache: cache::ReadThroughCache<(ZoneId, u16), Quest>,
    // Short-lived cache over the random draw: with many players in the same
    // zone the scheduler would otherwise rescan the event tree per tick.
    event_draw_cache: cache::ReadThroughCache<ZoneId, ZoneEvent>,
}

impl GameStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        Self::open_with_options(path.as_ref().to_path_buf(), false)
    }

    fn open_with_options(path: PathBuf, seed_demo_world: bool) -> Result<Self, GameError> {
        std::fs::create_dir_all(&path)?;
        let db = sled::open(&path)?;
        let store = Self {
            players: db.open_tree(TREE_PLAYERS)?,
            guilds: db.open_tree(TREE_GUILDS)?,
            zones: db.open_tree(TREE_ZONES)?,
            quests: db.open_tree(TREE_QUESTS)?,
            quest_index: db.open_tree(TREE_QUEST_INDEX)?,
            events: db.open_tree(TREE_EVENTS)?,
            adventures: db.open_tree(TREE_ADVENTURES)?,
            db,
            player_cache: cache::ReadThroughCache::sized(2000),
            guild_cache: cache::ReadThroughCache::sized_ttl(400, StdDuration::from_secs(3600)),
            zone_cache: cache::ReadThroughCache::ttl(StdDuration::from_secs(7 * 24 * 3600)),
            quest_cache: cache::ReadThroughCache::sized_ttl(200, StdDuration::from_secs(86400)),
            quest_number_cache: cache::ReadThroughCache::sized(200),
            event_draw_cache: cache::ReadThroughCache::ttl(StdDuration::from_secs(10)),
        };
        if seed_demo_world {
            store.seed_demo_world_if_empty()?;
        }
        Ok(store)
    }

    fn id_key(id: u64) -> [u8; 8] {
        id.to_be_bytes()
    }

    fn zone_key(id: ZoneId) -> [u8; 2] {
        id.to_be_bytes()
    }

    fn quest_index_key(zone: ZoneId, number: u16) -> [u8; 4] {
        let mut key = [0u8; 4];
        key[..2].copy_from_slice(&zone.to_be_bytes());
        key[2..].copy_from_slice(&number.to_be_bytes());
        key
    }

    fn event_key(zone: ZoneId, id: EventId) -> [u8; 10] {
        let mut key = [0u8; 10];
        key[..2].copy_from_slice(&zone.to_be_bytes());
        key[2..].copy_from_slice(&id.to_be_bytes());
        key
    }

    fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, GameError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, GameError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    // players ----

    /// Create a player record along with its idle adventure container. The
    /// container exists for the player's whole lifetime; it is how the
    /// scheduler tracks liveness even while the player is idle.
    pub fn create_player(
        &self,
        id: PlayerId,
        name: &str,
        description: &str,
    ) -> Result<SharedPlayer, GameError> {
        let key = Self::id_key(id);
        if self.players.get(key)?.is_some() {
            return Err(GameError::AlreadyExists(format!("player: {id}")));
        }
        let player = Player::new(id, name, description);
        self.players
            .insert(key, Self::serialize(&PlayerModel::from_player(&player))?)?;
        let container = AdventureContainer::idle(id, Utc::now());
        self.adventures.insert(key, Self::serialize(&container)?)?;
        self.players.flush()?;
        self.adventures.flush()?;
        let handle: SharedPlayer = Arc::new(Mutex::new(player));
        self.player_cache.insert(id, handle.clone());
        Ok(handle)
    }

    /// Fetch a player handle. Repeated calls within the cache window return
    /// the same logical instance; mutate it in place and persist with
    /// [`GameStore::update_player`].
    pub fn get_player(&self, id: PlayerId) -> Result<SharedPlayer, GameError> {
        self.player_cache.get_or_load(id, |&id| {
            let Some(bytes) = self.players.get(Self::id_key(id))? else {
                return Err(GameError::NotFound(format!("player: {id}")));
            };
            let model: PlayerModel = Self::deserialize(bytes)?;
            if model.schema_version != PLAYER_SCHEMA_VERSION {
                return Err(GameError::SchemaMismatch {
                    entity: "player",
                    expected: PLAYER_SCHEMA_VERSION,
                    found: model.schema_version,
                });
            }
            Ok(Arc::new(Mutex::new(model.into_player()?)))
        })
    }

    /// Write a player back to disk. Call this immediately after every
    /// mutation of a player handle.
    pub fn update_player(&self, player: &Player) -> Result<(), GameError> {
        let key = Self::id_key(player.id);
        if self.players.get(key)?.is_none() {
            return Err(GameError::NotFound(format!("player: {}", player.id)));
        }
        self.players
            .insert(key, Self::serialize(&PlayerModel::from_player(player))?)?;
        self.players.flush()?;
        Ok(())
    }

    // guilds ----

    pub fn add_guild(
        &self,
        name: &str,
        description: &str,
        founder_id: PlayerId,
    ) -> Result<SharedGuild, GameError> {
        let id = self.db.generate_id()?;
        let guild = Guild::new(id, name, description, founder_id);
        self.guilds
            .insert(Self::id_key(id), Self::serialize(&guild)?)?;
        self.guilds.flush()?;
        let handle: SharedGuild = Arc::new(Mutex::new(guild));
        self.guild_cache.insert(id, handle.clone());
        Ok(handle)
    }

    pub fn get_guild(&self, id: GuildId) -> Result<SharedGuild, GameError> {
        self.guild_cache.get_or_load(id, |&id| {
            let Some(bytes) = self.guilds.get(Self::id_key(id))? else {
                return Err(GameError::NotFound(format!("guild: {id}")));
            };
            let guild: Guild = Self::deserialize(bytes)?;
            if guild.schema_version != GUILD_SCHEMA_VERSION {
                return Err(GameError::SchemaMismatch {
                    entity: "guild",
                    expected: GUILD_SCHEMA_VERSION,
                    found: guild.schema_version,
                });
            }
            Ok(Arc::new(Mutex::new(guild)))
        })
    }

    pub fn update_guild(&self, guild: &Guild) -> Result<(), GameError> {
        let key = Self::id_key(guild.id);
        if self.guilds.get(key)?.is_none() {
            return Err(GameError::NotFound(format!("guild: {}", guild.id)));
        }
        self.guilds.insert(key, Self::serialize(guild)?)?;
        self.guilds.flush()?;
        Ok(())
    }

    /// Roster of a guild: member names with their levels.
    pub fn guild_members(&self, guild_id: GuildId) -> Result<Vec<(String, u32)>, GameError> {
        let mut members = Vec::new();
        for entry in self.players.iter() {
            let (_, bytes) = entry?;
            let model: PlayerModel = Self::deserialize(bytes)?;
            if model.guild_id == Some(guild_id) {
                members.push((model.name, model.level));
            }
        }
        Ok(members)
    }

    // zones ----

    pub fn add_zone(&self, name: &str, level: u32, description: &str) -> Result<Zone, GameError> {
        let id = self.next_zone_id()?;
        let zone = Zone {
            id,
            name: name.to_string(),
            level,
            description: description.to_string(),
        };
        self.zones
            .insert(Self::zone_key(id), Self::serialize(&zone)?)?;
        self.zones.flush()?;
        Ok(zone)
    }

    fn next_zone_id(&self) -> Result<ZoneId, GameError> {
        let next = match self.zones.last()? {
            Some((key, _)) => ZoneId::from_be_bytes([key[0], key[1]]) + 1,
            None => 1,
        };
        Ok(next)
    }

    pub fn get_zone(&self, id: ZoneId) -> Result<Zone, GameError> {
        self.zone_cache.get_or_load(id, |&id| {
            let Some(bytes) = self.zones.get(Self::zone_key(id))? else {
                return Err(GameError::NotFound(format!("zone: {id}")));
            };
            Self::deserialize(bytes)
        })
    }

    pub fn all_zones(&self) -> Result<Vec<Zone>, GameError> {
        self.zones
            .iter()
            .map(|entry| {
                let (_, bytes) = entry?;
                Self::deserialize(bytes)
            })
            .collect()
    }

    /// Rarely called; zones are effectively immutable once created.
    pub fn update_zone(&self, zone: &Zone) -> Result<(), GameError> {
        let key = Self::zone_key(zone.id);
        if self.zones.get(key)?.is_none() {
            return Err(GameError::NotFound(format!("zone: {}", zone.id)));
        }
        self.zones.insert(key, Self::serialize(zone)?)?;
        self.zones.flush()?;
        self.zone_cache.remove(&zone.id);
        Ok(())
    }

    // quests ----

    pub fn add_quest(
        &self,
        zone_id: ZoneId,
        number: u16,
        name: &str,
        description: &str,
        success_text: &str,
        failure_text: &str,
    ) -> Result<Quest, GameError> {
        let id = self.db.generate_id()?;
        let quest = Quest {
            id,
            zone_id,
            number,
            name: name.to_string(),
            description: description.to_string(),
            success_text: success_text.to_string(),
            failure_text: failure_text.to_string(),
        };
        self.quests
            .insert(Self::id_key(id), Self::serialize(&quest)?)?;
        self.quest_index
            .insert(Self::quest_index_key(zone_id, number), Self::id_key(id).to_vec())?;
        self.quests.flush()?;
        self.quest_index.flush()?;
        Ok(quest)
    }

    pub fn get_quest(&self, id: QuestId) -> Result<Quest, GameError> {
        self.quest_cache.get_or_load(id, |&id| {
            let Some(bytes) = self.quests.get(Self::id_key(id))? else {
                return Err(GameError::NotFound(format!("quest: {id}")));
            };
            Self::deserialize(bytes)
        })
    }

    /// Look a quest up by its ordinal within a zone's sequence.
    pub fn quest_from_number(&self, zone_id: ZoneId, number: u16) -> Result<Quest, GameError> {
        self.quest_number_cache
            .get_or_load((zone_id, number), |&(zone_id, number)| {
                let Some(id_bytes) =
                    self.quest_index.get(Self::quest_index_key(zone_id, number))?
                else {
                    return Err(GameError::NotFound(format!(
                        "quest number {number} in zone {zone_id}"
                    )));
                };
                let id = QuestId::from_be_bytes(id_bytes.as_ref().try_into().map_err(|_| {
                    GameError::NotFound(format!("quest index entry {zone_id}/{number}"))
                })?);
                self.get_quest(id)
            })
    }

    /// Number of quests authored for a zone so far.
    pub fn quest_count(&self, zone_id: ZoneId) -> Result<usize, GameError> {
        let mut count = 0;
        for entry in self.quest_index.scan_prefix(zone_id.to_be_bytes()) {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    pub fn update_quest(&self, quest: &Quest) -> Result<(), GameError> {
        let key = Self::id_key(quest.id);
        if self.quests.get(key)?.is_none() {
            return Err(GameError::NotFound(format!("quest: {}", quest.id)));
        }
        self.quests.insert(key, Self::serialize(quest)?)?;
        self.quests.flush()?;
        self.quest_cache.remove(&quest.id);
        self.quest_number_cache
            .remove(&(quest.zone_id, quest.number));
        Ok(())
    }

    // zone events ----

    pub fn add_zone_event(
        &self,
        zone_id: ZoneId,
        event_text: &str,
    ) -> Result<ZoneEvent, GameError> {
        let id = self.db.generate_id()?;
        let event = ZoneEvent {
            id,
            zone_id,
            event_text: event_text.to_string(),
        };
        self.events
            .insert(Self::event_key(zone_id, id), Self::serialize(&event)?)?;
        self.events.flush()?;
        Ok(event)
    }

    pub fn zone_events(&self, zone_id: ZoneId) -> Result<Vec<ZoneEvent>, GameError> {
        self.events
            .scan_prefix(zone_id.to_be_bytes())
            .map(|entry| {
                let (_, bytes) = entry?;
                Self::deserialize(bytes)
            })
            .collect()
    }

    /// Draw a random event scoped to `zone_id`. Draws are cached for a few
    /// seconds to serve bursts of ticks in the same zone.
    pub fn random_zone_event(&self, zone_id: ZoneId) -> Result<ZoneEvent, GameError> {
        self.event_draw_cache.get_or_load(zone_id, |&zone_id| {
            let mut all = self.zone_events(zone_id)?;
            if all.is_empty() {
                return Err(GameError::NotFound(format!(
                    "zone events for zone {zone_id}"
                )));
            }
            let pick = rand::thread_rng().gen_range(0..all.len());
            Ok(all.swap_remove(pick))
        })
    }

    // adventures ----

    pub fn get_adventure(&self, player_id: PlayerId) -> Result<AdventureContainer, GameError> {
        let Some(bytes) = self.adventures.get(Self::id_key(player_id))? else {
            return Err(GameError::NotFound(format!(
                "adventure for player {player_id}"
            )));
        };
        let container: AdventureContainer = Self::deserialize(bytes)?;
        if container.schema_version != ADVENTURE_SCHEMA_VERSION {
            return Err(GameError::SchemaMismatch {
                entity: "adventure",
                expected: ADVENTURE_SCHEMA_VERSION,
                found: container.schema_version,
            });
        }
        Ok(container)
    }

    pub fn update_adventure(&self, container: &AdventureContainer) -> Result<(), GameError> {
        let key = Self::id_key(container.player_id);
        if self.adventures.get(key)?.is_none() {
            return Err(GameError::NotFound(format!(
                "adventure for player {}",
                container.player_id
            )));
        }
        self.adventures.insert(key, Self::serialize(container)?)?;
        self.adventures.flush()?;
        Ok(())
    }

    pub fn is_on_quest(&self, player_id: PlayerId) -> Result<bool, GameError> {
        Ok(self.get_adventure(player_id)?.is_questing())
    }

    /// Every container whose `last_update + interval` has elapsed. The full
    /// scan is bounded by the player count, which stays small compared to
    /// the event volume behind it.
    pub fn due_adventures(&self, interval: Duration) -> Result<Vec<AdventureContainer>, GameError> {
        let now = Utc::now();
        let mut due = Vec::new();
        for entry in self.adventures.iter() {
            let (_, bytes) = entry?;
            let container: AdventureContainer = Self::deserialize(bytes)?;
            if container.last_update + interval <= now {
                due.push(container);
            }
        }
        Ok(due)
    }

    // administration ----

    pub fn counts(&self) -> Result<StoreCounts, GameError> {
        Ok(StoreCounts {
            players: self.players.len(),
            guilds: self.guilds.len(),
            zones: self.zones.len(),
            quests: self.quests.len(),
            events: self.events.len(),
        })
    }

    /// Seed a small demo world when no zones exist yet, so `init` produces
    /// a playable store. Returns the number of zones inserted.
    pub fn seed_demo_world_if_empty(&self) -> Result<usize, GameError> {
        if self.zones.iter().next().is_some() {
            return Ok(0);
        }
        let fringe = self.add_zone(
            "Verdant Fringe",
            1,
            "Mossy woodland at the edge of the settled lands.",
        )?;
        self.add_quest(
            fringe.id,
            0,
            "Clear the Bramble Path",
            "Thorny overgrowth has swallowed the trade path.",
            "The path stands clear and carts roll through again.",
            "The brambles proved too stubborn this time.",
        )?;
        self.add_quest(
            fringe.id,
            1,
            "The Missing Charcoal Burner",
            "A charcoal burner went quiet three days ago.",
            "You bring the burner home, singed but alive.",
            "The forest kept its secret; the trail went cold.",
        )?;
        self.add_quest(
            fringe.id,
            2,
            "Wolves at the Fold",
            "Something bolder than wolves is circling the pens.",
            "The pack scatters; the pens hold through the night.",
            "Driven back, you leave the flock to its fate.",
        )?;
        self.add_zone_event(fringe.id, "A tinker shares stew and rumors by the road.")?;
        self.add_zone_event(fringe.id, "You find a cache of coins under a hollow stump.")?;
        self.add_zone_event(fringe.id, "A shrine in a clearing hums with faint warmth.")?;

        let barrens = self.add_zone(
            "Howling Barrens",
            3,
            "Wind-scoured flats where the old roads end.",
        )?;
        self.add_quest(
            barrens.id,
            0,
            "Beacon on the Ridge",
            "The watch beacon has gone dark.",
            "Flame crowns the ridge once more.",
            "The ridge wind snuffs every torch you carry.",
        )?;
        self.add_quest(
            barrens.id,
            1,
            "Salt Caravan Escort",
            "A salt caravan needs a blade it can trust.",
            "The caravan rolls into market, salt and escort intact.",
            "Raiders split the caravan and you with it.",
        )?;
        self.add_zone_event(barrens.id, "Dust devils dance ahead of a coming storm.")?;
        self.add_zone_event(barrens.id, "A half-buried obelisk bears a name you almost know.")?;
        Ok(2)
    }
}
