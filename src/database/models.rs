//! Contains all the data structures that map to database tables or query
//! results, plus the closed enums that feed dynamic identifiers (table and
//! column names) elsewhere in this crate.

use serde::{Deserialize, Serialize};
use sqlx::Type;
use sqlx::types::Json;
use sqlx::types::chrono::{DateTime, Utc};

// --- Universes ---

/// The game universes a monster can belong to. Each universe has its own
/// pair of near-identical tables (species catalogue and caught monsters);
/// the mapping below is the only source of those table names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(type_name = "universe", rename_all = "PascalCase")]
pub enum Universe {
    Pokemon,
    Digimon,
    Nexomon,
}

impl Universe {
    pub const ALL: [Universe; 3] = [Universe::Pokemon, Universe::Digimon, Universe::Nexomon];

    pub fn species_table(self) -> &'static str {
        match self {
            Universe::Pokemon => "pokemon_species",
            Universe::Digimon => "digimon_species",
            Universe::Nexomon => "nexomon_species",
        }
    }

    pub fn caught_table(self) -> &'static str {
        match self {
            Universe::Pokemon => "caught_pokemon",
            Universe::Digimon => "caught_digimon",
            Universe::Nexomon => "caught_nexomon",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Universe::Pokemon => "Pokemon",
            Universe::Digimon => "Digimon",
            Universe::Nexomon => "Nexomon",
        }
    }
}

// --- Elements ---

/// Elemental types shared by every universe's species. Matchup math lives
/// in `database::typechart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(type_name = "element", rename_all = "PascalCase")]
pub enum Element {
    Normal,
    Fire,
    Water,
    Grass,
    Electric,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}

// --- Trainers ---

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Trainer {
    pub user_id: i64,
    pub display_name: Option<String>,
    pub balance: i64,
    pub daily_streak: i32,
    pub last_daily: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful daily claim.
#[derive(Debug, Clone, Copy)]
pub struct DailyReward {
    pub coins: i64,
    pub streak: i32,
}

// --- Species and caught monsters ---

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Species {
    pub species_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub primary_element: Element,
    pub secondary_element: Option<Element>,
    pub base_hp: i32,
    pub base_attack: i32,
    pub base_defense: i32,
    pub base_speed: i32,
    pub catch_rate: f32,
    pub is_starter: bool,
    pub ability_id: Option<i32>,
}

/// A move carried by a caught monster, stored in its JSONB move list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedMove {
    pub name: String,
    pub element: Element,
    pub power: i32,
    pub accuracy: i32,
}

/// A caught monster joined with its species name and elements.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct OwnedMonster {
    pub monster_id: i64,
    pub user_id: i64,
    pub species_id: i32,
    pub nickname: Option<String>,
    pub level: i32,
    pub xp: i32,
    pub moves: Json<Vec<LearnedMove>>,
    pub is_favorite: bool,
    pub trade_locked: bool,
    pub caught_at: DateTime<Utc>,
    pub name: String,
    pub primary_element: Element,
    pub secondary_element: Option<Element>,
}

impl OwnedMonster {
    /// Nickname when set, species name otherwise.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.name)
    }
}

/// Outcome of an XP grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpGain {
    pub new_level: i32,
    pub new_xp: i32,
    pub levels_gained: i32,
}

// --- Abilities and items ---

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Ability {
    pub ability_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub effect_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(type_name = "item_category", rename_all = "PascalCase")]
pub enum ItemCategory {
    Berry,
    Ball,
    Egg,
    Medicine,
    KeyItem,
}

impl ItemCategory {
    pub const ALL: [ItemCategory; 5] = [
        ItemCategory::Berry,
        ItemCategory::Ball,
        ItemCategory::Egg,
        ItemCategory::Medicine,
        ItemCategory::KeyItem,
    ];

    /// Column holding this category's bucket on the `inventories` row.
    pub fn bucket_column(self) -> &'static str {
        match self {
            ItemCategory::Berry => "berries",
            ItemCategory::Ball => "balls",
            ItemCategory::Egg => "eggs",
            ItemCategory::Medicine => "medicine",
            ItemCategory::KeyItem => "key_items",
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Item {
    pub item_id: i32,
    pub name: String,
    pub category: ItemCategory,
    pub description: Option<String>,
    pub buy_price: Option<i64>,
    pub sell_price: Option<i64>,
}

/// One trainer's inventory: a JSONB bucket per item category, each mapping
/// item name to quantity.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Inventory {
    pub user_id: i64,
    pub berries: Json<std::collections::HashMap<String, i64>>,
    pub balls: Json<std::collections::HashMap<String, i64>>,
    pub eggs: Json<std::collections::HashMap<String, i64>>,
    pub medicine: Json<std::collections::HashMap<String, i64>>,
    pub key_items: Json<std::collections::HashMap<String, i64>>,
}

impl Inventory {
    pub fn bucket(&self, category: ItemCategory) -> &std::collections::HashMap<String, i64> {
        match category {
            ItemCategory::Berry => &self.berries,
            ItemCategory::Ball => &self.balls,
            ItemCategory::Egg => &self.eggs,
            ItemCategory::Medicine => &self.medicine,
            ItemCategory::KeyItem => &self.key_items,
        }
    }
}

// --- Factions ---

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Faction {
    pub faction_id: i32,
    pub name: String,
    pub motto: Option<String>,
    pub emblem: Option<String>,
    pub founded_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct FactionStanding {
    pub user_id: i64,
    pub faction_id: i32,
    pub standing: i32,
    pub submissions: i32,
    pub meetings_attended: i32,
    pub last_submission_at: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct FactionSubmission {
    pub submission_id: i64,
    pub user_id: i64,
    pub faction_id: i32,
    pub summary: String,
    pub standing_delta: i32,
    pub submitted_at: DateTime<Utc>,
}

// --- Tasks ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
#[sqlx(type_name = "task_kind", rename_all = "PascalCase")]
pub enum TaskKind {
    Daily,
    Weekly,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct TaskDef {
    pub task_id: i32,
    pub kind: TaskKind,
    pub title: String,
    pub description: String,
    pub objective_key: String,
    pub objective_goal: i32,
    pub reward_coins: Option<i64>,
    pub reward_item: Option<String>,
    pub reward_item_category: Option<ItemCategory>,
    pub reward_item_quantity: Option<i32>,
    pub reward_faction_id: Option<i32>,
    pub reward_standing: Option<i32>,
}

/// A trainer's assigned task joined with its definition.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct PlayerTask {
    pub player_task_id: i64,
    pub kind: TaskKind,
    pub progress: i32,
    pub is_completed: bool,
    pub title: String,
    pub description: String,
    pub objective_goal: i32,
    pub reward_coins: Option<i64>,
    pub reward_item: Option<String>,
    pub reward_item_category: Option<ItemCategory>,
    pub reward_item_quantity: Option<i32>,
    pub reward_faction_id: Option<i32>,
    pub reward_standing: Option<i32>,
}

// --- Habits ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
#[sqlx(type_name = "habit_cadence", rename_all = "PascalCase")]
pub enum HabitCadence {
    Daily,
    Weekly,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Habit {
    pub habit_id: i64,
    pub user_id: i64,
    pub name: String,
    pub cadence: HabitCadence,
    pub streak: i32,
    pub best_streak: i32,
    pub last_completed_at: Option<DateTime<Utc>>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

/// Result of completing a habit.
#[derive(Debug, Clone, Copy)]
pub struct HabitCompletion {
    pub streak: i32,
    pub best_streak: i32,
    pub reward_coins: i64,
}

// --- Adventures ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
#[sqlx(type_name = "adventure_status", rename_all = "PascalCase")]
pub enum AdventureStatus {
    Open,
    Closed,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Adventure {
    pub adventure_id: i64,
    pub thread_id: i64,
    pub guild_id: i64,
    pub title: String,
    pub universe: Universe,
    pub status: AdventureStatus,
    pub started_by: i64,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct AdventureLogEntry {
    pub log_id: i64,
    pub adventure_id: i64,
    pub author_id: Option<i64>,
    pub entry: String,
    pub posted_at: DateTime<Utc>,
}

/// Mutable wild-encounter state, stored as a JSONB snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterState {
    pub current_hp: i32,
    pub max_hp: i32,
    pub status: Option<String>,
    pub flee_attempts: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
#[sqlx(type_name = "encounter_outcome", rename_all = "PascalCase")]
pub enum EncounterOutcome {
    Caught,
    Defeated,
    Fled,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Encounter {
    pub encounter_id: i64,
    pub adventure_id: i64,
    pub universe: Universe,
    pub species_id: i32,
    pub level: i32,
    pub state: Json<EncounterState>,
    pub spawned_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub outcome: Option<EncounterOutcome>,
}

// --- Trades ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
#[sqlx(type_name = "trade_status", rename_all = "PascalCase")]
pub enum TradeStatus {
    Pending,
    Accepted,
    Declined,
    Cancelled,
}

/// Reference to a caught monster on a trade manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterRef {
    pub universe: Universe,
    pub monster_id: i64,
}

/// A stack of bucket items on a trade manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    pub category: ItemCategory,
    pub name: String,
    pub quantity: i64,
}

/// Everything one side puts on the table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TradeManifest {
    pub monsters: Vec<MonsterRef>,
    pub items: Vec<ItemStack>,
    pub coins: i64,
}

impl TradeManifest {
    pub fn is_empty(&self) -> bool {
        self.monsters.is_empty() && self.items.is_empty() && self.coins == 0
    }
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Trade {
    pub trade_id: i64,
    pub initiator_id: i64,
    pub recipient_id: i64,
    pub status: TradeStatus,
    pub initiator_manifest: Json<TradeManifest>,
    pub recipient_manifest: Json<TradeManifest>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// An NPC offer on the rotating trade board.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct AutomatedTradeOffer {
    pub offer_id: i64,
    pub universe: Universe,
    pub wants_species_id: i32,
    pub wants_min_level: i32,
    pub gives_species_id: i32,
    pub gives_level: i32,
    pub coin_sweetener: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// --- Battles ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
#[sqlx(type_name = "battle_status", rename_all = "PascalCase")]
pub enum BattleStatus {
    Pending,
    Active,
    Finished,
    Abandoned,
}

/// Field-wide battle state, stored as a JSONB snapshot on the instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BattleState {
    pub weather: Option<String>,
    pub field_effects: Vec<String>,
    /// Participant id the engine is waiting on, if any.
    pub awaiting: Option<i64>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct BattleInstance {
    pub battle_id: i64,
    pub adventure_id: Option<i64>,
    pub channel_id: i64,
    pub message_id: Option<i64>,
    pub status: BattleStatus,
    pub round: i32,
    pub state: Json<BattleState>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub winner_user_id: Option<i64>,
}

/// A status effect on a battle participant, stored in its JSONB list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub name: String,
    pub turns_left: i32,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct BattleParticipant {
    pub participant_id: i64,
    pub battle_id: i64,
    pub user_id: Option<i64>,
    pub universe: Universe,
    pub monster_id: Option<i64>,
    pub display_name: String,
    pub level: i32,
    pub max_hp: i32,
    pub current_hp: i32,
    pub speed: i32,
    pub turn_order: i32,
    pub status_effects: Json<Vec<StatusEffect>>,
    pub is_npc: bool,
}

/// Everything needed to seat one participant when opening a battle.
#[derive(Debug, Clone)]
pub struct NewBattleParticipant {
    pub user_id: Option<i64>,
    pub universe: Universe,
    pub monster_id: Option<i64>,
    pub display_name: String,
    pub level: i32,
    pub max_hp: i32,
    pub speed: i32,
    pub is_npc: bool,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct BattleLogEntry {
    pub log_id: i64,
    pub battle_id: i64,
    pub round: i32,
    pub entry: String,
    pub logged_at: DateTime<Utc>,
}

// --- Leaderboards ---

/// A single row on any leaderboard.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub score: i64,
}
