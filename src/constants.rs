// Central constants for gameplay limits and payout tuning.

/// Hard cap applied to every paginated listing query.
pub const MAX_PAGE_SIZE: i64 = 50;

pub const MAX_TRADE_MONSTERS: usize = 6;
pub const MAX_TRADE_ITEM_STACKS: usize = 10;
pub const MAX_TRADE_COINS: i64 = 1_000_000;

pub const DAILY_BASE_REWARD: i64 = 100;
pub const DAILY_STREAK_BONUS: i64 = 25;
pub const DAILY_STREAK_BONUS_CAP: i64 = 14;

pub const HABIT_BASE_REWARD: i64 = 20;
pub const HABIT_STREAK_BONUS: i64 = 5;
pub const HABIT_STREAK_BONUS_CAP: i32 = 30;

/// Daily/weekly task slots handed out per trainer per period.
pub const DAILY_TASK_SLOTS: i64 = 3;
pub const WEEKLY_TASK_SLOTS: i64 = 2;

/// Rotating NPC trade board size per universe.
pub const TRADE_BOARD_SIZE: i64 = 4;

/// Contents of the starter kit granted alongside a fresh inventory.
pub const STARTER_BALLS: i64 = 10;
pub const STARTER_BERRIES: i64 = 5;
