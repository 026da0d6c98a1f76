//! Contains all database functions for species catalogues and caught
//! monsters. Every universe stores these in its own pair of tables with
//! identical shapes, so each query interpolates the table name from the
//! closed [`Universe`] enum and binds everything else.

use serenity::model::id::UserId;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use super::models::{LearnedMove, OwnedMonster, Species, Universe, XpGain};
use crate::util;

const SPECIES_COLUMNS: &str = "species_id, name, description, primary_element, secondary_element, \
     base_hp, base_attack, base_defense, base_speed, catch_rate, is_starter, ability_id";

const OWNED_COLUMNS: &str = "m.monster_id, m.user_id, m.species_id, m.nickname, m.level, m.xp, \
     m.moves, m.is_favorite, m.trade_locked, m.caught_at, s.name, s.primary_element, \
     s.secondary_element";

// -------------------------------------------------------------------------
// Species catalogue
// -------------------------------------------------------------------------

pub async fn get_species(
    pool: &PgPool,
    universe: Universe,
    species_id: i32,
) -> Result<Option<Species>, sqlx::Error> {
    sqlx::query_as::<_, Species>(&format!(
        "SELECT {} FROM {} WHERE species_id = $1",
        SPECIES_COLUMNS,
        universe.species_table()
    ))
    .bind(species_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_species_by_name(
    pool: &PgPool,
    universe: Universe,
    name: &str,
) -> Result<Option<Species>, sqlx::Error> {
    sqlx::query_as::<_, Species>(&format!(
        "SELECT {} FROM {} WHERE LOWER(name) = LOWER($1)",
        SPECIES_COLUMNS,
        universe.species_table()
    ))
    .bind(name)
    .fetch_optional(pool)
    .await
}

pub async fn list_species(
    pool: &PgPool,
    universe: Universe,
    limit: i64,
    offset: i64,
) -> Result<Vec<Species>, sqlx::Error> {
    sqlx::query_as::<_, Species>(&format!(
        "SELECT {} FROM {} ORDER BY species_id{}",
        SPECIES_COLUMNS,
        universe.species_table(),
        util::limit_offset(limit, offset)
    ))
    .fetch_all(pool)
    .await
}

/// Samples one species, e.g. for a wild encounter spawn.
pub async fn random_species(
    pool: &PgPool,
    universe: Universe,
) -> Result<Option<Species>, sqlx::Error> {
    sqlx::query_as::<_, Species>(&format!(
        "SELECT {} FROM {}{}",
        SPECIES_COLUMNS,
        universe.species_table(),
        util::random_limit(1)
    ))
    .fetch_optional(pool)
    .await
}

pub async fn species_by_element(
    pool: &PgPool,
    universe: Universe,
    element: super::models::Element,
) -> Result<Vec<Species>, sqlx::Error> {
    sqlx::query_as::<_, Species>(&format!(
        "SELECT {} FROM {} WHERE primary_element = $1 OR secondary_element = $1 ORDER BY species_id",
        SPECIES_COLUMNS,
        universe.species_table()
    ))
    .bind(element)
    .fetch_all(pool)
    .await
}

// -------------------------------------------------------------------------
// Caught monsters
// -------------------------------------------------------------------------

/// Inserts a freshly caught monster and returns its id.
#[instrument(level = "debug", skip(pool, moves))]
pub async fn record_catch(
    pool: &PgPool,
    user_id: UserId,
    universe: Universe,
    species_id: i32,
    level: i32,
    moves: &[LearnedMove],
) -> Result<i64, sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    sqlx::query_scalar::<_, i64>(&format!(
        "INSERT INTO {} (user_id, species_id, level, moves) VALUES ($1, $2, $3, $4)
         RETURNING monster_id",
        universe.caught_table()
    ))
    .bind(user_id_i64)
    .bind(species_id)
    .bind(level)
    .bind(Json(moves))
    .fetch_one(pool)
    .await
}

pub async fn get_owned(
    pool: &PgPool,
    user_id: UserId,
    universe: Universe,
) -> Result<Vec<OwnedMonster>, sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    sqlx::query_as::<_, OwnedMonster>(&format!(
        "SELECT {} FROM {} m JOIN {} s ON m.species_id = s.species_id
         WHERE m.user_id = $1
         ORDER BY m.is_favorite DESC, m.level DESC, m.monster_id",
        OWNED_COLUMNS,
        universe.caught_table(),
        universe.species_table()
    ))
    .bind(user_id_i64)
    .fetch_all(pool)
    .await
}

pub async fn get_monster(
    pool: &PgPool,
    universe: Universe,
    monster_id: i64,
) -> Result<Option<OwnedMonster>, sqlx::Error> {
    sqlx::query_as::<_, OwnedMonster>(&format!(
        "SELECT {} FROM {} m JOIN {} s ON m.species_id = s.species_id WHERE m.monster_id = $1",
        OWNED_COLUMNS,
        universe.caught_table(),
        universe.species_table()
    ))
    .bind(monster_id)
    .fetch_optional(pool)
    .await
}

pub async fn set_nickname(
    pool: &PgPool,
    user_id: UserId,
    universe: Universe,
    monster_id: i64,
    nickname: Option<&str>,
) -> Result<(), sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    let res = sqlx::query(&format!(
        "UPDATE {} SET nickname = $3 WHERE monster_id = $1 AND user_id = $2",
        universe.caught_table()
    ))
    .bind(monster_id)
    .bind(user_id_i64)
    .bind(nickname)
    .execute(pool)
    .await?;
    if res.rows_affected() == 1 {
        Ok(())
    } else {
        Err(sqlx::Error::RowNotFound)
    }
}

pub async fn set_favorite(
    pool: &PgPool,
    user_id: UserId,
    universe: Universe,
    monster_id: i64,
    is_favorite: bool,
) -> Result<(), sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    let res = sqlx::query(&format!(
        "UPDATE {} SET is_favorite = $3 WHERE monster_id = $1 AND user_id = $2",
        universe.caught_table()
    ))
    .bind(monster_id)
    .bind(user_id_i64)
    .bind(is_favorite)
    .execute(pool)
    .await?;
    if res.rows_affected() == 1 {
        Ok(())
    } else {
        Err(sqlx::Error::RowNotFound)
    }
}

/// Replaces a monster's move list wholesale; the engine validates legality.
pub async fn set_moves(
    pool: &PgPool,
    universe: Universe,
    monster_id: i64,
    moves: &[LearnedMove],
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "UPDATE {} SET moves = $2 WHERE monster_id = $1",
        universe.caught_table()
    ))
    .bind(monster_id)
    .bind(Json(moves))
    .execute(pool)
    .await?;
    Ok(())
}

/// XP needed to go from `level` to the next one.
pub fn xp_to_next_level(level: i32) -> i32 {
    60 + level.max(1) * 40
}

/// Applies an XP gain to a (level, xp) pair, consuming thresholds until the
/// remainder no longer levels.
pub fn apply_xp(level: i32, xp: i32, gained: i32) -> XpGain {
    let mut new_level = level.max(1);
    let mut new_xp = xp + gained.max(0);
    let mut levels_gained = 0;
    loop {
        let needed = xp_to_next_level(new_level);
        if new_xp >= needed {
            new_xp -= needed;
            new_level += 1;
            levels_gained += 1;
        } else {
            break;
        }
    }
    XpGain {
        new_level,
        new_xp,
        levels_gained,
    }
}

/// Grants XP to a caught monster, applying any level-ups atomically.
#[instrument(level = "debug", skip(pool))]
pub async fn gain_xp(
    pool: &PgPool,
    universe: Universe,
    monster_id: i64,
    gained: i32,
) -> Result<XpGain, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let (level, xp) = sqlx::query_as::<_, (i32, i32)>(&format!(
        "SELECT level, xp FROM {} WHERE monster_id = $1 FOR UPDATE",
        universe.caught_table()
    ))
    .bind(monster_id)
    .fetch_one(&mut *tx)
    .await?;
    let gain = apply_xp(level, xp, gained);
    sqlx::query(&format!(
        "UPDATE {} SET level = $2, xp = $3 WHERE monster_id = $1",
        universe.caught_table()
    ))
    .bind(monster_id)
    .bind(gain.new_level)
    .bind(gain.new_xp)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(gain)
}

/// Releases a monster back to the wild. Favorites and monsters locked in a
/// pending trade are refused.
pub async fn release(
    pool: &PgPool,
    user_id: UserId,
    universe: Universe,
    monster_id: i64,
) -> Result<(), String> {
    let user_id_i64 = user_id.get() as i64;
    let res = sqlx::query(&format!(
        "DELETE FROM {} WHERE monster_id = $1 AND user_id = $2
         AND trade_locked = FALSE AND is_favorite = FALSE",
        universe.caught_table()
    ))
    .bind(monster_id)
    .bind(user_id_i64)
    .execute(pool)
    .await
    .map_err(|e| e.to_string())?;
    if res.rows_affected() == 1 {
        Ok(())
    } else {
        Err("That monster is not yours, is a favorite, or is locked in a trade.".to_string())
    }
}

/// Marks a monster as committed to a pending trade. Fails if it is already
/// locked or not owned by `owner`.
pub async fn lock_for_trade(
    tx: &mut Transaction<'_, Postgres>,
    universe: Universe,
    monster_id: i64,
    owner: UserId,
) -> Result<(), sqlx::Error> {
    let owner_i64 = owner.get() as i64;
    let res = sqlx::query(&format!(
        "UPDATE {} SET trade_locked = TRUE
         WHERE monster_id = $1 AND user_id = $2 AND trade_locked = FALSE",
        universe.caught_table()
    ))
    .bind(monster_id)
    .bind(owner_i64)
    .execute(&mut **tx)
    .await?;
    if res.rows_affected() == 1 {
        Ok(())
    } else {
        Err(sqlx::Error::RowNotFound)
    }
}

pub async fn unlock(
    tx: &mut Transaction<'_, Postgres>,
    universe: Universe,
    monster_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "UPDATE {} SET trade_locked = FALSE WHERE monster_id = $1",
        universe.caught_table()
    ))
    .bind(monster_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Moves a monster between trainers inside a trade transaction. Clears the
/// trade lock and the favorite flag on the way over.
pub async fn transfer(
    tx: &mut Transaction<'_, Postgres>,
    universe: Universe,
    monster_id: i64,
    from: UserId,
    to: UserId,
) -> Result<(), sqlx::Error> {
    let from_i64 = from.get() as i64;
    let to_i64 = to.get() as i64;
    let res = sqlx::query(&format!(
        "UPDATE {} SET user_id = $3, trade_locked = FALSE, is_favorite = FALSE
         WHERE monster_id = $1 AND user_id = $2",
        universe.caught_table()
    ))
    .bind(monster_id)
    .bind(from_i64)
    .bind(to_i64)
    .execute(&mut **tx)
    .await?;
    if res.rows_affected() == 1 {
        Ok(())
    } else {
        Err(sqlx::Error::RowNotFound)
    }
}

pub async fn count_owned(
    pool: &PgPool,
    user_id: UserId,
    universe: Universe,
) -> Result<i64, sqlx::Error> {
    let user_id_i64 = user_id.get() as i64;
    sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM {} WHERE user_id = $1",
        universe.caught_table()
    ))
    .bind(user_id_i64)
    .fetch_one(pool)
    .await
}

pub async fn count_by_species(
    pool: &PgPool,
    universe: Universe,
    species_id: i32,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM {} WHERE species_id = $1",
        universe.caught_table()
    ))
    .bind(species_id)
    .fetch_one(pool)
    .await
}
