use menagerie_db::constants::{MAX_TRADE_COINS, MAX_TRADE_MONSTERS};
use menagerie_db::database::models::{ItemCategory, ItemStack, MonsterRef, TradeManifest, Universe};
use menagerie_db::database::trades::validate_manifest;

fn monster(universe: Universe, monster_id: i64) -> MonsterRef {
    MonsterRef {
        universe,
        monster_id,
    }
}

#[test]
fn empty_manifest_is_structurally_valid() {
    // An empty side is fine on its own; open_trade rejects the case where
    // BOTH sides are empty.
    assert!(validate_manifest(&TradeManifest::default()).is_ok());
    assert!(TradeManifest::default().is_empty());
}

#[test]
fn rejects_negative_and_excessive_coins() {
    let mut m = TradeManifest::default();
    m.coins = -1;
    assert!(validate_manifest(&m).is_err());
    m.coins = MAX_TRADE_COINS + 1;
    assert!(validate_manifest(&m).is_err());
    m.coins = MAX_TRADE_COINS;
    assert!(validate_manifest(&m).is_ok());
}

#[test]
fn rejects_duplicate_monsters() {
    let mut m = TradeManifest::default();
    m.monsters = vec![
        monster(Universe::Pokemon, 7),
        monster(Universe::Digimon, 7),
        monster(Universe::Pokemon, 7),
    ];
    let err = validate_manifest(&m).unwrap_err();
    assert!(err.contains("twice"));
}

#[test]
fn same_id_in_different_universes_is_distinct() {
    let mut m = TradeManifest::default();
    m.monsters = vec![monster(Universe::Pokemon, 7), monster(Universe::Nexomon, 7)];
    assert!(validate_manifest(&m).is_ok());
}

#[test]
fn rejects_oversized_monster_list() {
    let mut m = TradeManifest::default();
    m.monsters = (0..=MAX_TRADE_MONSTERS as i64)
        .map(|i| monster(Universe::Pokemon, i))
        .collect();
    assert!(validate_manifest(&m).is_err());
}

#[test]
fn rejects_non_positive_item_stacks() {
    let mut m = TradeManifest::default();
    m.items = vec![ItemStack {
        category: ItemCategory::Berry,
        name: "Oran Berry".to_string(),
        quantity: 0,
    }];
    assert!(validate_manifest(&m).is_err());
}
