use menagerie_db::database::adventures::encounter_hp;
use menagerie_db::database::battles::assign_turn_order;
use menagerie_db::database::factions::rank_for_standing;
use menagerie_db::database::models::{Element, NewBattleParticipant, Species, Universe};
use menagerie_db::database::monsters::{apply_xp, xp_to_next_level};
use menagerie_db::database::trainers::daily_reward_for_streak;

#[test]
fn xp_thresholds_grow_with_level() {
    assert_eq!(xp_to_next_level(1), 100);
    assert_eq!(xp_to_next_level(2), 140);
    assert!(xp_to_next_level(10) > xp_to_next_level(5));
}

#[test]
fn xp_gain_can_level_multiple_times() {
    let gain = apply_xp(1, 0, 260);
    assert_eq!(gain.new_level, 3);
    assert_eq!(gain.new_xp, 20);
    assert_eq!(gain.levels_gained, 2);
}

#[test]
fn xp_gain_below_threshold_keeps_level() {
    let gain = apply_xp(5, 10, 30);
    assert_eq!(gain.new_level, 5);
    assert_eq!(gain.new_xp, 40);
    assert_eq!(gain.levels_gained, 0);
}

#[test]
fn daily_rewards_cap_their_streak_bonus() {
    assert_eq!(daily_reward_for_streak(1), 100);
    assert_eq!(daily_reward_for_streak(5), 200);
    assert_eq!(daily_reward_for_streak(15), daily_reward_for_streak(200));
}

#[test]
fn standing_ranks_follow_thresholds() {
    assert_eq!(rank_for_standing(-5), "Outcast");
    assert_eq!(rank_for_standing(0), "Stranger");
    assert_eq!(rank_for_standing(120), "Associate");
    assert_eq!(rank_for_standing(400), "Trusted");
    assert_eq!(rank_for_standing(2000), "Exemplar");
}

fn seat(name: &str, speed: i32) -> NewBattleParticipant {
    NewBattleParticipant {
        user_id: None,
        universe: Universe::Pokemon,
        monster_id: None,
        display_name: name.to_string(),
        level: 10,
        max_hp: 40,
        speed,
        is_npc: true,
    }
}

#[test]
fn turn_order_is_fastest_first_with_stable_ties() {
    let seats = vec![seat("a", 50), seat("b", 120), seat("c", 80), seat("d", 80)];
    assert_eq!(assign_turn_order(&seats), vec![3, 0, 1, 2]);
}

#[test]
fn encounter_hp_scales_with_level() {
    let species = Species {
        species_id: 1,
        name: "Grumblewisp".to_string(),
        description: None,
        primary_element: Element::Ghost,
        secondary_element: None,
        base_hp: 30,
        base_attack: 12,
        base_defense: 9,
        base_speed: 14,
        catch_rate: 0.35,
        is_starter: false,
        ability_id: None,
    };
    assert_eq!(encounter_hp(&species, 10), 60);
    assert!(encounter_hp(&species, 1) < encounter_hp(&species, 50));
}
