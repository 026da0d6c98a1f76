use menagerie_db::database::models::Element;
use menagerie_db::database::typechart::{Effectiveness, effectiveness, matchup};

#[test]
fn immunities_zero_out() {
    assert_eq!(effectiveness(Element::Electric, Element::Ground), 0.0);
    assert_eq!(effectiveness(Element::Normal, Element::Ghost), 0.0);
    assert_eq!(effectiveness(Element::Fighting, Element::Ghost), 0.0);
    assert_eq!(effectiveness(Element::Poison, Element::Steel), 0.0);
    assert_eq!(effectiveness(Element::Dragon, Element::Fairy), 0.0);
}

#[test]
fn classic_matchups() {
    assert_eq!(effectiveness(Element::Fire, Element::Grass), 2.0);
    assert_eq!(effectiveness(Element::Water, Element::Fire), 2.0);
    assert_eq!(effectiveness(Element::Water, Element::Water), 0.5);
    assert_eq!(effectiveness(Element::Fire, Element::Electric), 1.0);
    assert_eq!(effectiveness(Element::Fairy, Element::Dragon), 2.0);
}

#[test]
fn dual_type_multiplies() {
    // Grass vs Water/Ground stacks both weaknesses.
    assert_eq!(
        matchup(Element::Grass, (Element::Water, Some(Element::Ground))),
        4.0
    );
    // A secondary immunity wipes out a primary weakness.
    assert_eq!(
        matchup(Element::Fighting, (Element::Normal, Some(Element::Ghost))),
        0.0
    );
    // Single-typed defenders pass through unchanged.
    assert_eq!(matchup(Element::Ice, (Element::Dragon, None)), 2.0);
}

#[test]
fn effectiveness_buckets() {
    assert_eq!(Effectiveness::from_multiplier(0.0), Effectiveness::Immune);
    assert_eq!(Effectiveness::from_multiplier(0.25), Effectiveness::NotVery);
    assert_eq!(Effectiveness::from_multiplier(1.0), Effectiveness::Neutral);
    assert_eq!(Effectiveness::from_multiplier(4.0), Effectiveness::Super);
    assert_eq!(
        Effectiveness::from_multiplier(2.0).label(),
        "It's super effective!"
    );
}
