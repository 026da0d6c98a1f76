//! Hand-rolled elemental type chart.
//!
//! The battle engine asks this module for matchup multipliers when it
//! resolves damage; nothing here touches the database. The chart is written
//! as one match per attacking element so a balance pass can edit a single
//! arm without chasing a table layout.

use super::models::Element;

/// Coarse buckets for presenting a multiplier to players.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effectiveness {
    Immune,
    NotVery,
    Neutral,
    Super,
}

impl Effectiveness {
    pub fn from_multiplier(mult: f32) -> Self {
        if mult == 0.0 {
            Effectiveness::Immune
        } else if mult < 1.0 {
            Effectiveness::NotVery
        } else if mult > 1.0 {
            Effectiveness::Super
        } else {
            Effectiveness::Neutral
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Effectiveness::Immune => "It has no effect...",
            Effectiveness::NotVery => "It's not very effective.",
            Effectiveness::Neutral => "",
            Effectiveness::Super => "It's super effective!",
        }
    }
}

/// Multiplier for a single attacking element against a single defending one.
pub fn effectiveness(attacker: Element, defender: Element) -> f32 {
    use Element::*;
    match attacker {
        Normal => match defender {
            Ghost => 0.0,
            Rock | Steel => 0.5,
            _ => 1.0,
        },
        Fire => match defender {
            Grass | Ice | Bug | Steel => 2.0,
            Fire | Water | Rock | Dragon => 0.5,
            _ => 1.0,
        },
        Water => match defender {
            Fire | Ground | Rock => 2.0,
            Water | Grass | Dragon => 0.5,
            _ => 1.0,
        },
        Grass => match defender {
            Water | Ground | Rock => 2.0,
            Fire | Grass | Poison | Flying | Bug | Dragon | Steel => 0.5,
            _ => 1.0,
        },
        Electric => match defender {
            Water | Flying => 2.0,
            Grass | Electric | Dragon => 0.5,
            Ground => 0.0,
            _ => 1.0,
        },
        Ice => match defender {
            Grass | Ground | Flying | Dragon => 2.0,
            Fire | Water | Ice | Steel => 0.5,
            _ => 1.0,
        },
        Fighting => match defender {
            Normal | Ice | Rock | Dark | Steel => 2.0,
            Poison | Flying | Psychic | Bug | Fairy => 0.5,
            Ghost => 0.0,
            _ => 1.0,
        },
        Poison => match defender {
            Grass | Fairy => 2.0,
            Poison | Ground | Rock | Ghost => 0.5,
            Steel => 0.0,
            _ => 1.0,
        },
        Ground => match defender {
            Fire | Electric | Poison | Rock | Steel => 2.0,
            Grass | Bug => 0.5,
            Flying => 0.0,
            _ => 1.0,
        },
        Flying => match defender {
            Grass | Fighting | Bug => 2.0,
            Electric | Rock | Steel => 0.5,
            _ => 1.0,
        },
        Psychic => match defender {
            Fighting | Poison => 2.0,
            Psychic | Steel => 0.5,
            Dark => 0.0,
            _ => 1.0,
        },
        Bug => match defender {
            Grass | Psychic | Dark => 2.0,
            Fire | Fighting | Poison | Flying | Ghost | Steel | Fairy => 0.5,
            _ => 1.0,
        },
        Rock => match defender {
            Fire | Ice | Flying | Bug => 2.0,
            Fighting | Ground | Steel => 0.5,
            _ => 1.0,
        },
        Ghost => match defender {
            Psychic | Ghost => 2.0,
            Dark => 0.5,
            Normal => 0.0,
            _ => 1.0,
        },
        Dragon => match defender {
            Dragon => 2.0,
            Steel => 0.5,
            Fairy => 0.0,
            _ => 1.0,
        },
        Dark => match defender {
            Psychic | Ghost => 2.0,
            Fighting | Dark | Fairy => 0.5,
            _ => 1.0,
        },
        Steel => match defender {
            Ice | Rock | Fairy => 2.0,
            Fire | Water | Electric | Steel => 0.5,
            _ => 1.0,
        },
        Fairy => match defender {
            Fighting | Dragon | Dark => 2.0,
            Fire | Poison | Steel => 0.5,
            _ => 1.0,
        },
    }
}

/// Combined multiplier against a possibly dual-typed defender.
pub fn matchup(attacker: Element, defender: (Element, Option<Element>)) -> f32 {
    let mut mult = effectiveness(attacker, defender.0);
    if let Some(secondary) = defender.1 {
        mult *= effectiveness(attacker, secondary);
    }
    mult
}
