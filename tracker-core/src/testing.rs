//! Testing utilities for the tracker.
//!
//! - `RecordingSink` keeps every record a session saves
//! - Sample characters with reconciled resources

use crate::config::TrackerConfig;
use crate::persist::SaveSink;
use crate::reconcile::reconcile;
use crate::session::PlayerSession;
use crate::world::{Ability, AbilityScores, Character, CharacterClass, ClassLevel, HitPoints};

/// A save sink that records every saved character in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    saves: Vec<Character>,
}

impl RecordingSink {
    pub fn saves(&self) -> &[Character] {
        &self.saves
    }

    pub fn count(&self) -> usize {
        self.saves.len()
    }

    pub fn last(&self) -> Option<&Character> {
        self.saves.last()
    }
}

impl SaveSink for RecordingSink {
    fn save(&mut self, character: &Character) {
        self.saves.push(character.clone());
    }
}

fn sample(name: &str, class: CharacterClass, level: u8, abilities: AbilityScores, hit_die: i32) -> Character {
    let mut character = Character::new(name);
    character.classes = vec![ClassLevel::new(class, level)];
    character.abilities = abilities;
    let con = character.abilities.modifier(Ability::Constitution);
    let level = level.max(1) as i32;
    character.hit_points = HitPoints::new((hit_die + con + (level - 1) * (hit_die / 2 + 1 + con)).max(1));
    reconcile(&mut character, &TrackerConfig::default());
    character
}

/// A single-class Wizard with reconciled slots and Arcane Recovery.
pub fn sample_wizard(name: &str, level: u8) -> Character {
    sample(
        name,
        CharacterClass::Wizard,
        level,
        AbilityScores::new(8, 14, 10, 16, 12, 10),
        6,
    )
}

/// A single-class Fighter with Second Wind (and Action Surge from level 2).
pub fn sample_fighter(name: &str, level: u8) -> Character {
    sample(
        name,
        CharacterClass::Fighter,
        level,
        AbilityScores::new(16, 12, 14, 10, 10, 8),
        10,
    )
}

/// A session over `character` with default config and a recording sink.
pub fn recording_session(character: Character) -> PlayerSession<RecordingSink> {
    PlayerSession::new(character, TrackerConfig::default(), RecordingSink::default())
}
