//! Rest cycle and per-round state.

use crate::ledger::UsageCounter;
use crate::world::Character;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Type of rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestType {
    Short,
    Long,
}

impl fmt::Display for RestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestType::Short => write!(f, "short rest"),
            RestType::Long => write!(f, "long rest"),
        }
    }
}

// ============================================================================
// Round State
// ============================================================================

/// Action economy categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    Action,
    Bonus,
    Reaction,
    Movement,
    Object,
}

impl ActionType {
    pub fn all() -> [ActionType; 5] {
        [
            ActionType::Action,
            ActionType::Bonus,
            ActionType::Reaction,
            ActionType::Movement,
            ActionType::Object,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActionType::Action => "Action",
            ActionType::Bonus => "Bonus",
            ActionType::Reaction => "Reaction",
            ActionType::Movement => "Movement",
            ActionType::Object => "Object",
        }
    }
}

/// Which actions are still available this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEconomy {
    pub action: bool,
    pub bonus: bool,
    pub reaction: bool,
    pub movement: bool,
    pub object: bool,
}

impl ActionEconomy {
    fn slot_mut(&mut self, action: ActionType) -> &mut bool {
        match action {
            ActionType::Action => &mut self.action,
            ActionType::Bonus => &mut self.bonus,
            ActionType::Reaction => &mut self.reaction,
            ActionType::Movement => &mut self.movement,
            ActionType::Object => &mut self.object,
        }
    }

    pub fn is_available(&self, action: ActionType) -> bool {
        match action {
            ActionType::Action => self.action,
            ActionType::Bonus => self.bonus,
            ActionType::Reaction => self.reaction,
            ActionType::Movement => self.movement,
            ActionType::Object => self.object,
        }
    }

    /// Flip between available and spent. Returns the new availability.
    pub fn toggle(&mut self, action: ActionType) -> bool {
        let slot = self.slot_mut(action);
        *slot = !*slot;
        *slot
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Default for ActionEconomy {
    fn default() -> Self {
        Self {
            action: true,
            bonus: true,
            reaction: true,
            movement: true,
            object: true,
        }
    }
}

/// Transient per-session state. Not persisted with the character.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundState {
    pub actions: ActionEconomy,
    pub concentration: Option<String>,
}

impl RoundState {
    pub fn new_round(&mut self) {
        self.actions.reset();
    }

    /// Start concentrating on a spell. Blank names are ignored.
    pub fn set_concentration(&mut self, spell: &str) -> bool {
        let spell = spell.trim();
        if spell.is_empty() {
            return false;
        }
        self.concentration = Some(spell.to_string());
        true
    }

    pub fn drop_concentration(&mut self) -> bool {
        self.concentration.take().is_some()
    }
}

// ============================================================================
// Rests
// ============================================================================

/// Counts of what a rest brought back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestSummary {
    pub rest_type: RestType,
    pub slots_restored: usize,
    pub resources_restored: usize,
}

/// Restore the pact slot and every short-rest resource, and reset the
/// action economy. Hit points, death saves and concentration are untouched.
pub fn short_rest(character: &mut Character, round: &mut RoundState) -> RestSummary {
    let slots_restored = clear_usage(character.spell_slots.values_mut().filter(|slot| slot.is_pact));
    let classes = clear_usage(character.class_resources.iter_mut().filter(|r| r.short_rest));
    let customs = clear_usage(character.custom_resources.iter_mut().filter(|r| r.short_rest));

    round.actions.reset();

    let summary = RestSummary {
        rest_type: RestType::Short,
        slots_restored,
        resources_restored: classes + customs,
    };
    info!(character = %character.name, ?summary, "Short rest");
    summary
}

/// Restore everything: slots, resources, hit points, death saves, actions
/// and concentration.
pub fn long_rest(character: &mut Character, round: &mut RoundState) -> RestSummary {
    let slots_restored = clear_usage(character.spell_slots.values_mut());
    let classes = clear_usage(character.class_resources.iter_mut());
    let customs = clear_usage(character.custom_resources.iter_mut());

    character.hit_points.restore_full();
    character.death_saves.reset();
    round.actions.reset();
    round.concentration = None;

    let summary = RestSummary {
        rest_type: RestType::Long,
        slots_restored,
        resources_restored: classes + customs,
    };
    info!(character = %character.name, ?summary, "Long rest");
    summary
}

/// Zero every counter yielded; returns how many there were.
fn clear_usage<'a, T: UsageCounter + 'a>(counters: impl Iterator<Item = &'a mut T>) -> usize {
    let mut cleared = 0;
    for counter in counters {
        counter.set_used(0);
        cleared += 1;
    }
    cleared
}

pub fn take_rest(character: &mut Character, round: &mut RoundState, rest_type: RestType) -> RestSummary {
    match rest_type {
        RestType::Short => short_rest(character, round),
        RestType::Long => long_rest(character, round),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use crate::ledger;
    use crate::reconcile::reconcile;
    use crate::world::{CharacterClass, ClassLevel, CustomResource, ResourceColor, SlotKey};

    fn warlock_wizard() -> Character {
        let mut character = Character::new("Ysolde");
        character.classes = vec![
            ClassLevel::new(CharacterClass::Warlock, 2),
            ClassLevel::new(CharacterClass::Wizard, 3),
        ];
        reconcile(&mut character, &TrackerConfig::default());
        character.custom_resources = vec![
            CustomResource {
                name: "Luck".into(),
                max: 3,
                used: 0,
                color: ResourceColor::Yellow,
                short_rest: false,
                is_pool: false,
            },
            CustomResource {
                name: "Focus".into(),
                max: 2,
                used: 0,
                color: ResourceColor::Blue,
                short_rest: true,
                is_pool: false,
            },
        ];
        character
    }

    #[test]
    fn test_long_rest_restores_everything() {
        let mut character = Character::new("Test");
        character.classes = vec![ClassLevel::new(CharacterClass::Wizard, 5)];
        reconcile(&mut character, &TrackerConfig::default());
        ledger::consume_spell_slot(&mut character, 1, 4);
        ledger::consume_spell_slot(&mut character, 2, 3);
        ledger::consume_spell_slot(&mut character, 3, 2);
        character.hit_points.maximum = 27;
        character.hit_points.current = 3;
        character.hit_points.temporary = 5;
        character.death_saves.failures = 2;

        let mut round = RoundState::default();
        round.actions.toggle(ActionType::Action);
        round.set_concentration("Haste");

        long_rest(&mut character, &mut round);

        assert!(character.spell_slots.values().all(|s| s.used == 0));
        assert!(character.class_resources.iter().all(|r| r.used == 0));
        assert_eq!(character.hit_points.current, 27);
        assert_eq!(character.hit_points.temporary, 0);
        assert_eq!(character.death_saves.failures, 0);
        assert_eq!(round, RoundState::default());
    }

    #[test]
    fn test_short_rest_scope() {
        let mut character = warlock_wizard();
        ledger::consume_pact_slot(&mut character, 2);
        ledger::consume_spell_slot(&mut character, 1, 2);
        ledger::consume_custom_resource(&mut character, 0, 1);
        ledger::consume_custom_resource(&mut character, 1, 2);
        ledger::consume_class_resource(&mut character, 0, 1);
        character.hit_points.current = 4;

        let mut round = RoundState::default();
        round.actions.toggle(ActionType::Reaction);
        round.set_concentration("Hex");

        let summary = short_rest(&mut character, &mut round);

        assert_eq!(character.pact_slot().unwrap().1.used, 0);
        assert_eq!(character.spell_slots[&SlotKey::Standard(1)].used, 2);
        assert_eq!(character.custom_resources[0].used, 1);
        assert_eq!(character.custom_resources[1].used, 0);
        // Arcane Recovery only returns on a long rest
        assert_eq!(character.class_resources[0].used, 1);
        assert_eq!(character.hit_points.current, 4);
        assert!(round.actions.is_available(ActionType::Reaction));
        assert_eq!(round.concentration.as_deref(), Some("Hex"));
        assert_eq!(summary.slots_restored, 1);
        assert_eq!(summary.resources_restored, 1);
    }

    #[test]
    fn test_action_economy_toggle() {
        let mut round = RoundState::default();
        assert!(!round.actions.toggle(ActionType::Bonus));
        assert!(!round.actions.is_available(ActionType::Bonus));
        assert!(round.actions.toggle(ActionType::Bonus));

        round.actions.toggle(ActionType::Movement);
        round.new_round();
        assert!(ActionType::all().iter().all(|a| round.actions.is_available(*a)));
    }

    #[test]
    fn test_concentration() {
        let mut round = RoundState::default();
        assert!(!round.set_concentration("   "));
        assert!(!round.drop_concentration());
        assert!(round.set_concentration("Bless"));
        assert!(round.drop_concentration());
        assert_eq!(round.concentration, None);
    }
}
