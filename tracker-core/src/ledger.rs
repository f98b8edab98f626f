//! Consumption ledger: spending and restoring units of any resource.
//!
//! All operations are guarded no-ops. They return `true` only when the
//! character actually changed, so callers know whether to persist.

use crate::world::{Character, ClassResource, CustomResource, Skill, SlotKey, SpellSlot};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::trace;

// ============================================================================
// Resource References
// ============================================================================

/// A typed reference to one consumable resource.
///
/// Serialized as `spell-3`, `pact`, `custom-0` or `class-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResourceRef {
    SpellSlot(u8),
    /// The pact slot, whatever level it currently sits at.
    Pact,
    Custom(usize),
    Class(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseRefError {
    #[error("empty resource reference")]
    Empty,
    #[error("unknown resource kind in reference: {0}")]
    UnknownKind(String),
    #[error("invalid index in resource reference: {0}")]
    InvalidIndex(String),
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::SpellSlot(level) => write!(f, "spell-{level}"),
            ResourceRef::Pact => write!(f, "pact"),
            ResourceRef::Custom(index) => write!(f, "custom-{index}"),
            ResourceRef::Class(index) => write!(f, "class-{index}"),
        }
    }
}

impl FromStr for ResourceRef {
    type Err = ParseRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseRefError::Empty);
        }
        let (kind, rest) = s.split_once('-').unwrap_or((s, ""));
        let index = || {
            rest.parse::<usize>()
                .map_err(|_| ParseRefError::InvalidIndex(s.to_string()))
        };
        match kind {
            // Older records carry the pact level, e.g. "pact-3"
            "pact" => Ok(ResourceRef::Pact),
            "spell" => {
                let level = index()?;
                u8::try_from(level)
                    .map(ResourceRef::SpellSlot)
                    .map_err(|_| ParseRefError::InvalidIndex(s.to_string()))
            }
            "custom" => index().map(ResourceRef::Custom),
            "class" => index().map(ResourceRef::Class),
            _ => Err(ParseRefError::UnknownKind(s.to_string())),
        }
    }
}

impl TryFrom<String> for ResourceRef {
    type Error = ParseRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceRef> for String {
    fn from(r: ResourceRef) -> Self {
        r.to_string()
    }
}

// ============================================================================
// Usage Counters
// ============================================================================

/// Anything that tracks `used` out of `max`.
pub trait UsageCounter {
    fn used(&self) -> u32;
    fn max(&self) -> u32;
    fn set_used(&mut self, used: u32);

    fn remaining(&self) -> u32 {
        self.max().saturating_sub(self.used())
    }

    /// Whether the counter accepts arbitrary remaining values.
    fn is_pool(&self) -> bool {
        false
    }
}

impl UsageCounter for SpellSlot {
    fn used(&self) -> u32 {
        self.used
    }
    fn max(&self) -> u32 {
        self.max
    }
    fn set_used(&mut self, used: u32) {
        self.used = used;
    }
}

impl UsageCounter for ClassResource {
    fn used(&self) -> u32 {
        self.used
    }
    fn max(&self) -> u32 {
        self.max
    }
    fn set_used(&mut self, used: u32) {
        self.used = used;
    }
    fn is_pool(&self) -> bool {
        self.is_pool
    }
}

impl UsageCounter for CustomResource {
    fn used(&self) -> u32 {
        self.used
    }
    fn max(&self) -> u32 {
        self.max
    }
    fn set_used(&mut self, used: u32) {
        self.used = used;
    }
    fn is_pool(&self) -> bool {
        self.is_pool
    }
}

fn consume_counter(counter: &mut dyn UsageCounter, amount: u32) -> bool {
    if amount == 0 || counter.remaining() < amount {
        return false;
    }
    counter.set_used(counter.used() + amount);
    true
}

fn restore_counter(counter: &mut dyn UsageCounter, amount: u32) -> bool {
    if amount == 0 || counter.used() < amount {
        return false;
    }
    counter.set_used(counter.used() - amount);
    true
}

/// Resolve a reference to its counter.
pub fn counter<'a>(character: &'a Character, r: ResourceRef) -> Option<&'a dyn UsageCounter> {
    match r {
        ResourceRef::SpellSlot(level) => character
            .spell_slots
            .get(&SlotKey::Standard(level))
            .map(|s| s as &dyn UsageCounter),
        ResourceRef::Pact => character.pact_slot().map(|(_, s)| s as &dyn UsageCounter),
        ResourceRef::Custom(i) => character
            .custom_resources
            .get(i)
            .map(|c| c as &dyn UsageCounter),
        ResourceRef::Class(i) => character
            .class_resources
            .get(i)
            .map(|c| c as &dyn UsageCounter),
    }
}

fn counter_mut<'a>(
    character: &'a mut Character,
    r: ResourceRef,
) -> Option<&'a mut dyn UsageCounter> {
    match r {
        ResourceRef::SpellSlot(level) => character
            .spell_slots
            .get_mut(&SlotKey::Standard(level))
            .map(|s| s as &mut dyn UsageCounter),
        ResourceRef::Pact => character.pact_slot_mut().map(|s| s as &mut dyn UsageCounter),
        ResourceRef::Custom(i) => character
            .custom_resources
            .get_mut(i)
            .map(|c| c as &mut dyn UsageCounter),
        ResourceRef::Class(i) => character
            .class_resources
            .get_mut(i)
            .map(|c| c as &mut dyn UsageCounter),
    }
}

// ============================================================================
// Ledger Operations
// ============================================================================

/// Spend `amount` units. Refused if the resource is missing or short.
pub fn consume(character: &mut Character, r: ResourceRef, amount: u32) -> bool {
    let changed = counter_mut(character, r).is_some_and(|c| consume_counter(c, amount));
    trace!(resource = %r, amount, changed, "consume");
    changed
}

/// Return `amount` units. Refused if fewer than `amount` are in use.
pub fn restore(character: &mut Character, r: ResourceRef, amount: u32) -> bool {
    let changed = counter_mut(character, r).is_some_and(|c| restore_counter(c, amount));
    trace!(resource = %r, amount, changed, "restore");
    changed
}

pub fn consume_spell_slot(character: &mut Character, level: u8, amount: u32) -> bool {
    consume(character, ResourceRef::SpellSlot(level), amount)
}

pub fn restore_spell_slot(character: &mut Character, level: u8, amount: u32) -> bool {
    restore(character, ResourceRef::SpellSlot(level), amount)
}

pub fn consume_pact_slot(character: &mut Character, amount: u32) -> bool {
    consume(character, ResourceRef::Pact, amount)
}

pub fn restore_pact_slot(character: &mut Character, amount: u32) -> bool {
    restore(character, ResourceRef::Pact, amount)
}

pub fn consume_custom_resource(character: &mut Character, index: usize, amount: u32) -> bool {
    consume(character, ResourceRef::Custom(index), amount)
}

pub fn restore_custom_resource(character: &mut Character, index: usize, amount: u32) -> bool {
    restore(character, ResourceRef::Custom(index), amount)
}

pub fn consume_class_resource(character: &mut Character, index: usize, amount: u32) -> bool {
    consume(character, ResourceRef::Class(index), amount)
}

pub fn restore_class_resource(character: &mut Character, index: usize, amount: u32) -> bool {
    restore(character, ResourceRef::Class(index), amount)
}

/// Set a pool's remaining amount directly; `used = clamp(max - value, 0, max)`.
///
/// Only pool resources accept this.
pub fn set_pool_remaining(character: &mut Character, r: ResourceRef, value: i64) -> bool {
    let Some(counter) = counter_mut(character, r) else {
        return false;
    };
    if !counter.is_pool() {
        return false;
    }
    let max = counter.max() as i64;
    let used = (max - value.clamp(0, max)) as u32;
    if used == counter.used() {
        return false;
    }
    counter.set_used(used);
    true
}

/// Whether a skill's linked resource exists and covers its cost.
pub fn is_skill_available(character: &Character, skill: &Skill) -> bool {
    skill
        .linked_resource
        .and_then(|r| counter(character, r))
        .is_some_and(|c| c.remaining() >= skill.cost)
}

/// Spend the skill's cost from its linked resource.
pub fn use_skill(character: &mut Character, index: usize) -> bool {
    let Some(skill) = character.skills.get(index) else {
        return false;
    };
    let (Some(r), cost) = (skill.linked_resource, skill.cost) else {
        return false;
    };
    consume(character, r, cost)
}

// ============================================================================
// Labels
// ============================================================================

/// A resource a skill may link to, with its display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceOption {
    pub reference: ResourceRef,
    pub label: String,
}

/// Human label for a reference, or `None` if it does not resolve.
pub fn resource_label(character: &Character, r: ResourceRef) -> Option<String> {
    match r {
        ResourceRef::SpellSlot(level) => character
            .spell_slots
            .get(&SlotKey::Standard(level))
            .map(|_| format!("Spell Slot (Lvl {level})")),
        ResourceRef::Pact => character
            .pact_slot()
            .map(|(key, _)| format!("Pact Slot (Lvl {})", key.level())),
        ResourceRef::Custom(i) => character.custom_resources.get(i).map(|c| c.name.clone()),
        ResourceRef::Class(i) => character.class_resources.get(i).map(|c| c.name.clone()),
    }
}

/// Every resource currently on the character, for skill linking.
pub fn available_resources(character: &Character) -> Vec<ResourceOption> {
    let slots = character.spell_slots.keys().map(|key| match key {
        SlotKey::Standard(level) => ResourceRef::SpellSlot(*level),
        SlotKey::Pact(_) => ResourceRef::Pact,
    });
    let customs = (0..character.custom_resources.len()).map(ResourceRef::Custom);
    let classes = (0..character.class_resources.len()).map(ResourceRef::Class);

    slots
        .chain(customs)
        .chain(classes)
        .filter_map(|reference| {
            resource_label(character, reference).map(|label| ResourceOption { reference, label })
        })
        .collect()
}
