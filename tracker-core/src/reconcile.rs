//! Merging freshly derived maxima into a character that already has usage.
//!
//! Runs after every change to class composition or ability scores. Spell
//! slots carry usage by key; class resources carry usage by
//! `(source_class, name)` identity.

use crate::config::TrackerConfig;
use crate::derive::{derive_class_resources, derive_spell_slots_with, SlotSpec};
use crate::ledger::ResourceRef;
use crate::tables;
use crate::world::{Character, ClassResource, Skill, SlotKey, SpellSlot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// What happens to class resource usage when maxima are re-derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassResourcePolicy {
    /// Usage follows the resource by identity, clamped to the new maximum.
    #[default]
    PreserveByIdentity,
    /// Every class resource starts unused after a class-structure change.
    ResetOnChange,
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub dropped_slots: Vec<SlotKey>,
    pub dropped_resources: Vec<String>,
    /// Skills whose class resource link was cleared because it vanished.
    pub unlinked_skills: usize,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.dropped_slots.is_empty() && self.dropped_resources.is_empty() && self.unlinked_skills == 0
    }
}

/// Recompute level, proficiency bonus, spell slots and class resources.
pub fn reconcile(character: &mut Character, config: &TrackerConfig) -> ReconcileReport {
    let total = character.total_level();
    character.level = total.min(u8::MAX as u32) as u8;
    character.proficiency_bonus = tables::proficiency_bonus(total);

    let specs = derive_spell_slots_with(character, config.half_caster_progression);
    let (slots, dropped_slots) = merge_spell_slots(&character.spell_slots, &specs);
    character.spell_slots = slots;

    let (dropped_resources, unlinked_skills) =
        refresh_class_resources(character, config.class_resource_policy);

    let report = ReconcileReport {
        dropped_slots,
        dropped_resources,
        unlinked_skills,
    };
    debug!(
        character = %character.name,
        level = character.level,
        slots = character.spell_slots.len(),
        class_resources = character.class_resources.len(),
        dropped_slots = report.dropped_slots.len(),
        dropped_resources = report.dropped_resources.len(),
        "Reconciled character"
    );
    report
}

/// Re-derive class resources only, leaving spell slots untouched.
///
/// Returns the names of resources that disappeared and the number of
/// skill links cleared as a result.
pub fn refresh_class_resources(
    character: &mut Character,
    policy: ClassResourcePolicy,
) -> (Vec<String>, usize) {
    let fresh = derive_class_resources(character);
    let old = std::mem::take(&mut character.class_resources);
    let (merged, remap) = merge_class_resources(&old, fresh, policy);

    let dropped: Vec<String> = old
        .iter()
        .zip(&remap)
        .filter(|(_, to)| to.is_none())
        .map(|(res, _)| res.name.clone())
        .collect();

    character.class_resources = merged;
    let unlinked = relink_class_skills(&mut character.skills, &remap);
    (dropped, unlinked)
}

/// Build the slot map from derived specs, carrying `used` by key.
pub fn merge_spell_slots(
    old: &BTreeMap<SlotKey, SpellSlot>,
    specs: &[SlotSpec],
) -> (BTreeMap<SlotKey, SpellSlot>, Vec<SlotKey>) {
    let merged: BTreeMap<SlotKey, SpellSlot> = specs
        .iter()
        .map(|spec| {
            let key = spec.key();
            let used = old.get(&key).map_or(0, |prev| prev.used.min(spec.max));
            let slot = SpellSlot {
                used,
                max: spec.max,
                level: spec.level,
                is_pact: spec.is_pact,
            };
            (key, slot)
        })
        .collect();

    let dropped = old
        .keys()
        .filter(|key| !merged.contains_key(key))
        .copied()
        .collect();

    (merged, dropped)
}

/// Merge derived resources with existing ones.
///
/// The returned remap has one entry per old resource: its index in the
/// merged list, or `None` if no derived resource shares its identity.
pub fn merge_class_resources(
    old: &[ClassResource],
    mut fresh: Vec<ClassResource>,
    policy: ClassResourcePolicy,
) -> (Vec<ClassResource>, Vec<Option<usize>>) {
    // Repeated class entries yield repeated identities; pair them up in order.
    let remap: Vec<Option<usize>> = old
        .iter()
        .enumerate()
        .map(|(i, prev)| {
            let nth = old[..i]
                .iter()
                .filter(|res| res.identity() == prev.identity())
                .count();
            fresh
                .iter()
                .enumerate()
                .filter(|(_, res)| res.identity() == prev.identity())
                .nth(nth)
                .map(|(j, _)| j)
        })
        .collect();

    for (prev, to) in old.iter().zip(&remap) {
        let Some(to) = *to else { continue };
        let res = &mut fresh[to];
        res.used = match policy {
            ClassResourcePolicy::PreserveByIdentity => prev.used.min(res.max),
            ClassResourcePolicy::ResetOnChange => 0,
        };
    }

    (fresh, remap)
}

fn relink_class_skills(skills: &mut [Skill], remap: &[Option<usize>]) -> usize {
    let mut unlinked = 0;
    for skill in skills.iter_mut() {
        if let Some(ResourceRef::Class(index)) = skill.linked_resource {
            let moved = remap.get(index).copied().flatten();
            if moved.is_none() {
                unlinked += 1;
            }
            skill.linked_resource = moved.map(ResourceRef::Class);
        }
    }
    unlinked
}
