//! Derivation of spell slot and class resource maxima from class composition.
//!
//! Both functions are pure: they read the character and return fresh slot
//! and resource definitions with nothing used. Merging them into a
//! character with existing usage is the reconciler's job.

use crate::class_data::CasterType;
use crate::tables;
use crate::world::{Character, ClassLevel, ClassResource, SlotKey};
use serde::{Deserialize, Serialize};

/// Which table drives a character whose only class is a half caster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HalfCasterProgression {
    /// Half of the class level feeds the combined caster level.
    #[default]
    Multiclass,
    /// A lone half caster reads the dedicated half caster table.
    DedicatedTable,
}

/// A derived spell slot pool with nothing used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSpec {
    pub level: u8,
    pub max: u32,
    pub is_pact: bool,
}

impl SlotSpec {
    pub fn key(&self) -> SlotKey {
        if self.is_pact {
            SlotKey::Pact(self.level)
        } else {
            SlotKey::Standard(self.level)
        }
    }
}

/// Combined caster level and separately tracked warlock level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CasterProfile {
    pub caster_level: u32,
    pub warlock_level: u32,
}

impl CasterProfile {
    pub fn from_classes(classes: &[ClassLevel]) -> Self {
        classes.iter().fold(Self::default(), |mut profile, entry| {
            let level = entry.level as u32;
            match entry.class.effective_caster_type(entry.subclass.as_deref()) {
                CasterType::Warlock => profile.warlock_level += level,
                caster => profile.caster_level += caster.caster_levels(level),
            }
            profile
        })
    }
}

/// Standard and pact slot pools for the character's classes.
pub fn derive_spell_slots(character: &Character) -> Vec<SlotSpec> {
    derive_spell_slots_with(character, HalfCasterProgression::default())
}

/// Like [`derive_spell_slots`] with an explicit half caster progression.
pub fn derive_spell_slots_with(
    character: &Character,
    progression: HalfCasterProgression,
) -> Vec<SlotSpec> {
    let profile = CasterProfile::from_classes(&character.classes);

    let row = match (progression, character.classes.as_slice()) {
        (HalfCasterProgression::DedicatedTable, [only])
            if only.class.effective_caster_type(only.subclass.as_deref()) == CasterType::Half =>
        {
            tables::half_caster_row(only.level as u32)
        }
        _ => tables::full_caster_row(profile.caster_level),
    };

    let mut specs: Vec<SlotSpec> = row
        .into_iter()
        .flat_map(|row| row.iter().enumerate())
        .filter(|(_, max)| **max > 0)
        .map(|(i, max)| SlotSpec {
            level: i as u8 + 1,
            max: *max,
            is_pact: false,
        })
        .collect();

    if let Some((count, level)) = tables::warlock_row(profile.warlock_level) {
        specs.push(SlotSpec {
            level,
            max: count,
            is_pact: true,
        });
    }

    specs
}

/// Class resources for every class entry, in class order then template order.
pub fn derive_class_resources(character: &Character) -> Vec<ClassResource> {
    let modifiers = character.abilities.modifiers();

    character
        .classes
        .iter()
        .flat_map(|entry| {
            entry
                .class
                .resource_templates()
                .iter()
                .filter(|t| t.applies_at(entry.level))
                .map(move |t| ClassResource {
                    name: t.name.to_string(),
                    linked_ability: t.linked_ability,
                    max: t.max.evaluate(entry.level, &modifiers),
                    used: 0,
                    short_rest: t.short_rest.evaluate(entry.level),
                    is_pool: t.is_pool,
                    source_class: entry.class,
                })
        })
        .collect()
}
