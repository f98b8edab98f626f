//! Per-class rule data: caster type, subclasses and resource templates.
//!
//! Resource templates are a static registry of tagged formulas so they can
//! be inspected and tested without running them.

use crate::world::{Ability, AbilityModifiers, CharacterClass};
use std::collections::HashMap;

/// Spellcasting progression contributed by a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CasterType {
    Full,
    Half,
    Third,
    Warlock,
    None,
}

impl CasterType {
    /// Contribution of `class_level` levels to the combined caster level.
    /// Warlock levels never contribute; they are tracked separately.
    pub fn caster_levels(&self, class_level: u32) -> u32 {
        match self {
            CasterType::Full => class_level,
            CasterType::Half => class_level / 2,
            CasterType::Third => class_level / 3,
            CasterType::Warlock | CasterType::None => 0,
        }
    }
}

// ============================================================================
// Resource Templates
// ============================================================================

/// How a class resource's maximum is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxFormula {
    Fixed(u32),
    ClassLevel,
    ClassLevelTimes(u32),
    HalfClassLevelRoundedUp,
    /// `max(1, modifier)` of the given ability.
    ModifierMinOne(Ability),
    /// `base` until the class level reaches each `(level, value)` threshold.
    Tiered {
        base: u32,
        steps: &'static [(u8, u32)],
    },
}

impl MaxFormula {
    pub fn evaluate(&self, class_level: u8, modifiers: &AbilityModifiers) -> u32 {
        let level = class_level as u32;
        match self {
            MaxFormula::Fixed(value) => *value,
            MaxFormula::ClassLevel => level,
            MaxFormula::ClassLevelTimes(factor) => level * factor,
            MaxFormula::HalfClassLevelRoundedUp => level.div_ceil(2),
            MaxFormula::ModifierMinOne(ability) => modifiers.get(*ability).max(1) as u32,
            MaxFormula::Tiered { base, steps } => steps
                .iter()
                .take_while(|(threshold, _)| class_level >= *threshold)
                .last()
                .map(|(_, value)| *value)
                .unwrap_or(*base),
        }
    }
}

/// Whether a class resource returns on a short rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortRestRule {
    Always,
    Never,
    FromLevel(u8),
}

impl ShortRestRule {
    pub fn evaluate(&self, class_level: u8) -> bool {
        match self {
            ShortRestRule::Always => true,
            ShortRestRule::Never => false,
            ShortRestRule::FromLevel(min) => class_level >= *min,
        }
    }
}

/// A class resource definition; evaluated against a class level and the
/// character's ability modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTemplate {
    pub name: &'static str,
    pub linked_ability: Ability,
    pub max: MaxFormula,
    pub short_rest: ShortRestRule,
    /// The resource is absent below this class level.
    pub min_level: Option<u8>,
    pub is_pool: bool,
}

impl ResourceTemplate {
    pub fn new(name: &'static str, linked_ability: Ability, max: MaxFormula) -> Self {
        Self {
            name,
            linked_ability,
            max,
            short_rest: ShortRestRule::Never,
            min_level: None,
            is_pool: false,
        }
    }

    pub fn with_short_rest(mut self, rule: ShortRestRule) -> Self {
        self.short_rest = rule;
        self
    }

    pub fn with_min_level(mut self, level: u8) -> Self {
        self.min_level = Some(level);
        self
    }

    pub fn as_pool(mut self) -> Self {
        self.is_pool = true;
        self
    }

    pub fn applies_at(&self, class_level: u8) -> bool {
        self.min_level.map_or(true, |min| class_level >= min)
    }
}

lazy_static::lazy_static! {
    /// Resource templates for each class. Classes without entries have none.
    pub static ref CLASS_RESOURCES: HashMap<CharacterClass, Vec<ResourceTemplate>> = {
        use Ability::*;
        use MaxFormula::*;

        let mut m = HashMap::new();
        m.insert(CharacterClass::Barbarian, vec![
            ResourceTemplate::new("Rage", Strength, Tiered {
                base: 2,
                steps: &[(3, 3), (6, 4), (12, 5), (17, 6)],
            }),
        ]);
        m.insert(CharacterClass::Bard, vec![
            ResourceTemplate::new("Inspiration", Charisma, ModifierMinOne(Charisma))
                .with_short_rest(ShortRestRule::FromLevel(5)),
        ]);
        m.insert(CharacterClass::Cleric, vec![
            ResourceTemplate::new("Channel Divinity", Wisdom, Tiered {
                base: 1,
                steps: &[(6, 2), (18, 3)],
            })
            .with_short_rest(ShortRestRule::Always),
        ]);
        m.insert(CharacterClass::Druid, vec![
            ResourceTemplate::new("Wild Shape", Wisdom, Fixed(2))
                .with_short_rest(ShortRestRule::Always),
        ]);
        m.insert(CharacterClass::Fighter, vec![
            ResourceTemplate::new("Second Wind", Constitution, Fixed(1))
                .with_short_rest(ShortRestRule::Always),
            ResourceTemplate::new("Action Surge", Strength, Tiered {
                base: 1,
                steps: &[(17, 2)],
            })
            .with_short_rest(ShortRestRule::Always)
            .with_min_level(2),
        ]);
        m.insert(CharacterClass::Monk, vec![
            ResourceTemplate::new("Ki", Wisdom, ClassLevel)
                .with_short_rest(ShortRestRule::Always)
                .with_min_level(2),
        ]);
        m.insert(CharacterClass::Paladin, vec![
            ResourceTemplate::new("Lay on Hands", Charisma, ClassLevelTimes(5)).as_pool(),
            ResourceTemplate::new("Channel Divinity", Charisma, Fixed(1))
                .with_short_rest(ShortRestRule::Always)
                .with_min_level(3),
        ]);
        m.insert(CharacterClass::Ranger, vec![
            ResourceTemplate::new("Favored Foe", Wisdom, Tiered {
                base: 2,
                steps: &[(6, 3), (14, 4)],
            })
            .with_min_level(1),
        ]);
        m.insert(CharacterClass::Sorcerer, vec![
            ResourceTemplate::new("Sorcery Points", Charisma, ClassLevel).with_min_level(2),
        ]);
        m.insert(CharacterClass::Wizard, vec![
            ResourceTemplate::new("Arcane Recovery", Intelligence, HalfClassLevelRoundedUp).as_pool(),
        ]);
        m.insert(CharacterClass::Artificer, vec![
            ResourceTemplate::new("Flash of Genius", Intelligence, ModifierMinOne(Intelligence))
                .with_short_rest(ShortRestRule::Always)
                .with_min_level(7),
        ]);
        m
    };
}

impl CharacterClass {
    /// Base spellcasting progression of the class.
    pub fn caster_type(&self) -> CasterType {
        match self {
            CharacterClass::Bard
            | CharacterClass::Cleric
            | CharacterClass::Druid
            | CharacterClass::Sorcerer
            | CharacterClass::Wizard => CasterType::Full,
            CharacterClass::Artificer | CharacterClass::Paladin | CharacterClass::Ranger => {
                CasterType::Half
            }
            CharacterClass::Warlock => CasterType::Warlock,
            CharacterClass::Barbarian
            | CharacterClass::Fighter
            | CharacterClass::Monk
            | CharacterClass::Rogue => CasterType::None,
        }
    }

    /// Caster type once a subclass is taken into account.
    pub fn effective_caster_type(&self, subclass: Option<&str>) -> CasterType {
        match (self, subclass) {
            (CharacterClass::Fighter, Some("Eldritch Knight"))
            | (CharacterClass::Rogue, Some("Arcane Trickster")) => CasterType::Third,
            _ => self.caster_type(),
        }
    }

    pub fn resource_templates(&self) -> &'static [ResourceTemplate] {
        CLASS_RESOURCES.get(self).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn subclasses(&self) -> &'static [&'static str] {
        match self {
            CharacterClass::Artificer => &["Alchemist", "Armorer", "Artillerist", "Battle Smith"],
            CharacterClass::Barbarian => &[
                "Ancestral Guardian",
                "Beast",
                "Berserker",
                "Storm Herald",
                "Totem Warrior",
                "Wild Magic",
                "Zealot",
            ],
            CharacterClass::Bard => &[
                "Creation", "Eloquence", "Glamour", "Lore", "Swords", "Valor", "Whispers",
            ],
            CharacterClass::Cleric => &[
                "Forge", "Grave", "Knowledge", "Life", "Light", "Nature", "Order", "Peace",
                "Tempest", "Trickery", "Twilight", "War",
            ],
            CharacterClass::Druid => &[
                "Dreams", "Land", "Moon", "Shepherd", "Spores", "Stars", "Wildfire",
            ],
            CharacterClass::Fighter => &[
                "Arcane Archer",
                "Battle Master",
                "Cavalier",
                "Champion",
                "Eldritch Knight",
                "Psi Warrior",
                "Rune Knight",
                "Samurai",
            ],
            CharacterClass::Monk => &[
                "Astral Self",
                "Drunken Master",
                "Four Elements",
                "Kensei",
                "Mercy",
                "Open Hand",
                "Shadow",
                "Sun Soul",
            ],
            CharacterClass::Paladin => &[
                "Ancients",
                "Conquest",
                "Devotion",
                "Glory",
                "Redemption",
                "Vengeance",
                "Watchers",
            ],
            CharacterClass::Ranger => &[
                "Beast Master",
                "Fey Wanderer",
                "Gloom Stalker",
                "Horizon Walker",
                "Hunter",
                "Monster Slayer",
                "Swarmkeeper",
            ],
            CharacterClass::Rogue => &[
                "Arcane Trickster",
                "Assassin",
                "Inquisitive",
                "Mastermind",
                "Phantom",
                "Scout",
                "Soulknife",
                "Swashbuckler",
                "Thief",
            ],
            CharacterClass::Sorcerer => &[
                "Aberrant Mind",
                "Clockwork Soul",
                "Divine Soul",
                "Draconic",
                "Shadow",
                "Storm",
                "Wild",
            ],
            CharacterClass::Warlock => &[
                "Archfey",
                "Celestial",
                "Fathomless",
                "Fiend",
                "Genie",
                "Great Old One",
                "Hexblade",
            ],
            CharacterClass::Wizard => &[
                "Abjuration",
                "Bladesinging",
                "Conjuration",
                "Divination",
                "Enchantment",
                "Evocation",
                "Illusion",
                "Necromancy",
                "Scribes",
                "Transmutation",
                "War",
            ],
        }
    }

    pub fn is_known_subclass(&self, subclass: &str) -> bool {
        self.subclasses().contains(&subclass)
    }
}
