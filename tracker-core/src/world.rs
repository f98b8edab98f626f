//! Player character record.
//!
//! Contains the character aggregate and every value type it is built from:
//! ability scores, class levels, hit points, death saves, spell slots,
//! class and custom resources, skills and features.

use crate::ledger::ResourceRef;
use crate::tables;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub Uuid);

impl CharacterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Ability Scores
// ============================================================================

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ability {
    #[serde(rename = "STR")]
    Strength,
    #[serde(rename = "DEX")]
    Dexterity,
    #[serde(rename = "CON")]
    Constitution,
    #[serde(rename = "INT")]
    Intelligence,
    #[serde(rename = "WIS")]
    Wisdom,
    #[serde(rename = "CHA")]
    Charisma,
}

impl Ability {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        }
    }

    pub fn all() -> [Ability; 6] {
        [
            Ability::Strength,
            Ability::Dexterity,
            Ability::Constitution,
            Ability::Intelligence,
            Ability::Wisdom,
            Ability::Charisma,
        ]
    }

    fn index(&self) -> usize {
        match self {
            Ability::Strength => 0,
            Ability::Dexterity => 1,
            Ability::Constitution => 2,
            Ability::Intelligence => 3,
            Ability::Wisdom => 4,
            Ability::Charisma => 5,
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Error returned when a name does not match any known ability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown ability: {0}")]
pub struct UnknownAbility(pub String);

impl FromStr for Ability {
    type Err = UnknownAbility;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Ability::all()
            .into_iter()
            .find(|a| {
                a.abbreviation().eq_ignore_ascii_case(wanted) || a.name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| UnknownAbility(s.to_string()))
    }
}

/// Ability scores container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    #[serde(rename = "STR")]
    pub strength: i32,
    #[serde(rename = "DEX")]
    pub dexterity: i32,
    #[serde(rename = "CON")]
    pub constitution: i32,
    #[serde(rename = "INT")]
    pub intelligence: i32,
    #[serde(rename = "WIS")]
    pub wisdom: i32,
    #[serde(rename = "CHA")]
    pub charisma: i32,
}

impl AbilityScores {
    pub fn new(str: i32, dex: i32, con: i32, int: i32, wis: i32, cha: i32) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            charisma: cha,
        }
    }

    pub fn get(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn set(&mut self, ability: Ability, value: i32) {
        match ability {
            Ability::Strength => self.strength = value,
            Ability::Dexterity => self.dexterity = value,
            Ability::Constitution => self.constitution = value,
            Ability::Intelligence => self.intelligence = value,
            Ability::Wisdom => self.wisdom = value,
            Ability::Charisma => self.charisma = value,
        }
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        tables::ability_modifier(self.get(ability))
    }

    /// Snapshot of all six modifiers, as consumed by resource formulas.
    pub fn modifiers(&self) -> AbilityModifiers {
        let mut mods = [0; 6];
        for ability in Ability::all() {
            mods[ability.index()] = self.modifier(ability);
        }
        AbilityModifiers(mods)
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

/// Ability modifiers indexed by ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AbilityModifiers([i32; 6]);

impl AbilityModifiers {
    pub fn get(&self, ability: Ability) -> i32 {
        self.0[ability.index()]
    }
}

// ============================================================================
// Classes
// ============================================================================

/// Playable classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CharacterClass {
    Artificer,
    Barbarian,
    Bard,
    Cleric,
    Druid,
    Fighter,
    Monk,
    Paladin,
    Ranger,
    Rogue,
    Sorcerer,
    Warlock,
    Wizard,
}

impl CharacterClass {
    pub fn name(&self) -> &'static str {
        match self {
            CharacterClass::Artificer => "Artificer",
            CharacterClass::Barbarian => "Barbarian",
            CharacterClass::Bard => "Bard",
            CharacterClass::Cleric => "Cleric",
            CharacterClass::Druid => "Druid",
            CharacterClass::Fighter => "Fighter",
            CharacterClass::Monk => "Monk",
            CharacterClass::Paladin => "Paladin",
            CharacterClass::Ranger => "Ranger",
            CharacterClass::Rogue => "Rogue",
            CharacterClass::Sorcerer => "Sorcerer",
            CharacterClass::Warlock => "Warlock",
            CharacterClass::Wizard => "Wizard",
        }
    }

    /// Get all character classes.
    pub fn all() -> &'static [CharacterClass] {
        &[
            CharacterClass::Artificer,
            CharacterClass::Barbarian,
            CharacterClass::Bard,
            CharacterClass::Cleric,
            CharacterClass::Druid,
            CharacterClass::Fighter,
            CharacterClass::Monk,
            CharacterClass::Paladin,
            CharacterClass::Ranger,
            CharacterClass::Rogue,
            CharacterClass::Sorcerer,
            CharacterClass::Warlock,
            CharacterClass::Wizard,
        ]
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when a name does not match any known class.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown class: {0}")]
pub struct UnknownClass(pub String);

impl FromStr for CharacterClass {
    type Err = UnknownClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CharacterClass::all()
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownClass(s.to_string()))
    }
}

/// One entry of a character's class composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLevel {
    pub class: CharacterClass,
    pub level: u8,
    pub subclass: Option<String>,
}

impl ClassLevel {
    /// Create a class entry; the level is clamped to 1..=20.
    pub fn new(class: CharacterClass, level: u8) -> Self {
        Self {
            class,
            level: level.clamp(1, tables::MAX_CLASS_LEVEL),
            subclass: None,
        }
    }

    pub fn with_subclass(mut self, subclass: impl Into<String>) -> Self {
        self.subclass = Some(subclass.into());
        self
    }
}

impl fmt::Display for ClassLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subclass {
            Some(sub) => write!(f, "{} {} ({sub})", self.class, self.level),
            None => write!(f, "{} {}", self.class, self.level),
        }
    }
}

/// Class feature or trait noted on the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub description: String,
}

// ============================================================================
// Hit Points and Health
// ============================================================================

/// Hit points tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: i32,
    pub maximum: i32,
    pub temporary: i32,
}

impl HitPoints {
    pub fn new(maximum: i32) -> Self {
        Self {
            current: maximum,
            maximum,
            temporary: 0,
        }
    }

    /// Apply damage, draining temporary HP first. Current HP never drops below zero.
    pub fn take_damage(&mut self, amount: i32) -> DamageResult {
        let mut remaining = amount.max(0);

        if self.temporary > 0 {
            let absorbed = self.temporary.min(remaining);
            self.temporary -= absorbed;
            remaining -= absorbed;
        }

        self.current = self.current.saturating_sub(remaining).max(0);
        DamageResult {
            damage_taken: amount.max(0),
            dropped_to_zero: self.current == 0,
        }
    }

    /// Heal up to the maximum. Returns the amount actually healed.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let old = self.current;
        self.current = old
            .saturating_add(amount.max(0))
            .min(self.maximum)
            .max(old);
        self.current.saturating_sub(old)
    }

    pub fn restore_full(&mut self) {
        self.current = self.maximum;
        self.temporary = 0;
    }
}

impl Default for HitPoints {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Result of taking damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageResult {
    pub damage_taken: i32,
    pub dropped_to_zero: bool,
}

/// Editable hit point fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HpField {
    Current,
    Maximum,
    Temporary,
}

/// Which death save counter to adjust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathSaveKind {
    Success,
    Failure,
}

/// Informational outcome of the death save counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathSaveStatus {
    Rolling,
    Stabilized,
    Dead,
}

/// Death saving throws.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathSaves {
    pub successes: u8,
    pub failures: u8,
}

impl DeathSaves {
    /// Move one counter by `delta`, clamped to `0..=3`. Returns true if it changed.
    pub fn adjust(&mut self, kind: DeathSaveKind, delta: i32) -> bool {
        let counter = match kind {
            DeathSaveKind::Success => &mut self.successes,
            DeathSaveKind::Failure => &mut self.failures,
        };
        let next = (*counter as i32)
            .saturating_add(delta)
            .clamp(0, tables::MAX_DEATH_SAVES as i32) as u8;
        let changed = next != *counter;
        *counter = next;
        changed
    }

    pub fn reset(&mut self) {
        self.successes = 0;
        self.failures = 0;
    }

    pub fn status(&self) -> DeathSaveStatus {
        if self.failures >= tables::MAX_DEATH_SAVES {
            DeathSaveStatus::Dead
        } else if self.successes >= tables::MAX_DEATH_SAVES {
            DeathSaveStatus::Stabilized
        } else {
            DeathSaveStatus::Rolling
        }
    }
}

// ============================================================================
// Spell Slots
// ============================================================================

/// Key of a spell slot pool: a standard spell level or the pact slot at its level.
///
/// Serialized as `"3"` or `"pact-3"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SlotKey {
    Standard(u8),
    Pact(u8),
}

impl SlotKey {
    pub fn level(&self) -> u8 {
        match self {
            SlotKey::Standard(level) | SlotKey::Pact(level) => *level,
        }
    }

    pub fn is_pact(&self) -> bool {
        matches!(self, SlotKey::Pact(_))
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKey::Standard(level) => write!(f, "{level}"),
            SlotKey::Pact(level) => write!(f, "{}{level}", tables::PACT_KEY_PREFIX),
        }
    }
}

/// Error returned when a slot key string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid spell slot key: {0}")]
pub struct InvalidSlotKey(pub String);

impl FromStr for SlotKey {
    type Err = InvalidSlotKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidSlotKey(s.to_string());
        match s.strip_prefix(tables::PACT_KEY_PREFIX) {
            Some(level) => level.parse().map(SlotKey::Pact).map_err(|_| invalid()),
            None => s.parse().map(SlotKey::Standard).map_err(|_| invalid()),
        }
    }
}

impl TryFrom<String> for SlotKey {
    type Error = InvalidSlotKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotKey> for String {
    fn from(key: SlotKey) -> Self {
        key.to_string()
    }
}

/// Usage of one spell slot pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSlot {
    pub used: u32,
    pub max: u32,
    pub level: u8,
    pub is_pact: bool,
}

impl SpellSlot {
    pub fn available(&self) -> u32 {
        self.max.saturating_sub(self.used)
    }
}

// ============================================================================
// Resources and Skills
// ============================================================================

/// A resource instance derived from a class template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassResource {
    pub name: String,
    pub linked_ability: Ability,
    pub max: u32,
    pub used: u32,
    pub short_rest: bool,
    pub is_pool: bool,
    pub source_class: CharacterClass,
}

impl ClassResource {
    /// Identity used to carry usage across re-derivation.
    pub fn identity(&self) -> (CharacterClass, &str) {
        (self.source_class, self.name.as_str())
    }
}

/// Display color for custom resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceColor {
    Red,
    Orange,
    Yellow,
    Green,
    #[default]
    Cyan,
    Blue,
    Purple,
    Fuchsia,
    Pink,
    Gray,
}

impl ResourceColor {
    pub fn name(&self) -> &'static str {
        match self {
            ResourceColor::Red => "red",
            ResourceColor::Orange => "orange",
            ResourceColor::Yellow => "yellow",
            ResourceColor::Green => "green",
            ResourceColor::Cyan => "cyan",
            ResourceColor::Blue => "blue",
            ResourceColor::Purple => "purple",
            ResourceColor::Fuchsia => "fuchsia",
            ResourceColor::Pink => "pink",
            ResourceColor::Gray => "gray",
        }
    }

    pub fn all() -> &'static [ResourceColor] {
        &[
            ResourceColor::Red,
            ResourceColor::Orange,
            ResourceColor::Yellow,
            ResourceColor::Green,
            ResourceColor::Cyan,
            ResourceColor::Blue,
            ResourceColor::Purple,
            ResourceColor::Fuchsia,
            ResourceColor::Pink,
            ResourceColor::Gray,
        ]
    }

    /// Look up a palette color by id, falling back to cyan.
    pub fn from_id(id: &str) -> Self {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(id.trim()))
            .unwrap_or_default()
    }
}

/// A user-authored resource with a directly chosen maximum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomResource {
    pub name: String,
    pub max: u32,
    pub used: u32,
    #[serde(default)]
    pub color: ResourceColor,
    pub short_rest: bool,
    pub is_pool: bool,
}

/// A named action that spends units of a linked resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    /// `None` once the linked resource has been removed.
    pub linked_resource: Option<ResourceRef>,
    pub cost: u32,
}

// ============================================================================
// Character
// ============================================================================

/// Complete player character record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    #[serde(default)]
    pub linked_to_party: bool,
    pub name: String,
    pub origin: String,

    // Class composition
    pub classes: Vec<ClassLevel>,
    pub level: u8,
    pub proficiency_bonus: u8,

    // Core stats
    pub abilities: AbilityScores,
    #[serde(default)]
    pub saving_throw_proficiencies: HashSet<Ability>,

    // Health
    pub hit_points: HitPoints,
    #[serde(default)]
    pub death_saves: DeathSaves,

    // Combat
    pub armor_class: i32,
    pub initiative: i32,
    pub speed: u32,

    // Resources
    #[serde(default)]
    pub spell_slots: BTreeMap<SlotKey, SpellSlot>,
    #[serde(default)]
    pub class_resources: Vec<ClassResource>,
    #[serde(default)]
    pub custom_resources: Vec<CustomResource>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub features: Vec<Feature>,

    // Free text
    #[serde(default)]
    pub proficiencies: String,
    #[serde(default)]
    pub languages: String,
    #[serde(default)]
    pub notes: String,
}

impl Character {
    pub const DEFAULT_NAME: &'static str = "New Operative";
    pub const DEFAULT_ORIGIN: &'static str = "Lifer";

    /// A fresh level-1 Fighter with default scores. Derived resources are
    /// empty until the reconciler runs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CharacterId::new(),
            linked_to_party: false,
            name: name.into(),
            origin: Self::DEFAULT_ORIGIN.to_string(),
            classes: vec![ClassLevel::new(CharacterClass::Fighter, 1)],
            level: 1,
            proficiency_bonus: tables::proficiency_bonus(1),
            abilities: AbilityScores::default(),
            saving_throw_proficiencies: HashSet::new(),
            hit_points: HitPoints::default(),
            death_saves: DeathSaves::default(),
            armor_class: 10,
            initiative: 0,
            speed: 30,
            spell_slots: BTreeMap::new(),
            class_resources: Vec::new(),
            custom_resources: Vec::new(),
            skills: Vec::new(),
            features: Vec::new(),
            proficiencies: String::new(),
            languages: "Common".to_string(),
            notes: String::new(),
        }
    }

    /// Sum of all class levels.
    pub fn total_level(&self) -> u32 {
        self.classes.iter().map(|c| c.level as u32).sum()
    }

    /// The single pact slot pool, whatever level it is keyed at.
    pub fn pact_slot(&self) -> Option<(SlotKey, &SpellSlot)> {
        self.spell_slots
            .iter()
            .find(|(key, _)| key.is_pact())
            .map(|(key, slot)| (*key, slot))
    }

    pub fn pact_slot_mut(&mut self) -> Option<&mut SpellSlot> {
        self.spell_slots
            .iter_mut()
            .find(|(key, _)| key.is_pact())
            .map(|(_, slot)| slot)
    }

    pub fn has_saving_throw(&self, ability: Ability) -> bool {
        self.saving_throw_proficiencies.contains(&ability)
    }

    pub fn saving_throw_modifier(&self, ability: Ability) -> i32 {
        let ability_mod = self.abilities.modifier(ability);
        if self.has_saving_throw(ability) {
            ability_mod + self.proficiency_bonus as i32
        } else {
            ability_mod
        }
    }

    /// Class summary such as `Wizard 3 / Cleric 2 (Life)`.
    pub fn class_summary(&self) -> String {
        self.classes
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

impl Default for Character {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME)
    }
}
