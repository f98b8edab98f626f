//! PlayerSession - the primary public API for tracking a character.
//!
//! A session owns the character record, the transient round state and the
//! save sink. Every operation that changes the record hands the updated
//! record to the sink; operations that decline leave the record untouched
//! and return `false`.

use crate::config::TrackerConfig;
use crate::ledger::{self, ResourceOption, ResourceRef};
use crate::persist::SaveSink;
use crate::reconcile::{reconcile, refresh_class_resources, ClassResourcePolicy, ReconcileReport};
use crate::rest::{self, ActionType, RestSummary, RestType, RoundState};
use crate::tables;
use crate::world::{
    Ability, Character, CharacterClass, CharacterId, ClassLevel, CustomResource, DeathSaveKind,
    Feature, HpField, ResourceColor, Skill, SlotKey, SpellSlot,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Lowest and highest ability score accepted from edits.
const ABILITY_SCORE_RANGE: (i32, i32) = (1, 30);

// ============================================================================
// Setup
// ============================================================================

/// A candidate character from the party roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: CharacterId,
    pub name: String,
    pub origin: String,
    pub classes: Vec<ClassLevel>,
    /// Killed in action; hidden from selection.
    #[serde(default)]
    pub kia: bool,
}

/// Result of starting the tracker.
pub enum Startup<S> {
    Resumed(PlayerSession<S>),
    NeedsSetup(CharacterSetup<S>),
}

/// Resume a saved character as-is, or ask for setup when there is none.
pub fn start<S: SaveSink>(config: TrackerConfig, sink: S, saved: Option<Character>) -> Startup<S> {
    match saved {
        Some(character) => {
            info!(character = %character.name, "Resuming saved character");
            Startup::Resumed(PlayerSession::new(character, config, sink))
        }
        None => Startup::NeedsSetup(CharacterSetup::new(config, sink)),
    }
}

/// Character selection or creation, before a session exists.
pub struct CharacterSetup<S> {
    config: TrackerConfig,
    sink: S,
}

impl<S: SaveSink> CharacterSetup<S> {
    pub fn new(config: TrackerConfig, sink: S) -> Self {
        Self { config, sink }
    }

    /// Roster entries that can still be played.
    pub fn available_roster<'a>(&self, roster: &'a [RosterEntry]) -> Vec<&'a RosterEntry> {
        roster.iter().filter(|entry| !entry.kia).collect()
    }

    /// Seed a character from a roster entry. Only identity, name, origin and
    /// classes are copied; everything else starts at defaults.
    pub fn select_from_roster(self, entry: &RosterEntry) -> PlayerSession<S> {
        let mut character = Character::new(entry.name.clone());
        character.id = entry.id;
        character.origin = entry.origin.clone();
        character.linked_to_party = true;
        character.classes = sanitize_classes(&entry.classes, self.config.max_classes);
        info!(character = %character.name, classes = %character.class_summary(), "Selected roster character");
        self.begin(character)
    }

    /// Create a standalone character. Blank names fall back to the default.
    pub fn create_character(self, name: &str) -> PlayerSession<S> {
        let name = match name.trim() {
            "" => Character::DEFAULT_NAME,
            trimmed => trimmed,
        };
        let character = Character::new(name);
        info!(character = %character.name, "Created standalone character");
        self.begin(character)
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn begin(self, mut character: Character) -> PlayerSession<S> {
        reconcile(&mut character, &self.config);
        let mut session = PlayerSession::new(character, self.config, self.sink);
        session.persist();
        session
    }
}

fn sanitize_classes(classes: &[ClassLevel], max_classes: usize) -> Vec<ClassLevel> {
    let mut sanitized: Vec<ClassLevel> = classes
        .iter()
        .take(max_classes.max(1))
        .map(|entry| ClassLevel {
            class: entry.class,
            level: entry.level.clamp(1, tables::MAX_CLASS_LEVEL),
            subclass: entry
                .subclass
                .clone()
                .filter(|sub| entry.class.is_known_subclass(sub)),
        })
        .collect();
    if sanitized.is_empty() {
        sanitized.push(ClassLevel::new(CharacterClass::Fighter, 1));
    }
    sanitized
}

// ============================================================================
// Edit payloads
// ============================================================================

/// Fields for a new custom resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomResourceDraft {
    pub name: String,
    pub max: i64,
    pub color: ResourceColor,
    pub short_rest: bool,
    pub is_pool: bool,
}

impl CustomResourceDraft {
    pub fn new(name: impl Into<String>, max: i64) -> Self {
        Self {
            name: name.into(),
            max,
            color: ResourceColor::default(),
            short_rest: false,
            is_pool: false,
        }
    }

    pub fn with_color(mut self, color: ResourceColor) -> Self {
        self.color = color;
        self
    }

    pub fn short_rest(mut self) -> Self {
        self.short_rest = true;
        self
    }

    pub fn pool(mut self) -> Self {
        self.is_pool = true;
        self
    }
}

/// A single-field edit to a custom resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomResourceUpdate {
    Name(String),
    Max(i64),
    Color(ResourceColor),
    ShortRest(bool),
    Pool(bool),
}

// ============================================================================
// Session
// ============================================================================

/// A live tracking session for one character.
pub struct PlayerSession<S> {
    character: Character,
    round: RoundState,
    config: TrackerConfig,
    sink: S,
}

impl<S: SaveSink> PlayerSession<S> {
    /// Wrap an existing record without reconciling it.
    pub fn new(character: Character, config: TrackerConfig, sink: S) -> Self {
        Self {
            character,
            round: RoundState::default(),
            config,
            sink,
        }
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Drop the current character and return to setup.
    pub fn switch_character(self) -> CharacterSetup<S> {
        info!(character = %self.character.name, "Leaving character");
        CharacterSetup::new(self.config, self.sink)
    }

    /// End the session, handing back the final record.
    pub fn exit(self) -> Character {
        self.character
    }

    fn persist(&mut self) {
        self.sink.save(&self.character);
    }

    fn commit(&mut self, changed: bool) -> bool {
        if changed {
            self.persist();
        }
        changed
    }

    fn restructure(&mut self) -> ReconcileReport {
        let report = reconcile(&mut self.character, &self.config);
        self.persist();
        report
    }

    // ---- Class management --------------------------------------------------

    pub fn set_class_level(&mut self, index: usize, level: u8) -> bool {
        let level = level.clamp(1, tables::MAX_CLASS_LEVEL);
        let Some(entry) = self.character.classes.get_mut(index) else {
            return false;
        };
        if entry.level == level {
            return false;
        }
        entry.level = level;
        debug!(index, level, "Class level changed");
        self.restructure();
        true
    }

    /// Change the class of an entry. The subclass is cleared.
    pub fn set_class(&mut self, index: usize, class: CharacterClass) -> bool {
        let Some(entry) = self.character.classes.get_mut(index) else {
            return false;
        };
        if entry.class == class {
            return false;
        }
        entry.class = class;
        entry.subclass = None;
        debug!(index, %class, "Class changed");
        self.restructure();
        true
    }

    /// Set or clear a subclass. Unknown subclasses for the class are refused.
    pub fn set_subclass(&mut self, index: usize, subclass: Option<&str>) -> bool {
        let Some(entry) = self.character.classes.get_mut(index) else {
            return false;
        };
        if let Some(sub) = subclass {
            if !entry.class.is_known_subclass(sub) {
                return false;
            }
        }
        if entry.subclass.as_deref() == subclass {
            return false;
        }
        entry.subclass = subclass.map(str::to_string);
        self.restructure();
        true
    }

    /// Add a level-1 Fighter entry, unless the multiclass cap is reached.
    pub fn add_class(&mut self) -> bool {
        if self.character.classes.len() >= self.config.max_classes {
            return false;
        }
        self.character
            .classes
            .push(ClassLevel::new(CharacterClass::Fighter, 1));
        self.restructure();
        true
    }

    /// Remove a class entry. The last remaining class cannot be removed.
    pub fn remove_class(&mut self, index: usize) -> bool {
        if self.character.classes.len() <= 1 || index >= self.character.classes.len() {
            return false;
        }
        self.character.classes.remove(index);
        self.restructure();
        true
    }

    // ---- Abilities and sheet fields ----------------------------------------

    /// Set an ability score (clamped to 1..=30) and refresh class resource maxima.
    ///
    /// Not a class-structure change: usage is kept (clamped) under every policy.
    pub fn set_ability(&mut self, ability: Ability, score: i32) -> bool {
        let score = score.clamp(ABILITY_SCORE_RANGE.0, ABILITY_SCORE_RANGE.1);
        if self.character.abilities.get(ability) == score {
            return false;
        }
        self.character.abilities.set(ability, score);
        refresh_class_resources(&mut self.character, ClassResourcePolicy::PreserveByIdentity);
        self.commit(true)
    }

    /// Like [`Self::set_ability`] for raw text; non-numeric input becomes 10.
    pub fn set_ability_from_input(&mut self, ability: Ability, input: &str) -> bool {
        let score = input.trim().parse().unwrap_or(10);
        self.set_ability(ability, score)
    }

    pub fn toggle_saving_throw(&mut self, ability: Ability) -> bool {
        let throws = &mut self.character.saving_throw_proficiencies;
        if !throws.remove(&ability) {
            throws.insert(ability);
        }
        self.commit(true)
    }

    /// Set one hit point field from raw text; non-numeric input becomes 0.
    pub fn set_hp_field(&mut self, field: HpField, input: &str) -> bool {
        let value = input.trim().parse().unwrap_or(0);
        self.set_hp_value(field, value)
    }

    /// Set one hit point field. Maximum is at least 1, current stays within
    /// `[0, max]` and temporary is never negative.
    pub fn set_hp_value(&mut self, field: HpField, value: i32) -> bool {
        let before = self.character.hit_points.clone();
        let hp = &mut self.character.hit_points;
        match field {
            HpField::Current => hp.current = value.max(0).min(hp.maximum.max(0)),
            HpField::Maximum => {
                hp.maximum = value.max(1);
                hp.current = hp.current.min(hp.maximum);
            }
            HpField::Temporary => hp.temporary = value.max(0),
        }
        let changed = self.character.hit_points != before;
        self.commit(changed)
    }

    pub fn apply_damage(&mut self, amount: i32) -> bool {
        if amount <= 0 {
            return false;
        }
        let result = self.character.hit_points.take_damage(amount);
        if result.dropped_to_zero {
            info!(character = %self.character.name, "Dropped to 0 HP");
        }
        self.commit(true)
    }

    pub fn apply_healing(&mut self, amount: i32) -> bool {
        if amount <= 0 {
            return false;
        }
        let healed = self.character.hit_points.heal(amount);
        self.commit(healed > 0)
    }

    pub fn adjust_death_save(&mut self, kind: DeathSaveKind, delta: i32) -> bool {
        let changed = self.character.death_saves.adjust(kind, delta);
        self.commit(changed)
    }

    pub fn reset_death_saves(&mut self) -> bool {
        let saves = &self.character.death_saves;
        if saves.successes == 0 && saves.failures == 0 {
            return false;
        }
        self.character.death_saves.reset();
        self.commit(true)
    }

    pub fn set_name(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || name == self.character.name {
            return false;
        }
        self.character.name = name.to_string();
        self.commit(true)
    }

    pub fn set_origin(&mut self, origin: &str) -> bool {
        if origin == self.character.origin {
            return false;
        }
        self.character.origin = origin.to_string();
        self.commit(true)
    }

    pub fn set_armor_class(&mut self, ac: i32) -> bool {
        let changed = std::mem::replace(&mut self.character.armor_class, ac) != ac;
        self.commit(changed)
    }

    pub fn set_initiative(&mut self, initiative: i32) -> bool {
        let changed = std::mem::replace(&mut self.character.initiative, initiative) != initiative;
        self.commit(changed)
    }

    pub fn set_speed(&mut self, speed: u32) -> bool {
        let changed = std::mem::replace(&mut self.character.speed, speed) != speed;
        self.commit(changed)
    }

    pub fn set_notes(&mut self, notes: &str) -> bool {
        let changed = self.character.notes != notes;
        self.character.notes = notes.to_string();
        self.commit(changed)
    }

    pub fn set_proficiencies(&mut self, proficiencies: &str) -> bool {
        let changed = self.character.proficiencies != proficiencies;
        self.character.proficiencies = proficiencies.to_string();
        self.commit(changed)
    }

    pub fn set_languages(&mut self, languages: &str) -> bool {
        let changed = self.character.languages != languages;
        self.character.languages = languages.to_string();
        self.commit(changed)
    }

    pub fn add_feature(&mut self, name: &str, description: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.character.features.push(Feature {
            name: name.to_string(),
            description: description.trim().to_string(),
        });
        self.commit(true)
    }

    pub fn remove_feature(&mut self, index: usize) -> bool {
        if index >= self.character.features.len() {
            return false;
        }
        self.character.features.remove(index);
        self.commit(true)
    }

    // ---- Manual spell slot configuration -----------------------------------

    /// Set a slot's maximum. Zero or less removes the slot; otherwise the
    /// slot is created if missing and `used` is clamped.
    ///
    /// Setting a pact key moves the existing pact pool to that key.
    pub fn set_spell_slot_max(&mut self, key: SlotKey, max: i64) -> bool {
        let slots = &mut self.character.spell_slots;
        if max <= 0 {
            let removed = slots.remove(&key).is_some();
            return self.commit(removed);
        }

        let max = u32::try_from(max).unwrap_or(u32::MAX);
        let level = key.level().clamp(1, tables::MAX_SPELL_LEVEL);
        let key = match key {
            SlotKey::Standard(_) => SlotKey::Standard(level),
            SlotKey::Pact(_) => SlotKey::Pact(level),
        };

        let existing = match key {
            SlotKey::Pact(_) => {
                let old_key = slots.keys().find(|k| k.is_pact()).copied();
                old_key.and_then(|k| slots.remove(&k))
            }
            SlotKey::Standard(_) => slots.remove(&key),
        };
        let slot = SpellSlot {
            used: existing.map_or(0, |s| s.used.min(max)),
            max,
            level,
            is_pact: key.is_pact(),
        };
        let changed = existing != Some(slot);
        slots.insert(key, slot);
        self.commit(changed)
    }

    /// Move the pact pool to another slot level (clamped to 1..=9).
    pub fn set_pact_slot_level(&mut self, level: u8) -> bool {
        let level = level.clamp(1, tables::MAX_SPELL_LEVEL);
        let Some((old_key, _)) = self.character.pact_slot() else {
            return false;
        };
        if old_key.level() == level {
            return false;
        }
        let slots = &mut self.character.spell_slots;
        let Some(mut slot) = slots.remove(&old_key) else {
            return false;
        };
        slot.level = level;
        slots.insert(SlotKey::Pact(level), slot);
        self.commit(true)
    }

    // ---- Consumption ---------------------------------------------------------

    pub fn consume(&mut self, r: ResourceRef, amount: u32) -> bool {
        let changed = ledger::consume(&mut self.character, r, amount);
        self.commit(changed)
    }

    pub fn restore(&mut self, r: ResourceRef, amount: u32) -> bool {
        let changed = ledger::restore(&mut self.character, r, amount);
        self.commit(changed)
    }

    pub fn use_spell_slot(&mut self, level: u8) -> bool {
        self.consume(ResourceRef::SpellSlot(level), 1)
    }

    pub fn restore_spell_slot(&mut self, level: u8) -> bool {
        self.restore(ResourceRef::SpellSlot(level), 1)
    }

    pub fn use_pact_slot(&mut self) -> bool {
        self.consume(ResourceRef::Pact, 1)
    }

    pub fn restore_pact_slot(&mut self) -> bool {
        self.restore(ResourceRef::Pact, 1)
    }

    pub fn use_class_resource(&mut self, index: usize) -> bool {
        self.consume(ResourceRef::Class(index), 1)
    }

    pub fn restore_class_resource(&mut self, index: usize) -> bool {
        self.restore(ResourceRef::Class(index), 1)
    }

    pub fn use_custom_resource(&mut self, index: usize) -> bool {
        self.consume(ResourceRef::Custom(index), 1)
    }

    pub fn restore_custom_resource(&mut self, index: usize) -> bool {
        self.restore(ResourceRef::Custom(index), 1)
    }

    pub fn set_pool_remaining(&mut self, r: ResourceRef, value: i64) -> bool {
        let changed = ledger::set_pool_remaining(&mut self.character, r, value);
        self.commit(changed)
    }

    pub fn use_skill(&mut self, index: usize) -> bool {
        let changed = ledger::use_skill(&mut self.character, index);
        self.commit(changed)
    }

    pub fn is_skill_available(&self, index: usize) -> bool {
        self.character
            .skills
            .get(index)
            .is_some_and(|skill| ledger::is_skill_available(&self.character, skill))
    }

    // ---- Custom resources ----------------------------------------------------

    pub fn add_custom_resource(&mut self, draft: CustomResourceDraft) -> bool {
        let name = draft.name.trim();
        if name.is_empty() {
            return false;
        }
        self.character.custom_resources.push(CustomResource {
            name: name.to_string(),
            max: clamp_count(draft.max),
            used: 0,
            color: draft.color,
            short_rest: draft.short_rest,
            is_pool: draft.is_pool,
        });
        self.commit(true)
    }

    /// Remove a custom resource. Skills linked to it lose their link; links
    /// to later custom resources shift down with them.
    pub fn remove_custom_resource(&mut self, index: usize) -> bool {
        if index >= self.character.custom_resources.len() {
            return false;
        }
        self.character.custom_resources.remove(index);
        for skill in &mut self.character.skills {
            if let Some(ResourceRef::Custom(linked)) = skill.linked_resource {
                skill.linked_resource = match linked.cmp(&index) {
                    std::cmp::Ordering::Less => Some(ResourceRef::Custom(linked)),
                    std::cmp::Ordering::Equal => None,
                    std::cmp::Ordering::Greater => Some(ResourceRef::Custom(linked - 1)),
                };
            }
        }
        self.commit(true)
    }

    pub fn update_custom_resource(&mut self, index: usize, update: CustomResourceUpdate) -> bool {
        let Some(res) = self.character.custom_resources.get_mut(index) else {
            return false;
        };
        let before = res.clone();
        match update {
            CustomResourceUpdate::Name(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return false;
                }
                res.name = name.to_string();
            }
            CustomResourceUpdate::Max(max) => {
                res.max = clamp_count(max);
                res.used = res.used.min(res.max);
            }
            CustomResourceUpdate::Color(color) => res.color = color,
            CustomResourceUpdate::ShortRest(flag) => res.short_rest = flag,
            CustomResourceUpdate::Pool(flag) => res.is_pool = flag,
        }
        let changed = *res != before;
        self.commit(changed)
    }

    // ---- Skills --------------------------------------------------------------

    pub fn add_skill(&mut self, name: &str, linked_resource: Option<ResourceRef>, cost: i64) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.character.skills.push(Skill {
            name: name.to_string(),
            linked_resource,
            cost: clamp_count(cost),
        });
        self.commit(true)
    }

    pub fn remove_skill(&mut self, index: usize) -> bool {
        if index >= self.character.skills.len() {
            return false;
        }
        self.character.skills.remove(index);
        self.commit(true)
    }

    pub fn relink_skill(&mut self, index: usize, linked_resource: Option<ResourceRef>) -> bool {
        let Some(skill) = self.character.skills.get_mut(index) else {
            return false;
        };
        let changed = skill.linked_resource != linked_resource;
        skill.linked_resource = linked_resource;
        self.commit(changed)
    }

    pub fn available_resources(&self) -> Vec<ResourceOption> {
        ledger::available_resources(&self.character)
    }

    /// Label of the resource a skill consumes, if it still resolves.
    pub fn skill_resource_label(&self, index: usize) -> Option<String> {
        let skill = self.character.skills.get(index)?;
        ledger::resource_label(&self.character, skill.linked_resource?)
    }

    // ---- Round state -----------------------------------------------------------

    /// Flip an action between available and spent. Returns the new availability.
    pub fn toggle_action(&mut self, action: ActionType) -> bool {
        self.round.actions.toggle(action)
    }

    pub fn new_round(&mut self) {
        self.round.new_round();
    }

    pub fn set_concentration(&mut self, spell: &str) -> bool {
        self.round.set_concentration(spell)
    }

    pub fn drop_concentration(&mut self) -> bool {
        self.round.drop_concentration()
    }

    // ---- Rests -----------------------------------------------------------------

    /// Take a rest of either kind. Always saved.
    pub fn rest(&mut self, rest_type: RestType) -> RestSummary {
        let summary = rest::take_rest(&mut self.character, &mut self.round, rest_type);
        self.persist();
        summary
    }

    pub fn short_rest(&mut self) -> RestSummary {
        self.rest(RestType::Short)
    }

    pub fn long_rest(&mut self) -> RestSummary {
        self.rest(RestType::Long)
    }
}

/// Coerce a user-entered count to at least 1.
fn clamp_count(value: i64) -> u32 {
    value.clamp(1, u32::MAX as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{recording_session as session, sample_wizard, RecordingSink};
    use crate::world::DeathSaveStatus;

    fn roster() -> Vec<RosterEntry> {
        vec![
            RosterEntry {
                id: CharacterId::new(),
                name: "Kessa".into(),
                origin: "Hiver".into(),
                classes: vec![
                    ClassLevel::new(CharacterClass::Cleric, 3).with_subclass("Life"),
                    ClassLevel::new(CharacterClass::Warlock, 2),
                ],
                kia: false,
            },
            RosterEntry {
                id: CharacterId::new(),
                name: "Old Tom".into(),
                origin: "Lifer".into(),
                classes: vec![ClassLevel::new(CharacterClass::Fighter, 5)],
                kia: true,
            },
        ]
    }

    #[test]
    fn test_start_resumes_saved_record_as_is() {
        let mut saved = sample_wizard("Ilsa", 5);
        saved.spell_slots.clear();
        match start(TrackerConfig::default(), RecordingSink::default(), Some(saved.clone())) {
            Startup::Resumed(session) => {
                assert_eq!(session.character(), &saved);
                assert_eq!(session.sink().count(), 0);
            }
            Startup::NeedsSetup(_) => panic!("expected a resumed session"),
        }
    }

    #[test]
    fn test_select_from_roster() {
        let roster = roster();
        let Startup::NeedsSetup(setup) = start(TrackerConfig::default(), RecordingSink::default(), None)
        else {
            panic!("expected setup");
        };

        let available = setup.available_roster(&roster);
        assert_eq!(available.len(), 1);

        let session = setup.select_from_roster(available[0]);
        let character = session.character();
        assert_eq!(character.id, roster[0].id);
        assert_eq!(character.origin, "Hiver");
        assert!(character.linked_to_party);
        assert_eq!(character.level, 5);
        assert_eq!(character.proficiency_bonus, 3);
        assert_eq!(character.pact_slot().map(|(k, _)| k), Some(SlotKey::Pact(1)));
        assert!(character.spell_slots.contains_key(&SlotKey::Standard(2)));
        assert_eq!(character.abilities.strength, 10);
        assert_eq!(session.sink().count(), 1);
    }

    #[test]
    fn test_roster_classes_are_sanitized() {
        let entry = RosterEntry {
            id: CharacterId::new(),
            name: "Odd".into(),
            origin: "Modder".into(),
            classes: vec![
                ClassLevel {
                    class: CharacterClass::Rogue,
                    level: 0,
                    subclass: Some("Moon".into()),
                },
                ClassLevel::new(CharacterClass::Bard, 2),
                ClassLevel::new(CharacterClass::Monk, 2),
            ],
            kia: false,
        };
        let setup = CharacterSetup::new(TrackerConfig::default(), RecordingSink::default());
        let session = setup.select_from_roster(&entry);
        let classes = &session.character().classes;
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].level, 1);
        assert_eq!(classes[0].subclass, None);
    }

    #[test]
    fn test_create_character_defaults() {
        let setup = CharacterSetup::new(TrackerConfig::default(), RecordingSink::default());
        let session = setup.create_character("   ");
        let character = session.character();
        assert_eq!(character.name, "New Operative");
        assert!(!character.linked_to_party);
        // Fighter 1 gets Second Wind once reconciled
        assert_eq!(character.class_resources.len(), 1);
        assert_eq!(session.sink().count(), 1);
    }

    #[test]
    fn test_switch_character_keeps_sink() {
        let setup = CharacterSetup::new(TrackerConfig::default(), RecordingSink::default());
        let mut session = setup.create_character("First");
        session.apply_damage(3);
        let setup = session.switch_character();
        let session = setup.create_character("Second");
        let names: Vec<&str> = session.sink().saves().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["First", "First", "Second"]);
    }

    #[test]
    fn test_class_management() {
        let mut session = session(sample_wizard("Ilsa", 5));

        assert!(session.add_class());
        assert!(!session.add_class());
        assert_eq!(session.character().level, 6);

        assert!(session.set_class(1, CharacterClass::Cleric));
        assert!(!session.set_class(1, CharacterClass::Cleric));
        assert!(session.set_subclass(1, Some("Life")));
        assert!(!session.set_subclass(1, Some("Evocation")));
        assert!(session.set_class(1, CharacterClass::Warlock));
        assert_eq!(session.character().classes[1].subclass, None);
        assert!(session.character().pact_slot().is_some());

        assert!(session.set_class_level(0, 25));
        assert_eq!(session.character().classes[0].level, 20);
        assert!(!session.set_class_level(5, 3));

        assert!(session.remove_class(1));
        assert!(!session.remove_class(0));
        assert!(session.character().pact_slot().is_none());
        assert_eq!(session.character().proficiency_bonus, 6);
    }

    #[test]
    fn test_every_change_is_saved() {
        let mut session = session(sample_wizard("Ilsa", 5));
        assert!(session.use_spell_slot(3));
        assert!(session.use_spell_slot(3));
        assert!(!session.use_spell_slot(3));
        assert!(!session.restore_pact_slot());
        assert_eq!(session.sink().count(), 2);
        assert_eq!(session.sink().last().unwrap().spell_slots[&SlotKey::Standard(3)].used, 2);
    }

    #[test]
    fn test_ability_input_and_resource_refresh() {
        let mut character = sample_wizard("Ilsa", 1);
        character.classes[0] = ClassLevel::new(CharacterClass::Bard, 1);
        let mut session = session(character);
        session.set_class_level(0, 2);
        assert_eq!(session.character().class_resources[0].max, 1);

        assert!(session.set_ability(Ability::Charisma, 18));
        assert_eq!(session.character().class_resources[0].max, 4);
        session.consume(ResourceRef::Class(0), 4);

        assert!(session.set_ability_from_input(Ability::Charisma, "fourteen"));
        assert_eq!(session.character().abilities.charisma, 10);
        let inspiration = &session.character().class_resources[0];
        assert_eq!((inspiration.used, inspiration.max), (1, 1));
    }

    #[test]
    fn test_hp_fields() {
        let mut session = session(sample_wizard("Ilsa", 1));
        assert!(session.set_hp_field(HpField::Maximum, "24"));
        assert!(session.set_hp_field(HpField::Current, "30"));
        assert_eq!(session.character().hit_points.current, 24);
        assert!(!session.set_hp_field(HpField::Temporary, "-3"));
        assert_eq!(session.character().hit_points.temporary, 0);
        assert!(session.set_hp_field(HpField::Maximum, "abc"));
        assert_eq!(session.character().hit_points.maximum, 1);
        assert_eq!(session.character().hit_points.current, 1);
    }

    #[test]
    fn test_damage_and_healing() {
        let mut session = session(sample_wizard("Ilsa", 1));
        session.set_hp_value(HpField::Maximum, 20);
        session.set_hp_value(HpField::Current, 20);
        session.set_hp_value(HpField::Temporary, 5);

        assert!(!session.apply_damage(0));
        assert!(!session.apply_damage(-4));
        assert!(session.apply_damage(8));
        let hp = &session.character().hit_points;
        assert_eq!((hp.current, hp.temporary), (17, 0));

        assert!(session.apply_healing(10));
        assert_eq!(session.character().hit_points.current, 20);
        assert!(!session.apply_healing(5));
    }

    #[test]
    fn test_extreme_numeric_input() {
        let mut character = sample_wizard("Ilsa", 3);
        character.classes[0] = ClassLevel::new(CharacterClass::Paladin, 3);
        let mut session = session(character);
        session.set_class_level(0, 4);

        assert!(session.set_pool_remaining(ResourceRef::Class(0), i64::MIN));
        assert_eq!(session.character().class_resources[0].used, 20);

        session.set_hp_value(HpField::Current, 1);
        assert!(session.apply_healing(i32::MAX));
        let hp = &session.character().hit_points;
        assert_eq!(hp.current, hp.maximum);

        assert!(session.adjust_death_save(DeathSaveKind::Success, i32::MAX));
        assert_eq!(session.character().death_saves.successes, 3);
        assert!(!session.set_spell_slot_max(SlotKey::Standard(9), i64::MIN));
    }

    #[test]
    fn test_resumed_record_with_negative_maximum() {
        let mut saved = sample_wizard("Ilsa", 1);
        saved.hit_points.maximum = -4;
        let Startup::Resumed(mut session) =
            start(TrackerConfig::default(), RecordingSink::default(), Some(saved))
        else {
            panic!("expected a resumed session");
        };
        session.set_hp_value(HpField::Current, 7);
        assert_eq!(session.character().hit_points.current, 0);
    }

    #[test]
    fn test_death_saves() {
        let mut session = session(sample_wizard("Ilsa", 1));
        assert!(!session.reset_death_saves());
        for _ in 0..4 {
            session.adjust_death_save(DeathSaveKind::Failure, 1);
        }
        assert_eq!(session.character().death_saves.failures, 3);
        assert_eq!(session.character().death_saves.status(), DeathSaveStatus::Dead);
        assert!(session.reset_death_saves());
    }

    #[test]
    fn test_manual_spell_slots() {
        let mut session = session(sample_wizard("Ilsa", 5));
        session.use_spell_slot(2);
        session.use_spell_slot(2);

        assert!(session.set_spell_slot_max(SlotKey::Standard(2), 1));
        let slot = session.character().spell_slots[&SlotKey::Standard(2)];
        assert_eq!((slot.used, slot.max), (1, 1));

        assert!(session.set_spell_slot_max(SlotKey::Standard(6), 1));
        assert!(session.set_spell_slot_max(SlotKey::Standard(3), 0));
        assert!(!session.set_spell_slot_max(SlotKey::Standard(3), -2));
        assert!(!session.character().spell_slots.contains_key(&SlotKey::Standard(3)));

        assert!(!session.set_pact_slot_level(3));
        assert!(session.set_spell_slot_max(SlotKey::Pact(1), 2));
        session.use_pact_slot();
        assert!(session.set_pact_slot_level(12));
        let (key, slot) = session.character().pact_slot().unwrap();
        assert_eq!(key, SlotKey::Pact(9));
        assert_eq!((slot.used, slot.max, slot.level), (1, 2, 9));
    }

    #[test]
    fn test_custom_resources_and_skill_links() {
        let mut session = session(sample_wizard("Ilsa", 1));
        assert!(!session.add_custom_resource(CustomResourceDraft::new("  ", 3)));
        assert!(session.add_custom_resource(CustomResourceDraft::new("Luck", 3)));
        assert!(session.add_custom_resource(CustomResourceDraft::new("Grit", -1).short_rest()));
        assert!(session.add_custom_resource(
            CustomResourceDraft::new("Charges", 7).with_color(ResourceColor::Purple)
        ));
        assert_eq!(session.character().custom_resources[1].max, 1);
        assert_eq!(session.character().custom_resources[0].color, ResourceColor::Cyan);

        session.add_skill("Lucky Break", Some(ResourceRef::Custom(0)), 1);
        session.add_skill("Dig In", Some(ResourceRef::Custom(1)), 0);
        session.add_skill("Zap", Some(ResourceRef::Custom(2)), 2);
        assert_eq!(session.character().skills[1].cost, 1);

        assert!(session.remove_custom_resource(1));
        let links: Vec<Option<ResourceRef>> = session
            .character()
            .skills
            .iter()
            .map(|s| s.linked_resource)
            .collect();
        assert_eq!(
            links,
            vec![Some(ResourceRef::Custom(0)), None, Some(ResourceRef::Custom(1))]
        );
        assert_eq!(session.skill_resource_label(2).as_deref(), Some("Charges"));
        assert_eq!(session.skill_resource_label(1), None);
        assert!(!session.is_skill_available(1));

        assert!(session.use_skill(2));
        assert!(session.update_custom_resource(1, CustomResourceUpdate::Max(1)));
        assert_eq!(session.character().custom_resources[1].used, 1);
        assert!(!session.update_custom_resource(1, CustomResourceUpdate::Name(" ".into())));
        assert!(session.update_custom_resource(1, CustomResourceUpdate::Pool(true)));
        assert!(session.set_pool_remaining(ResourceRef::Custom(1), 1));
        assert_eq!(session.character().custom_resources[1].used, 0);

        assert!(session.relink_skill(1, Some(ResourceRef::SpellSlot(1))));
        assert!(session.is_skill_available(1));
        assert!(session.remove_skill(0));
        assert_eq!(session.character().skills.len(), 2);
    }

    #[test]
    fn test_rests_through_session() {
        let mut session = session(sample_wizard("Ilsa", 3));
        session.use_spell_slot(1);
        session.toggle_action(ActionType::Action);
        session.set_concentration("Web");

        session.short_rest();
        assert_eq!(session.character().spell_slots[&SlotKey::Standard(1)].used, 1);
        assert!(session.round().actions.is_available(ActionType::Action));
        assert!(session.round().concentration.is_some());

        let saves_before = session.sink().count();
        let summary = session.rest(RestType::Long);
        assert_eq!(summary.rest_type, RestType::Long);
        assert_eq!(session.character().spell_slots[&SlotKey::Standard(1)].used, 0);
        assert_eq!(session.round().concentration, None);
        assert_eq!(session.sink().count(), saves_before + 1);
    }

    #[test]
    fn test_round_state_is_not_saved() {
        let mut session = session(sample_wizard("Ilsa", 3));
        session.toggle_action(ActionType::Bonus);
        session.set_concentration("Shield");
        session.drop_concentration();
        session.new_round();
        assert_eq!(session.sink().count(), 0);
    }
}
