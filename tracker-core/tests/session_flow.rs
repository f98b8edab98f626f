//! End-to-end tests of a play session through the public API.
//!
//! Each test drives a `PlayerSession` the way a front end would and checks
//! both the live record and what reached the save sink.

use tracker_core::ledger::ResourceRef;
use tracker_core::rest::ActionType;
use tracker_core::session::{CustomResourceDraft, CustomResourceUpdate};
use tracker_core::testing::{recording_session, sample_fighter, RecordingSink};
use tracker_core::world::{DeathSaveKind, HpField, SlotKey};
use tracker_core::{
    start, Ability, CharacterClass, ClassLevel, ClassResourcePolicy, RosterEntry, Startup,
    TrackerConfig,
};

/// Every usage counter on the record stays within `0..=max`.
fn assert_usage_in_bounds(character: &tracker_core::Character) {
    for (key, slot) in &character.spell_slots {
        assert!(slot.used <= slot.max, "slot {key} over max");
    }
    for res in &character.class_resources {
        assert!(res.used <= res.max, "{} over max", res.name);
    }
    for res in &character.custom_resources {
        assert!(res.used <= res.max, "{} over max", res.name);
    }
}

#[test]
fn test_multiclass_warlock_session() {
    let roster = vec![RosterEntry {
        id: tracker_core::world::CharacterId::new(),
        name: "Vex".into(),
        origin: "Replicant".into(),
        classes: vec![
            ClassLevel::new(CharacterClass::Warlock, 1),
            ClassLevel::new(CharacterClass::Wizard, 4),
        ],
        kia: false,
    }];

    let Startup::NeedsSetup(setup) = start(TrackerConfig::default(), RecordingSink::default(), None)
    else {
        panic!("no saved character was supplied");
    };
    let entry = setup.available_roster(&roster)[0];
    let mut session = setup.select_from_roster(entry);

    let character = session.character();
    assert_eq!(character.spell_slots[&SlotKey::Standard(1)].max, 4);
    assert_eq!(character.spell_slots[&SlotKey::Standard(2)].max, 3);
    assert_eq!(character.pact_slot().map(|(k, s)| (k, s.max)), Some((SlotKey::Pact(1), 1)));

    // A skill bound to the pact slot keeps working after the pact level moves
    assert!(session.add_skill("Hex", Some(ResourceRef::Pact), 1));
    assert!(session.set_class_level(0, 3));
    assert_eq!(session.character().pact_slot().map(|(k, _)| k), Some(SlotKey::Pact(2)));
    assert!(session.use_skill(0));
    assert!(session.use_skill(0));
    assert!(!session.is_skill_available(0));
    assert!(!session.use_skill(0));

    session.short_rest();
    assert!(session.is_skill_available(0));
    assert_usage_in_bounds(session.character());
}

#[test]
fn test_level_up_keeps_action_surge_usage() {
    let mut session = recording_session(sample_fighter("Brant", 4));
    let surge = session
        .character()
        .class_resources
        .iter()
        .position(|r| r.name == "Action Surge")
        .expect("fighter 4 has Action Surge");

    assert!(session.use_class_resource(surge));
    assert!(session.set_class_level(0, 17));

    let res = &session.character().class_resources[surge];
    assert_eq!((res.used, res.max), (1, 2));
    assert_eq!(session.character().proficiency_bonus, 6);
}

#[test]
fn test_reset_policy_session() {
    let config = TrackerConfig::default().with_class_resource_policy(ClassResourcePolicy::ResetOnChange);
    let mut session = tracker_core::PlayerSession::new(
        sample_fighter("Brant", 4),
        config,
        RecordingSink::default(),
    );
    assert!(session.use_class_resource(0));
    assert!(session.use_class_resource(1));

    // Ability edits are not class-structure changes
    session.set_ability(Ability::Strength, 18);
    assert_eq!(session.character().class_resources[1].used, 1);

    // Second Wind's max is unchanged at 5, but a level change still clears it
    session.set_class_level(0, 5);
    assert!(session.character().class_resources.iter().all(|r| r.used == 0));
}

#[test]
fn test_long_rest_scenario() {
    let mut session = recording_session(sample_fighter("Brant", 3));
    session.set_class(0, CharacterClass::Paladin);
    session.set_hp_value(HpField::Maximum, 20);
    session.set_hp_value(HpField::Current, 1);
    session.set_hp_value(HpField::Temporary, 5);
    session.adjust_death_save(DeathSaveKind::Success, 2);
    session.adjust_death_save(DeathSaveKind::Failure, 1);

    // Paladin 3: one first-level slot pool, Lay on Hands (long rest only)
    assert!(session.use_spell_slot(1));
    assert!(session.set_pool_remaining(ResourceRef::Class(0), 4));
    session.toggle_action(ActionType::Action);
    session.set_concentration("Bless");

    session.short_rest();
    assert_eq!(session.character().class_resources[0].used, 11);
    assert_eq!(session.character().spell_slots[&SlotKey::Standard(1)].used, 1);

    session.long_rest();
    let character = session.character();
    let hp = &character.hit_points;
    assert_eq!((hp.current, hp.maximum, hp.temporary), (20, 20, 0));
    assert!(character.spell_slots.values().all(|s| s.used == 0));
    assert!(character.class_resources.iter().all(|r| r.used == 0));
    assert_eq!((character.death_saves.successes, character.death_saves.failures), (0, 0));
    assert_eq!(session.round().concentration, None);
    assert!(session.round().actions.is_available(ActionType::Action));
}

#[test]
fn test_consume_restore_round_trip() {
    let mut session = recording_session(sample_fighter("Brant", 1));
    session.add_custom_resource(CustomResourceDraft::new("Stims", 5).short_rest());
    session.consume(ResourceRef::Custom(0), 2);

    let before = session.character().custom_resources[0].used;
    assert!(session.consume(ResourceRef::Custom(0), 3));
    assert!(session.restore(ResourceRef::Custom(0), 3));
    assert_eq!(session.character().custom_resources[0].used, before);

    // Over-consuming and over-restoring are both declined without a save
    session.consume(ResourceRef::Custom(0), 3);
    let saves = session.sink().count();
    assert!(!session.consume(ResourceRef::Custom(0), 1));
    assert!(!session.restore(ResourceRef::Custom(0), 6));
    assert_eq!(session.character().custom_resources[0].used, 5);
    assert!(session.restore(ResourceRef::Custom(0), 5));
    assert!(!session.restore(ResourceRef::Custom(0), 1));
    assert_eq!(session.sink().count(), saves + 1);
}

#[test]
fn test_removed_slot_level_disables_skill() {
    let mut session = recording_session(sample_fighter("Brant", 1));
    session.set_spell_slot_max(SlotKey::Standard(2), 2);
    session.add_skill("Misty Step", Some(ResourceRef::SpellSlot(2)), 1);
    assert!(session.is_skill_available(0));

    session.set_spell_slot_max(SlotKey::Standard(2), 0);
    assert!(!session.is_skill_available(0));
    assert!(!session.use_skill(0));
    assert_eq!(session.skill_resource_label(0), None);

    session.relink_skill(0, Some(ResourceRef::Class(0)));
    assert_eq!(session.skill_resource_label(0).as_deref(), Some("Second Wind"));
}

#[test]
fn test_class_swap_clears_vanished_links() {
    let mut session = recording_session(sample_fighter("Brant", 2));
    session.add_skill("Surge", Some(ResourceRef::Class(1)), 1);
    session.add_class();
    session.set_class(1, CharacterClass::Monk);
    session.set_class_level(1, 2);

    // Fighter resources stay in front; the Surge link is untouched
    assert_eq!(session.skill_resource_label(0).as_deref(), Some("Action Surge"));

    session.set_class(0, CharacterClass::Rogue);
    assert_eq!(session.character().skills[0].linked_resource, None);
    assert_eq!(session.character().class_resources.len(), 1);
    assert_eq!(session.character().class_resources[0].name, "Ki");
}

#[test]
fn test_custom_resource_edits() {
    let mut session = recording_session(sample_fighter("Brant", 1));
    session.add_custom_resource(CustomResourceDraft::new("Ammo", 20).pool());
    session.set_pool_remaining(ResourceRef::Custom(0), 12);
    assert_eq!(session.character().custom_resources[0].used, 8);

    assert!(session.update_custom_resource(0, CustomResourceUpdate::Max(5)));
    assert_eq!(session.character().custom_resources[0].used, 5);
    assert!(session.update_custom_resource(0, CustomResourceUpdate::Name("Slugs".into())));

    let labels: Vec<String> = session.available_resources().into_iter().map(|o| o.label).collect();
    assert_eq!(labels, vec!["Slugs".to_string(), "Second Wind".to_string()]);
}

#[test]
fn test_ability_edits_from_text() {
    let mut session = recording_session(sample_fighter("Brant", 1));
    assert!(session.set_ability_from_input(Ability::Strength, " 18 "));
    assert_eq!(session.character().abilities.strength, 18);
    assert!(session.set_ability_from_input(Ability::Strength, "lots"));
    assert_eq!(session.character().abilities.strength, 10);
    assert!(session.toggle_saving_throw(Ability::Strength));
    assert_eq!(session.character().saving_throw_modifier(Ability::Strength), 2);
}

#[test]
fn test_exit_returns_final_record() {
    let mut session = recording_session(sample_fighter("Brant", 1));
    session.set_notes("Owes Kessa a favor");
    let last_saved = session.sink().last().cloned();
    let character = session.exit();
    assert_eq!(Some(character), last_saved);
}
