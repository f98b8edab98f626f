//! Walk a character through a short adventuring day.
//!
//! Saves land in `TRACKER_SAVE_DIR` (default `saves/characters`). Set
//! `RUST_LOG=tracker_core=debug` to see reconciliation and autosave logs.

use tracker_core::ledger::ResourceRef;
use tracker_core::rest::ActionType;
use tracker_core::session::CustomResourceDraft;
use tracker_core::{spawn_autosave, start, CharacterClass, Startup, TrackerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    println!("=== Tracker Walkthrough ===\n");

    let config = TrackerConfig::from_env()?;
    let (sink, writer) = spawn_autosave(config.save_dir.clone());

    println!("1. Creating character...");
    let mut session = match start(config, sink, None) {
        Startup::Resumed(session) => session,
        Startup::NeedsSetup(setup) => setup.create_character("Vex"),
    };
    session.set_class(0, CharacterClass::Warlock);
    session.set_class_level(0, 3);
    session.add_class();
    session.set_class(1, CharacterClass::Wizard);
    session.set_class_level(1, 2);
    println!("   {} ({})", session.character().name, session.character().class_summary());
    print_slots(session.character());

    println!("\n2. Adding a custom resource and a skill...");
    session.add_custom_resource(CustomResourceDraft::new("Stims", 3).short_rest());
    session.add_skill("Eldritch Blast Surge", Some(ResourceRef::Pact), 1);
    for option in session.available_resources() {
        println!("   {} -> {}", option.reference, option.label);
    }

    println!("\n3. Fighting...");
    session.toggle_action(ActionType::Action);
    session.set_concentration("Hex");
    session.use_skill(0);
    session.use_spell_slot(1);
    session.use_custom_resource(0);
    session.apply_damage(9);
    let hp = &session.character().hit_points;
    println!("   HP: {}/{}", hp.current, hp.maximum);
    print_slots(session.character());

    println!("\n4. Short rest...");
    let summary = session.short_rest();
    println!("   {summary:?}");
    print_slots(session.character());

    println!("\n5. Long rest...");
    let summary = session.long_rest();
    println!("   {summary:?}");
    print_slots(session.character());

    let character = session.exit();
    writer.await?;
    println!("\n=== Saved {} ===", character.name);
    Ok(())
}

fn print_slots(character: &tracker_core::Character) {
    for (key, slot) in &character.spell_slots {
        println!("   slot {key}: {}/{}", slot.available(), slot.max);
    }
}
