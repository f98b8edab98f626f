//! Player-side character and resource tracker for D&D 5e sessions.
//!
//! This crate provides:
//! - Spell slot and class resource derivation from class composition
//! - Reconciliation of live usage when classes or abilities change
//! - A consumption ledger for slots, pact slots, custom and class resources
//! - Short and long rests, action economy, death saves
//! - Character persistence through a pluggable save sink
//!
//! # Quick Start
//!
//! ```ignore
//! use tracker_core::{start, spawn_autosave, Startup, TrackerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TrackerConfig::from_env()?;
//!     let (sink, _writer) = spawn_autosave(config.save_dir.clone());
//!
//!     let mut session = match start(config, sink, None) {
//!         Startup::Resumed(session) => session,
//!         Startup::NeedsSetup(setup) => setup.create_character("Vex"),
//!     };
//!
//!     session.set_class(0, tracker_core::CharacterClass::Wizard);
//!     session.use_spell_slot(1);
//!     session.long_rest();
//!     Ok(())
//! }
//! ```

pub mod class_data;
pub mod config;
pub mod derive;
pub mod ledger;
pub mod persist;
pub mod reconcile;
pub mod rest;
pub mod session;
pub mod tables;
pub mod testing;
pub mod world;

// Primary public API
pub use config::{ConfigError, TrackerConfig};
pub use ledger::{ParseRefError, ResourceRef};
pub use persist::{spawn_autosave, PersistError, SaveSink, SavedCharacter};
pub use reconcile::ClassResourcePolicy;
pub use rest::{ActionType, RestType, RoundState};
pub use session::{start, CharacterSetup, PlayerSession, RosterEntry, Startup};
pub use world::{Ability, Character, CharacterClass, ClassLevel, SlotKey};
