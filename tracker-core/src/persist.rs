//! Character persistence.
//!
//! The session hands every mutated character to a [`SaveSink`]. Any
//! `FnMut(&Character)` is a sink; [`spawn_autosave`] provides one that
//! writes JSON files from a background task.

use crate::world::Character;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

// ============================================================================
// Save Sink
// ============================================================================

/// Receives the full character after every change.
pub trait SaveSink {
    fn save(&mut self, character: &Character);
}

impl<F> SaveSink for F
where
    F: FnMut(&Character),
{
    fn save(&mut self, character: &Character) {
        self(character)
    }
}

/// A sink that forwards characters to the autosave task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Character>,
}

impl SaveSink for ChannelSink {
    fn save(&mut self, character: &Character) {
        if self.tx.send(character.clone()).is_err() {
            warn!(character = %character.name, "Autosave writer has stopped; change not saved");
        }
    }
}

/// Spawn a task that writes each received character to `dir`.
///
/// Must be called from within a tokio runtime. The task ends once every
/// clone of the returned sink has been dropped. Write failures are logged
/// and do not stop the task.
pub fn spawn_autosave(dir: impl Into<PathBuf>) -> (ChannelSink, JoinHandle<()>) {
    let dir = dir.into();
    let (tx, mut rx) = mpsc::unbounded_channel::<Character>();

    let handle = tokio::spawn(async move {
        if let Err(e) = fs::create_dir_all(&dir).await {
            warn!(dir = %dir.display(), error = %e, "Could not create save directory");
        }
        while let Some(character) = rx.recv().await {
            let path = character_save_path(&dir, &character.name);
            let name = character.name.clone();
            match SavedCharacter::new(character).save_json(&path).await {
                Ok(()) => debug!(character = %name, path = %path.display(), "Autosaved"),
                Err(e) => warn!(character = %name, error = %e, "Autosave failed"),
            }
        }
    });

    (ChannelSink { tx }, handle)
}

// ============================================================================
// Character Files
// ============================================================================

/// Current character save file version.
const CHARACTER_SAVE_VERSION: u32 = 1;

/// A saved character that can be resumed in a later session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedCharacter {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// RFC 3339 timestamp of the save.
    pub saved_at: String,

    pub character: Character,

    /// Quick-access metadata about the character.
    pub metadata: CharacterMetadata,
}

/// Metadata about a saved character for quick display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterMetadata {
    pub name: String,
    pub origin: String,
    /// Class summary, e.g. `Wizard 3 / Cleric 2`.
    pub classes: String,
    pub level: u8,
    pub linked_to_party: bool,
}

impl SavedCharacter {
    pub fn new(character: Character) -> Self {
        let metadata = CharacterMetadata {
            name: character.name.clone(),
            origin: character.origin.clone(),
            classes: character.class_summary(),
            level: character.level,
            linked_to_party: character.linked_to_party,
        };

        Self {
            version: CHARACTER_SAVE_VERSION,
            saved_at: chrono::Utc::now().to_rfc3339(),
            character,
            metadata,
        }
    }

    /// Write the file atomically: a sibling temp file is renamed over `path`.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_string_pretty(self)?).await?;
        fs::rename(&staging, path).await?;
        Ok(())
    }

    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let saved: Self = read_json(path.as_ref()).await?;
        check_version(saved.version)?;
        Ok(saved)
    }

    /// Read only the version and metadata of a save file.
    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<CharacterMetadata, PersistError> {
        #[derive(Deserialize)]
        struct Header {
            version: u32,
            metadata: CharacterMetadata,
        }

        let header: Header = read_json(path.as_ref()).await?;
        check_version(header.version)?;
        Ok(header.metadata)
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PersistError> {
    let content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

fn check_version(found: u32) -> Result<(), PersistError> {
    if found == CHARACTER_SAVE_VERSION {
        Ok(())
    } else {
        Err(PersistError::VersionMismatch {
            expected: CHARACTER_SAVE_VERSION,
            found,
        })
    }
}

/// Information about a character save file.
#[derive(Debug, Clone)]
pub struct CharacterSaveInfo {
    pub path: PathBuf,
    pub metadata: CharacterMetadata,
}

/// List all character save files in a directory, sorted by name.
///
/// A missing directory is created and yields an empty list. Files that
/// fail to parse are skipped.
pub async fn list_character_saves(
    dir: impl AsRef<Path>,
) -> Result<Vec<CharacterSaveInfo>, PersistError> {
    let mut saves = Vec::new();

    let dir_path = dir.as_ref();
    if !dir_path.exists() {
        fs::create_dir_all(dir_path).await?;
        return Ok(saves);
    }

    let mut entries = fs::read_dir(dir_path).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|e| e == "json") {
            match SavedCharacter::peek_metadata(&path).await {
                Ok(metadata) => saves.push(CharacterSaveInfo { path, metadata }),
                Err(e) => debug!(path = %path.display(), error = %e, "Skipping unreadable save"),
            }
        }
    }

    saves.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
    Ok(saves)
}

/// Generate a save path for a character.
pub fn character_save_path(dir: impl AsRef<Path>, name: &str) -> PathBuf {
    let sanitized = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();
    dir.as_ref().join(format!("{sanitized}.json"))
}
