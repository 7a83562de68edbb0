//! Flat JSON appointment journal
//!
//! Alternate appointment log: a single JSON file holding an array of
//! booking entries, appended to on every confirmed booking when
//! configured.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::Result;

/// One journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub phone_number: String,
    pub package_name: String,
    pub time_slot: String,
    pub booking_time: String,
    pub status: String,
}

/// JSON-file appointment journal
#[derive(Debug, Clone)]
pub struct AppointmentJournal {
    path: PathBuf,
}

impl AppointmentJournal {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// All entries currently in the journal. A missing or corrupt file
    /// reads as empty.
    pub fn entries(&self) -> Vec<JournalEntry> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };

        match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Corrupt appointment journal at {:?}: {}", self.path, e);
                Vec::new()
            }
        }
    }

    /// Append an entry, rewriting the whole file
    pub fn append(&self, entry: JournalEntry) -> Result<()> {
        let mut entries = self.entries();
        entries.push(entry);

        let content = serde_json::to_string_pretty(&entries)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}
