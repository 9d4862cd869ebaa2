//! Identity directory: display attributes for participant ids.
//!
//! Only presentation code looks names up; the queue itself deals in ids.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayInfo {
    pub id: String,
    pub full_name: String,
    pub username: Option<String>,
}

impl DisplayInfo {
    pub fn new(id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            username: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

impl std::fmt::Display for DisplayInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.username {
            Some(username) => write!(f, "{} (@{})", self.full_name, username),
            None => write!(f, "{}", self.full_name),
        }
    }
}

pub trait Directory: Send + Sync {
    fn find_by_id(&self, id: &str) -> Result<DisplayInfo, Error>;
}

/// Render `id` through `directory`, falling back to the raw id.
pub fn display_name(directory: &dyn Directory, id: &str) -> String {
    directory
        .find_by_id(id)
        .map(|info| info.to_string())
        .unwrap_or_else(|_| id.to_string())
}

/// In-memory directory filled from the profiles the bot sees in incoming messages.
#[derive(Debug, Default)]
pub struct ParticipantDirectory {
    known: RwLock<HashMap<String, DisplayInfo>>,
}

impl ParticipantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remember(&self, info: DisplayInfo) {
        self.known
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(info.id.clone(), info);
    }
}

impl Directory for ParticipantDirectory {
    fn find_by_id(&self, id: &str) -> Result<DisplayInfo, Error> {
        self.known
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("participant {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remember_and_find() {
        let directory = ParticipantDirectory::new();
        directory.remember(DisplayInfo::new("1", "Ada Lovelace").with_username("ada"));

        let info = directory.find_by_id("1").unwrap();
        assert_eq!(info.full_name, "Ada Lovelace");
        assert_eq!(info.to_string(), "Ada Lovelace (@ada)");
        assert!(matches!(directory.find_by_id("2"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let directory = ParticipantDirectory::new();
        directory.remember(DisplayInfo::new("1", "Grace"));

        assert_eq!(display_name(&directory, "1"), "Grace");
        assert_eq!(display_name(&directory, "99"), "99");
    }

    #[test]
    fn test_remember_overwrites() {
        let directory = ParticipantDirectory::new();
        directory.remember(DisplayInfo::new("1", "Old"));
        directory.remember(DisplayInfo::new("1", "New"));

        assert_eq!(display_name(&directory, "1"), "New");
    }
}
