//! Data models for pastesync
//!
//! Defines the paste identifier, the paste document as served by the store,
//! and the audit history entries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors parsing a paste identifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasteIdError {
    #[error("Paste ID is empty")]
    Empty,

    #[error("Invalid paste ID '{0}': must not contain '/', '?' or whitespace")]
    Invalid(String),
}

/// Opaque identifier of a paste
///
/// The server issues five-digit numbers, but the client treats the value as
/// an opaque path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasteId(String);

impl PasteId {
    /// Parse an identifier from user input
    ///
    /// Accepts a bare id (`00001`), a path (`/00001`), the static-site query
    /// form (`view.html?00001`) or a full URL (`https://host/00001`).
    pub fn parse(input: &str) -> Result<Self, PasteIdError> {
        let input = input.trim();

        // Query form wins: view.html?00001
        let candidate = match input.split_once('?') {
            Some((_, query)) => query,
            None => {
                let without_scheme = match input.split_once("://") {
                    Some((_, rest)) => rest.split_once('/').map(|(_, p)| p).unwrap_or(""),
                    None => input,
                };
                without_scheme
                    .trim_end_matches('/')
                    .rsplit('/')
                    .next()
                    .unwrap_or("")
            }
        };

        if candidate.is_empty() {
            return Err(PasteIdError::Empty);
        }

        if candidate
            .chars()
            .any(|c| c == '/' || c == '?' || c.is_whitespace())
        {
            return Err(PasteIdError::Invalid(candidate.to_string()));
        }

        Ok(Self(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PasteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PasteId {
    type Err = PasteIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A paste as returned by `GET /api/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paste {
    /// Identifier echoed by the server (older servers omit it)
    #[serde(default)]
    pub id: Option<String>,
    /// Full text body
    pub text: String,
    /// Retired flag; a missing field means the paste is live
    #[serde(default)]
    pub deleted: bool,
}

/// Kind of change recorded in the history log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryAction {
    Create,
    Update,
    Delete,
    /// Action name this client doesn't know about
    Other(String),
}

impl HistoryAction {
    pub fn as_str(&self) -> &str {
        match self {
            HistoryAction::Create => "create",
            HistoryAction::Update => "update",
            HistoryAction::Delete => "delete",
            HistoryAction::Other(s) => s,
        }
    }
}

impl From<String> for HistoryAction {
    fn from(s: String) -> Self {
        match s.as_str() {
            "create" => HistoryAction::Create,
            "update" => HistoryAction::Update,
            "delete" => HistoryAction::Delete,
            _ => HistoryAction::Other(s),
        }
    }
}

impl From<HistoryAction> for String {
    fn from(action: HistoryAction) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HistoryAction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HistoryAction {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(HistoryAction::from)
    }
}

/// One row of the audit history (`GET /api/history`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Paste the entry refers to
    pub id: String,
    /// When the action happened
    pub timestamp: DateTime<Utc>,
    /// Address of the client that performed the action
    #[serde(default)]
    pub creator_ip: String,
    /// Paste version after the action
    #[serde(default)]
    pub version: u32,
    pub action: HistoryAction,
    /// Current retired status of the paste (not of this entry)
    #[serde(default)]
    pub deleted: bool,
    /// Free-form note attached by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl HistoryEntry {
    /// Whether the history view should offer a delete action for this row
    pub fn is_deletable(&self) -> bool {
        !self.deleted
    }

    pub fn status_label(&self) -> &'static str {
        if self.deleted {
            "Deleted"
        } else {
            "Active"
        }
    }
}
