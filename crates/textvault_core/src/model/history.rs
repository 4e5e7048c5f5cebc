//! Versioned text history.
//!
//! # Responsibility
//! - Record successive versions of a document's text as compact deltas.
//! - Serialize losslessly to the JSON text stored in `documents.history`.
//!
//! # Invariants
//! - There is always at least one version.
//! - Replaying every delta from the empty string yields `latest()`.
//! - Deltas are computed on `char` boundaries, never splitting UTF-8.

use super::now_millis;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum HistoryError {
    Json(serde_json::Error),
    /// Deltas do not replay to the recorded current text.
    Corrupt(String),
}

impl Display for HistoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "could not parse history: {err}"),
            Self::Corrupt(message) => write!(f, "corrupt history: {message}"),
        }
    }
}

impl Error for HistoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Corrupt(_) => None,
        }
    }
}

impl From<serde_json::Error> for HistoryError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Edit turning the previous version into this one.
///
/// Keeps `prefix` leading and `suffix` trailing chars of the previous text
/// and puts `insert` between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Delta {
    #[serde(rename = "t")]
    saved_at: i64,
    #[serde(rename = "p")]
    prefix: usize,
    #[serde(rename = "s")]
    suffix: usize,
    #[serde(rename = "i")]
    insert: String,
}

impl Delta {
    fn between(old: &str, new: &str, saved_at: i64) -> Self {
        let old: Vec<char> = old.chars().collect();
        let new: Vec<char> = new.chars().collect();

        let prefix = old
            .iter()
            .zip(new.iter())
            .take_while(|(a, b)| a == b)
            .count();
        let suffix = old[prefix..]
            .iter()
            .rev()
            .zip(new[prefix..].iter().rev())
            .take_while(|(a, b)| a == b)
            .count();

        Self {
            saved_at,
            prefix,
            suffix,
            insert: new[prefix..new.len() - suffix].iter().collect(),
        }
    }

    fn apply(&self, base: &str) -> Option<String> {
        let chars: Vec<char> = base.chars().collect();
        if self.prefix + self.suffix > chars.len() {
            return None;
        }

        let mut out = String::with_capacity(base.len() + self.insert.len());
        out.extend(&chars[..self.prefix]);
        out.push_str(&self.insert);
        out.extend(&chars[chars.len() - self.suffix..]);
        Some(out)
    }
}

/// Ordered record of a document's text versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    current: String,
    versions: Vec<Delta>,
}

impl History {
    /// Starts a history whose only version is `text`.
    pub fn new(text: impl Into<String>) -> Self {
        let current = text.into();
        let first = Delta::between("", &current, now_millis());
        Self {
            current,
            versions: vec![first],
        }
    }

    /// Appends `text` as a new version.
    ///
    /// Returns `false` and records nothing when `text` equals the latest
    /// version.
    pub fn update(&mut self, text: &str) -> bool {
        if text == self.current {
            return false;
        }
        self.versions
            .push(Delta::between(&self.current, text, now_millis()));
        self.current = text.to_string();
        true
    }

    /// Text of the most recent version.
    pub fn latest(&self) -> &str {
        &self.current
    }

    pub fn version_count(&self) -> usize {
        self.versions.len()
    }

    /// Epoch milliseconds at which version `index` was recorded.
    pub fn saved_at(&self, index: usize) -> Option<i64> {
        self.versions.get(index).map(|delta| delta.saved_at)
    }

    /// Reconstructs the text of version `index` (0 = oldest kept).
    pub fn text_at(&self, index: usize) -> Option<String> {
        if index >= self.versions.len() {
            return None;
        }
        replay(&self.versions[..=index])
    }

    /// Collapses the oldest versions so at most `max_versions` remain.
    ///
    /// The collapsed versions become a single base version holding the text
    /// of the newest one among them. Returns how many versions were dropped.
    pub fn prune_to(&mut self, max_versions: usize) -> usize {
        let max_versions = max_versions.max(1);
        if self.versions.len() <= max_versions {
            return 0;
        }

        let collapse = self.versions.len() - max_versions + 1;
        let Some(base_text) = replay(&self.versions[..collapse]) else {
            return 0;
        };
        let base = Delta::between("", &base_text, self.versions[collapse - 1].saved_at);
        self.versions.drain(..collapse);
        self.versions.insert(0, base);
        collapse - 1
    }

    pub fn to_json(&self) -> Result<String, HistoryError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a persisted history and checks that its deltas replay.
    pub fn from_json(value: &str) -> Result<Self, HistoryError> {
        let history: History = serde_json::from_str(value)?;
        if history.versions.is_empty() {
            return Err(HistoryError::Corrupt("no versions recorded".to_string()));
        }
        match replay(&history.versions) {
            Some(text) if text == history.current => Ok(history),
            Some(_) => Err(HistoryError::Corrupt(
                "replayed text differs from current text".to_string(),
            )),
            None => Err(HistoryError::Corrupt(
                "delta exceeds the length of its base text".to_string(),
            )),
        }
    }
}

fn replay(deltas: &[Delta]) -> Option<String> {
    deltas
        .iter()
        .try_fold(String::new(), |text, delta| delta.apply(&text))
}

#[cfg(test)]
mod tests {
    use super::{Delta, History, HistoryError};

    #[test]
    fn delta_keeps_shared_prefix_and_suffix() {
        let delta = Delta::between("Hello world", "Hello brave world", 0);
        assert_eq!(delta.prefix, 6);
        assert_eq!(delta.suffix, 5);
        assert_eq!(delta.insert, "brave ");
        assert_eq!(delta.apply("Hello world").as_deref(), Some("Hello brave world"));
    }

    #[test]
    fn delta_handles_repeated_chars_and_multibyte_text() {
        let delta = Delta::between("aaa", "aa", 0);
        assert_eq!(delta.apply("aaa").as_deref(), Some("aa"));

        let delta = Delta::between("naïve café", "naïve crème café", 0);
        assert_eq!(
            delta.apply("naïve café").as_deref(),
            Some("naïve crème café")
        );
    }

    #[test]
    fn update_appends_only_changed_text() {
        let mut history = History::new("Hello");
        assert!(history.update("Hello world"));
        assert!(!history.update("Hello world"));

        assert_eq!(history.version_count(), 2);
        assert_eq!(history.latest(), "Hello world");
        assert_eq!(history.text_at(0).as_deref(), Some("Hello"));
        assert_eq!(history.text_at(1).as_deref(), Some("Hello world"));
        assert!(history.text_at(2).is_none());
    }

    #[test]
    fn prune_collapses_oldest_versions_into_base() {
        let mut history = History::new("v1");
        for text in ["v2", "v3", "v4", "v5"] {
            history.update(text);
        }

        assert_eq!(history.prune_to(3), 2);
        assert_eq!(history.version_count(), 3);
        assert_eq!(history.text_at(0).as_deref(), Some("v3"));
        assert_eq!(history.latest(), "v5");
        assert_eq!(history.prune_to(3), 0);
    }

    #[test]
    fn json_roundtrip_preserves_versions() {
        let mut history = History::new("first");
        history.update("second");

        let restored = History::from_json(&history.to_json().unwrap()).unwrap();
        assert_eq!(restored, history);
    }

    #[test]
    fn from_json_rejects_malformed_and_inconsistent_input() {
        assert!(matches!(
            History::from_json("not json"),
            Err(HistoryError::Json(_))
        ));
        assert!(matches!(
            History::from_json(r#"{"current":"x","versions":[]}"#),
            Err(HistoryError::Corrupt(_))
        ));
        assert!(matches!(
            History::from_json(r#"{"current":"x","versions":[{"t":0,"p":0,"s":0,"i":"y"}]}"#),
            Err(HistoryError::Corrupt(_))
        ));
        assert!(matches!(
            History::from_json(r#"{"current":"x","versions":[{"t":0,"p":4,"s":0,"i":"x"}]}"#),
            Err(HistoryError::Corrupt(_))
        ));
    }
}
