//! Read-only access to the user and component records of one snapshot.

use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use crate::config::{Component, User, DEFAULT_TOP_LEVEL_PATTERN};
use crate::error::AnalysisError;

/// Source of users and components for an analysis run.
///
/// The accessor is passed explicitly to every phase and is treated as
/// immutable for the duration of the run.
pub trait RecordAccessor: Sync {
    fn list_users(&self) -> &[User];

    fn list_components(&self) -> &[Component];

    /// Naming-convention predicate identifying top-level components.
    fn is_top_level_name(&self, name: &str) -> bool;

    /// Source text of the top-level predicate, when it is a pattern.
    fn top_level_pattern(&self) -> Option<&str> {
        None
    }

    fn user(&self, name: &str) -> Option<&User> {
        self.list_users().iter().find(|u| u.name == name)
    }
}

static DEFAULT_TOP_LEVEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&anchored(DEFAULT_TOP_LEVEL_PATTERN)).unwrap());

fn anchored(pattern: &str) -> String {
    format!("^(?:{pattern})")
}

/// Top-level name predicate. Patterns match at the start of the name.
#[derive(Debug, Clone)]
pub struct TopLevelMatcher {
    pattern: String,
    regex: Regex,
}

impl TopLevelMatcher {
    pub fn new(pattern: &str) -> Result<Self, AnalysisError> {
        let regex = Regex::new(&anchored(pattern)).map_err(|e| {
            AnalysisError::Configuration(format!("invalid top-level pattern '{pattern}': {e}"))
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

impl Default for TopLevelMatcher {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_TOP_LEVEL_PATTERN.to_string(),
            regex: DEFAULT_TOP_LEVEL.clone(),
        }
    }
}

/// On-disk layout of a snapshot document.
#[derive(Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    components: Vec<Component>,
}

/// In-memory snapshot of the record store.
#[derive(Debug)]
pub struct Snapshot {
    users: Vec<User>,
    components: Vec<Component>,
    user_index: HashMap<String, usize>,
    top_level: TopLevelMatcher,
}

impl Snapshot {
    /// Build a snapshot, checking key uniqueness and revision numbers.
    pub fn new(
        users: Vec<User>,
        components: Vec<Component>,
        top_level: TopLevelMatcher,
    ) -> Result<Self, AnalysisError> {
        let mut user_index = HashMap::with_capacity(users.len());
        for (i, user) in users.iter().enumerate() {
            if user_index.insert(user.name.clone(), i).is_some() {
                return Err(AnalysisError::DataIntegrity(format!(
                    "duplicate user name '{}'",
                    user.name
                )));
            }
        }

        let mut keys = HashSet::with_capacity(components.len());
        for comp in &components {
            if comp.revision == 0 {
                return Err(AnalysisError::DataIntegrity(format!(
                    "component '{}' has revision 0; revisions start at 1",
                    comp.name
                )));
            }
            if !keys.insert(comp.key()) {
                return Err(AnalysisError::DataIntegrity(format!(
                    "duplicate component '{}'",
                    comp.key()
                )));
            }
        }

        log::debug!(
            "Snapshot holds {} users and {} components",
            users.len(),
            components.len()
        );

        Ok(Self {
            users,
            components,
            user_index,
            top_level,
        })
    }

    pub fn from_json_str(json: &str, top_level: TopLevelMatcher) -> Result<Self, AnalysisError> {
        let file: SnapshotFile = serde_json::from_str(json)?;
        Self::new(file.users, file.components, top_level)
    }

    /// Read a snapshot document from disk.
    pub fn load(path: impl AsRef<Path>, top_level: TopLevelMatcher) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        log::info!("Loading snapshot from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json, top_level)
    }

    pub fn top_level_matcher(&self) -> &TopLevelMatcher {
        &self.top_level
    }
}

impl RecordAccessor for Snapshot {
    fn list_users(&self) -> &[User] {
        &self.users
    }

    fn list_components(&self) -> &[Component] {
        &self.components
    }

    fn is_top_level_name(&self, name: &str) -> bool {
        self.top_level.is_match(name)
    }

    fn top_level_pattern(&self) -> Option<&str> {
        Some(self.top_level.as_str())
    }

    fn user(&self, name: &str) -> Option<&User> {
        self.user_index.get(name).map(|&i| &self.users[i])
    }
}
