//! Cell configuration.
//!
//! The recognized options are `persist`, `key`, `history` and
//! `historySize`. Built in code with the `with_*` methods or parsed from a
//! JSON document, in which case unknown options are rejected.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::reactive::DEFAULT_HISTORY_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct CellConfig {
    /// Load the initial value from, and store every write to, the
    /// persistence store under `key`.
    pub persist: bool,
    pub key: Option<String>,
    /// Keep an undo/redo log of the cell's values.
    pub history: bool,
    pub history_size: usize,
}

impl Default for CellConfig {
    fn default() -> Self {
        Self {
            persist: false,
            key: None,
            history: false,
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

impl CellConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist the cell under `key`.
    pub fn with_persistence(mut self, key: impl Into<String>) -> Self {
        self.persist = true;
        self.key = Some(key.into());
        self
    }

    /// Track history, keeping at most `size` past values.
    pub fn with_history(mut self, size: usize) -> Self {
        self.history = true;
        self.history_size = size;
        self
    }

    /// Parse a configuration document such as
    /// `{"persist": true, "key": "count", "history": true, "historySize": 20}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.history && self.history_size == 0 {
            return Err(Error::InvalidConfig(
                "historySize must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The key to persist under, if persistence is requested and usable.
    ///
    /// Persistence without a key is treated as disabled.
    pub(crate) fn persistence_key(&self) -> Option<&str> {
        if !self.persist {
            return None;
        }
        match self.key.as_deref() {
            Some(key) if !key.is_empty() => Some(key),
            _ => {
                tracing::warn!("persistence requested without a key, persistence disabled");
                None
            }
        }
    }

    /// History capacity, if history is requested.
    pub(crate) fn history_capacity(&self) -> Option<usize> {
        self.history.then(|| self.history_size.max(1))
    }
}
