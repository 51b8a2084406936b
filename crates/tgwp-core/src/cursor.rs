use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{domain::MessageId, Result};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CursorFile {
    #[serde(default)]
    last_message_id: Option<MessageId>,
}

/// Persists the id of the last channel post handed to the publisher.
///
/// File format: `{"last_message_id": <integer|null>}`, rewritten on every save.
#[derive(Clone, Debug)]
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or empty file means nothing has been processed yet.
    pub fn load(&self) -> Result<Option<MessageId>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let txt = std::fs::read_to_string(&self.path)?;
        if txt.trim().is_empty() {
            return Ok(None);
        }
        let data: CursorFile = serde_json::from_str(&txt)?;
        Ok(data.last_message_id)
    }

    pub fn save(&self, id: MessageId) -> Result<()> {
        let txt = serde_json::to_string(&CursorFile {
            last_message_id: Some(id),
        })?;
        std::fs::write(&self.path, txt)?;
        Ok(())
    }
}
