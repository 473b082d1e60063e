//! In-memory session history with browser semantics.
//!
//! Pushing truncates any forward entries; replacing rewrites the current
//! entry in place so it never adds a back-navigation step.

use url::Url;

use crate::Error;

/// Ordered list of visited locations and a cursor into it.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Url>,
    index: usize,
}

impl History {
    pub fn new(initial: Url) -> Self {
        Self { entries: vec![initial], index: 0 }
    }

    /// Start a history from an absolute location string.
    pub fn parse(location: &str) -> Result<Self, Error> {
        let url = Url::parse(location.trim()).map_err(|e| Error::InvalidLocation(format!("{location}: {e}")))?;
        Ok(Self::new(url))
    }

    pub fn current(&self) -> &Url {
        &self.entries[self.index]
    }

    /// Navigate to a new location, dropping anything ahead of the cursor.
    pub fn push(&mut self, url: Url) {
        self.entries.truncate(self.index + 1);
        self.entries.push(url);
        self.index = self.entries.len() - 1;
    }

    /// Overwrite the current entry.
    pub fn replace(&mut self, url: Url) {
        self.entries[self.index] = url;
    }

    /// Step back one entry. Returns `false` at the start of history.
    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Step forward one entry. Returns `false` at the end of history.
    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Number of entries, including ones ahead of the cursor.
    pub fn depth(&self) -> usize {
        self.entries.len()
    }
}
