//! The chat log shown to the user.

use serde::{Deserialize, Serialize};

/// One bubble in the chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranscriptEntry {
    UserText(String),
    UserImage { preview: String },
    BotText(String),
    /// Placeholder while an exchange is in flight.
    Pending,
}

/// Append-only chat log with at most one live pending entry.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    pending: Option<usize>,
    scroll_requested: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Append an entry. A second `Pending` while one is live is ignored.
    pub fn append(&mut self, entry: TranscriptEntry) {
        if entry == TranscriptEntry::Pending {
            if self.pending.is_some() {
                return;
            }
            self.pending = Some(self.entries.len());
        }
        self.entries.push(entry);
        self.scroll_requested = true;
    }

    /// Turn the live pending entry into a bot reply, or append the reply if
    /// nothing is pending.
    pub fn resolve_pending(&mut self, text: String) {
        match self.pending.take() {
            Some(idx) => self.entries[idx] = TranscriptEntry::BotText(text),
            None => self.entries.push(TranscriptEntry::BotText(text)),
        }
        self.scroll_requested = true;
    }

    /// True once after every mutation; the view uses it to stick to the bottom.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_requested)
    }
}

/// Normalize `\r\n` and lone `\r` to the log's line break.
pub fn normalize_line_breaks(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
