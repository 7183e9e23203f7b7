//! Where exchange results go.
//!
//! The orchestrator never touches a screen directly. It pushes transcript
//! entries, card lists and notices through [`ChatSink`], so the same state
//! machine drives the terminal UI and headless tests.

use crate::card::{CardBoard, RecommendationCard};
use crate::notify::Notifications;
use crate::transcript::{Transcript, TranscriptEntry};

pub trait ChatSink {
    fn append_entry(&mut self, entry: TranscriptEntry);

    /// Replace the live pending entry with a bot reply.
    fn resolve_pending(&mut self, text: String);

    fn render_cards(&mut self, cards: &[RecommendationCard]);

    fn notify(&mut self, text: &str);
}

/// UI-agnostic chat state: transcript, card board and notices.
#[derive(Debug, Default)]
pub struct ChatView {
    pub transcript: Transcript,
    pub cards: CardBoard,
    pub notices: Notifications,
}

impl ChatView {
    pub fn new(notices: Notifications) -> Self {
        Self {
            transcript: Transcript::new(),
            cards: CardBoard::default(),
            notices,
        }
    }
}

impl ChatSink for ChatView {
    fn append_entry(&mut self, entry: TranscriptEntry) {
        self.transcript.append(entry);
    }

    fn resolve_pending(&mut self, text: String) {
        self.transcript.resolve_pending(text);
    }

    fn render_cards(&mut self, cards: &[RecommendationCard]) {
        self.cards.render(cards);
    }

    fn notify(&mut self, text: &str) {
        self.notices.notify(text);
    }
}
