use std::time::Instant;

use foodfinder_core::{
    ApiClient, ChatSink, ChatView, Config, ExchangeOrchestrator, Notifications,
    RecommendationCard, TranscriptEntry, UploadStaging,
};
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info};

use crate::tui::AppEvent;

pub const NO_CARD_SELECTED: &str = "Chưa có quán nào được chọn.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Chat,
    Cards,
}

/// What the input line is currently collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Message,
    ImagePath,
    RouteOrigin,
}

impl PromptKind {
    pub fn title(&self) -> &'static str {
        match self {
            PromptKind::Message => " Tin nhắn (Enter để gửi) ",
            PromptKind::ImagePath => " Đường dẫn ảnh (png, jpg, jpeg, gif) ",
            PromptKind::RouteOrigin => " Vị trí của bạn ",
        }
    }
}

/// Single-line text input with a character cursor.
#[derive(Debug, Clone, Default)]
pub struct LineEditor {
    pub text: String,
    pub cursor: usize,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

impl LineEditor {
    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.char_count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Input state
    pub prompt: PromptKind,
    pub message: LineEditor,
    pub prompt_input: LineEditor,

    // Chat state
    pub chat: ChatView,
    pub orchestrator: ExchangeOrchestrator<ApiClient>,
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    // Card pane
    pub card_state: ListState,

    pub animation_frame: u8, // 0-2 for ellipsis animation
    pub events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(config: &Config, events: UnboundedSender<AppEvent>) -> anyhow::Result<Self> {
        let base_url = config.base_url();
        let client = ApiClient::new(&base_url, config.request_timeout())?;
        let staging = UploadStaging::new(config.max_upload_bytes());
        let orchestrator =
            ExchangeOrchestrator::new(client, staging).with_timeout(config.request_timeout());
        info!(%base_url, "backend configured");

        Ok(Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Chat,
            prompt: PromptKind::Message,
            message: LineEditor::default(),
            prompt_input: LineEditor::default(),
            chat: ChatView::new(Notifications::new(
                config.notice_display(),
                config.notice_exit(),
            )),
            orchestrator,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            card_state: ListState::default(),
            animation_frame: 0,
            events,
        })
    }

    /// Editor behind the input line for the active prompt.
    pub fn active_input(&self) -> &LineEditor {
        match self.prompt {
            PromptKind::Message => &self.message,
            _ => &self.prompt_input,
        }
    }

    pub fn active_input_mut(&mut self) -> &mut LineEditor {
        match self.prompt {
            PromptKind::Message => &mut self.message,
            _ => &mut self.prompt_input,
        }
    }

    pub fn open_prompt(&mut self, kind: PromptKind) {
        self.prompt = kind;
        self.prompt_input.clear();
        self.input_mode = InputMode::Editing;
    }

    /// Back to the message prompt, dropping any side prompt text.
    pub fn close_prompt(&mut self) {
        self.prompt = PromptKind::Message;
        self.prompt_input.clear();
    }

    /// Send the message line. The line is only cleared when the exchange
    /// actually starts.
    pub fn send_message(&mut self) {
        let text = self.message.text.clone();
        let Ok(exchange) = self.orchestrator.begin(&text, &mut self.chat) else {
            return;
        };
        self.message.clear();

        let id = exchange.id();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let event = match tokio::spawn(exchange.run()).await {
                Ok(outcome) => AppEvent::ExchangeFinished(outcome),
                Err(e) => {
                    error!(error = %e, "exchange task failed");
                    AppEvent::ExchangeAborted {
                        id,
                        reason: e.to_string(),
                    }
                }
            };
            // A closed channel means the app is gone; dropping the outcome
            // releases the busy flag.
            let _ = tx.send(event);
        });
    }

    pub fn cards(&self) -> &[RecommendationCard] {
        self.chat.cards.cards()
    }

    pub fn selected_card(&self) -> Option<&RecommendationCard> {
        self.card_state.selected().and_then(|i| self.cards().get(i))
    }

    /// Keep the card selection inside the current list after a re-render.
    pub fn sync_card_selection(&mut self) {
        let count = self.cards().len();
        if count == 0 {
            self.card_state.select(None);
        } else {
            let idx = self.card_state.selected().unwrap_or(0).min(count - 1);
            self.card_state.select(Some(idx));
        }
    }

    pub fn card_nav_down(&mut self) {
        let count = self.cards().len();
        if count > 0 {
            let i = self.card_state.selected().map_or(0, |i| (i + 1).min(count - 1));
            self.card_state.select(Some(i));
        }
    }

    pub fn card_nav_up(&mut self) {
        if let Some(i) = self.card_state.selected() {
            self.card_state.select(Some(i.saturating_sub(1)));
        }
    }

    pub fn scroll_chat_down(&mut self) {
        let max = self.max_chat_scroll();
        self.chat_scroll = (self.chat_scroll + 1).min(max);
    }

    pub fn scroll_chat_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    /// Scroll chat to bottom so the newest entry is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self.max_chat_scroll();
    }

    fn max_chat_scroll(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        let total_lines = transcript_line_count(self.chat.transcript.entries(), wrap_width);
        total_lines.saturating_sub(visible_height)
    }

    /// Apply a scroll request raised by the transcript, if any.
    pub fn follow_transcript(&mut self) {
        if self.chat.transcript.take_scroll_request() {
            self.scroll_chat_to_bottom();
        }
    }

    /// Tick animation frame and expire notices (called by Tick event)
    pub fn tick(&mut self) {
        if self.chat.transcript.has_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.chat.notices.prune(Instant::now());
    }

    pub fn notify(&mut self, text: &str) {
        self.chat.notify(text);
    }
}

/// Rendered height of the transcript: a role line, the wrapped body, then a
/// blank line per entry. Saturates at `u16::MAX`, the widest scroll offset
/// the chat paragraph accepts.
pub fn transcript_line_count(entries: &[TranscriptEntry], wrap_width: usize) -> u16 {
    let wrap_width = wrap_width.max(1);
    let mut total_lines: usize = 0;

    for entry in entries {
        let body = match entry {
            TranscriptEntry::UserText(text) | TranscriptEntry::BotText(text) => text.as_str(),
            TranscriptEntry::UserImage { preview } => preview.as_str(),
            TranscriptEntry::Pending => "",
        };
        // Use character count, not byte length, for proper UTF-8 handling
        let body_lines: usize = body
            .lines()
            .map(|line| line.chars().count() / wrap_width + 1)
            .sum();
        total_lines += 1 + body_lines.max(1) + 1;
    }

    u16::try_from(total_lines).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodfinder_core::orchestrator::INPUT_REQUIRED_NOTICE;
    use foodfinder_core::{CardBoard, ExchangeState};

    fn test_app() -> App {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        App::new(&Config::new(), tx).unwrap()
    }

    fn card(name: &str) -> RecommendationCard {
        RecommendationCard {
            name: name.to_string(),
            address: "unknown".to_string(),
            rating: "unknown".to_string(),
            budget: "unknown".to_string(),
            description: "unknown".to_string(),
            distance_km: "unknown".to_string(),
            image: "/static/images/default_food.jpg".to_string(),
            place_id: None,
        }
    }

    #[test]
    fn line_editor_handles_multibyte_text() {
        let mut editor = LineEditor::default();
        for c in "phở".chars() {
            editor.insert(c);
        }
        editor.left();
        editor.backspace();
        assert_eq!(editor.text, "phở");
        assert_eq!(editor.cursor, 1);

        editor.end();
        editor.backspace();
        assert_eq!(editor.text, "ph");

        editor.home();
        editor.delete();
        assert_eq!(editor.text, "h");
        assert_eq!(editor.take(), "h");
        assert_eq!(editor.cursor, 0);
    }

    #[test]
    fn empty_send_is_rejected_and_keeps_idle() {
        let mut app = test_app();
        app.message.text = "   ".to_string();

        app.send_message();

        assert_eq!(app.orchestrator.state(), ExchangeState::Idle);
        assert!(app.chat.transcript.is_empty());
        assert_eq!(app.chat.notices.iter().next().unwrap().text, INPUT_REQUIRED_NOTICE);
        // Rejected input is left for the user to fix
        assert_eq!(app.message.text, "   ");
    }

    #[test]
    fn card_selection_follows_rerender() {
        let mut app = test_app();
        assert!(app.selected_card().is_none());

        app.chat.cards = CardBoard::Cards(vec![card("A"), card("B"), card("C")]);
        app.sync_card_selection();
        app.card_nav_down();
        app.card_nav_down();
        app.card_nav_down();
        assert_eq!(app.selected_card().unwrap().name, "C");

        app.chat.cards.render(&[card("D")]);
        app.sync_card_selection();
        assert_eq!(app.selected_card().unwrap().name, "D");

        app.chat.cards.render(&[]);
        app.sync_card_selection();
        assert!(app.selected_card().is_none());
    }

    #[test]
    fn prompts_keep_message_draft() {
        let mut app = test_app();
        app.message.text = "bún chả".to_string();

        app.open_prompt(PromptKind::ImagePath);
        app.active_input_mut().insert('/');
        assert_eq!(app.prompt_input.text, "/");

        app.close_prompt();
        assert_eq!(app.active_input().text, "bún chả");
        assert!(app.prompt_input.text.is_empty());
    }

    #[test]
    fn line_count_wraps_long_entries() {
        let entries = vec![
            TranscriptEntry::UserText("a".repeat(25)),
            TranscriptEntry::Pending,
        ];
        // 1 role + 3 wrapped + 1 blank, then 1 role + 1 + 1 blank
        assert_eq!(transcript_line_count(&entries, 10), 8);
    }

    #[test]
    fn line_count_saturates_on_huge_transcripts() {
        let long_reply = vec![TranscriptEntry::BotText("Phở\n".repeat(70_000))];
        assert_eq!(transcript_line_count(&long_reply, 50), u16::MAX);

        let long_session = vec![TranscriptEntry::UserText("hi".to_string()); 30_000];
        assert_eq!(transcript_line_count(&long_session, 50), u16::MAX);
    }

    #[test]
    fn following_a_huge_reply_scrolls_to_the_end() {
        let mut app = test_app();
        app.chat
            .transcript
            .append(TranscriptEntry::BotText("dòng\n".repeat(70_000)));

        app.follow_transcript();

        assert_eq!(app.chat_scroll, u16::MAX - 20);
    }
}
