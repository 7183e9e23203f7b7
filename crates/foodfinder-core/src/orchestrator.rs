//! The chat exchange state machine.
//!
//! An exchange is one user send: either a text-only chat call, or an image
//! recognition call followed by a chat call built from its result. At most
//! one exchange is in flight. The busy guard is created when an exchange
//! begins and travels with it until its outcome has been applied, so the
//! orchestrator returns to idle on every path, including a dropped task.
//!
//! The work is split in three so the network part can run off the UI loop:
//!
//! - [`ExchangeOrchestrator::begin`] validates, appends the user entries and
//!   the pending entry, and hands back an owned [`Exchange`];
//! - [`Exchange::run`] performs the backend calls and touches no UI state;
//! - [`ExchangeOrchestrator::finish`] resolves the pending entry, forwards
//!   cards, then releases the busy guard.
//!
//! An exchange whose outcome was lost is closed by [`ExchangeOrchestrator::abandon`],
//! or by the next `begin` if that arrives first.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::api::ChatReply;
use crate::backend::FoodBackend;
use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::error::ApiError;
use crate::sink::ChatSink;
use crate::staging::{ImageFile, UploadStaging};
use crate::transcript::{normalize_line_breaks, TranscriptEntry};

pub const PROCESSING_NOTICE: &str = "Đang xử lý, vui lòng đợi trong giây lát...";
pub const INPUT_REQUIRED_NOTICE: &str = "Vui lòng nhập tin nhắn hoặc chọn ảnh.";
pub const CHAT_FALLBACK: &str = "Xin lỗi, hệ thống đang gặp sự cố. Bạn vui lòng thử lại sau.";
pub const RECOGNITION_FALLBACK: &str = "Không thể nhận diện hình ảnh.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    Busy,
}

/// A send that was refused before anything happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("an exchange is already in flight")]
    Busy,
    #[error("no text and no image to send")]
    InputRequired,
}

impl Rejection {
    pub fn notice(&self) -> &'static str {
        match self {
            Rejection::Busy => PROCESSING_NOTICE,
            Rejection::InputRequired => INPUT_REQUIRED_NOTICE,
        }
    }
}

/// Clears the busy flag when dropped.
#[derive(Debug)]
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Result of the recognition step of an image exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognition {
    Recognized { message: String, subject: String },
    Failed,
}

impl Recognition {
    pub fn message(&self) -> &str {
        match self {
            Recognition::Recognized { message, .. } => message,
            Recognition::Failed => RECOGNITION_FALLBACK,
        }
    }

    pub fn subject(&self) -> &str {
        match self {
            Recognition::Recognized { subject, .. } => subject,
            Recognition::Failed => "",
        }
    }
}

/// Chat prompt for an image exchange: subject, a space, then the user's text.
pub fn combined_prompt(recognition: &Recognition, text: &str) -> String {
    format!("{} {}", recognition.subject(), text)
}

#[derive(Debug)]
enum Plan {
    Text { text: String },
    Image { image: ImageFile, text: String },
}

/// A validated exchange, ready to run.
#[derive(Debug)]
pub struct Exchange<B> {
    id: u64,
    backend: B,
    plan: Plan,
    timeout: Duration,
    busy: BusyGuard,
}

impl<B: FoodBackend> Exchange<B> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_image(&self) -> bool {
        matches!(self.plan, Plan::Image { .. })
    }

    /// Perform the backend calls. Never fails: every failure is folded into
    /// the outcome.
    pub async fn run(self) -> ExchangeOutcome {
        let Exchange {
            id,
            backend,
            plan,
            timeout,
            busy,
        } = self;

        let kind = match plan {
            Plan::Text { text } => OutcomeKind::Text {
                chat: with_timeout(timeout, backend.chat(&text)).await,
            },
            Plan::Image { image, text } => {
                // Recognition must settle before the chat prompt can be built.
                let recognition = match with_timeout(timeout, backend.recognize(&image)).await {
                    Ok(reply) => Recognition::Recognized {
                        message: reply.message,
                        subject: reply.food_name,
                    },
                    Err(e) => {
                        warn!(error = %e, file = %image.file_name, "image recognition failed");
                        Recognition::Failed
                    }
                };
                let prompt = combined_prompt(&recognition, &text);
                let chat = with_timeout(timeout, backend.chat(&prompt)).await;
                OutcomeKind::Image { recognition, chat }
            }
        };

        ExchangeOutcome { id, kind, busy }
    }
}

async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or_else(|_| Err(ApiError::Timeout))
}

#[derive(Debug)]
pub enum OutcomeKind {
    Text {
        chat: Result<ChatReply, ApiError>,
    },
    Image {
        recognition: Recognition,
        chat: Result<ChatReply, ApiError>,
    },
}

/// What an exchange produced. Holds the busy guard until it is applied with
/// [`ExchangeOrchestrator::finish`] or dropped.
#[derive(Debug)]
pub struct ExchangeOutcome {
    id: u64,
    kind: OutcomeKind,
    busy: BusyGuard,
}

impl ExchangeOutcome {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> &OutcomeKind {
        &self.kind
    }
}

pub struct ExchangeOrchestrator<B> {
    backend: B,
    staging: UploadStaging,
    busy: Arc<AtomicBool>,
    timeout: Duration,
    next_id: u64,
    /// Exchange whose pending entry is still on screen.
    open: Option<u64>,
}

impl<B: FoodBackend> ExchangeOrchestrator<B> {
    pub fn new(backend: B, staging: UploadStaging) -> Self {
        Self {
            backend,
            staging,
            busy: Arc::new(AtomicBool::new(false)),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            next_id: 0,
            open: None,
        }
    }

    /// Limit for each backend call inside an exchange.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> ExchangeState {
        if self.busy.load(Ordering::Acquire) {
            ExchangeState::Busy
        } else {
            ExchangeState::Idle
        }
    }

    pub fn is_busy(&self) -> bool {
        self.state() == ExchangeState::Busy
    }

    pub fn staging(&self) -> &UploadStaging {
        &self.staging
    }

    pub fn staging_mut(&mut self) -> &mut UploadStaging {
        &mut self.staging
    }

    /// Validate a send and start the exchange. On rejection the user is
    /// notified and nothing else changes.
    pub fn begin(
        &mut self,
        raw_text: &str,
        sink: &mut impl ChatSink,
    ) -> Result<Exchange<B>, Rejection> {
        let text = raw_text.trim();

        let rejection = if self.is_busy() {
            Some(Rejection::Busy)
        } else if text.is_empty() && !self.staging.is_staged() {
            Some(Rejection::InputRequired)
        } else {
            None
        };
        if let Some(rejection) = rejection {
            sink.notify(rejection.notice());
            return Err(rejection);
        }

        let Some(busy) = BusyGuard::acquire(&self.busy) else {
            sink.notify(PROCESSING_NOTICE);
            return Err(Rejection::Busy);
        };

        // The previous run died and its abandon notice has not arrived yet.
        if let Some(stale) = self.open.take() {
            warn!(exchange = stale, "closing exchange that never reported back");
            sink.resolve_pending(CHAT_FALLBACK.to_string());
        }

        let plan = match self.staging.take() {
            Some(staged) => {
                sink.append_entry(TranscriptEntry::UserImage {
                    preview: staged.preview.label,
                });
                if !text.is_empty() {
                    sink.append_entry(TranscriptEntry::UserText(text.to_string()));
                }
                Plan::Image {
                    image: staged.file,
                    text: text.to_string(),
                }
            }
            None => {
                sink.append_entry(TranscriptEntry::UserText(text.to_string()));
                Plan::Text {
                    text: text.to_string(),
                }
            }
        };
        sink.append_entry(TranscriptEntry::Pending);

        let id = self.next_id;
        self.next_id += 1;
        self.open = Some(id);

        info!(exchange = id, image = matches!(plan, Plan::Image { .. }), "exchange started");
        Ok(Exchange {
            id,
            backend: self.backend.clone(),
            plan,
            timeout: self.timeout,
            busy,
        })
    }

    /// Apply an outcome to the sink, then return to idle.
    pub fn finish(&mut self, outcome: ExchangeOutcome, sink: &mut impl ChatSink) {
        let ExchangeOutcome { id, kind, busy } = outcome;
        if self.open == Some(id) {
            self.open = None;
        }

        match kind {
            OutcomeKind::Text { chat } => match chat {
                Ok(reply) => {
                    sink.resolve_pending(normalize_line_breaks(&reply.reply));
                    sink.render_cards(&reply.cards);
                }
                Err(e) => {
                    warn!(error = %e, "chat request failed");
                    sink.resolve_pending(CHAT_FALLBACK.to_string());
                }
            },
            OutcomeKind::Image { recognition, chat } => {
                let reply = match chat {
                    Ok(reply) => {
                        sink.render_cards(&reply.cards);
                        normalize_line_breaks(&reply.reply)
                    }
                    Err(e) => {
                        warn!(error = %e, "chat request after recognition failed");
                        CHAT_FALLBACK.to_string()
                    }
                };
                let message = normalize_line_breaks(recognition.message());
                sink.resolve_pending(format!("{}\n{}", message, reply));
            }
        }

        drop(busy);
        info!(exchange = id, "exchange finished");
    }

    /// Close out exchange `id` whose run never produced an outcome (the task
    /// died). The busy guard has already been released by then. A no-op when
    /// a later `begin` already closed it.
    pub fn abandon(&mut self, id: u64, sink: &mut impl ChatSink) {
        if self.open != Some(id) {
            return;
        }
        warn!(exchange = id, "exchange abandoned");
        self.open = None;
        sink.resolve_pending(CHAT_FALLBACK.to_string());
    }

    /// Begin, run and finish an exchange in one go.
    pub async fn send(&mut self, raw_text: &str, sink: &mut impl ChatSink) -> Result<(), Rejection> {
        let exchange = self.begin(raw_text, sink)?;
        let outcome = exchange.run().await;
        self.finish(outcome, sink);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_prompt_keeps_both_sides() {
        let recognized = Recognition::Recognized {
            message: "Nhận diện: Bánh mì".to_string(),
            subject: "Bánh mì".to_string(),
        };
        assert_eq!(combined_prompt(&recognized, ""), "Bánh mì ");
        assert_eq!(combined_prompt(&recognized, "gần đây"), "Bánh mì gần đây");
        assert_eq!(combined_prompt(&Recognition::Failed, "phở"), " phở");
    }

    #[test]
    fn failed_recognition_uses_fallback_message() {
        assert_eq!(Recognition::Failed.message(), RECOGNITION_FALLBACK);
        assert_eq!(Recognition::Failed.subject(), "");
    }

    #[test]
    fn busy_guard_is_exclusive_and_released_on_drop() {
        let flag = Arc::new(AtomicBool::new(false));
        let guard = BusyGuard::acquire(&flag).unwrap();
        assert!(BusyGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(!flag.load(Ordering::Acquire));
        assert!(BusyGuard::acquire(&flag).is_some());
    }

    #[test]
    fn rejection_notices() {
        assert_eq!(Rejection::Busy.notice(), PROCESSING_NOTICE);
        assert_eq!(Rejection::InputRequired.notice(), INPUT_REQUIRED_NOTICE);
    }
}
