pub mod api;
pub mod backend;
pub mod card;
pub mod config;
pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod places;
pub mod sink;
pub mod staging;
pub mod transcript;

// Re-export main types for convenience
pub use api::{ApiClient, ChatReply, RecognitionReply};
pub use backend::FoodBackend;
pub use card::{CardBoard, RecommendationCard};
pub use config::Config;
pub use error::{ApiError, StagingError};
pub use notify::{Notice, NoticePhase, Notifications};
pub use orchestrator::{
    Exchange, ExchangeOrchestrator, ExchangeOutcome, ExchangeState, OutcomeKind, Recognition,
    Rejection,
};
pub use places::{LatLng, RoutePlan};
pub use sink::{ChatSink, ChatView};
pub use staging::{ImageFile, Preview, StagedImage, UploadStaging};
pub use transcript::{Transcript, TranscriptEntry};
