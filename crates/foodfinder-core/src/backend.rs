use std::future::Future;

use crate::api::{ChatReply, RecognitionReply};
use crate::error::ApiError;
use crate::staging::ImageFile;

/// The two backend calls an exchange depends on.
///
/// Implementations are cloned into each exchange so the exchange can run
/// without borrowing the orchestrator.
pub trait FoodBackend: Clone + Send + Sync + 'static {
    /// `POST /api/chat`
    fn chat(&self, message: &str) -> impl Future<Output = Result<ChatReply, ApiError>> + Send;

    /// `POST /api/predict` with the image as multipart field `image`.
    fn recognize(
        &self,
        image: &ImageFile,
    ) -> impl Future<Output = Result<RecognitionReply, ApiError>> + Send;
}
