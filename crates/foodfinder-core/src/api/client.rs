use std::time::Duration;

use reqwest::{multipart, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::types::{
    ChatReply, ChatRequest, ChatResponse, FavoriteRequest, FindPathRequest, FindPathResponse,
    GeocodeRequest, GeocodeResponse, RecognitionReply, StatusResponse,
};
use crate::backend::FoodBackend;
use crate::error::ApiError;
use crate::places::{LatLng, RoutePlan};
use crate::staging::ImageFile;

pub const ORIGIN_REQUIRED: &str = "Vui lòng nhập vị trí của bạn!";
const LOGIN_REQUIRED: &str = "Bạn cần đăng nhập để lưu quán yêu thích.";

/// HTTP client for the restaurant backend.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Resolve an address to coordinates. `None` when the backend could not
    /// place it.
    pub async fn geocode(&self, address: &str) -> Result<Option<LatLng>, ApiError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ApiError::InvalidInput("address is empty".to_string()));
        }

        debug!(address, "geocode");
        let response = self
            .client
            .post(self.url("/api/geocode"))
            .json(&GeocodeRequest { address })
            .send()
            .await?;

        // The backend reports lookup failures as null coordinates, sometimes
        // with an error status.
        let body: GeocodeResponse = decode_lenient(response).await?.unwrap_or(GeocodeResponse {
            lat: None,
            lng: None,
        });
        Ok(body.into_point())
    }

    pub async fn find_path(&self, origin: &str, destination: &str) -> Result<RoutePlan, ApiError> {
        let origin = origin.trim();
        if origin.is_empty() {
            return Err(ApiError::InvalidInput(ORIGIN_REQUIRED.to_string()));
        }

        debug!(origin, destination, "find path");
        let response = self
            .client
            .post(self.url("/api/find_path"))
            .json(&FindPathRequest { origin, destination })
            .send()
            .await?;

        let status = response.status();
        let body: FindPathResponse = decode_lenient(response).await?.unwrap_or_default();

        if let Some(error) = body.error {
            warn!(%status, error = %error, "route lookup failed");
            return Err(ApiError::Backend(error));
        }
        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16() });
        }
        body.into_plan()
            .ok_or_else(|| ApiError::Decode("route is missing geometry or endpoints".to_string()))
    }

    pub async fn add_favorite(&self, place_id: &str, place_name: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/favorite/add"))
            .json(&FavoriteRequest { place_id, place_name })
            .send()
            .await?;

        let status = response.status();
        let body: StatusResponse = decode_lenient(response).await?.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized(
                body.message.unwrap_or_else(|| LOGIN_REQUIRED.to_string()),
            ));
        }
        if let Some(error) = body.error {
            return Err(ApiError::Backend(error));
        }
        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16() });
        }
        match body.status.as_deref() {
            Some("success") => Ok(()),
            other => Err(ApiError::Decode(format!("unexpected favorite status: {:?}", other))),
        }
    }
}

impl FoodBackend for ApiClient {
    async fn chat(&self, message: &str) -> Result<ChatReply, ApiError> {
        debug!(chars = message.chars().count(), "chat request");
        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&ChatRequest { message })
            .send()
            .await?;

        let body: ChatResponse = decode_success(response).await?;
        Ok(body.into())
    }

    async fn recognize(&self, image: &ImageFile) -> Result<RecognitionReply, ApiError> {
        debug!(file = %image.file_name, bytes = image.size(), "recognition request");
        let part = multipart::Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)?;
        let form = multipart::Form::new().part("image", part);

        let response = self
            .client
            .post(self.url("/api/predict"))
            .multipart(form)
            .send()
            .await?;

        decode_success(response).await
    }
}

/// Decode a 2xx body; any other status is an error.
async fn decode_success<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        warn!(%status, url = %response.url(), "backend request failed");
        return Err(ApiError::Status { status: status.as_u16() });
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Decode whatever body came back regardless of status. `None` when the body
/// is not the expected JSON.
async fn decode_lenient<T: DeserializeOwned>(response: Response) -> Result<Option<T>, ApiError> {
    let text = response.text().await?;
    Ok(serde_json::from_str(&text).ok())
}
