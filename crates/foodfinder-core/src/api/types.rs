//! Wire schemas for the restaurant backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::card::RecommendationCard;
use crate::places::{LatLng, RoutePlan};

#[derive(Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub message: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct ChatResponse {
    pub reply: String,
    #[serde(default)]
    pub food_data: Value,
}

impl From<ChatResponse> for ChatReply {
    fn from(response: ChatResponse) -> Self {
        let cards = response
            .food_data
            .as_array()
            .map(|items| RecommendationCard::list_from_values(items))
            .unwrap_or_default();
        Self {
            reply: response.reply,
            cards,
        }
    }
}

/// A chat completion plus the recommendations that came with it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub reply: String,
    pub cards: Vec<RecommendationCard>,
}

/// What the recognition endpoint says about an uploaded photo.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecognitionReply {
    pub message: String,
    #[serde(default)]
    pub food_name: String,
}

#[derive(Serialize)]
pub(crate) struct GeocodeRequest<'a> {
    pub address: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct GeocodeResponse {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl GeocodeResponse {
    pub fn into_point(self) -> Option<LatLng> {
        Some(LatLng::new(self.lat?, self.lng?))
    }
}

#[derive(Serialize)]
pub(crate) struct FindPathRequest<'a> {
    pub origin: &'a str,
    pub destination: &'a str,
}

#[derive(Deserialize, Default)]
pub(crate) struct FindPathResponse {
    pub geometry: Option<Vec<[f64; 2]>>,
    pub start_point: Option<[f64; 2]>,
    pub end_point: Option<[f64; 2]>,
    pub error: Option<String>,
}

impl FindPathResponse {
    pub fn into_plan(self) -> Option<RoutePlan> {
        Some(RoutePlan {
            path: self.geometry?.into_iter().map(LatLng::from_lon_lat).collect(),
            start: LatLng::from_lat_lon(self.start_point?),
            end: LatLng::from_lat_lon(self.end_point?),
        })
    }
}

#[derive(Serialize)]
pub(crate) struct FavoriteRequest<'a> {
    pub place_id: &'a str,
    pub place_name: &'a str,
}

#[derive(Deserialize, Default)]
pub(crate) struct StatusResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_response_tolerates_missing_or_odd_food_data() {
        let missing: ChatResponse = serde_json::from_str(r#"{"reply":"hi"}"#).unwrap();
        assert!(ChatReply::from(missing).cards.is_empty());

        let null: ChatResponse = serde_json::from_str(r#"{"reply":"hi","food_data":null}"#).unwrap();
        assert!(ChatReply::from(null).cards.is_empty());

        let object: ChatResponse = serde_json::from_str(r#"{"reply":"hi","food_data":{"Name":"x"}}"#).unwrap();
        assert!(ChatReply::from(object).cards.is_empty());
    }

    #[test]
    fn chat_response_requires_reply() {
        assert!(serde_json::from_str::<ChatResponse>(r#"{"food_data":[]}"#).is_err());
    }

    #[test]
    fn geocode_without_coordinates_is_none() {
        let resp: GeocodeResponse =
            serde_json::from_str(r#"{"lat":null,"lng":null,"error":"boom"}"#).unwrap();
        assert_eq!(resp.into_point(), None);

        let resp: GeocodeResponse = serde_json::from_str(r#"{"lat":10.5,"lng":106.7}"#).unwrap();
        assert_eq!(resp.into_point(), Some(LatLng::new(10.5, 106.7)));
    }

    #[test]
    fn find_path_flips_geometry() {
        let resp: FindPathResponse = serde_json::from_str(
            r#"{"geometry":[[106.1,10.1],[106.2,10.2]],"start_point":[10.1,106.1],"end_point":[10.2,106.2]}"#,
        )
        .unwrap();
        let plan = resp.into_plan().unwrap();
        assert_eq!(plan.path[0], LatLng::new(10.1, 106.1));
        assert_eq!(plan.start, LatLng::new(10.1, 106.1));
        assert_eq!(plan.end, LatLng::new(10.2, 106.2));
    }
}
