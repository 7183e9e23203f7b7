//! Recommendation cards returned alongside chat replies.
//!
//! The backend sends `food_data` as loosely shaped JSON. Cards are read field
//! by field so that one missing or mistyped value never drops the whole list.

use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_IMAGE: &str = "/static/images/default_food.jpg";
pub const UNKNOWN: &str = "unknown";

/// A restaurant entry as displayed in the results list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationCard {
    pub name: String,
    pub address: String,
    pub rating: String,
    pub budget: String,
    pub description: String,
    pub distance_km: String,
    pub image: String,
    pub place_id: Option<String>,
}

impl RecommendationCard {
    /// Read a card out of one `food_data` element. Never fails: anything that
    /// is not an object, or lacks a field, falls back to placeholders.
    pub fn from_value(value: &Value) -> Self {
        let image = field_text(value, &["Image", "img"])
            .map(|path| format!("/static/{}", path.trim_start_matches('/')))
            .unwrap_or_else(|| DEFAULT_IMAGE.to_string());

        Self {
            name: field_or_unknown(value, &["Name"]),
            address: field_or_unknown(value, &["Address"]),
            rating: field_or_unknown(value, &["Rating"]),
            budget: field_or_unknown(value, &["Budget"]),
            description: field_or_unknown(value, &["Description"]),
            distance_km: field_or_unknown(value, &["distance_km"]),
            image,
            place_id: field_text(value, &["place_id", "id"]),
        }
    }

    pub fn list_from_values(values: &[Value]) -> Vec<Self> {
        values.iter().map(Self::from_value).collect()
    }

    /// Identifier used when saving the place as a favorite.
    pub fn favorite_id(&self) -> &str {
        self.place_id.as_deref().unwrap_or(&self.name)
    }
}

fn field_or_unknown(value: &Value, keys: &[&str]) -> String {
    field_text(value, keys).unwrap_or_else(|| UNKNOWN.to_string())
}

/// First non-empty string or number found under any of `keys`.
fn field_text(value: &Value, keys: &[&str]) -> Option<String> {
    let object = value.as_object()?;
    keys.iter().find_map(|key| match object.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// What the card pane currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CardBoard {
    #[default]
    Placeholder,
    Cards(Vec<RecommendationCard>),
}

impl CardBoard {
    /// Replace everything on the board. Rendering the same list twice leaves
    /// the board exactly as rendering it once.
    pub fn render(&mut self, cards: &[RecommendationCard]) {
        *self = if cards.is_empty() {
            CardBoard::Placeholder
        } else {
            CardBoard::Cards(cards.to_vec())
        };
    }

    pub fn cards(&self) -> &[RecommendationCard] {
        match self {
            CardBoard::Placeholder => &[],
            CardBoard::Cards(cards) => cards,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, CardBoard::Placeholder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_card_reads_every_field() {
        let card = RecommendationCard::from_value(&json!({
            "Name": "Phở Bò Gánh",
            "Address": "123 Đường ABC, Hà Nội",
            "Rating": 4.5,
            "Budget": 2,
            "Description": "Phở truyền thống",
            "distance_km": 1.25,
            "Image": "images/pho_bo.jpg",
            "OpeningTime": "Mo-Su 10:00-21:00"
        }));

        assert_eq!(card.name, "Phở Bò Gánh");
        assert_eq!(card.address, "123 Đường ABC, Hà Nội");
        assert_eq!(card.rating, "4.5");
        assert_eq!(card.budget, "2");
        assert_eq!(card.distance_km, "1.25");
        assert_eq!(card.image, "/static/images/pho_bo.jpg");
        assert_eq!(card.favorite_id(), "Phở Bò Gánh");
    }

    #[test]
    fn img_key_is_accepted() {
        let card = RecommendationCard::from_value(&json!({ "Name": "Chè Hẻm", "img": "images/che.jpg" }));
        assert_eq!(card.image, "/static/images/che.jpg");
    }

    #[test]
    fn missing_fields_fall_back() {
        let card = RecommendationCard::from_value(&json!({ "Name": "Bánh Mì Phượng", "Image": "  " }));
        assert_eq!(card.name, "Bánh Mì Phượng");
        assert_eq!(card.address, UNKNOWN);
        assert_eq!(card.rating, UNKNOWN);
        assert_eq!(card.image, DEFAULT_IMAGE);
        assert_eq!(card.place_id, None);
    }

    #[test]
    fn non_object_entry_becomes_placeholder_card() {
        let cards = RecommendationCard::list_from_values(&[json!(null), json!("oops"), json!({ "Name": "Cơm Tấm" })]);
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].name, UNKNOWN);
        assert_eq!(cards[1].image, DEFAULT_IMAGE);
        assert_eq!(cards[2].name, "Cơm Tấm");
    }

    #[test]
    fn place_id_is_preferred_for_favorites() {
        let card = RecommendationCard::from_value(&json!({ "Name": "Bún Chả", "place_id": 42 }));
        assert_eq!(card.favorite_id(), "42");
    }

    #[test]
    fn render_is_full_replacement() {
        let first = RecommendationCard::list_from_values(&[json!({ "Name": "A" }), json!({ "Name": "B" })]);
        let second = RecommendationCard::list_from_values(&[json!({ "Name": "C" })]);

        let mut board = CardBoard::default();
        board.render(&first);
        board.render(&second);
        assert_eq!(board.cards().len(), 1);
        assert_eq!(board.cards()[0].name, "C");
    }

    #[test]
    fn render_twice_equals_render_once() {
        let cards = RecommendationCard::list_from_values(&[json!({ "Name": "A" }), json!({ "Name": "B" })]);

        let mut once = CardBoard::default();
        once.render(&cards);

        let mut twice = CardBoard::default();
        twice.render(&cards);
        twice.render(&cards);

        assert_eq!(once, twice);
    }

    #[test]
    fn empty_list_shows_placeholder() {
        let mut board = CardBoard::Cards(RecommendationCard::list_from_values(&[json!({ "Name": "A" })]));
        board.render(&[]);
        assert!(board.is_placeholder());
        assert!(board.cards().is_empty());
    }
}
