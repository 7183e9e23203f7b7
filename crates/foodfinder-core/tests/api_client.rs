use std::time::Duration;

use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use foodfinder_core::{ApiClient, ApiError, FoodBackend, ImageFile, LatLng};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral port and return a client pointed at it.
async fn client_for(router: Router) -> ApiClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    ApiClient::new(&format!("http://{}/", addr), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn chat_posts_message_and_reads_cards() {
    let router = Router::new().route(
        "/api/chat",
        post(|Json(body): Json<Value>| async move {
            let message = body["message"].as_str().unwrap_or_default().to_string();
            Json(json!({
                "reply": format!("Bạn hỏi: {}", message),
                "food_data": [
                    { "Name": "Phở Bò Gánh", "Rating": 4.5, "distance_km": 0.8, "Image": "images/pho_bo.jpg" },
                    { "Address": "24 Lê Văn Hưu" }
                ]
            }))
        }),
    );
    let client = client_for(router).await;

    let reply = client.chat("phở bò").await.unwrap();
    assert_eq!(reply.reply, "Bạn hỏi: phở bò");
    assert_eq!(reply.cards.len(), 2);
    assert_eq!(reply.cards[0].name, "Phở Bò Gánh");
    assert_eq!(reply.cards[0].image, "/static/images/pho_bo.jpg");
    assert_eq!(reply.cards[1].name, "unknown");
}

#[tokio::test]
async fn chat_error_status_is_a_failure() {
    let router = Router::new().route(
        "/api/chat",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "reply": "Xin lỗi, hệ thống đang gặp sự cố.", "food_data": [] })),
            )
        }),
    );
    let client = client_for(router).await;

    let err = client.chat("x").await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 500 }), "got {err:?}");
}

#[tokio::test]
async fn chat_transport_failure_is_reported() {
    // Nothing listens on this port once the listener is dropped.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
    let err = client.chat("x").await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn recognize_sends_image_field_as_multipart() {
    let router = Router::new().route(
        "/api/predict",
        post(|mut multipart: Multipart| async move {
            let mut seen = Value::Null;
            while let Some(field) = multipart.next_field().await.unwrap() {
                let name = field.name().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let len = field.bytes().await.unwrap().len();
                if name.as_deref() == Some("image") {
                    seen = json!({ "file": file_name, "type": content_type, "len": len });
                }
            }
            Json(json!({
                "message": format!("The food you are looking for is Bánh mì. {}", seen),
                "food_name": "Bánh mì"
            }))
        }),
    );
    let client = client_for(router).await;

    let image = ImageFile::new("banh_mi.jpg", vec![7u8; 64]).unwrap();
    let reply = client.recognize(&image).await.unwrap();

    assert_eq!(reply.food_name, "Bánh mì");
    assert!(reply.message.contains(r#""file":"banh_mi.jpg""#), "{}", reply.message);
    assert!(reply.message.contains(r#""type":"image/jpeg""#), "{}", reply.message);
    assert!(reply.message.contains(r#""len":64"#), "{}", reply.message);
}

#[tokio::test]
async fn recognize_malformed_body_is_a_decode_error() {
    let router = Router::new().route("/api/predict", post(|| async { "not json" }));
    let client = client_for(router).await;

    let image = ImageFile::new("x.png", vec![1]).unwrap();
    let err = client.recognize(&image).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn geocode_returns_point_or_none() {
    let router = Router::new().route(
        "/api/geocode",
        post(|Json(body): Json<Value>| async move {
            if body["address"] == "123 Đường ABC" {
                Json(json!({ "lat": 10.7626, "lng": 106.6601 }))
            } else {
                Json(json!({ "lat": null, "lng": null, "error": "not found" }))
            }
        }),
    );
    let client = client_for(router).await;

    assert_eq!(
        client.geocode("123 Đường ABC").await.unwrap(),
        Some(LatLng::new(10.7626, 106.6601))
    );
    assert_eq!(client.geocode("nowhere").await.unwrap(), None);
    assert!(matches!(
        client.geocode("   ").await,
        Err(ApiError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn find_path_flips_geometry_and_reports_errors() {
    let router = Router::new().route(
        "/api/find_path",
        post(|Json(body): Json<Value>| async move {
            if body["destination"] == "Quán Không Tồn Tại" {
                return (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Không tìm thấy tọa độ nhà hàng" })),
                );
            }
            (
                StatusCode::OK,
                Json(json!({
                    "geometry": [[106.66, 10.76], [106.67, 10.77]],
                    "start_point": [10.76, 106.66],
                    "end_point": [10.77, 106.67]
                })),
            )
        }),
    );
    let client = client_for(router).await;

    let plan = client.find_path("Bến Thành", "Phở Bò Gánh").await.unwrap();
    assert_eq!(plan.path, vec![LatLng::new(10.76, 106.66), LatLng::new(10.77, 106.67)]);
    assert_eq!(plan.start, LatLng::new(10.76, 106.66));
    assert!(plan.length_km() > 1.0 && plan.length_km() < 2.0);

    let err = client.find_path("Bến Thành", "Quán Không Tồn Tại").await.unwrap_err();
    assert!(matches!(err, ApiError::Backend(ref msg) if msg == "Không tìm thấy tọa độ nhà hàng"));

    let err = client.find_path("  ", "Phở Bò Gánh").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[tokio::test]
async fn add_favorite_maps_unauthorized() {
    let router = Router::new().route(
        "/favorite/add",
        post(|Json(body): Json<Value>| async move {
            if body["place_id"] == "guest" {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "message": "Please log in" })),
                );
            }
            (
                StatusCode::OK,
                Json(json!({ "status": "success", "message": "Saved to favorites!" })),
            )
        }),
    );
    let client = client_for(router).await;

    client.add_favorite("42", "Phở Bò Gánh").await.unwrap();

    let err = client.add_favorite("guest", "Phở Bò Gánh").await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(ref msg) if msg == "Please log in"));
}
