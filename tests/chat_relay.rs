#![cfg(feature = "inmem-store")]

use actix_web::{test, App};
use serial_test::serial;
use std::sync::Arc;
use walkmate::chat::ChatBroker;
use walkmate::repo::inmem::InMemRepo;
use walkmate::routes::{config, AppState};
use walkmate::storage::FsPhotoStore;

fn setup_env() {
    std::env::set_var("JWT_SECRET", "test-secret-must-be-32-bytes-long!!");
    let tmp = tempfile::tempdir().unwrap();
    std::env::set_var("WALKMATE_DATA_DIR", tmp.path().to_str().unwrap());
}

fn state() -> AppState {
    AppState {
        repo: Arc::new(InMemRepo::new()),
        photo_store: Arc::new(FsPhotoStore::new()),
        chat: Arc::new(ChatBroker::new()),
    }
}

async fn register<S, B>(app: &S, email: &str, role: &str) -> String
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    B: actix_web::body::MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(serde_json::json!({
            "email": email,
            "password": "correct-horse",
            "nickname": "채팅유저",
            "role": role,
            "region_code": "SEOUL_GANGNAM"
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201);
    let session: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    session["token"].as_str().unwrap().to_string()
}

/// Drive a request all the way to MATCHED, returning its id.
async fn matched_request<S, B>(app: &S, owner_token: &str, walker_token: &str) -> String
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    B: actix_web::body::MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/dogs")
        .insert_header(("Authorization", format!("Bearer {owner_token}")))
        .set_json(serde_json::json!({
            "name": "초코", "breed": "푸들", "size": "S",
            "notes": null, "image_url": null
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let dog: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/requests")
        .insert_header(("Authorization", format!("Bearer {owner_token}")))
        .set_json(serde_json::json!({
            "dog_id": dog["id"],
            "scheduled_at": chrono::Utc::now() + chrono::Duration::hours(2),
            "duration_min": 30,
            "reward": 20000,
            "region": "강남구"
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let request: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    let request_id = request["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/requests/{request_id}/applications"))
        .insert_header(("Authorization", format!("Bearer {walker_token}")))
        .to_request();
    let resp = test::call_service(app, req).await;
    let application: serde_json::Value =
        serde_json::from_slice(&test::read_body(resp).await).unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/requests/{request_id}/accept"))
        .insert_header(("Authorization", format!("Bearer {owner_token}")))
        .set_json(serde_json::json!({ "application_id": application["id"] }))
        .to_request();
    assert!(test::call_service(app, req).await.status().is_success());

    request_id
}

#[actix_web::test]
#[serial]
async fn history_and_send_are_participant_only() {
    setup_env();
    let state = state();
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(state.clone()))
            .configure(config),
    )
    .await;

    let owner_token = register(&app, "owner@example.com", "OWNER").await;
    let walker_token = register(&app, "walker@example.com", "WALKER").await;
    let outsider_token = register(&app, "outsider@example.com", "WALKER").await;
    let request_id = matched_request(&app, &owner_token, &walker_token).await;

    // both parties can write
    for (token, text) in [(&owner_token, "언제 도착하세요?"), (&walker_token, "10분 후 도착해요")] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/requests/{request_id}/messages"))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(serde_json::json!({ "content": text }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 201);
    }

    // an uninvolved walker can neither read nor write
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/requests/{request_id}/messages"))
        .insert_header(("Authorization", format!("Bearer {outsider_token}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/requests/{request_id}/messages"))
        .insert_header(("Authorization", format!("Bearer {outsider_token}")))
        .set_json(serde_json::json!({ "content": "저도 끼워주세요" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    // blank content is rejected
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/requests/{request_id}/messages"))
        .insert_header(("Authorization", format!("Bearer {owner_token}")))
        .set_json(serde_json::json!({ "content": "   " }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 422);

    // history comes back oldest-first with senders joined
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/requests/{request_id}/messages"))
        .insert_header(("Authorization", format!("Bearer {owner_token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let history: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["content"], "언제 도착하세요?");
    assert_eq!(history[1]["content"], "10분 후 도착해요");
    assert!(history[0]["sender"]["nickname"].is_string());
}

#[actix_web::test]
#[serial]
async fn no_chat_exists_before_a_match() {
    setup_env();
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(state()))
            .configure(config),
    )
    .await;

    let owner_token = register(&app, "owner@example.com", "OWNER").await;

    let req = test::TestRequest::post()
        .uri("/api/v1/dogs")
        .insert_header(("Authorization", format!("Bearer {owner_token}")))
        .set_json(serde_json::json!({
            "name": "초코", "breed": "푸들", "size": "S",
            "notes": null, "image_url": null
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let dog: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/requests")
        .insert_header(("Authorization", format!("Bearer {owner_token}")))
        .set_json(serde_json::json!({
            "dog_id": dog["id"],
            "scheduled_at": chrono::Utc::now() + chrono::Duration::hours(2),
            "duration_min": 30,
            "reward": 20000,
            "region": "강남구"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let request: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    let request_id = request["id"].as_str().unwrap();

    // even the owner has no chat on an OPEN request
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/requests/{request_id}/messages"))
        .insert_header(("Authorization", format!("Bearer {owner_token}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);
}

#[actix_web::test]
#[serial]
async fn sending_publishes_to_live_subscribers() {
    setup_env();
    let state = state();
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(state.clone()))
            .configure(config),
    )
    .await;

    let owner_token = register(&app, "owner@example.com", "OWNER").await;
    let walker_token = register(&app, "walker@example.com", "WALKER").await;
    let request_id = matched_request(&app, &owner_token, &walker_token).await;

    // subscribe the way the SSE endpoint does, then send over HTTP
    let mut rx = state.chat.subscribe(request_id.parse().unwrap());

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/requests/{request_id}/messages"))
        .insert_header(("Authorization", format!("Bearer {walker_token}")))
        .set_json(serde_json::json!({ "content": "지금 출발해요" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let live = rx.recv().await.unwrap();
    assert_eq!(live.message.content, "지금 출발해요");
    assert_eq!(live.message.request_id.to_string(), request_id);
    assert_eq!(live.sender.as_ref().unwrap().nickname, "채팅유저");
}

#[actix_web::test]
#[serial]
async fn stream_endpoint_enforces_membership_and_content_type() {
    setup_env();
    let state = state();
    let app = test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(state.clone()))
            .configure(config),
    )
    .await;

    let owner_token = register(&app, "owner@example.com", "OWNER").await;
    let walker_token = register(&app, "walker@example.com", "WALKER").await;
    let outsider_token = register(&app, "outsider@example.com", "WALKER").await;
    let request_id = matched_request(&app, &owner_token, &walker_token).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/requests/{request_id}/messages/stream"))
        .insert_header(("Authorization", format!("Bearer {outsider_token}")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/requests/{request_id}/messages/stream"))
        .insert_header(("Authorization", format!("Bearer {owner_token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "text/event-stream"
    );
    // opening the stream registered a live subscriber
    assert_eq!(state.chat.subscriber_count(request_id.parse().unwrap()), 1);
}
