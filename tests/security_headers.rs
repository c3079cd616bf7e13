#![cfg(feature = "inmem-store")]

use actix_web::{test, web, App, HttpResponse};
use std::sync::Arc;
use walkmate::chat::ChatBroker;
use walkmate::repo::inmem::InMemRepo;
use walkmate::storage::FsPhotoStore;
use walkmate::{config, AppState, SecurityHeaders};

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

#[actix_web::test]
#[serial_test::serial]
async fn test_security_headers_present() {
    setup_env();
    std::env::remove_var("ENABLE_HSTS");
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_env())
            .app_data(actix_web::web::Data::new(state()))
            .configure(config),
    )
    .await;
    // headers are applied to every response, error responses included
    let req = test::TestRequest::get().uri("/api/v1/requests").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let headers = resp.headers();
    assert!(headers.get("content-security-policy").is_some());
    assert_eq!(headers.get("referrer-policy").unwrap(), "no-referrer");
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert!(headers.get("strict-transport-security").is_none()); // not enabled
}

#[actix_web::test]
#[serial_test::serial]
async fn test_hsts_enabled_via_builder() {
    setup_env();
    let sec = SecurityHeaders::from_env().with_hsts(true);
    let app = test::init_service(
        App::new()
            .wrap(sec)
            .app_data(actix_web::web::Data::new(state()))
            .configure(config),
    )
    .await;
    let req = test::TestRequest::get().uri("/api/v1/requests").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(
        resp.headers().get("strict-transport-security").is_some(),
        "HSTS header missing"
    );
}

#[actix_web::test]
#[serial_test::serial]
async fn test_env_var_enables_hsts_without_builder_override() {
    setup_env();
    std::env::set_var("ENABLE_HSTS", "1");
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_env())
            .app_data(actix_web::web::Data::new(state()))
            .configure(config),
    )
    .await;
    let req = test::TestRequest::get().uri("/api/v1/requests").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.headers().get("strict-transport-security").is_some());
    std::env::remove_var("ENABLE_HSTS");
}

#[actix_web::test]
#[serial_test::serial]
async fn test_existing_csp_header_preserved() {
    setup_env();
    let app = test::init_service(
        App::new()
            .wrap(SecurityHeaders::from_env())
            .app_data(actix_web::web::Data::new(state()))
            .route(
                "/custom",
                web::get().to(|| async {
                    HttpResponse::Ok()
                        .insert_header((
                            actix_web::http::header::CONTENT_SECURITY_POLICY,
                            "custom-src 'none'",
                        ))
                        .finish()
                }),
            ),
    )
    .await;
    let req = test::TestRequest::get().uri("/custom").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let csp = resp
        .headers()
        .get("content-security-policy")
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(csp, "custom-src 'none'");
}
