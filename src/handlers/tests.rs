use actix_web::{
    body::MessageBody,
    dev::ServiceResponse,
    http::{header, StatusCode},
    test, web, App,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    config::Config,
    db::MemoryStore,
    service::{self, auth::AuthMiddleware},
    state::AppState,
};

async fn app_state() -> web::Data<AppState> {
    let config = Config::for_tests();
    let state = AppState::new(config, Arc::new(MemoryStore::new()));
    service::account::ensure_admin(state.store.as_ref(), "admin@campus.test", "admin-pass")
        .await
        .unwrap();
    web::Data::new(state)
}

async fn body_json<B: MessageBody>(res: ServiceResponse<B>) -> Value {
    let bytes = test::read_body(res).await;
    serde_json::from_slice(&bytes).unwrap()
}

macro_rules! login {
    ($app:expr, $email:expr, $password:expr) => {{
        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "email": $email, "password": $password }))
            .to_request();
        let res = test::call_service($app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        format!("Bearer {}", body["access_token"].as_str().unwrap())
    }};
}

#[actix_rt::test]
async fn organizer_to_student_flow() {
    let state = app_state().await;
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .wrap(AuthMiddleware)
            .configure(super::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(json!({
            "name": "Jordan",
            "email": "jordan@campus.test",
            "password": "pw123",
            "confirm_password": "pw123"
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let organizer = login!(&app, "jordan@campus.test", "pw123");
    let admin = login!(&app, "admin@campus.test", "admin-pass");

    let date = (chrono::Utc::now().date_naive() + chrono::Duration::days(3)).to_string();
    let req = test::TestRequest::post()
        .uri("/events")
        .insert_header((header::AUTHORIZATION, organizer.clone()))
        .set_json(json!({
            "title": "Workshop: async Rust",
            "description": "Futures from scratch",
            "category": "workshop",
            "date": date,
            "time": "16:00:00",
            "location": "Room 101",
            "event_link": "https://register.campus.test/async"
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = body_json(res).await;
    assert_eq!(created["status"], "pending");
    let id = created["id"].as_str().unwrap().to_string();

    // students do not see it yet
    let req = test::TestRequest::get()
        .uri("/events/feed")
        .insert_header((header::AUTHORIZATION, organizer.clone()))
        .to_request();
    let feed = body_json(test::call_service(&app, req).await).await;
    assert_eq!(feed.as_array().unwrap().len(), 0);

    let req = test::TestRequest::post()
        .uri(&format!("/admin/events/{id}/approve"))
        .insert_header((header::AUTHORIZATION, organizer.clone()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&format!("/admin/events/{id}/approve"))
        .insert_header((header::AUTHORIZATION, admin.clone()))
        .to_request();
    let approved = body_json(test::call_service(&app, req).await).await;
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["color_theme"], "#3498db");
    assert_eq!(approved["is_featured"], true);

    let req = test::TestRequest::get()
        .uri("/events/feed")
        .insert_header((header::AUTHORIZATION, organizer.clone()))
        .to_request();
    let feed = body_json(test::call_service(&app, req).await).await;
    assert_eq!(feed.as_array().unwrap().len(), 1);

    let req = test::TestRequest::get().uri(&format!("/events/{id}")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::delete()
        .uri(&format!("/events/{id}"))
        .insert_header((header::AUTHORIZATION, organizer.clone()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/events/dashboard")
        .insert_header((header::AUTHORIZATION, organizer))
        .to_request();
    let dashboard = body_json(test::call_service(&app, req).await).await;
    assert_eq!(dashboard["counts"]["total"], 0);

    let req = test::TestRequest::get()
        .uri(&format!("/admin/events/{id}"))
        .insert_header((header::AUTHORIZATION, admin))
        .to_request();
    let audited = body_json(test::call_service(&app, req).await).await;
    assert!(!audited["deleted_at"].is_null());
}

#[actix_rt::test]
async fn deny_without_reason_is_bad_request() {
    let state = app_state().await;
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .wrap(AuthMiddleware)
            .configure(super::configure),
    )
    .await;
    let admin = login!(&app, "admin@campus.test", "admin-pass");

    let req = test::TestRequest::post()
        .uri(&format!("/admin/events/{}/deny", uuid::Uuid::new_v4()))
        .insert_header((header::AUTHORIZATION, admin))
        .set_json(json!({ "denial_reason": "" }))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[actix_rt::test]
async fn logout_requires_issued_token() {
    let state = app_state().await;
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .wrap(AuthMiddleware)
            .configure(super::configure),
    )
    .await;
    let admin = login!(&app, "admin@campus.test", "admin-pass");

    let req = test::TestRequest::post()
        .uri("/auth/logout")
        .insert_header((header::AUTHORIZATION, admin.clone()))
        .set_json(json!({ "logout_token": "forged" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/auth/logout-token")
        .insert_header((header::AUTHORIZATION, admin.clone()))
        .to_request();
    let issued = body_json(test::call_service(&app, req).await).await;
    let token = issued["logout_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/auth/logout")
        .insert_header((header::AUTHORIZATION, admin.clone()))
        .set_json(json!({ "logout_token": token }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri("/admin/stats")
        .insert_header((header::AUTHORIZATION, admin))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn requests_without_token_are_unauthorized() {
    let state = app_state().await;
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .wrap(AuthMiddleware)
            .configure(super::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/events/feed").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn stale_token_does_not_block_public_routes() {
    let state = app_state().await;
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .wrap(AuthMiddleware)
            .configure(super::configure),
    )
    .await;
    let admin = login!(&app, "admin@campus.test", "admin-pass");

    let req = test::TestRequest::post()
        .uri("/auth/logout-token")
        .insert_header((header::AUTHORIZATION, admin.clone()))
        .to_request();
    let issued = body_json(test::call_service(&app, req).await).await;
    let req = test::TestRequest::post()
        .uri("/auth/logout")
        .insert_header((header::AUTHORIZATION, admin.clone()))
        .set_json(json!({ "logout_token": issued["logout_token"].clone() }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .insert_header((header::AUTHORIZATION, admin.clone()))
        .set_json(json!({ "email": "admin@campus.test", "password": "admin-pass" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .insert_header((header::AUTHORIZATION, "Bearer not.a.jwt"))
        .set_json(json!({ "email": "admin@campus.test", "password": "admin-pass" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // protected routes still refuse the ended session
    let req = test::TestRequest::get()
        .uri("/admin/stats")
        .insert_header((header::AUTHORIZATION, admin))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["error"], "UNAUTHORIZED");
}

#[actix_rt::test]
async fn malformed_event_id_is_a_json_validation_error() {
    let state = app_state().await;
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .wrap(AuthMiddleware)
            .configure(super::configure),
    )
    .await;
    let admin = login!(&app, "admin@campus.test", "admin-pass");

    let req = test::TestRequest::get().uri("/events/not-a-uuid").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().starts_with("invalid path"));

    let req = test::TestRequest::post()
        .uri("/admin/events/42/approve")
        .insert_header((header::AUTHORIZATION, admin))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"], "VALIDATION_ERROR");
}
