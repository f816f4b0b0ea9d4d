//! HTTP-level tests: auth guard, JSON API status codes, meeting import
//! validation and the public schedule page.

mod common;

use actix_session::{Session, SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::{App, HttpResponse, http::StatusCode, test, web};
use serde_json::{Value, json};
use sqlx::PgPool;

use versammlung::auth;
use versammlung::config::ScraperConfig;
use versammlung::handlers;
use common::*;

async fn fake_login(session: Session) -> HttpResponse {
    let _ = session.insert("user_id", 1_i64);
    let _ = session.insert("username", "admin");
    let _ = session.insert("permissions", "weeks.edit,publishers.edit,directory.edit,settings.manage");
    HttpResponse::Ok().finish()
}

async fn ok() -> HttpResponse {
    HttpResponse::Ok().finish()
}

macro_rules! test_app {
    ($pool:expr) => {
        test::init_service(
            App::new()
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                        .cookie_secure(false)
                        .build(),
                )
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new(ScraperConfig::default()))
                .route("/test-login", web::get().to(fake_login))
                .route("/weeks/{date}", web::get().to(handlers::schedule_handlers::week_schedule))
                .service(
                    web::scope("")
                        .wrap(actix_web::middleware::from_fn(auth::middleware::require_auth))
                        .route("/admin/weeks", web::get().to(ok))
                        .route("/api/import-meeting", web::get().to(handlers::import_handlers::import_meeting))
                        .service(web::scope("/api/v1").configure(handlers::api_v1::configure)),
                ),
        )
        .await
    };
}

/// Session cookie of a user holding every permission.
macro_rules! login {
    ($app:expr) => {{
        let resp = test::call_service(&$app, test::TestRequest::get().uri("/test-login").to_request()).await;
        let cookie: Cookie<'static> = resp.response().cookies().next().expect("session cookie").into_owned();
        cookie
    }};
}

fn lazy_pool() -> PgPool {
    PgPool::connect_lazy("postgres://localhost/unused").expect("lazy pool")
}

#[actix_rt::test]
async fn test_admin_routes_redirect_to_login() {
    let app = test_app!(lazy_pool());
    let resp = test::call_service(&app, test::TestRequest::get().uri("/admin/weeks").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get("location").unwrap(), "/login");

    let cookie = login!(app);
    let req = test::TestRequest::get().uri("/admin/weeks").cookie(cookie).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_api_mutations_require_json() {
    let app = test_app!(lazy_pool());
    let cookie = login!(app);
    let req = test::TestRequest::post()
        .uri("/api/v1/weeks")
        .cookie(cookie)
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload("weekStartDate=2025-03-03")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_import_rejects_malformed_year_week() {
    let app = test_app!(lazy_pool());
    let cookie = login!(app);
    let req = test::TestRequest::get().uri("/api/import-meeting?yearWeek=2025-99").cookie(cookie).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[actix_rt::test]
async fn test_candidates_endpoint() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();
    let app = test_app!(pool);
    let cookie = login!(app);

    let visitor_id = insert_entity(pool, "visitor", "v-test", "Gerd Gast").await;
    insert_prop(pool, visitor_id, "congregation", "Süd").await;

    let req = test::TestRequest::get().uri("/api/v1/candidates?role=watchtower-conductor").cookie(cookie.clone()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!([{ "value": visitor_id, "label": "Gerd Gast", "relationTo": "visitors" }]));

    let req = test::TestRequest::get().uri("/api/v1/candidates?role=janitor").cookie(cookie).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_week_api_status_codes() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();
    let app = test_app!(pool);
    let cookie = login!(app);

    let week = json!({
        "weekStartDate": "2025-03-03",
        "midweekMeeting": { "openingSong": 77, "chairman": "Walter Neu" }
    });
    let req = test::TestRequest::post().uri("/api/v1/weeks").cookie(cookie.clone()).set_json(&week).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["midweekMeeting"]["calculatedDate"], "2025-03-06");
    assert_eq!(created["midweekMeeting"]["chairman"]["relationTo"], "visitors");
    let id = created["id"].as_i64().expect("id");

    let req = test::TestRequest::post().uri("/api/v1/weeks").cookie(cookie.clone()).set_json(&week).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let invalid = json!({
        "weekStartDate": "2025-03-03",
        "weekendMeeting": { "chairman": { "relationTo": "users", "value": 987654 } }
    });
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/weeks/{id}"))
        .cookie(cookie.clone())
        .set_json(&invalid)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"][0]["path"], "weekendMeeting.chairman");

    let too_long = json!({
        "weekStartDate": "2025-03-03",
        "midweekMeeting": { "treasuresFromGodsWord": { "bibleReadingDuration": 45 } }
    });
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/weeks/{id}"))
        .cookie(cookie.clone())
        .set_json(&too_long)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"][0]["path"], "midweekMeeting.treasuresFromGodsWord.bibleReadingDuration");

    let req = test::TestRequest::get().uri(&format!("/api/v1/weeks/{id}")).cookie(cookie.clone()).to_request();
    let read: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(read["midweekMeeting"]["openingSong"], 77);

    let req = test::TestRequest::get().uri("/api/v1/weeks/999999").cookie(cookie).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_public_schedule_page() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();
    let app = test_app!(pool);
    let cookie = login!(app);

    let week = json!({ "weekStartDate": "2025-03-03", "weekendMeeting": { "middleSong": 45 } });
    let req = test::TestRequest::post().uri("/api/v1/weeks").cookie(cookie).set_json(&week).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    // no session needed
    let resp = test::call_service(&app, test::TestRequest::get().uri("/weeks/2025-03-03").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("Week of 03.03.2025"));
    assert!(body.contains("Thu 06.03."));
    assert!(body.contains("Song 45"));

    for uri in ["/weeks/2025-03-10", "/weeks/not-a-date"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_rt::test]
async fn test_api_without_session_gets_json_401() {
    let app = test_app!(lazy_pool());
    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/weeks").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Login required");
}
