use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, cookie::Key, middleware, web};

use versammlung::auth::{self, rate_limit::RateLimiter};
use versammlung::config::AppConfig;
use versammlung::{db, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    let pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    db::run_migrations(&pool).await.expect("Failed to run migrations");

    // Seed relation types, roles, assignment permissions, settings and the admin account if empty
    let admin_hash = auth::password::hash_password(&config.admin_password)
        .expect("Failed to hash admin password");
    db::seed(&pool, &admin_hash).await.expect("Failed to seed database");

    // Without SESSION_KEY sessions are lost on restart
    let secret_key = match &config.session_key {
        Some(bytes) => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(bytes.as_slice())
        }
        None => {
            log::warn!("No usable SESSION_KEY set, generating random key");
            Key::generate()
        }
    };

    let limiter = web::Data::new(RateLimiter::new());
    let scraper = web::Data::new(config.scraper.clone());

    log::info!("Starting server at http://{}", config.bind_addr);

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(
            CookieSessionStore::default(),
            secret_key.clone(),
        )
        .cookie_secure(false)
        .cookie_http_only(true)
        .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(pool.clone()))
            .app_data(limiter.clone())
            .app_data(scraper.clone())
            // Static files
            .service(actix_files::Files::new("/static", "./static"))
            // Public routes
            .route("/login", web::get().to(handlers::auth_handlers::login_page))
            .route("/login", web::post().to(handlers::auth_handlers::login_submit))
            .route("/weeks/{date}", web::get().to(handlers::schedule_handlers::week_schedule))
            // Root redirect
            .route("/", web::get().to(|| async {
                actix_web::HttpResponse::SeeOther()
                    .insert_header(("Location", "/dashboard"))
                    .finish()
            }))
            // Protected routes
            .service(
                web::scope("")
                    .wrap(actix_web::middleware::from_fn(auth::middleware::require_auth))
                    .route("/dashboard", web::get().to(handlers::dashboard::index))
                    .route("/logout", web::post().to(handlers::auth_handlers::logout))
                    // Weeks (/new before /{id})
                    .route("/admin/weeks", web::get().to(handlers::week_handlers::list))
                    .route("/admin/weeks/new", web::get().to(handlers::week_handlers::new_form))
                    .route("/admin/weeks", web::post().to(handlers::week_handlers::create))
                    .route("/admin/weeks/{id}/edit", web::get().to(handlers::week_handlers::edit_form))
                    .route("/admin/weeks/{id}", web::post().to(handlers::week_handlers::update))
                    .route("/admin/weeks/{id}/delete", web::post().to(handlers::week_handlers::delete))
                    // Publishers
                    .route("/admin/publishers", web::get().to(handlers::publisher_handlers::list))
                    .route("/admin/publishers/new", web::get().to(handlers::publisher_handlers::new_form))
                    .route("/admin/publishers", web::post().to(handlers::publisher_handlers::create))
                    .route("/admin/publishers/{id}/edit", web::get().to(handlers::publisher_handlers::edit_form))
                    .route("/admin/publishers/{id}", web::post().to(handlers::publisher_handlers::update))
                    .route("/admin/publishers/{id}/delete", web::post().to(handlers::publisher_handlers::delete))
                    // Visitors
                    .route("/admin/visitors", web::get().to(handlers::visitor_handlers::list))
                    .route("/admin/visitors/new", web::get().to(handlers::visitor_handlers::new_form))
                    .route("/admin/visitors", web::post().to(handlers::visitor_handlers::create))
                    .route("/admin/visitors/{id}/edit", web::get().to(handlers::visitor_handlers::edit_form))
                    .route("/admin/visitors/{id}", web::post().to(handlers::visitor_handlers::update))
                    .route("/admin/visitors/{id}/delete", web::post().to(handlers::visitor_handlers::delete))
                    // Groups
                    .route("/admin/groups", web::get().to(handlers::group_handlers::list))
                    .route("/admin/groups/new", web::get().to(handlers::group_handlers::new_form))
                    .route("/admin/groups", web::post().to(handlers::group_handlers::create))
                    .route("/admin/groups/{id}/edit", web::get().to(handlers::group_handlers::edit_form))
                    .route("/admin/groups/{id}", web::post().to(handlers::group_handlers::update))
                    .route("/admin/groups/{id}/delete", web::post().to(handlers::group_handlers::delete))
                    // Public talk titles
                    .route("/admin/talks", web::get().to(handlers::talk_handlers::list))
                    .route("/admin/talks/new", web::get().to(handlers::talk_handlers::new_form))
                    .route("/admin/talks", web::post().to(handlers::talk_handlers::create))
                    .route("/admin/talks/{id}/edit", web::get().to(handlers::talk_handlers::edit_form))
                    .route("/admin/talks/{id}", web::post().to(handlers::talk_handlers::update))
                    .route("/admin/talks/{id}/delete", web::post().to(handlers::talk_handlers::delete))
                    // Field service meetings
                    .route("/admin/field-service", web::get().to(handlers::field_service_handlers::list))
                    .route("/admin/field-service/new", web::get().to(handlers::field_service_handlers::new_form))
                    .route("/admin/field-service", web::post().to(handlers::field_service_handlers::create))
                    .route("/admin/field-service/{id}/edit", web::get().to(handlers::field_service_handlers::edit_form))
                    .route("/admin/field-service/{id}", web::post().to(handlers::field_service_handlers::update))
                    .route("/admin/field-service/{id}/delete", web::post().to(handlers::field_service_handlers::delete))
                    // Settings
                    .route("/admin/settings", web::get().to(handlers::settings_handlers::list))
                    .route("/admin/settings", web::post().to(handlers::settings_handlers::save))
                    // JSON
                    .route("/api/import-meeting", web::get().to(handlers::import_handlers::import_meeting))
                    .service(web::scope("/api/v1").configure(handlers::api_v1::configure))
            )
            // Default 404 handler (must be registered last)
            .default_service(web::to(|| async {
                let html = include_str!("../templates/errors/404.html");
                actix_web::HttpResponse::NotFound()
                    .content_type("text/html; charset=utf-8")
                    .body(html)
            }))
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
