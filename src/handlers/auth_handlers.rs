use actix_session::Session;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::models::{congregation, permission, publisher, setting};
use crate::auth::{csrf, password, rate_limit::RateLimiter};
use crate::errors::{AppError, render};
use crate::templates_structs::LoginTemplate;

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct CsrfOnly {
    pub csrf_token: String,
}

async fn login_error(pool: &PgPool, session: &Session, message: &str) -> Result<HttpResponse, AppError> {
    let app_name = setting::get_value(pool, congregation::NAME, "Versammlung").await;
    let csrf_token = csrf::get_or_create_token(session);
    render(LoginTemplate { error: Some(message.to_string()), app_name, csrf_token })
}

pub async fn login_page(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    if session.get::<i64>("user_id").unwrap_or(None).is_some() {
        return Ok(HttpResponse::SeeOther()
            .insert_header(("Location", "/dashboard"))
            .finish());
    }

    let app_name = setting::get_value(&pool, congregation::NAME, "Versammlung").await;
    let csrf_token = csrf::get_or_create_token(&session);
    render(LoginTemplate { error: None, app_name, csrf_token })
}

pub async fn login_submit(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    form: web::Form<LoginForm>,
    limiter: web::Data<RateLimiter>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    // Rate-limit check before any database access
    let ip = req.peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED));

    if limiter.is_blocked(ip) {
        log::warn!("Login blocked for {ip}: too many failed attempts");
        return login_error(&pool, &session, "Too many failed login attempts. Please try again later.").await;
    }

    let found = publisher::find_login(&pool, form.username.trim()).await?;
    let user = match found {
        Some(u) if password::verify_password(&form.password, &u.password) => u,
        _ => {
            limiter.record_failure(ip);
            log::info!("Failed login for '{}' from {ip}", form.username.trim());
            return login_error(&pool, &session, "Invalid username or password").await;
        }
    };

    limiter.clear(ip);
    let perms = permission::find_codes_by_user_id(&pool, user.id).await?;

    session.renew();
    let _ = session.insert("user_id", user.id);
    let _ = session.insert("username", &user.username);
    let _ = session.insert("permissions", perms.join(","));
    log::info!("User '{}' logged in", user.username);

    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/dashboard"))
        .finish())
}

pub async fn logout(
    session: Session,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    session.purge();
    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/login"))
        .finish())
}
