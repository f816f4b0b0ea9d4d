use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use askama::Template;
use std::fmt;

use crate::assignments::DirectoryError;

#[derive(Debug)]
pub enum AppError {
    Db(sqlx::Error),
    Template(askama::Error),
    Hash(String),
    Session(String),
    PermissionDenied(String),
    Csrf,
    NotFound,
    Directory(DirectoryError),
    Import(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Template(e) => write!(f, "Template error: {e}"),
            AppError::Hash(e) => write!(f, "Hash error: {e}"),
            AppError::Session(e) => write!(f, "Session error: {e}"),
            AppError::PermissionDenied(code) => write!(f, "Permission denied: {code}"),
            AppError::Csrf => write!(f, "Invalid or missing CSRF token"),
            AppError::NotFound => write!(f, "Not found"),
            AppError::Directory(e) => write!(f, "Directory lookup failed: {e}"),
            AppError::Import(e) => write!(f, "Import failed: {e}"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::PermissionDenied(_) | AppError::Csrf => StatusCode::FORBIDDEN,
            AppError::Session(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound => HttpResponse::NotFound().body("Not Found"),
            AppError::PermissionDenied(code) => {
                log::warn!("Permission denied: {code}");
                HttpResponse::Forbidden().body("Access denied")
            }
            AppError::Csrf => HttpResponse::Forbidden().body("Invalid or missing CSRF token"),
            AppError::Session(_) => HttpResponse::SeeOther()
                .insert_header(("Location", "/login"))
                .finish(),
            AppError::Import(e) => {
                log::error!("Meeting import failed: {e}");
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "success": false,
                    "error": e,
                }))
            }
            _ => {
                log::error!("{self}");
                HttpResponse::InternalServerError().body("Internal Server Error")
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Db(e)
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::Template(e)
    }
}

impl From<DirectoryError> for AppError {
    fn from(e: DirectoryError) -> Self {
        AppError::Directory(e)
    }
}

/// Render an Askama template into an HTML response.
pub fn render(tmpl: impl Template) -> Result<HttpResponse, AppError> {
    let body = tmpl.render()?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}
