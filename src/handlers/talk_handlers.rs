use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::audit;
use crate::auth::session::{DIRECTORY_EDIT, get_user_id, require_permission};
use crate::auth::{csrf, validate};
use crate::db::is_unique_violation;
use crate::errors::{AppError, render};
use crate::handlers::auth_handlers::CsrfOnly;
use crate::models::entity;
use crate::models::public_talk::{self, Delivery, format_deliveries, parse_deliveries};
use crate::templates_structs::{PageContext, TalkFormTemplate, TalkListRow, TalkListTemplate};

#[derive(Deserialize)]
pub struct TalkForm {
    pub number: String,
    pub title: String,
    #[serde(default)]
    pub deliveries: String,
    pub csrf_token: String,
}

impl TalkForm {
    fn parse(&self) -> Result<(i32, Vec<Delivery>), Vec<String>> {
        let mut errors = Vec::new();
        let number = match self.number.trim().parse::<i32>() {
            Ok(n) if n > 0 => Some(n),
            _ => {
                errors.push("Number must be a positive whole number".to_string());
                None
            }
        };
        errors.extend(validate::validate_required(&self.title, "Title", 200));
        let deliveries = parse_deliveries(&self.deliveries).unwrap_or_else(|e| {
            errors.push(e);
            Vec::new()
        });
        match number {
            Some(n) if errors.is_empty() => Ok((n, deliveries)),
            _ => Err(errors),
        }
    }
}

async fn render_form(
    pool: &PgPool,
    session: &Session,
    form_action: String,
    form_title: &str,
    form: (&str, &str, &str),
    errors: Vec<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(session, pool, "/admin/talks").await?;
    let (number, title, deliveries) = form;
    render(TalkFormTemplate {
        ctx,
        form_action,
        form_title: form_title.to_string(),
        number: number.to_string(),
        title: title.to_string(),
        deliveries: deliveries.to_string(),
        errors,
    })
}

pub async fn list(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    let ctx = PageContext::build(&session, &pool, "/admin/talks").await?;
    let talks = public_talk::find_all(&pool)
        .await?
        .into_iter()
        .map(|t| TalkListRow {
            id: t.id,
            numbered_title: t.numbered_title(),
            last_delivered: t.last_delivered().map(|d| d.format("%d.%m.%Y").to_string()).unwrap_or_default(),
            delivery_count: t.deliveries.len(),
        })
        .collect();
    render(TalkListTemplate { ctx, talks })
}

pub async fn new_form(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    render_form(&pool, &session, "/admin/talks".to_string(), "New public talk", ("", "", ""), vec![]).await
}

pub async fn create(
    pool: web::Data<PgPool>,
    session: Session,
    form: web::Form<TalkForm>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let action = "/admin/talks".to_string();
    let values = (form.number.as_str(), form.title.as_str(), form.deliveries.as_str());

    let (number, deliveries) = match form.parse() {
        Ok(parsed) => parsed,
        Err(errors) => return render_form(&pool, &session, action, "New public talk", values, errors).await,
    };

    match public_talk::create(&pool, number, &form.title, &deliveries).await {
        Ok(id) => {
            let current_user_id = get_user_id(&session).unwrap_or(0);
            let details = serde_json::json!({ "summary": format!("Created public talk {number}") });
            let _ = audit::log(&pool, current_user_id, "public_talk.created", "public_talk_title", id, details).await;
            let _ = session.insert("flash", "Public talk created");
            Ok(HttpResponse::SeeOther()
                .insert_header(("Location", "/admin/talks"))
                .finish())
        }
        Err(e) if is_unique_violation(&e) => {
            let errors = vec![format!("Talk number {number} already exists")];
            render_form(&pool, &session, action, "New public talk", values, errors).await
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn edit_form(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    let id = path.into_inner();
    let talk = public_talk::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    let number = talk.number.to_string();
    let deliveries = format_deliveries(&talk.deliveries);
    render_form(
        &pool,
        &session,
        format!("/admin/talks/{id}"),
        "Edit public talk",
        (number.as_str(), talk.title.as_str(), deliveries.as_str()),
        vec![],
    )
    .await
}

pub async fn update(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<TalkForm>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let id = path.into_inner();
    public_talk::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    let action = format!("/admin/talks/{id}");
    let values = (form.number.as_str(), form.title.as_str(), form.deliveries.as_str());

    let (number, deliveries) = match form.parse() {
        Ok(parsed) => parsed,
        Err(errors) => return render_form(&pool, &session, action, "Edit public talk", values, errors).await,
    };

    match public_talk::update(&pool, id, number, &form.title, &deliveries).await {
        Ok(()) => {
            let current_user_id = get_user_id(&session).unwrap_or(0);
            let details = serde_json::json!({ "summary": format!("Updated public talk {number}") });
            let _ = audit::log(&pool, current_user_id, "public_talk.updated", "public_talk_title", id, details).await;
            let _ = session.insert("flash", "Public talk saved");
            Ok(HttpResponse::SeeOther()
                .insert_header(("Location", "/admin/talks"))
                .finish())
        }
        Err(e) if is_unique_violation(&e) => {
            let errors = vec![format!("Talk number {number} already exists")];
            render_form(&pool, &session, action, "Edit public talk", values, errors).await
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn delete(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let id = path.into_inner();

    if !entity::delete_typed(&pool, "public_talk_title", id).await? {
        return Err(AppError::NotFound);
    }
    let current_user_id = get_user_id(&session).unwrap_or(0);
    let details = serde_json::json!({ "summary": format!("Deleted public talk #{id}") });
    let _ = audit::log(&pool, current_user_id, "public_talk.deleted", "public_talk_title", id, details).await;

    let _ = session.insert("flash", "Public talk deleted");
    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/admin/talks"))
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(number: &str, title: &str, deliveries: &str) -> TalkForm {
        TalkForm {
            number: number.to_string(),
            title: title.to_string(),
            deliveries: deliveries.to_string(),
            csrf_token: String::new(),
        }
    }

    #[test]
    fn valid_form_parses() {
        let (n, d) = form(" 42 ", "Love never fails", "2024-03-10 Jonas Berg").parse().unwrap();
        assert_eq!(n, 42);
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn collects_every_problem() {
        let errors = form("0", "", "10.03.2024").parse().unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
