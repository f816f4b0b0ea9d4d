use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::audit;
use crate::auth::session::{DIRECTORY_EDIT, get_user_id, require_permission};
use crate::auth::{csrf, validate};
use crate::errors::{AppError, render};
use crate::handlers::auth_handlers::CsrfOnly;
use crate::models::entity;
use crate::models::visitor::{self, Visitor};
use crate::templates_structs::{PageContext, VisitorFormTemplate, VisitorListTemplate};

#[derive(Deserialize)]
pub struct VisitorForm {
    pub name: String,
    #[serde(default)]
    pub congregation: String,
    #[serde(default)]
    pub notes: String,
    pub csrf_token: String,
}

impl VisitorForm {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(validate::validate_required(&self.name, "Name", 100));
        errors.extend(validate::validate_optional(&self.congregation, "Congregation", 100));
        errors.extend(validate::validate_optional(&self.notes, "Notes", 1000));
        errors
    }

    fn to_visitor(&self, id: i64) -> Visitor {
        Visitor {
            id,
            name: self.name.clone(),
            congregation: self.congregation.clone(),
            notes: self.notes.clone(),
        }
    }
}

async fn render_form(
    pool: &PgPool,
    session: &Session,
    form_action: String,
    form_title: &str,
    visitor: Visitor,
    errors: Vec<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(session, pool, "/admin/visitors").await?;
    render(VisitorFormTemplate { ctx, form_action, form_title: form_title.to_string(), visitor, errors })
}

pub async fn list(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    let ctx = PageContext::build(&session, &pool, "/admin/visitors").await?;
    let visitors = visitor::find_all(&pool).await?;
    render(VisitorListTemplate { ctx, visitors })
}

pub async fn new_form(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    render_form(&pool, &session, "/admin/visitors".to_string(), "New visitor", Visitor::default(), vec![]).await
}

pub async fn create(
    pool: web::Data<PgPool>,
    session: Session,
    form: web::Form<VisitorForm>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let errors = form.validate();
    if !errors.is_empty() {
        return render_form(&pool, &session, "/admin/visitors".to_string(), "New visitor", form.to_visitor(0), errors).await;
    }

    let id = visitor::create(&pool, &form.name, &form.congregation, &form.notes).await?;
    let current_user_id = get_user_id(&session).unwrap_or(0);
    let details = serde_json::json!({ "summary": format!("Created visitor '{}'", form.name.trim()) });
    let _ = audit::log(&pool, current_user_id, "visitor.created", "visitor", id, details).await;

    let _ = session.insert("flash", "Visitor created");
    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/admin/visitors"))
        .finish())
}

pub async fn edit_form(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    let id = path.into_inner();
    let v = visitor::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    render_form(&pool, &session, format!("/admin/visitors/{id}"), "Edit visitor", v, vec![]).await
}

pub async fn update(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<VisitorForm>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let id = path.into_inner();
    visitor::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;

    let errors = form.validate();
    if !errors.is_empty() {
        return render_form(&pool, &session, format!("/admin/visitors/{id}"), "Edit visitor", form.to_visitor(id), errors).await;
    }

    visitor::update(&pool, id, &form.name, &form.congregation, &form.notes).await?;
    let current_user_id = get_user_id(&session).unwrap_or(0);
    let details = serde_json::json!({ "summary": format!("Updated visitor '{}'", form.name.trim()) });
    let _ = audit::log(&pool, current_user_id, "visitor.updated", "visitor", id, details).await;

    let _ = session.insert("flash", "Visitor saved");
    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/admin/visitors"))
        .finish())
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

    if !entity::delete_typed(&pool, "visitor", id).await? {
        return Err(AppError::NotFound);
    }
    let current_user_id = get_user_id(&session).unwrap_or(0);
    let details = serde_json::json!({ "summary": format!("Deleted visitor #{id}") });
    let _ = audit::log(&pool, current_user_id, "visitor.deleted", "visitor", id, details).await;

    let _ = session.insert("flash", "Visitor deleted");
    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/admin/visitors"))
        .finish())
}
