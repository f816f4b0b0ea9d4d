use actix_session::Session;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::audit;
use crate::auth::session::{DIRECTORY_EDIT, get_user_id, require_permission};
use crate::auth::{csrf, validate};
use crate::errors::{AppError, render};
use crate::handlers::auth_handlers::CsrfOnly;
use crate::models::{entity, group, publisher};
use crate::templates_structs::{GroupFormTemplate, GroupListTemplate, PageContext, id_options};
use super::form::FormData;

#[allow(clippy::too_many_arguments)]
async fn render_form(
    pool: &PgPool,
    session: &Session,
    form_action: String,
    form_title: &str,
    name: String,
    overseer_id: Option<i64>,
    assistant_id: Option<i64>,
    errors: Vec<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(session, pool, "/admin/groups").await?;
    let people = publisher::find_options(pool).await?;
    render(GroupFormTemplate {
        ctx,
        form_action,
        form_title: form_title.to_string(),
        name,
        overseers: id_options(&people, overseer_id),
        assistants: id_options(&people, assistant_id),
        errors,
    })
}

pub async fn list(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    let ctx = PageContext::build(&session, &pool, "/admin/groups").await?;
    let groups = group::find_all(&pool).await?;
    render(GroupListTemplate { ctx, groups })
}

pub async fn new_form(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    render_form(&pool, &session, "/admin/groups".to_string(), "New group", String::new(), None, None, vec![]).await
}

pub async fn create(
    pool: web::Data<PgPool>,
    session: Session,
    body: String,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    let form = FormData::parse(&body);
    csrf::validate_csrf(&session, form.csrf_token())?;

    let name = form.get("name").trim().to_string();
    let overseer_id = form.get_id("overseer_id");
    let assistant_id = form.get_id("assistant_id");
    if let Some(e) = validate::validate_required(&name, "Name", 100) {
        return render_form(&pool, &session, "/admin/groups".to_string(), "New group", name, overseer_id, assistant_id, vec![e]).await;
    }

    let id = group::create(&pool, &name, overseer_id, assistant_id).await?;
    let current_user_id = get_user_id(&session).unwrap_or(0);
    let details = serde_json::json!({ "summary": format!("Created group '{name}'") });
    let _ = audit::log(&pool, current_user_id, "group.created", "group", id, details).await;

    let _ = session.insert("flash", "Group created");
    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/admin/groups"))
        .finish())
}

pub async fn edit_form(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    let id = path.into_inner();
    let g = group::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    render_form(&pool, &session, format!("/admin/groups/{id}"), "Edit group", g.name, g.overseer_id, g.assistant_id, vec![]).await
}

pub async fn update(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    body: String,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    let form = FormData::parse(&body);
    csrf::validate_csrf(&session, form.csrf_token())?;
    let id = path.into_inner();
    group::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;

    let name = form.get("name").trim().to_string();
    let overseer_id = form.get_id("overseer_id");
    let assistant_id = form.get_id("assistant_id");
    if let Some(e) = validate::validate_required(&name, "Name", 100) {
        return render_form(&pool, &session, format!("/admin/groups/{id}"), "Edit group", name, overseer_id, assistant_id, vec![e]).await;
    }

    group::update(&pool, id, &name, overseer_id, assistant_id).await?;
    let current_user_id = get_user_id(&session).unwrap_or(0);
    let details = serde_json::json!({ "summary": format!("Updated group '{name}'") });
    let _ = audit::log(&pool, current_user_id, "group.updated", "group", id, details).await;

    let _ = session.insert("flash", "Group saved");
    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/admin/groups"))
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

    if !entity::delete_typed(&pool, "group", id).await? {
        return Err(AppError::NotFound);
    }
    let current_user_id = get_user_id(&session).unwrap_or(0);
    let details = serde_json::json!({ "summary": format!("Deleted group #{id}") });
    let _ = audit::log(&pool, current_user_id, "group.deleted", "group", id, details).await;

    let _ = session.insert("flash", "Group deleted");
    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/admin/groups"))
        .finish())
}
