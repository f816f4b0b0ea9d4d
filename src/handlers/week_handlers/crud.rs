use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::{Datelike, Days, Local};
use sqlx::PgPool;

use crate::assignments::load_all_candidates;
use crate::audit;
use crate::auth::session::{WEEKS_EDIT, get_user_id, require_permission, require_user_id};
use crate::auth::csrf;
use crate::errors::{AppError, render};
use crate::handlers::auth_handlers::CsrfOnly;
use crate::handlers::form::FormData;
use crate::models::congregation::CongregationSettings;
use crate::models::directory::PgDirectory;
use crate::models::{entity, public_talk, week};
use crate::models::week::WeekDocument;
use crate::schedule::recompute_for_display;
use crate::templates_structs::{PageContext, WeekFormTemplate};
use super::form::{SlotContext, build_view, parse_week_form};
use super::save::{FieldMessage, SaveOutcome, save_week};

async fn render_week_form(
    pool: &PgPool,
    session: &Session,
    week_id: Option<i64>,
    doc: &WeekDocument,
    errors: Vec<FieldMessage>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(session, pool, "/admin/weeks").await?;
    let settings = CongregationSettings::load(pool).await?;
    let doc = recompute_for_display(doc, &settings);

    let candidates = load_all_candidates(&PgDirectory::new(pool)).await?;
    let names = week::assignee_names(pool, &doc.references()).await?;
    let talks = public_talk::find_all(pool).await?;

    let slots = SlotContext { candidates: &candidates, names: &names, errors: &errors };
    let view = build_view(&doc, &slots, &talks, &settings);

    let (form_action, form_title) = match week_id {
        Some(id) => (format!("/admin/weeks/{id}"), "Edit week"),
        None => ("/admin/weeks".to_string(), "New week"),
    };
    render(WeekFormTemplate {
        ctx,
        form_action,
        form_title: form_title.to_string(),
        week_id,
        view,
        errors: errors.into_iter().map(|e| e.message).collect(),
    })
}

/// Monday of the week after the latest stored one, or of the current week.
async fn next_start_date(pool: &PgPool) -> Result<chrono::NaiveDate, AppError> {
    let latest = week::find_all(pool).await?.into_iter().find_map(|w| w.document.week_start_date);
    Ok(match latest {
        Some(d) => d + Days::new(7),
        None => {
            let today = Local::now().date_naive();
            today - Days::new(u64::from(today.weekday().num_days_from_monday()))
        }
    })
}

pub async fn new_form(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, WEEKS_EDIT)?;
    let doc = WeekDocument { week_start_date: Some(next_start_date(&pool).await?), ..Default::default() };
    render_week_form(&pool, &session, None, &doc, vec![]).await
}

async fn submit(
    pool: &PgPool,
    session: &Session,
    id: Option<i64>,
    body: &str,
) -> Result<HttpResponse, AppError> {
    let form = FormData::parse(body);
    csrf::validate_csrf(session, form.csrf_token())?;
    let user_id = require_user_id(session)?;

    let (doc, parse_errors) = parse_week_form(&form);
    if !parse_errors.is_empty() {
        return render_week_form(pool, session, id, &doc, parse_errors).await;
    }

    let outcome = save_week(pool, id, doc, user_id).await?;
    let errors = outcome.messages();
    match outcome {
        SaveOutcome::Saved(saved) => {
            let flash = if id.is_some() { "Week saved" } else { "Week created" };
            let _ = session.insert("flash", flash);
            Ok(HttpResponse::SeeOther()
                .insert_header(("Location", format!("/admin/weeks/{}/edit", saved.id)))
                .finish())
        }
        SaveOutcome::Duplicate { document, .. } | SaveOutcome::Rejected { document, .. } => {
            render_week_form(pool, session, id, &document, errors).await
        }
    }
}

pub async fn create(
    pool: web::Data<PgPool>,
    session: Session,
    body: String,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, WEEKS_EDIT)?;
    submit(&pool, &session, None, &body).await
}

pub async fn edit_form(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, WEEKS_EDIT)?;
    let id = path.into_inner();
    let stored = week::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    render_week_form(&pool, &session, Some(id), &stored.document, vec![]).await
}

pub async fn update(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    body: String,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, WEEKS_EDIT)?;
    let id = path.into_inner();
    week::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    submit(&pool, &session, Some(id), &body).await
}

pub async fn delete(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, WEEKS_EDIT)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let id = path.into_inner();

    if !entity::delete_typed(&pool, "week", id).await? {
        return Err(AppError::NotFound);
    }
    let current_user_id = get_user_id(&session).unwrap_or(0);
    let details = serde_json::json!({ "summary": format!("Deleted week #{id}") });
    let _ = audit::log(&pool, current_user_id, "week.deleted", "week", id, details).await;
    let _ = session.insert("flash", "Week deleted");
    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/admin/weeks"))
        .finish())
}
