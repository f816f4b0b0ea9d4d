use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::audit;
use crate::auth::session::{DIRECTORY_EDIT, get_user_id, require_permission};
use crate::auth::{csrf, validate};
use crate::errors::{AppError, render};
use crate::handlers::auth_handlers::CsrfOnly;
use crate::models::field_service::{self, FieldServiceDetail, FieldServiceInput};
use crate::models::{entity, group, publisher};
use crate::schedule::timing::parse_time_of_day;
use crate::templates_structs::{FieldServiceFormTemplate, FieldServiceListTemplate, PageContext, id_options};
use super::form::FormData;

/// Form values as typed, plus the parsed input when valid.
fn parse_form(form: &FormData) -> (FieldServiceDetail, Result<FieldServiceInput, Vec<String>>) {
    let detail = FieldServiceDetail {
        id: 0,
        date: form.get("date").trim().to_string(),
        time: form.get("time").trim().to_string(),
        location: form.get("location").trim().to_string(),
        notes: form.get("notes").trim().to_string(),
        group_id: form.get_id("group_id"),
        conductor_id: form.get_id("conductor_id"),
    };

    let mut errors = Vec::new();
    let date = NaiveDate::parse_from_str(&detail.date, "%Y-%m-%d").ok();
    if date.is_none() {
        errors.push("Date is required (YYYY-MM-DD)".to_string());
    }
    let time = parse_time_of_day(&detail.time);
    if time.is_none() {
        errors.push("Time is required (HH:MM)".to_string());
    }
    errors.extend(validate::validate_required(&detail.location, "Location", 200));
    errors.extend(validate::validate_optional(&detail.notes, "Notes", 1000));

    let input = match (date, time) {
        (Some(date), Some(time)) if errors.is_empty() => Ok(FieldServiceInput {
            date,
            time,
            location: detail.location.clone(),
            notes: detail.notes.clone(),
            group_id: detail.group_id,
            conductor_id: detail.conductor_id,
        }),
        _ => Err(errors),
    };
    (detail, input)
}

async fn render_form(
    pool: &PgPool,
    session: &Session,
    form_action: String,
    form_title: &str,
    detail: FieldServiceDetail,
    errors: Vec<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(session, pool, "/admin/field-service").await?;
    let groups = id_options(&group::find_options(pool).await?, detail.group_id);
    let conductors = id_options(&publisher::find_options(pool).await?, detail.conductor_id);
    render(FieldServiceFormTemplate {
        ctx,
        form_action,
        form_title: form_title.to_string(),
        date: detail.date,
        time: detail.time,
        location: detail.location,
        notes: detail.notes,
        groups,
        conductors,
        errors,
    })
}

pub async fn list(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    let ctx = PageContext::build(&session, &pool, "/admin/field-service").await?;
    let meetings = field_service::find_all(&pool).await?;
    render(FieldServiceListTemplate { ctx, meetings })
}

pub async fn new_form(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    let detail = FieldServiceDetail::default();
    render_form(&pool, &session, "/admin/field-service".to_string(), "New field service meeting", detail, vec![]).await
}

pub async fn create(
    pool: web::Data<PgPool>,
    session: Session,
    body: String,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    let form = FormData::parse(&body);
    csrf::validate_csrf(&session, form.csrf_token())?;

    let (detail, parsed) = parse_form(&form);
    let input = match parsed {
        Ok(input) => input,
        Err(errors) => {
            return render_form(&pool, &session, "/admin/field-service".to_string(), "New field service meeting", detail, errors).await;
        }
    };

    let id = field_service::create(&pool, &input).await?;
    let current_user_id = get_user_id(&session).unwrap_or(0);
    let details = serde_json::json!({
        "summary": format!("Created field service meeting on {}", input.date.format("%Y-%m-%d"))
    });
    let _ = audit::log(&pool, current_user_id, "field_service.created", "field_service_meeting", id, details).await;

    let _ = session.insert("flash", "Field service meeting created");
    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/admin/field-service"))
        .finish())
}

pub async fn edit_form(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, DIRECTORY_EDIT)?;
    let id = path.into_inner();
    let detail = field_service::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    render_form(&pool, &session, format!("/admin/field-service/{id}"), "Edit field service meeting", detail, vec![]).await
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
    field_service::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;

    let (detail, parsed) = parse_form(&form);
    let input = match parsed {
        Ok(input) => input,
        Err(errors) => {
            return render_form(&pool, &session, format!("/admin/field-service/{id}"), "Edit field service meeting", detail, errors).await;
        }
    };

    field_service::update(&pool, id, &input).await?;
    let current_user_id = get_user_id(&session).unwrap_or(0);
    let details = serde_json::json!({
        "summary": format!("Updated field service meeting on {}", input.date.format("%Y-%m-%d"))
    });
    let _ = audit::log(&pool, current_user_id, "field_service.updated", "field_service_meeting", id, details).await;

    let _ = session.insert("flash", "Field service meeting saved");
    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/admin/field-service"))
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

    if !entity::delete_typed(&pool, "field_service_meeting", id).await? {
        return Err(AppError::NotFound);
    }
    let current_user_id = get_user_id(&session).unwrap_or(0);
    let details = serde_json::json!({ "summary": format!("Deleted field service meeting #{id}") });
    let _ = audit::log(&pool, current_user_id, "field_service.deleted", "field_service_meeting", id, details).await;

    let _ = session.insert("flash", "Field service meeting deleted");
    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/admin/field-service"))
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_meeting() {
        let form = FormData::parse("date=2025-03-08&time=09%3A30&location=Saal&group_id=4&conductor_id=");
        let (_, parsed) = parse_form(&form);
        let input = parsed.unwrap();
        assert_eq!(input.time.format("%H:%M").to_string(), "09:30");
        assert_eq!(input.group_id, Some(4));
        assert_eq!(input.conductor_id, None);
    }

    #[test]
    fn keeps_typed_values_when_invalid() {
        let form = FormData::parse("date=08.03.2025&time=&location=Saal");
        let (detail, parsed) = parse_form(&form);
        assert_eq!(parsed.unwrap_err().len(), 2);
        assert_eq!(detail.date, "08.03.2025");
    }
}
