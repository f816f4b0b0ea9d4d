use std::collections::BTreeSet;

use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::assignments::AssignmentPermission;
use crate::audit;
use crate::auth::session::{PUBLISHERS_EDIT, get_user_id, require_permission};
use crate::auth::{csrf, password, validate};
use crate::db::is_unique_violation;
use crate::errors::{AppError, render};
use crate::handlers::auth_handlers::CsrfOnly;
use crate::models::{entity, group, publisher};
use crate::models::publisher::{Absence, GENDERS, PRIVILEGES, PublisherDetail, PublisherInput};
use crate::templates_structs::{
    AbsenceRow, CheckboxOption, PageContext, PublisherFormTemplate, PublisherListRow, PublisherListTemplate,
    SelectOption, id_options,
};
use super::form::FormData;

/// Blank absence rows offered below the existing ones.
const SPARE_ABSENCE_ROWS: usize = 2;

/// Submitted publisher form, before hashing the password.
#[derive(Debug, Default)]
pub struct PublisherSubmission {
    pub input: PublisherInput,
    pub password: String,
    pub absence_rows: Vec<AbsenceRow>,
}

/// Read and validate the publisher form. Rows of the absence table with
/// both dates blank are ignored.
pub fn parse_publisher_form(form: &FormData) -> (PublisherSubmission, Vec<String>) {
    let mut errors = Vec::new();

    let username = form.get("username").trim().to_string();
    let first_name = form.get("first_name").trim().to_string();
    let surname = form.get("surname").trim().to_string();
    let email = form.get("email").trim().to_string();
    let password = form.get("password").to_string();

    errors.extend(validate::validate_required(&first_name, "First name", 100));
    errors.extend(validate::validate_required(&surname, "Surname", 100));
    errors.extend(validate::validate_optional_email(&email));
    errors.extend(validate::validate_optional(form.get("address"), "Address", 500));
    if !username.is_empty() {
        errors.extend(validate::validate_username(&username));
    }
    if !password.is_empty() {
        errors.extend(validate::validate_password(&password));
    }

    let gender = match form.get("gender") {
        g if GENDERS.iter().any(|(code, _)| *code == g) => g.to_string(),
        "" => {
            errors.push("Gender is required".to_string());
            String::new()
        }
        other => {
            errors.push(format!("Unknown gender '{other}'"));
            String::new()
        }
    };

    let privileges: Vec<String> = form
        .get_all("privileges")
        .into_iter()
        .filter(|p| PRIVILEGES.iter().any(|(code, _)| code == p))
        .map(String::from)
        .collect();

    let assignment_permissions: BTreeSet<AssignmentPermission> = form
        .get_all("assignment_permissions")
        .into_iter()
        .filter_map(AssignmentPermission::parse)
        .collect();

    let starts = form.get_all("absence_start");
    let ends = form.get_all("absence_end");
    let reasons = form.get_all("absence_reason");
    let mut absences = Vec::new();
    let mut absence_rows = Vec::new();
    for (i, start) in starts.iter().enumerate() {
        let row = AbsenceRow {
            start_date: start.trim().to_string(),
            end_date: ends.get(i).map(|s| s.trim()).unwrap_or("").to_string(),
            reason: reasons.get(i).map(|s| s.trim()).unwrap_or("").to_string(),
        };
        if row.start_date.is_empty() && row.end_date.is_empty() {
            continue;
        }
        let start = NaiveDate::parse_from_str(&row.start_date, "%Y-%m-%d");
        let end = NaiveDate::parse_from_str(&row.end_date, "%Y-%m-%d");
        match (start, end) {
            (Ok(start_date), Ok(end_date)) => {
                match validate::validate_date_range(start_date, end_date, "Absence") {
                    Some(e) => errors.push(e),
                    None => absences.push(Absence { start_date, end_date, reason: row.reason.clone() }),
                }
            }
            _ => errors.push("Absence: both dates are required (YYYY-MM-DD)".to_string()),
        }
        absence_rows.push(row);
    }

    let input = PublisherInput {
        username,
        first_name,
        surname,
        gender,
        email,
        address: form.get("address").trim().to_string(),
        privileges,
        assignment_permissions,
        group_id: form.get_id("group_id"),
        absences,
        password_hash: None,
    };
    (PublisherSubmission { input, password, absence_rows }, errors)
}

fn absence_rows(absences: &[Absence]) -> Vec<AbsenceRow> {
    let mut rows: Vec<AbsenceRow> = absences
        .iter()
        .map(|a| AbsenceRow {
            start_date: a.start_date.format("%Y-%m-%d").to_string(),
            end_date: a.end_date.format("%Y-%m-%d").to_string(),
            reason: a.reason.clone(),
        })
        .collect();
    rows.extend(std::iter::repeat_with(AbsenceRow::default).take(SPARE_ABSENCE_ROWS));
    rows
}

async fn render_form(
    pool: &PgPool,
    session: &Session,
    form_action: String,
    form_title: &str,
    detail: PublisherDetail,
    rows: Vec<AbsenceRow>,
    errors: Vec<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(session, pool, "/admin/publishers").await?;
    let groups = id_options(&group::find_options(pool).await?, detail.group_id);
    let genders = GENDERS
        .iter()
        .map(|(code, label)| SelectOption::new(*code, *label, detail.gender == *code))
        .collect();
    let privileges = PRIVILEGES
        .iter()
        .map(|(code, label)| CheckboxOption {
            value: code.to_string(),
            label: label.to_string(),
            checked: detail.has_privilege(code),
        })
        .collect();
    let permissions = AssignmentPermission::ALL
        .iter()
        .map(|p| CheckboxOption {
            value: p.as_str().to_string(),
            label: p.label().to_string(),
            checked: detail.assignment_permissions.contains(p),
        })
        .collect();

    render(PublisherFormTemplate {
        ctx,
        form_action,
        form_title: form_title.to_string(),
        username: detail.username,
        first_name: detail.first_name,
        surname: detail.surname,
        email: detail.email,
        address: detail.address,
        genders,
        groups,
        privileges,
        permissions,
        absences: rows,
        has_login: detail.has_login,
        errors,
    })
}

/// Form values redisplayed after a rejected submission.
fn detail_from_submission(id: i64, sub: &PublisherSubmission, has_login: bool) -> PublisherDetail {
    let input = &sub.input;
    PublisherDetail {
        id,
        username: input.username.clone(),
        first_name: input.first_name.clone(),
        surname: input.surname.clone(),
        gender: input.gender.clone(),
        email: input.email.clone(),
        address: input.address.clone(),
        privileges: input.privileges.clone(),
        assignment_permissions: input.assignment_permissions.clone(),
        group_id: input.group_id,
        absences: Vec::new(),
        has_login,
    }
}

fn hash_if_given(password: &str) -> Result<Option<String>, AppError> {
    if password.is_empty() {
        Ok(None)
    } else {
        password::hash_password(password).map(Some)
    }
}

pub async fn list(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, PUBLISHERS_EDIT)?;

    let ctx = PageContext::build(&session, &pool, "/admin/publishers").await?;
    let publishers = publisher::find_all(&pool)
        .await?
        .into_iter()
        .map(|p| PublisherListRow {
            id: p.id,
            gender: GENDERS
                .iter()
                .find(|(code, _)| *code == p.gender)
                .map(|(_, label)| label.to_string())
                .unwrap_or_default(),
            permissions: p
                .permissions
                .split(',')
                .filter_map(AssignmentPermission::parse)
                .map(|perm| perm.label().to_string())
                .collect(),
            display_name: p.display_name,
            group_name: p.group_name,
        })
        .collect();

    render(PublisherListTemplate { ctx, publishers })
}

pub async fn new_form(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, PUBLISHERS_EDIT)?;
    let detail = PublisherDetail { gender: "brother".to_string(), ..Default::default() };
    render_form(&pool, &session, "/admin/publishers".to_string(), "New publisher", detail, absence_rows(&[]), vec![]).await
}

pub async fn create(
    pool: web::Data<PgPool>,
    session: Session,
    body: String,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, PUBLISHERS_EDIT)?;
    let form = FormData::parse(&body);
    csrf::validate_csrf(&session, form.csrf_token())?;

    let (mut sub, errors) = parse_publisher_form(&form);
    if !errors.is_empty() {
        let rows = sub.absence_rows.clone();
        let detail = detail_from_submission(0, &sub, false);
        return render_form(&pool, &session, "/admin/publishers".to_string(), "New publisher", detail, rows, errors).await;
    }
    sub.input.password_hash = hash_if_given(&sub.password)?;

    match publisher::create(&pool, &sub.input).await {
        Ok(id) => {
            let current_user_id = get_user_id(&session).unwrap_or(0);
            let name = sub.input.display_name();
            let details = serde_json::json!({
                "permissions": sub.input.assignment_permissions.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
                "summary": format!("Created publisher '{name}'")
            });
            let _ = audit::log(&pool, current_user_id, "publisher.created", "user", id, details).await;

            let _ = session.insert("flash", format!("Publisher '{name}' created"));
            Ok(HttpResponse::SeeOther()
                .insert_header(("Location", "/admin/publishers"))
                .finish())
        }
        Err(e) if is_unique_violation(&e) => {
            let rows = sub.absence_rows.clone();
            let detail = detail_from_submission(0, &sub, false);
            let errors = vec![format!("Username '{}' is already taken", sub.input.username)];
            render_form(&pool, &session, "/admin/publishers".to_string(), "New publisher", detail, rows, errors).await
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn edit_form(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, PUBLISHERS_EDIT)?;
    let id = path.into_inner();

    let detail = publisher::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    let rows = absence_rows(&detail.absences);
    render_form(&pool, &session, format!("/admin/publishers/{id}"), "Edit publisher", detail, rows, vec![]).await
}

pub async fn update(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    body: String,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, PUBLISHERS_EDIT)?;
    let form = FormData::parse(&body);
    csrf::validate_csrf(&session, form.csrf_token())?;
    let id = path.into_inner();

    let existing = publisher::find_by_id(&pool, id).await?.ok_or(AppError::NotFound)?;
    let (mut sub, errors) = parse_publisher_form(&form);
    if !errors.is_empty() {
        let rows = sub.absence_rows.clone();
        let detail = detail_from_submission(id, &sub, existing.has_login);
        return render_form(&pool, &session, format!("/admin/publishers/{id}"), "Edit publisher", detail, rows, errors).await;
    }
    sub.input.password_hash = hash_if_given(&sub.password)?;

    match publisher::update(&pool, id, &sub.input).await {
        Ok(()) => {
            let current_user_id = get_user_id(&session).unwrap_or(0);
            let name = sub.input.display_name();
            let details = serde_json::json!({
                "permissions": sub.input.assignment_permissions.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
                "password_changed": sub.input.password_hash.is_some(),
                "summary": format!("Updated publisher '{name}'")
            });
            let _ = audit::log(&pool, current_user_id, "publisher.updated", "user", id, details).await;

            let _ = session.insert("flash", format!("Publisher '{name}' saved"));
            Ok(HttpResponse::SeeOther()
                .insert_header(("Location", "/admin/publishers"))
                .finish())
        }
        Err(e) if is_unique_violation(&e) => {
            let rows = sub.absence_rows.clone();
            let detail = detail_from_submission(id, &sub, existing.has_login);
            let errors = vec![format!("Username '{}' is already taken", sub.input.username)];
            render_form(&pool, &session, format!("/admin/publishers/{id}"), "Edit publisher", detail, rows, errors).await
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
    require_permission(&session, PUBLISHERS_EDIT)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let id = path.into_inner();

    let current_user_id = get_user_id(&session).unwrap_or(0);
    if id == current_user_id {
        let _ = session.insert("flash", "You cannot delete your own account");
    } else if entity::delete_typed(&pool, "user", id).await? {
        let details = serde_json::json!({ "summary": format!("Deleted publisher #{id}") });
        let _ = audit::log(&pool, current_user_id, "publisher.deleted", "user", id, details).await;
        let _ = session.insert("flash", "Publisher deleted");
    } else {
        return Err(AppError::NotFound);
    }

    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/admin/publishers"))
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(body: &str) -> FormData {
        FormData::parse(body)
    }

    #[test]
    fn parses_checkbox_groups_and_absences() {
        let (sub, errors) = parse_publisher_form(&form(
            "first_name=Anna&surname=Lind&gender=sister\
             &privileges=pioneer&privileges=bogus\
             &assignment_permissions=prayer&assignment_permissions=bible-reading\
             &absence_start=2025-07-01&absence_end=2025-07-14&absence_reason=Urlaub\
             &absence_start=&absence_end=&absence_reason=",
        ));
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(sub.input.display_name(), "Anna Lind");
        assert_eq!(sub.input.privileges, vec!["pioneer".to_string()]);
        assert!(sub.input.assignment_permissions.contains(&AssignmentPermission::Prayer));
        assert!(sub.input.assignment_permissions.contains(&AssignmentPermission::BibleReading));
        assert_eq!(sub.input.absences.len(), 1);
        assert_eq!(sub.input.absences[0].reason, "Urlaub");
        assert_eq!(sub.absence_rows.len(), 1);
    }

    #[test]
    fn absence_ending_before_start_is_rejected() {
        let (sub, errors) = parse_publisher_form(&form(
            "first_name=Ben&surname=Kraus&gender=brother\
             &absence_start=2025-07-14&absence_end=2025-07-01&absence_reason=",
        ));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("end date"));
        assert!(sub.input.absences.is_empty());
        // redisplayed as typed
        assert_eq!(sub.absence_rows[0].start_date, "2025-07-14");
    }

    #[test]
    fn names_and_gender_are_required() {
        let (_, errors) = parse_publisher_form(&form("first_name=&surname=&gender="));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn short_password_is_rejected_blank_is_kept() {
        let (_, errors) = parse_publisher_form(&form("first_name=A&surname=B&gender=brother&password=short"));
        assert_eq!(errors, vec!["Password must be at least 8 characters".to_string()]);
        let (sub, errors) = parse_publisher_form(&form("first_name=A&surname=B&gender=brother&password="));
        assert!(errors.is_empty());
        assert!(sub.password.is_empty());
    }
}
