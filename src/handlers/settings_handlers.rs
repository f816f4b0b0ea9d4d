use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::Weekday;
use sqlx::PgPool;

use crate::audit;
use crate::auth::csrf;
use crate::auth::session::{SETTINGS_MANAGE, get_user_id, require_permission};
use crate::errors::{AppError, render};
use crate::models::setting::{self, SettingDisplay};
use crate::schedule::TimeFormat;
use crate::schedule::dates::{parse_weekday, weekday_value};
use crate::schedule::timing::parse_time_of_day;
use crate::templates_structs::{PageContext, SelectOption, SettingsTemplate};
use super::form::FormData;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Check a submitted value against the setting's type and normalize it.
/// Empty is allowed everywhere and means "not set".
pub fn normalize_value(setting_type: &str, value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(String::new());
    }
    match setting_type {
        "weekday" => parse_weekday(value)
            .map(|d| weekday_value(d).to_string())
            .ok_or_else(|| format!("'{value}' is not a weekday")),
        "time" => parse_time_of_day(value)
            .map(|t| t.format("%H:%M").to_string())
            .ok_or_else(|| format!("'{value}' is not a time of day (HH:MM)")),
        "number" => value
            .parse::<u32>()
            .map(|n| n.to_string())
            .map_err(|_| format!("'{value}' is not a whole number of minutes")),
        "time_format" => match value {
            "24h" | "12h" => Ok(value.to_string()),
            _ => Err(format!("'{value}' is not a time format")),
        },
        _ => Ok(value.to_string()),
    }
}

async fn render_page(
    pool: &PgPool,
    session: &Session,
    settings: Vec<SettingDisplay>,
    errors: Vec<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(session, pool, "/admin/settings").await?;
    let weekdays = WEEKDAYS
        .iter()
        .map(|d| SelectOption::new(weekday_value(*d), weekday_label(*d), false))
        .collect();
    let time_formats = [TimeFormat::TwentyFourHour, TimeFormat::TwelveHour]
        .iter()
        .map(|f| {
            let label = match f {
                TimeFormat::TwentyFourHour => "24-hour (19:30)",
                TimeFormat::TwelveHour => "12-hour (7:30 PM)",
            };
            SelectOption::new(f.value(), label, false)
        })
        .collect();
    render(SettingsTemplate { ctx, settings, weekdays, time_formats, errors })
}

pub async fn list(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, SETTINGS_MANAGE)?;
    let settings = setting::find_all(&pool).await?;
    render_page(&pool, &session, settings, Vec::new()).await
}

pub async fn save(
    pool: web::Data<PgPool>,
    session: Session,
    body: String,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, SETTINGS_MANAGE)?;

    let form = FormData::parse(&body);
    csrf::validate_csrf(&session, form.csrf_token())?;

    let current_user_id = get_user_id(&session).unwrap_or(0);
    let mut settings = setting::find_all(&pool).await?;

    // Each setting is submitted as setting_<id>=<value>
    let mut errors = Vec::new();
    let mut updates = Vec::new();
    for s in settings.iter_mut() {
        let key = format!("setting_{}", s.id);
        if !form.contains(&key) {
            continue;
        }
        match normalize_value(&s.setting_type, form.get(&key)) {
            Ok(v) => {
                if v != s.value {
                    updates.push((s.id, s.name.clone(), v.clone()));
                }
                s.value = v;
            }
            Err(e) => {
                errors.push(format!("{}: {e}", s.label));
                s.value = form.get(&key).to_string();
            }
        }
    }

    if !errors.is_empty() {
        return render_page(&pool, &session, settings, errors).await;
    }

    for (id, _, value) in &updates {
        setting::update_value(&pool, *id, value).await?;
    }

    if !updates.is_empty() {
        let names: Vec<&str> = updates.iter().map(|(_, n, _)| n.as_str()).collect();
        log::info!("Settings updated: {}", names.join(", "));
        let details = serde_json::json!({
            "settings": names,
            "count": updates.len(),
            "summary": format!("Updated {} setting(s)", updates.len())
        });
        let _ = audit::log(&pool, current_user_id, "settings.update", "setting", 0, details).await;
    }

    let _ = session.insert("flash", "Settings saved");
    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/admin/settings"))
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_normalized_per_type() {
        assert_eq!(normalize_value("weekday", " Thursday ").unwrap(), "thursday");
        assert_eq!(normalize_value("time", " 08:05 ").unwrap(), "08:05");
        assert_eq!(normalize_value("time", "19:30:00").unwrap(), "19:30");
        assert_eq!(normalize_value("number", "07").unwrap(), "7");
        assert_eq!(normalize_value("time_format", "12h").unwrap(), "12h");
        assert_eq!(normalize_value("text", "  Nord ").unwrap(), "Nord");
    }

    #[test]
    fn blank_clears_any_setting() {
        assert_eq!(normalize_value("weekday", "").unwrap(), "");
        assert_eq!(normalize_value("time", "  ").unwrap(), "");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(normalize_value("weekday", "someday").is_err());
        assert!(normalize_value("time", "25:00").is_err());
        assert!(normalize_value("number", "-5").is_err());
        assert!(normalize_value("time_format", "military").is_err());
    }
}
