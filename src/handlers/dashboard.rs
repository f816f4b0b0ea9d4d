use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::{Datelike, Local};
use sqlx::PgPool;

use crate::audit;
use crate::errors::{AppError, render};
use crate::models::{congregation::CongregationSettings, entity};
use crate::templates_structs::{DashboardTemplate, PageContext};
use super::week_handlers::list_items;

pub async fn index(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(&session, &pool, "/dashboard").await?;

    let week_count = entity::count_by_type(&pool, "week").await?;
    let publisher_count = entity::count_by_type(&pool, "user").await?;
    let visitor_count = entity::count_by_type(&pool, "visitor").await?;

    let settings = CongregationSettings::load(&pool).await?;
    let today = Local::now().date_naive();
    let current_week = today - chrono::Days::new(u64::from(today.weekday().num_days_from_monday()));
    let mut upcoming = list_items(&pool, &settings).await?;
    let from = current_week.format("%Y-%m-%d").to_string();
    upcoming.retain(|w| w.week_start_date >= from);
    upcoming.reverse();
    upcoming.truncate(4);

    let recent = audit::find_recent(&pool, 8).await.unwrap_or_default();

    render(DashboardTemplate {
        ctx,
        week_count,
        publisher_count,
        visitor_count,
        upcoming,
        recent,
    })
}
