use actix_session::Session;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::auth::session::{WEEKS_EDIT, require_permission};
use crate::errors::{AppError, render};
use crate::models::congregation::CongregationSettings;
use crate::models::week::{self, WeekListItem};
use crate::schedule::{format_meeting_date, recompute_for_display};
use crate::templates_structs::{PageContext, WeekListTemplate};

/// Every stored week, newest first, with meeting dates computed from the
/// current settings rather than the stored values.
pub async fn list_items(pool: &PgPool, settings: &CongregationSettings) -> Result<Vec<WeekListItem>, AppError> {
    let items = week::find_all(pool)
        .await?
        .into_iter()
        .map(|stored| {
            let doc = recompute_for_display(&stored.document, settings);
            WeekListItem {
                id: stored.id,
                week_start_date: doc.week_start_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
                midweek_date: format_meeting_date(doc.midweek_meeting.calculated_date),
                weekend_date: format_meeting_date(doc.weekend_meeting.calculated_date),
            }
        })
        .collect();
    Ok(items)
}

pub async fn list(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, WEEKS_EDIT)?;
    let ctx = PageContext::build(&session, &pool, "/admin/weeks").await?;
    let settings = CongregationSettings::load(&pool).await?;
    let weeks = list_items(&pool, &settings).await?;
    render(WeekListTemplate { ctx, weeks })
}
