use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::session::{WEEKS_EDIT, require_permission, require_user_id};
use crate::errors::AppError;
use crate::handlers::week_handlers::{FieldMessage, SaveOutcome, save_week};
use crate::models::congregation::CongregationSettings;
use crate::models::week::{self, StoredWeek, WeekDocument};
use crate::schedule::recompute_for_display;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiWeek {
    pub id: i64,
    #[serde(flatten)]
    pub document: WeekDocument,
}

#[derive(Serialize)]
pub struct ApiWeekList {
    pub items: Vec<ApiWeek>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Serialize)]
struct ApiFieldErrors {
    errors: Vec<FieldMessage>,
}

fn to_api(stored: StoredWeek, settings: &CongregationSettings) -> ApiWeek {
    ApiWeek { id: stored.id, document: recompute_for_display(&stored.document, settings) }
}

/// Map a save outcome onto the API's status codes.
fn outcome_response(outcome: SaveOutcome, created: bool, settings: &CongregationSettings) -> HttpResponse {
    let errors = outcome.messages();
    match outcome {
        SaveOutcome::Saved(saved) if created => HttpResponse::Created().json(to_api(saved, settings)),
        SaveOutcome::Saved(saved) => HttpResponse::Ok().json(to_api(saved, settings)),
        SaveOutcome::Duplicate { existing_id, .. } => HttpResponse::Conflict().json(serde_json::json!({
            "error": errors.first().map(|e| e.message.clone()).unwrap_or_default(),
            "existingId": existing_id,
        })),
        SaveOutcome::Rejected { .. } => HttpResponse::UnprocessableEntity().json(ApiFieldErrors { errors }),
    }
}

/// GET /api/v1/weeks - newest first, paginated (`page`, `per_page` up to 100)
pub async fn list(
    pool: web::Data<PgPool>,
    session: Session,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, WEEKS_EDIT)?;
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(25).clamp(1, 100);

    let settings = CongregationSettings::load(&pool).await?;
    let all = week::find_all(&pool).await?;
    let total = all.len() as i64;
    let items = all
        .into_iter()
        .skip(((page - 1) * per_page) as usize)
        .take(per_page as usize)
        .map(|w| to_api(w, &settings))
        .collect();

    Ok(HttpResponse::Ok().json(ApiWeekList { items, total, page, per_page }))
}

/// GET /api/v1/weeks/{id} - computed fields are fresh, never the stored ones
pub async fn read(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, WEEKS_EDIT)?;
    let stored = week::find_by_id(&pool, path.into_inner()).await?.ok_or(AppError::NotFound)?;
    let settings = CongregationSettings::load(&pool).await?;
    Ok(HttpResponse::Ok().json(to_api(stored, &settings)))
}

/// POST /api/v1/weeks
pub async fn create(
    pool: web::Data<PgPool>,
    session: Session,
    body: web::Json<WeekDocument>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, WEEKS_EDIT)?;
    let user_id = require_user_id(&session)?;
    let outcome = save_week(&pool, None, body.into_inner(), user_id).await?;
    let settings = CongregationSettings::load(&pool).await?;
    Ok(outcome_response(outcome, true, &settings))
}

/// PUT /api/v1/weeks/{id}
pub async fn update(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<WeekDocument>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, WEEKS_EDIT)?;
    let user_id = require_user_id(&session)?;
    let outcome = save_week(&pool, Some(path.into_inner()), body.into_inner(), user_id).await?;
    let settings = CongregationSettings::load(&pool).await?;
    Ok(outcome_response(outcome, false, &settings))
}
