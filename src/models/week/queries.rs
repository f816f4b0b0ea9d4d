use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};

use crate::models::entity;
use super::types::*;

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    name: String,
    midweek: String,
    weekend: String,
}

impl From<Row> for StoredWeek {
    fn from(row: Row) -> Self {
        let week_start_date = NaiveDate::parse_from_str(&row.name, "%Y-%m-%d").ok();
        let midweek_meeting = serde_json::from_str(&row.midweek).unwrap_or_else(|e| {
            log::warn!("Week {} has an unreadable midweek programme: {e}", row.id);
            MidweekMeeting::default()
        });
        let weekend_meeting = serde_json::from_str(&row.weekend).unwrap_or_else(|e| {
            log::warn!("Week {} has an unreadable weekend programme: {e}", row.id);
            WeekendMeeting::default()
        });
        StoredWeek {
            id: row.id,
            document: WeekDocument { week_start_date, midweek_meeting, weekend_meeting },
        }
    }
}

const SELECT_WEEK: &str = "SELECT e.id, e.name, \
        COALESCE(p_mw.value, '{}') AS midweek, \
        COALESCE(p_we.value, '{}') AS weekend \
     FROM entities e \
     LEFT JOIN entity_properties p_mw ON e.id = p_mw.entity_id AND p_mw.key = 'midweek_meeting' \
     LEFT JOIN entity_properties p_we ON e.id = p_we.entity_id AND p_we.key = 'weekend_meeting' \
     WHERE e.entity_type = 'week'";

/// Entity name of a week: its ISO start date.
fn week_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// All weeks, newest first.
pub async fn find_all(pool: &PgPool) -> Result<Vec<StoredWeek>, sqlx::Error> {
    let rows = sqlx::query_as::<_, Row>(&format!("{SELECT_WEEK} ORDER BY e.name DESC"))
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(StoredWeek::from).collect())
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<StoredWeek>, sqlx::Error> {
    let row = sqlx::query_as::<_, Row>(&format!("{SELECT_WEEK} AND e.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(StoredWeek::from))
}

pub async fn find_by_start_date(pool: &PgPool, date: NaiveDate) -> Result<Option<StoredWeek>, sqlx::Error> {
    let row = sqlx::query_as::<_, Row>(&format!("{SELECT_WEEK} AND e.name = $1"))
        .bind(week_name(date))
        .fetch_optional(pool)
        .await?;
    Ok(row.map(StoredWeek::from))
}

async fn write_programme(conn: &mut PgConnection, id: i64, doc: &WeekDocument) -> Result<(), sqlx::Error> {
    let midweek = serde_json::to_string(&doc.midweek_meeting)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    let weekend = serde_json::to_string(&doc.weekend_meeting)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    entity::set_properties(conn, id, &[
        ("midweek_meeting", midweek.as_str()),
        ("weekend_meeting", weekend.as_str()),
    ])
    .await
}

/// Insert a week with its programme in one transaction. The document must
/// carry a start date; a second week with the same start date fails with a
/// unique violation.
pub async fn create(pool: &PgPool, start: NaiveDate, doc: &WeekDocument) -> Result<i64, sqlx::Error> {
    let label = format!("Week of {}", start.format("%d.%m.%Y"));
    let mut tx = pool.begin().await?;
    let id = entity::create(&mut *tx, "week", &week_name(start), &label).await?;
    write_programme(&mut *tx, id, doc).await?;
    tx.commit().await?;
    Ok(id)
}

pub async fn update(pool: &PgPool, id: i64, start: NaiveDate, doc: &WeekDocument) -> Result<(), sqlx::Error> {
    let label = format!("Week of {}", start.format("%d.%m.%Y"));
    let mut tx = pool.begin().await?;
    entity::update(&mut *tx, id, &week_name(start), &label).await?;
    write_programme(&mut *tx, id, doc).await?;
    tx.commit().await
}

/// Display names of the referenced people. A reference only resolves
/// against the entity type it names.
pub async fn assignee_names(pool: &PgPool, refs: &[AssigneeRef]) -> Result<HashMap<i64, String>, sqlx::Error> {
    if refs.is_empty() {
        return Ok(HashMap::new());
    }
    let (users, visitors): (Vec<AssigneeRef>, Vec<AssigneeRef>) =
        refs.iter().copied().partition(|r| r.relation_to == RelationTo::Users);
    let user_ids: Vec<i64> = users.iter().map(|r| r.value).collect();
    let visitor_ids: Vec<i64> = visitors.iter().map(|r| r.value).collect();
    let rows: Vec<(i64, String)> = sqlx::query_as(
        "SELECT id, label FROM entities \
         WHERE (entity_type = 'user' AND id = ANY($1)) OR (entity_type = 'visitor' AND id = ANY($2))",
    )
    .bind(&user_ids)
    .bind(&visitor_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().collect())
}
