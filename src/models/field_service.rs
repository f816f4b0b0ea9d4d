use chrono::{NaiveDate, NaiveTime};
use sqlx::{PgConnection, PgPool};

use crate::models::{entity, relation};

/// Row of the field service meeting list.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FieldServiceListItem {
    pub id: i64,
    pub date: String,
    pub time: String,
    pub location: String,
    pub group_name: String,
    pub conductor: String,
}

#[derive(Debug, Clone, Default)]
pub struct FieldServiceDetail {
    pub id: i64,
    pub date: String,
    pub time: String,
    pub location: String,
    pub notes: String,
    pub group_id: Option<i64>,
    pub conductor_id: Option<i64>,
}

/// Validated input for create and update.
#[derive(Debug, Clone)]
pub struct FieldServiceInput {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub notes: String,
    pub group_id: Option<i64>,
    pub conductor_id: Option<i64>,
}

/// Upcoming meetings first, then past ones.
pub async fn find_all(pool: &PgPool) -> Result<Vec<FieldServiceListItem>, sqlx::Error> {
    sqlx::query_as::<_, FieldServiceListItem>(
        "SELECT e.id, \
                COALESCE(p_date.value, '') AS date, \
                COALESCE(p_time.value, '') AS time, \
                COALESCE(p_loc.value, '') AS location, \
                COALESCE(g.label, '') AS group_name, \
                COALESCE(c.label, '') AS conductor \
         FROM entities e \
         LEFT JOIN entity_properties p_date ON e.id = p_date.entity_id AND p_date.key = 'date' \
         LEFT JOIN entity_properties p_time ON e.id = p_time.entity_id AND p_time.key = 'time' \
         LEFT JOIN entity_properties p_loc ON e.id = p_loc.entity_id AND p_loc.key = 'location' \
         LEFT JOIN relations r_g ON r_g.source_id = e.id \
             AND r_g.relation_type_id = (SELECT id FROM entities WHERE entity_type = 'relation_type' AND name = 'field_service_group') \
         LEFT JOIN entities g ON g.id = r_g.target_id \
         LEFT JOIN relations r_c ON r_c.source_id = e.id \
             AND r_c.relation_type_id = (SELECT id FROM entities WHERE entity_type = 'relation_type' AND name = 'conducted_by') \
         LEFT JOIN entities c ON c.id = r_c.target_id \
         WHERE e.entity_type = 'field_service_meeting' \
         ORDER BY p_date.value DESC, p_time.value, e.id",
    )
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<FieldServiceDetail>, sqlx::Error> {
    if entity::find_typed(pool, "field_service_meeting", id).await?.is_none() {
        return Ok(None);
    }
    let props = entity::get_properties(pool, id).await?;
    let prop = |key: &str| props.get(key).cloned().unwrap_or_default();
    Ok(Some(FieldServiceDetail {
        id,
        date: prop("date"),
        time: prop("time"),
        location: prop("location"),
        notes: prop("notes"),
        group_id: relation::find_target_ids(pool, id, "field_service_group").await?.into_iter().next(),
        conductor_id: relation::find_target_ids(pool, id, "conducted_by").await?.into_iter().next(),
    }))
}

async fn write_details(conn: &mut PgConnection, id: i64, input: &FieldServiceInput) -> Result<(), sqlx::Error> {
    let date = input.date.format("%Y-%m-%d").to_string();
    let time = input.time.format("%H:%M").to_string();
    entity::set_properties(&mut *conn, id, &[
        ("date", date.as_str()),
        ("time", time.as_str()),
        ("location", input.location.trim()),
        ("notes", input.notes.trim()),
    ])
    .await?;
    let group: Vec<i64> = input.group_id.into_iter().collect();
    let conductor: Vec<i64> = input.conductor_id.into_iter().collect();
    relation::replace_targets(&mut *conn, "field_service_group", id, &group).await?;
    relation::replace_targets(&mut *conn, "conducted_by", id, &conductor).await
}

fn label(input: &FieldServiceInput) -> String {
    format!("{} {}", input.date.format("%Y-%m-%d"), input.time.format("%H:%M"))
}

pub async fn create(pool: &PgPool, input: &FieldServiceInput) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let id = entity::create(&mut *tx, "field_service_meeting", &entity::generated_name("fs"), &label(input)).await?;
    write_details(&mut *tx, id, input).await?;
    tx.commit().await?;
    Ok(id)
}

pub async fn update(pool: &PgPool, id: i64, input: &FieldServiceInput) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "UPDATE entities SET label = $1, updated_at = NOW() WHERE id = $2 AND entity_type = 'field_service_meeting'",
    )
    .bind(label(input))
    .bind(id)
    .execute(&mut *tx)
    .await?;
    write_details(&mut *tx, id, input).await?;
    tx.commit().await
}
