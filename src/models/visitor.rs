use sqlx::PgPool;

use crate::models::entity;

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct Visitor {
    pub id: i64,
    pub name: String,
    pub congregation: String,
    pub notes: String,
}

const SELECT_VISITOR: &str = "SELECT e.id, e.label AS name, \
        COALESCE(p_cong.value, '') AS congregation, \
        COALESCE(p_notes.value, '') AS notes \
     FROM entities e \
     LEFT JOIN entity_properties p_cong ON e.id = p_cong.entity_id AND p_cong.key = 'congregation' \
     LEFT JOIN entity_properties p_notes ON e.id = p_notes.entity_id AND p_notes.key = 'notes' \
     WHERE e.entity_type = 'visitor'";

pub async fn find_all(pool: &PgPool) -> Result<Vec<Visitor>, sqlx::Error> {
    sqlx::query_as::<_, Visitor>(&format!("{SELECT_VISITOR} ORDER BY e.label, e.id"))
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Visitor>, sqlx::Error> {
    sqlx::query_as::<_, Visitor>(&format!("{SELECT_VISITOR} AND e.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Create a visitor. Names need not be unique.
pub async fn create(pool: &PgPool, name: &str, congregation: &str, notes: &str) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let id = entity::create(&mut *tx, "visitor", &entity::generated_name("v"), name.trim()).await?;
    entity::set_properties(&mut *tx, id, &[("congregation", congregation.trim()), ("notes", notes.trim())]).await?;
    tx.commit().await?;
    Ok(id)
}

pub async fn update(pool: &PgPool, id: i64, name: &str, congregation: &str, notes: &str) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE entities SET label = $1, updated_at = NOW() WHERE id = $2 AND entity_type = 'visitor'")
        .bind(name.trim())
        .bind(id)
        .execute(&mut *tx)
        .await?;
    entity::set_properties(&mut *tx, id, &[("congregation", congregation.trim()), ("notes", notes.trim())]).await?;
    tx.commit().await
}
