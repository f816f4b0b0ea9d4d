use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Entity {
    pub id: i64,
    pub entity_type: String,
    pub name: String,
    pub label: String,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

const SELECT_ENTITY: &str = "SELECT id, entity_type, name, label, sort_order::BIGINT AS sort_order, is_active, \
     created_at::TEXT, updated_at::TEXT FROM entities";

/// Find a single entity by id, restricted to one type.
pub async fn find_typed(pool: &PgPool, entity_type: &str, id: i64) -> Result<Option<Entity>, sqlx::Error> {
    sqlx::query_as::<_, Entity>(&format!("{SELECT_ENTITY} WHERE entity_type = $1 AND id = $2"))
        .bind(entity_type)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Create a new entity, returning its id.
pub async fn create(conn: &mut PgConnection, entity_type: &str, name: &str, label: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("INSERT INTO entities (entity_type, name, label) VALUES ($1, $2, $3) RETURNING id")
        .bind(entity_type)
        .bind(name)
        .bind(label)
        .fetch_one(&mut *conn)
        .await
}

/// Update an entity's name and label.
pub async fn update(conn: &mut PgConnection, id: i64, name: &str, label: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE entities SET name = $1, label = $2, updated_at = NOW() WHERE id = $3")
        .bind(name)
        .bind(label)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Delete an entity of the given type (cascades to properties and relations).
/// Returns false when no such entity existed.
pub async fn delete_typed(pool: &PgPool, entity_type: &str, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM entities WHERE entity_type = $1 AND id = $2")
        .bind(entity_type)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_by_type(pool: &PgPool, entity_type: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM entities WHERE entity_type = $1")
        .bind(entity_type)
        .fetch_one(pool)
        .await
}

// --- Property helpers ---

/// Get all properties for an entity as a HashMap.
pub async fn get_properties(pool: &PgPool, entity_id: i64) -> Result<HashMap<String, String>, sqlx::Error> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT key, value FROM entity_properties WHERE entity_id = $1")
            .bind(entity_id)
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().collect())
}

/// Set a property (upsert).
pub async fn set_property(conn: &mut PgConnection, entity_id: i64, key: &str, value: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO entity_properties (entity_id, key, value) VALUES ($1, $2, $3) \
         ON CONFLICT (entity_id, key) DO UPDATE SET value = EXCLUDED.value",
    )
    .bind(entity_id)
    .bind(key)
    .bind(value)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Set several properties at once.
pub async fn set_properties(conn: &mut PgConnection, entity_id: i64, props: &[(&str, &str)]) -> Result<(), sqlx::Error> {
    for (key, value) in props {
        set_property(&mut *conn, entity_id, key, value).await?;
    }
    Ok(())
}

/// Unique entity name for types whose display label may repeat, e.g. `v_3f9a1c0b2d4e`.
pub fn generated_name(prefix: &str) -> String {
    let bytes: [u8; 6] = rand::random();
    format!("{prefix}_{}", hex::encode(bytes))
}
