use sqlx::{PgConnection, PgPool};

/// Ids of all targets related to `source_id` via a named relation type.
pub async fn find_target_ids(pool: &PgPool, source_id: i64, relation_type_name: &str) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT r.target_id FROM relations r \
         WHERE r.source_id = $1 \
           AND r.relation_type_id = (SELECT id FROM entities WHERE entity_type = 'relation_type' AND name = $2) \
         ORDER BY r.target_id",
    )
    .bind(source_id)
    .bind(relation_type_name)
    .fetch_all(pool)
    .await
}

/// Create a relation between two entities.
pub async fn create(conn: &mut PgConnection, relation_type_name: &str, source_id: i64, target_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO relations (relation_type_id, source_id, target_id) \
         VALUES ((SELECT id FROM entities WHERE entity_type = 'relation_type' AND name = $1), $2, $3) \
         ON CONFLICT DO NOTHING",
    )
    .bind(relation_type_name)
    .bind(source_id)
    .bind(target_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Delete every relation of one type leaving `source_id`.
pub async fn delete_all_from(conn: &mut PgConnection, relation_type_name: &str, source_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "DELETE FROM relations WHERE source_id = $1 AND relation_type_id = \
         (SELECT id FROM entities WHERE entity_type = 'relation_type' AND name = $2)",
    )
    .bind(source_id)
    .bind(relation_type_name)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Replace the relations of one type leaving `source_id` with `target_ids`.
pub async fn replace_targets(
    conn: &mut PgConnection,
    relation_type_name: &str,
    source_id: i64,
    target_ids: &[i64],
) -> Result<(), sqlx::Error> {
    delete_all_from(&mut *conn, relation_type_name, source_id).await?;
    for target_id in target_ids {
        create(&mut *conn, relation_type_name, source_id, *target_id).await?;
    }
    Ok(())
}
