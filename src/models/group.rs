use sqlx::{PgConnection, PgPool};

use crate::models::{entity, relation};

/// Row of the group list.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GroupListItem {
    pub id: i64,
    pub name: String,
    pub overseer: String,
    pub assistant: String,
    pub member_count: i64,
}

#[derive(Debug, Clone, Default)]
pub struct GroupDetail {
    pub id: i64,
    pub name: String,
    pub overseer_id: Option<i64>,
    pub assistant_id: Option<i64>,
}

pub async fn find_all(pool: &PgPool) -> Result<Vec<GroupListItem>, sqlx::Error> {
    sqlx::query_as::<_, GroupListItem>(
        "SELECT g.id, g.label AS name, \
                COALESCE(o.label, '') AS overseer, \
                COALESCE(a.label, '') AS assistant, \
                (SELECT COUNT(*) FROM relations r_m \
                 WHERE r_m.target_id = g.id \
                   AND r_m.relation_type_id = (SELECT id FROM entities WHERE entity_type = 'relation_type' AND name = 'member_of_group') \
                ) AS member_count \
         FROM entities g \
         LEFT JOIN relations r_o ON r_o.source_id = g.id \
             AND r_o.relation_type_id = (SELECT id FROM entities WHERE entity_type = 'relation_type' AND name = 'overseen_by') \
         LEFT JOIN entities o ON o.id = r_o.target_id \
         LEFT JOIN relations r_a ON r_a.source_id = g.id \
             AND r_a.relation_type_id = (SELECT id FROM entities WHERE entity_type = 'relation_type' AND name = 'assisted_by') \
         LEFT JOIN entities a ON a.id = r_a.target_id \
         WHERE g.entity_type = 'group' \
         ORDER BY g.label, g.id",
    )
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<GroupDetail>, sqlx::Error> {
    let Some(e) = entity::find_typed(pool, "group", id).await? else {
        return Ok(None);
    };
    let overseer_id = relation::find_target_ids(pool, id, "overseen_by").await?.into_iter().next();
    let assistant_id = relation::find_target_ids(pool, id, "assisted_by").await?.into_iter().next();
    Ok(Some(GroupDetail { id, name: e.label, overseer_id, assistant_id }))
}

async fn write_leaders(
    conn: &mut PgConnection,
    id: i64,
    overseer_id: Option<i64>,
    assistant_id: Option<i64>,
) -> Result<(), sqlx::Error> {
    let overseer: Vec<i64> = overseer_id.into_iter().collect();
    let assistant: Vec<i64> = assistant_id.into_iter().collect();
    relation::replace_targets(&mut *conn, "overseen_by", id, &overseer).await?;
    relation::replace_targets(&mut *conn, "assisted_by", id, &assistant).await
}

pub async fn create(
    pool: &PgPool,
    name: &str,
    overseer_id: Option<i64>,
    assistant_id: Option<i64>,
) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let id = entity::create(&mut *tx, "group", &entity::generated_name("g"), name.trim()).await?;
    write_leaders(&mut *tx, id, overseer_id, assistant_id).await?;
    tx.commit().await?;
    Ok(id)
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    name: &str,
    overseer_id: Option<i64>,
    assistant_id: Option<i64>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE entities SET label = $1, updated_at = NOW() WHERE id = $2 AND entity_type = 'group'")
        .bind(name.trim())
        .bind(id)
        .execute(&mut *tx)
        .await?;
    write_leaders(&mut *tx, id, overseer_id, assistant_id).await?;
    tx.commit().await
}

/// Group id and name pairs, for dropdowns.
pub async fn find_options(pool: &PgPool) -> Result<Vec<(i64, String)>, sqlx::Error> {
    sqlx::query_as("SELECT id, label FROM entities WHERE entity_type = 'group' ORDER BY label, id")
        .fetch_all(pool)
        .await
}
