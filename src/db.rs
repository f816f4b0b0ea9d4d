use std::collections::HashMap;

use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use sqlx::postgres::PgPoolOptions;

const BASE_SEED: &str = include_str!("../data/seed/base.json");

pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(8)
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

/// True for a Postgres unique-constraint violation (SQLSTATE 23505).
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|d| d.code())
        .is_some_and(|code| code == "23505")
}

#[derive(Debug, Deserialize)]
struct SeedPayload {
    entities: Vec<SeedEntity>,
    #[serde(default)]
    relations: Vec<SeedRelation>,
}

#[derive(Debug, Deserialize)]
struct SeedEntity {
    entity_type: String,
    name: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    sort_order: i32,
    #[serde(default)]
    properties: HashMap<String, String>,
}

/// Endpoints are written `entity_type:name`.
#[derive(Debug, Deserialize)]
struct SeedRelation {
    relation_type: String,
    source: String,
    target: String,
}

async fn find_entity_id(conn: &mut PgConnection, reference: &str) -> Result<Option<i64>, sqlx::Error> {
    let Some((entity_type, name)) = reference.split_once(':') else {
        return Ok(None);
    };
    sqlx::query_scalar("SELECT id FROM entities WHERE entity_type = $1 AND name = $2")
        .bind(entity_type)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
}

/// Insert seed entities and relations, skipping any that already exist.
/// Returns the number of entities created. Runs in one transaction.
async fn import_seed(pool: &PgPool, json: &str) -> Result<usize, sqlx::Error> {
    let payload: SeedPayload = serde_json::from_str(json)
        .map_err(|e| sqlx::Error::Protocol(format!("Bad seed JSON: {e}")))?;
    let mut tx = pool.begin().await?;

    let mut created = 0;
    for entity in &payload.entities {
        let id: Option<i64> = sqlx::query_scalar(
            "INSERT INTO entities (entity_type, name, label, sort_order) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (entity_type, name) DO NOTHING RETURNING id",
        )
        .bind(&entity.entity_type)
        .bind(&entity.name)
        .bind(&entity.label)
        .bind(entity.sort_order)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(id) = id else { continue };
        created += 1;
        for (key, value) in &entity.properties {
            sqlx::query("INSERT INTO entity_properties (entity_id, key, value) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await?;
        }
    }

    for rel in &payload.relations {
        let source = find_entity_id(&mut *tx, &rel.source).await?;
        let target = find_entity_id(&mut *tx, &rel.target).await?;
        match (source, target) {
            (Some(source), Some(target)) => {
                crate::models::relation::create(&mut *tx, &rel.relation_type, source, target).await?;
            }
            _ => log::warn!("Seed relation {} -> {} skipped: endpoint missing", rel.source, rel.target),
        }
    }

    tx.commit().await?;
    Ok(created)
}

/// Seed relation types, roles, permissions, assignment permissions, default
/// settings and the `admin` account. Entities that already exist are kept,
/// so this is safe on every start.
pub async fn seed(pool: &PgPool, admin_password_hash: &str) -> Result<(), sqlx::Error> {
    let created = import_seed(pool, BASE_SEED).await?;
    if created == 0 {
        log::info!("Database already seeded, nothing to add");
        return Ok(());
    }

    // The hash is generated per install, so it is not part of the seed file.
    sqlx::query(
        "INSERT INTO entity_properties (entity_id, key, value) \
         SELECT id, 'password', $1 FROM entities WHERE entity_type = 'user' AND name = 'admin' \
         ON CONFLICT (entity_id, key) DO NOTHING",
    )
    .bind(admin_password_hash)
    .execute(pool)
    .await?;

    log::info!("Seed complete: {created} entities created");
    Ok(())
}
