//! Shared test infrastructure for database-backed tests.
//!
//! Tests run against the Postgres server named by `TEST_DATABASE_URL`. Each
//! call to `setup_test_db()` gets its own schema, so tests can run in
//! parallel. Without `TEST_DATABASE_URL` the database tests are skipped.
#![allow(dead_code)]

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use versammlung::db;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASS: &str = "admin123";

pub struct TestDb {
    pool: PgPool,
    pub schema: String,
}

impl TestDb {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Fresh schema with migrations and the base seed applied, or `None` when
/// no test database is configured.
pub async fn setup_test_db() -> Option<TestDb> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping database test");
        return None;
    };

    let schema = format!("test_{}", hex::encode(rand::random::<[u8; 6]>()));
    let admin = PgPool::connect(&url).await.expect("Failed to connect to test database");
    sqlx::query(&format!("CREATE SCHEMA {schema}"))
        .execute(&admin)
        .await
        .expect("Failed to create test schema");
    admin.close().await;

    let search_path = format!("SET search_path TO {schema}");
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .after_connect(move |conn, _meta| {
            let search_path = search_path.clone();
            Box::pin(async move {
                sqlx::query(&search_path).execute(conn).await?;
                Ok(())
            })
        })
        .connect(&url)
        .await
        .expect("Failed to open test pool");

    db::run_migrations(&pool).await.expect("Failed to run migrations");
    let hash = versammlung::auth::password::hash_password(ADMIN_PASS).expect("Failed to hash admin password");
    db::seed(&pool, &hash).await.expect("Failed to seed");

    Some(TestDb { pool, schema })
}

pub async fn insert_entity(pool: &PgPool, entity_type: &str, name: &str, label: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO entities (entity_type, name, label) VALUES ($1, $2, $3) RETURNING id")
        .bind(entity_type)
        .bind(name)
        .bind(label)
        .fetch_one(pool)
        .await
        .expect("Failed to insert entity")
}

pub async fn insert_prop(pool: &PgPool, entity_id: i64, key: &str, value: &str) {
    sqlx::query("INSERT INTO entity_properties (entity_id, key, value) VALUES ($1, $2, $3)")
        .bind(entity_id)
        .bind(key)
        .bind(value)
        .execute(pool)
        .await
        .expect("Failed to insert property");
}

/// Overwrite the value of a seeded setting.
pub async fn set_setting(pool: &PgPool, name: &str, value: &str) {
    sqlx::query(
        "UPDATE entity_properties SET value = $2 \
         WHERE key = 'value' AND entity_id = (SELECT id FROM entities WHERE entity_type = 'setting' AND name = $1)",
    )
    .bind(name)
    .bind(value)
    .execute(pool)
    .await
    .expect("Failed to update setting");
}
