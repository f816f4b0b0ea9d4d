use serde_json::Value;
use sqlx::PgPool;

/// Record a mutation in the audit log.
///
/// Callers ignore the result: a failed audit write is logged here and never
/// fails the request that triggered it.
pub async fn log(
    pool: &PgPool,
    user_id: i64,
    action: &str,
    target_type: &str,
    target_id: i64,
    details: Value,
) -> Result<(), sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO audit_log (user_id, action, target_type, target_id, details) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user_id)
    .bind(action)
    .bind(target_type)
    .bind(target_id)
    .bind(details.to_string())
    .execute(pool)
    .await;

    if let Err(e) = &result {
        log::error!("Audit write failed for {action} on {target_type} {target_id}: {e}");
    }
    result.map(|_| ())
}

/// Most recent audit entries, newest first.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditEntry {
    pub id: i64,
    pub username: String,
    pub action: String,
    pub target_type: String,
    pub target_id: i64,
    pub summary: String,
    pub created_at: String,
}

pub async fn find_recent(pool: &PgPool, limit: i64) -> Result<Vec<AuditEntry>, sqlx::Error> {
    sqlx::query_as::<_, AuditEntry>(
        "SELECT a.id, COALESCE(u.name, 'system') AS username, a.action, a.target_type, a.target_id, \
                COALESCE(a.details::JSONB ->> 'summary', '') AS summary, \
                to_char(a.created_at, 'YYYY-MM-DD HH24:MI') AS created_at \
         FROM audit_log a \
         LEFT JOIN entities u ON u.id = a.user_id AND u.entity_type = 'user' \
         ORDER BY a.created_at DESC, a.id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}
