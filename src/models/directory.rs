use sqlx::PgPool;

use crate::assignments::{
    AssignmentPermission, Directory, DirectoryError, PublisherFilter, PublisherRecord, VisitorRecord,
};
use crate::models::visitor;

/// [`Directory`] backed by the entity store: publishers are `user` entities,
/// their tags come from `has_assignment_permission` relations.
#[derive(Clone)]
pub struct PgDirectory<'a> {
    pool: &'a PgPool,
}

impl<'a> PgDirectory<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    display_name: String,
    permissions: String,
}

impl From<Row> for PublisherRecord {
    fn from(row: Row) -> Self {
        PublisherRecord {
            id: row.id,
            display_name: row.display_name,
            assignment_permissions: row.permissions.split(',').filter_map(AssignmentPermission::parse).collect(),
        }
    }
}

// $1: exact display name or NULL, $2: required tag or NULL, $3: id or NULL.
const SELECT_PUBLISHERS: &str = "SELECT e.id, e.label AS display_name, \
        COALESCE(string_agg(ap.name, ','), '') AS permissions \
     FROM entities e \
     LEFT JOIN relations r ON r.source_id = e.id \
         AND r.relation_type_id = (SELECT id FROM entities WHERE entity_type = 'relation_type' AND name = 'has_assignment_permission') \
     LEFT JOIN entities ap ON ap.id = r.target_id \
     WHERE e.entity_type = 'user' \
       AND ($1::TEXT IS NULL OR e.label = $1) \
       AND ($2::TEXT IS NULL OR EXISTS ( \
            SELECT 1 FROM relations r2 \
            JOIN entities ap2 ON ap2.id = r2.target_id \
            WHERE r2.source_id = e.id \
              AND r2.relation_type_id = (SELECT id FROM entities WHERE entity_type = 'relation_type' AND name = 'has_assignment_permission') \
              AND ap2.name = $2)) \
       AND ($3::BIGINT IS NULL OR e.id = $3) \
     GROUP BY e.id, e.label \
     ORDER BY e.label, e.id";

impl Directory for PgDirectory<'_> {
    async fn find_publishers(&self, filter: &PublisherFilter) -> Result<Vec<PublisherRecord>, DirectoryError> {
        let rows = sqlx::query_as::<_, Row>(SELECT_PUBLISHERS)
            .bind(filter.name.as_deref())
            .bind(filter.permission.map(AssignmentPermission::as_str))
            .bind(None::<i64>)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(PublisherRecord::from).collect())
    }

    async fn find_publisher(&self, id: i64) -> Result<Option<PublisherRecord>, DirectoryError> {
        let row = sqlx::query_as::<_, Row>(SELECT_PUBLISHERS)
            .bind(None::<&str>)
            .bind(None::<&str>)
            .bind(Some(id))
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(PublisherRecord::from))
    }

    async fn find_visitors(&self) -> Result<Vec<VisitorRecord>, DirectoryError> {
        let visitors = visitor::find_all(self.pool).await?;
        Ok(visitors
            .into_iter()
            .map(|v| VisitorRecord { id: v.id, name: v.name })
            .collect())
    }

    async fn find_visitor(&self, id: i64) -> Result<Option<VisitorRecord>, DirectoryError> {
        let found = visitor::find_by_id(self.pool, id).await?;
        Ok(found.map(|v| VisitorRecord { id: v.id, name: v.name }))
    }

    async fn create_visitor(&self, name: &str) -> Result<VisitorRecord, DirectoryError> {
        let id = visitor::create(self.pool, name, "", "").await?;
        Ok(VisitorRecord { id, name: name.to_string() })
    }
}
