use sqlx::{PgConnection, PgPool};

use crate::assignments::AssignmentPermission;
use crate::models::{entity, relation};
use super::types::*;

/// Find all publishers for the list page, ordered by display name.
pub async fn find_all(pool: &PgPool) -> Result<Vec<PublisherListItem>, sqlx::Error> {
    sqlx::query_as::<_, PublisherListItem>(
        "SELECT e.id, e.label AS display_name, \
                COALESCE(p_gender.value, '') AS gender, \
                COALESCE(g.label, '') AS group_name, \
                COALESCE(( \
                    SELECT string_agg(ap.name, ',' ORDER BY ap.sort_order) \
                    FROM relations r_ap \
                    JOIN entities ap ON ap.id = r_ap.target_id \
                    WHERE r_ap.source_id = e.id \
                      AND r_ap.relation_type_id = (SELECT id FROM entities WHERE entity_type = 'relation_type' AND name = 'has_assignment_permission') \
                ), '') AS permissions \
         FROM entities e \
         LEFT JOIN entity_properties p_gender ON e.id = p_gender.entity_id AND p_gender.key = 'gender' \
         LEFT JOIN relations r_group \
             ON r_group.source_id = e.id \
             AND r_group.relation_type_id = (SELECT id FROM entities WHERE entity_type = 'relation_type' AND name = 'member_of_group') \
         LEFT JOIN entities g ON g.id = r_group.target_id \
         WHERE e.entity_type = 'user' \
         ORDER BY e.label, e.id",
    )
    .fetch_all(pool)
    .await
}

/// Assignment permission tags held by a publisher.
pub async fn find_assignment_permissions(pool: &PgPool, user_id: i64) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT ap.name FROM relations r \
         JOIN entities ap ON ap.id = r.target_id \
         WHERE r.source_id = $1 \
           AND r.relation_type_id = (SELECT id FROM entities WHERE entity_type = 'relation_type' AND name = 'has_assignment_permission') \
         ORDER BY ap.sort_order",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<PublisherDetail>, sqlx::Error> {
    let Some(e) = entity::find_typed(pool, "user", id).await? else {
        return Ok(None);
    };
    let props = entity::get_properties(pool, id).await?;
    let prop = |key: &str| props.get(key).cloned().unwrap_or_default();

    let privileges = prop("privileges")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    let absences = match props.get("absences") {
        Some(json) if !json.is_empty() => serde_json::from_str(json).unwrap_or_else(|e| {
            log::warn!("Publisher {id} has unreadable absences: {e}");
            Vec::new()
        }),
        _ => Vec::new(),
    };
    let assignment_permissions = find_assignment_permissions(pool, id)
        .await?
        .iter()
        .filter_map(|tag| AssignmentPermission::parse(tag))
        .collect();
    let group_id = relation::find_target_ids(pool, id, "member_of_group").await?.into_iter().next();

    Ok(Some(PublisherDetail {
        id,
        username: e.name,
        first_name: prop("first_name"),
        surname: prop("surname"),
        gender: prop("gender"),
        email: prop("email"),
        address: prop("address"),
        privileges,
        assignment_permissions,
        group_id,
        absences,
        has_login: !prop("password").is_empty(),
    }))
}

/// Find a user by login name for authentication.
pub async fn find_login(pool: &PgPool, username: &str) -> Result<Option<LoginUser>, sqlx::Error> {
    sqlx::query_as::<_, LoginUser>(
        "SELECT e.id, e.name AS username, COALESCE(p_pw.value, '') AS password \
         FROM entities e \
         LEFT JOIN entity_properties p_pw ON e.id = p_pw.entity_id AND p_pw.key = 'password' \
         WHERE e.entity_type = 'user' AND e.name = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

async fn write_details(conn: &mut PgConnection, id: i64, input: &PublisherInput) -> Result<(), sqlx::Error> {
    let privileges = input.privileges.join(",");
    let absences = serde_json::to_string(&input.absences).unwrap_or_else(|_| "[]".to_string());
    entity::set_properties(&mut *conn, id, &[
        ("first_name", input.first_name.trim()),
        ("surname", input.surname.trim()),
        ("gender", input.gender.as_str()),
        ("email", input.email.trim()),
        ("address", input.address.trim()),
        ("privileges", privileges.as_str()),
        ("absences", absences.as_str()),
    ])
    .await?;
    if let Some(hash) = &input.password_hash {
        entity::set_property(&mut *conn, id, "password", hash).await?;
    }

    let tags: Vec<String> = input.assignment_permissions.iter().map(|p| p.as_str().to_string()).collect();
    let permission_ids: Vec<i64> = sqlx::query_scalar(
        "SELECT id FROM entities WHERE entity_type = 'assignment_permission' AND name = ANY($1)",
    )
    .bind(&tags)
    .fetch_all(&mut *conn)
    .await?;
    relation::replace_targets(&mut *conn, "has_assignment_permission", id, &permission_ids).await?;

    let groups: Vec<i64> = input.group_id.into_iter().collect();
    relation::replace_targets(&mut *conn, "member_of_group", id, &groups).await?;
    Ok(())
}

/// Create a publisher (a `user` entity), returning its id.
pub async fn create(pool: &PgPool, input: &PublisherInput) -> Result<i64, sqlx::Error> {
    let username = match input.username.trim() {
        "" => entity::generated_name("p"),
        name => name.to_string(),
    };
    let mut tx = pool.begin().await?;
    let id = entity::create(&mut *tx, "user", &username, &input.display_name()).await?;
    write_details(&mut *tx, id, input).await?;
    tx.commit().await?;
    Ok(id)
}

pub async fn update(pool: &PgPool, id: i64, input: &PublisherInput) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    let username = match input.username.trim() {
        "" => sqlx::query_scalar::<_, String>("SELECT name FROM entities WHERE id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?,
        name => name.to_string(),
    };
    entity::update(&mut *tx, id, &username, &input.display_name()).await?;
    write_details(&mut *tx, id, input).await?;
    tx.commit().await
}

/// Publisher id and display name pairs, for dropdowns.
pub async fn find_options(pool: &PgPool) -> Result<Vec<(i64, String)>, sqlx::Error> {
    sqlx::query_as("SELECT id, label FROM entities WHERE entity_type = 'user' ORDER BY label, id")
        .fetch_all(pool)
        .await
}
