use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::models::entity;

/// One occasion a talk outline was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub date: NaiveDate,
    #[serde(default)]
    pub speaker: String,
}

#[derive(Debug, Clone, Default)]
pub struct PublicTalkTitle {
    pub id: i64,
    pub number: i32,
    pub title: String,
    pub deliveries: Vec<Delivery>,
}

impl PublicTalkTitle {
    /// `"12. Title"`, as shown in dropdowns and on the schedule.
    pub fn numbered_title(&self) -> String {
        format!("{}. {}", self.number, self.title)
    }

    pub fn last_delivered(&self) -> Option<NaiveDate> {
        self.deliveries.iter().map(|d| d.date).max()
    }
}

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    name: String,
    label: String,
    deliveries: String,
}

impl From<Row> for PublicTalkTitle {
    fn from(row: Row) -> Self {
        Self {
            id: row.id,
            number: row.name.parse().unwrap_or(0),
            title: row.label,
            deliveries: serde_json::from_str(&row.deliveries).unwrap_or_default(),
        }
    }
}

const SELECT_TALK: &str = "SELECT e.id, e.name, e.label, COALESCE(p_del.value, '[]') AS deliveries \
     FROM entities e \
     LEFT JOIN entity_properties p_del ON e.id = p_del.entity_id AND p_del.key = 'deliveries' \
     WHERE e.entity_type = 'public_talk_title'";

/// All titles ordered by talk number.
pub async fn find_all(pool: &PgPool) -> Result<Vec<PublicTalkTitle>, sqlx::Error> {
    let rows = sqlx::query_as::<_, Row>(&format!("{SELECT_TALK} ORDER BY e.sort_order, e.id"))
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(PublicTalkTitle::from).collect())
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<PublicTalkTitle>, sqlx::Error> {
    let row = sqlx::query_as::<_, Row>(&format!("{SELECT_TALK} AND e.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(PublicTalkTitle::from))
}

/// Create a title. The number is the entity name, so a duplicate number fails
/// with a unique violation.
pub async fn create(pool: &PgPool, number: i32, title: &str, deliveries: &[Delivery]) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO entities (entity_type, name, label, sort_order) \
         VALUES ('public_talk_title', $1, $2, $3) RETURNING id",
    )
    .bind(number.to_string())
    .bind(title.trim())
    .bind(number)
    .fetch_one(&mut *tx)
    .await?;
    write_deliveries(&mut *tx, id, deliveries).await?;
    tx.commit().await?;
    Ok(id)
}

pub async fn update(pool: &PgPool, id: i64, number: i32, title: &str, deliveries: &[Delivery]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "UPDATE entities SET name = $1, label = $2, sort_order = $3, updated_at = NOW() \
         WHERE id = $4 AND entity_type = 'public_talk_title'",
    )
    .bind(number.to_string())
    .bind(title.trim())
    .bind(number)
    .bind(id)
    .execute(&mut *tx)
    .await?;
    write_deliveries(&mut *tx, id, deliveries).await?;
    tx.commit().await
}

async fn write_deliveries(conn: &mut PgConnection, id: i64, deliveries: &[Delivery]) -> Result<(), sqlx::Error> {
    let json = serde_json::to_string(deliveries).unwrap_or_else(|_| "[]".to_string());
    entity::set_property(conn, id, "deliveries", &json).await
}

/// Parse one delivery per line: `YYYY-MM-DD` optionally followed by the speaker.
pub fn parse_deliveries(text: &str) -> Result<Vec<Delivery>, String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|line| {
            let (date, speaker) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|_| format!("Invalid delivery date '{date}' (expected YYYY-MM-DD)"))?;
            Ok(Delivery { date, speaker: speaker.trim().to_string() })
        })
        .collect()
}

pub fn format_deliveries(deliveries: &[Delivery]) -> String {
    deliveries
        .iter()
        .map(|d| format!("{} {}", d.date.format("%Y-%m-%d"), d.speaker).trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_delivery_lines() {
        let parsed = parse_deliveries("2024-01-07 Jonas Berg\n\n2023-05-14").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].speaker, "Jonas Berg");
        assert_eq!(parsed[1].speaker, "");
        assert_eq!(format_deliveries(&parsed), "2024-01-07 Jonas Berg\n2023-05-14");
    }

    #[test]
    fn rejects_bad_dates() {
        assert!(parse_deliveries("07.01.2024 Jonas").is_err());
    }
}
