//! Pre-fill a week from the external meeting scraper.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;

use crate::auth::session::{WEEKS_EDIT, require_permission};
use crate::config::ScraperConfig;
use crate::errors::AppError;

#[derive(Deserialize)]
pub struct ImportQuery {
    #[serde(rename = "yearWeek", default)]
    pub year_week: String,
}

/// Parse `YYYY-WW` (also accepts `YYYY/WW`) into ISO year and week.
pub fn parse_year_week(s: &str) -> Option<(i32, u32)> {
    let (year, week) = s.trim().split_once(['-', '/'])?;
    if year.len() != 4 || week.is_empty() || week.len() > 2 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let week: u32 = week.parse().ok()?;
    (1..=53).contains(&week).then_some((year, week))
}

fn output_path() -> PathBuf {
    let stamp = chrono::Utc::now().timestamp_millis();
    let nonce: u32 = rand::random();
    std::env::temp_dir().join(format!("meeting_data_{stamp}_{nonce:08x}.json"))
}

/// Run the scraper for one ISO week and return its JSON document.
///
/// The output file is always removed, also when the script fails.
pub async fn run_scraper(config: &ScraperConfig, year: i32, week: u32) -> Result<Value, AppError> {
    if tokio::fs::metadata(&config.script).await.is_err() {
        return Err(AppError::Import(format!("Scraper script not found: {}", config.script)));
    }
    let output = output_path();
    let result = scrape_into(config, &format!("{year}/{week:02}"), &output).await;
    let _ = tokio::fs::remove_file(&output).await;
    result
}

async fn scrape_into(config: &ScraperConfig, year_week: &str, output: &Path) -> Result<Value, AppError> {
    log::info!("Running scraper for {year_week}");
    let mut command = Command::new(&config.python);
    command
        .arg(&config.script)
        .arg("--year-week")
        .arg(year_week)
        .arg("--output")
        .arg(output)
        .stdin(Stdio::null())
        .kill_on_drop(true);
    let child = command.output();

    let result = tokio::time::timeout(config.timeout, child)
        .await
        .map_err(|_| AppError::Import(format!("Scraper timed out after {}s", config.timeout.as_secs())))?
        .map_err(|e| AppError::Import(format!("Could not start scraper: {e}")))?;

    let stderr = String::from_utf8_lossy(&result.stderr);
    if !stderr.trim().is_empty() {
        log::warn!("Scraper stderr: {}", stderr.trim());
    }
    if !result.status.success() {
        return Err(AppError::Import(format!("Scraper exited with {}", result.status)));
    }

    let raw = tokio::fs::read_to_string(output)
        .await
        .map_err(|_| AppError::Import("Scraper produced no output file".to_string()))?;
    let data: Value = serde_json::from_str(&raw)
        .map_err(|e| AppError::Import(format!("Scraper output is not valid JSON: {e}")))?;

    if data.get("midweekMeeting").is_none() || data.get("weekendMeeting").is_none() {
        return Err(AppError::Import("Scraper output lacks midweekMeeting or weekendMeeting".to_string()));
    }
    Ok(data)
}

pub async fn import_meeting(
    session: Session,
    config: web::Data<ScraperConfig>,
    query: web::Query<ImportQuery>,
) -> Result<HttpResponse, AppError> {
    require_permission(&session, WEEKS_EDIT)?;
    let Some((year, week)) = parse_year_week(&query.year_week) else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": format!("Invalid yearWeek '{}', expected YYYY-WW", query.year_week),
        })));
    };

    let week_data = run_scraper(&config, year, week).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "weekData": week_data,
    })))
}
