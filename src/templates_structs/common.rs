use askama::Template;

use crate::audit::AuditEntry;
use crate::models::setting::SettingDisplay;
use crate::models::week::WeekListItem;
use super::{PageContext, SelectOption};

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub app_name: String,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub week_count: i64,
    pub publisher_count: i64,
    pub visitor_count: i64,
    pub upcoming: Vec<WeekListItem>,
    pub recent: Vec<AuditEntry>,
}

#[derive(Template)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub ctx: PageContext,
    pub settings: Vec<SettingDisplay>,
    pub weekdays: Vec<SelectOption>,
    pub time_formats: Vec<SelectOption>,
    pub errors: Vec<String>,
}
