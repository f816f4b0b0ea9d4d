// Template context structures for Askama templates, organized by domain.

use actix_session::Session;
use sqlx::PgPool;

use crate::auth::csrf;
use crate::auth::session::{Permissions, get_permissions, get_username, take_flash};
use crate::errors::AppError;
use crate::models::{congregation, setting};

/// Common context shared by all authenticated pages.
/// Templates access these as `ctx.username`, `ctx.permissions`, etc.
pub struct PageContext {
    pub username: String,
    pub avatar_initial: String,
    pub permissions: Permissions,
    pub flash: Option<String>,
    pub app_name: String,
    pub csrf_token: String,
    pub current_path: String,
}

impl PageContext {
    pub async fn build(session: &Session, pool: &PgPool, current_path: &str) -> Result<Self, AppError> {
        let username = get_username(session)?;
        let permissions = get_permissions(session)?;
        let flash = take_flash(session);
        let app_name = setting::get_value(pool, congregation::NAME, "Versammlung").await;
        let csrf_token = csrf::get_or_create_token(session);
        let avatar_initial = username.chars().next().unwrap_or('?').to_uppercase().to_string();
        Ok(Self {
            username,
            avatar_initial,
            permissions,
            flash,
            app_name,
            csrf_token,
            current_path: current_path.to_string(),
        })
    }

    /// Whether the sidebar entry for `prefix` is the current section.
    pub fn is_active(&self, prefix: &str) -> bool {
        self.current_path.starts_with(prefix)
    }
}

/// An `<option>` in a select box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>, selected: bool) -> Self {
        Self { value: value.into(), label: label.into(), selected }
    }
}

/// Options from id/label pairs with an optional current selection.
pub fn id_options(items: &[(i64, String)], selected: Option<i64>) -> Vec<SelectOption> {
    items
        .iter()
        .map(|(id, label)| SelectOption::new(id.to_string(), label.clone(), Some(*id) == selected))
        .collect()
}

mod common;
mod directory;
mod schedule;
mod week;

pub use self::common::{DashboardTemplate, LoginTemplate, SettingsTemplate};
pub use self::directory::{
    CheckboxOption, FieldServiceFormTemplate, FieldServiceListTemplate, GroupFormTemplate, GroupListTemplate,
    PublisherFormTemplate, PublisherListRow, PublisherListTemplate, TalkFormTemplate, TalkListRow,
    TalkListTemplate, VisitorFormTemplate, VisitorListTemplate, AbsenceRow,
};
pub use self::schedule::{ScheduleLine, ScheduleMeeting, ScheduleTemplate};
pub use self::week::{
    FieldMinistryRowView, LivingRowView, SlotView, WeekFormTemplate, WeekFormView, WeekListRow, WeekListTemplate,
};
