use askama::Template;

use crate::models::week::WeekListItem;
use super::{PageContext, SelectOption};

pub type WeekListRow = WeekListItem;

#[derive(Template)]
#[template(path = "weeks/list.html")]
pub struct WeekListTemplate {
    pub ctx: PageContext,
    pub weeks: Vec<WeekListRow>,
}

/// One assignment slot in the week form: a select of eligible candidates plus
/// a free-text name field. `key` is the slot path and doubles as field name.
#[derive(Debug, Clone)]
pub struct SlotView {
    pub key: String,
    pub label: String,
    pub options: Vec<SelectOption>,
    pub free_text: String,
    pub error: Option<String>,
}

impl SlotView {
    pub fn name_field(&self) -> String {
        format!("{}__name", self.key)
    }
}

#[derive(Debug, Clone)]
pub struct FieldMinistryRowView {
    pub index: usize,
    pub title: String,
    pub lesson: String,
    pub duration: String,
    pub time: String,
    pub assignee: SlotView,
    pub assistant: SlotView,
}

#[derive(Debug, Clone)]
pub struct LivingRowView {
    pub index: usize,
    pub title: String,
    pub duration: String,
    pub time: String,
    pub assignee: SlotView,
}

/// Everything the week form shows. Computed dates and times are read-only.
#[derive(Debug, Clone)]
pub struct WeekFormView {
    pub week_start_date: String,
    /// ISO `YYYY-WW` of the start date, for the import button.
    pub year_week: String,
    pub midweek_date: String,
    pub midweek_time: String,
    pub chairman: SlotView,
    pub opening_song: String,
    pub opening_prayer: SlotView,
    pub talk_title: String,
    pub talk_duration: String,
    pub talk_time: String,
    pub talk: SlotView,
    pub gems_duration: String,
    pub gems_time: String,
    pub gems: SlotView,
    pub reading_scripture: String,
    pub reading_lesson: String,
    pub reading_duration: String,
    pub reading_time: String,
    pub reading: SlotView,
    pub field_ministry: Vec<FieldMinistryRowView>,
    pub living_song: String,
    pub living: Vec<LivingRowView>,
    pub closing_song: String,
    pub closing_prayer: SlotView,
    pub closing_time: String,
    pub weekend_date: String,
    pub weekend_time: String,
    pub weekend_chairman: SlotView,
    pub weekend_opening_song: String,
    pub public_talks: Vec<SelectOption>,
    pub public_talk_duration: String,
    pub public_talk_time: String,
    pub speaker: SlotView,
    pub middle_song: String,
    pub watchtower_title: String,
    pub watchtower_duration: String,
    pub watchtower_time: String,
    pub conductor: SlotView,
    pub weekend_closing_song: String,
    pub weekend_closing_prayer: SlotView,
    pub weekend_closing_time: String,
}

#[derive(Template)]
#[template(path = "weeks/form.html")]
pub struct WeekFormTemplate {
    pub ctx: PageContext,
    pub form_action: String,
    pub form_title: String,
    pub week_id: Option<i64>,
    pub view: WeekFormView,
    pub errors: Vec<String>,
}
