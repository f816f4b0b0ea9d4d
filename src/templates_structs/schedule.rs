use askama::Template;

/// One printed line of a meeting: start time, part, assignee.
#[derive(Debug, Clone)]
pub struct ScheduleLine {
    pub time: String,
    pub title: String,
    pub detail: String,
    pub assignee: String,
}

#[derive(Debug, Clone)]
pub struct ScheduleMeeting {
    pub heading: String,
    pub date: String,
    pub start: String,
    pub lines: Vec<ScheduleLine>,
}

/// Public read-only schedule of one week. No login needed.
#[derive(Template)]
#[template(path = "schedule.html")]
pub struct ScheduleTemplate {
    pub app_name: String,
    pub week_label: String,
    pub midweek: ScheduleMeeting,
    pub weekend: ScheduleMeeting,
}
