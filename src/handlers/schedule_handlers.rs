use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;

use crate::errors::{AppError, render};
use crate::models::congregation::CongregationSettings;
use crate::models::public_talk;
use crate::models::week::{self, Assignee, MidweekMeeting, WeekDocument, WeekendMeeting};
use crate::schedule::{TimeFormat, format_meeting_date, recompute_for_display};
use crate::templates_structs::{ScheduleLine, ScheduleMeeting, ScheduleTemplate};

struct Lines<'a> {
    names: &'a HashMap<i64, String>,
    format: TimeFormat,
    lines: Vec<ScheduleLine>,
}

impl Lines<'_> {
    fn name(&self, assignee: Option<&Assignee>) -> String {
        match assignee {
            Some(Assignee::Reference(r)) => self.names.get(&r.value).cloned().unwrap_or_default(),
            Some(Assignee::Name(n)) => n.clone(),
            None => String::new(),
        }
    }

    fn part(&mut self, time: Option<NaiveTime>, title: &str, detail: &str, assignee: Option<&Assignee>) {
        let line = ScheduleLine {
            time: time.map(|t| self.format.format(t)).unwrap_or_default(),
            title: title.to_string(),
            detail: detail.to_string(),
            assignee: self.name(assignee),
        };
        self.lines.push(line);
    }

    fn song(&mut self, label: &str, song: Option<u32>) {
        if let Some(n) = song {
            self.part(None, &format!("{label} {n}"), "", None);
        }
    }
}

fn midweek_lines(mw: &MidweekMeeting, lines: &mut Lines<'_>) {
    lines.part(mw.calculated_time, "Chairman", "", mw.chairman.as_ref());
    lines.song("Song", mw.opening_song);
    lines.part(None, "Prayer", "", mw.opening_prayer.as_ref());

    let t = &mw.treasures_from_gods_word;
    lines.part(t.talk_time, "Treasures from God's Word", &t.talk_title, t.talk_assignee.as_ref());
    lines.part(t.spiritual_gems_time, "Spiritual gems", "", t.spiritual_gems_assignee.as_ref());
    let reading = [t.bible_reading_scripture.as_str(), t.bible_reading_lesson.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" · ");
    lines.part(t.bible_reading_time, "Bible reading", &reading, t.bible_reading_assignee.as_ref());

    for part in &mw.apply_yourself_to_field_ministry.field_ministry_assignments {
        let mut assignee = lines.name(part.assignee.as_ref());
        let assistant = lines.name(part.assistant.as_ref());
        if !assistant.is_empty() {
            assignee = format!("{assignee} / {assistant}");
        }
        let time = part.time.map(|t| lines.format.format(t)).unwrap_or_default();
        lines.lines.push(ScheduleLine { time, title: part.title.clone(), detail: part.lesson.clone(), assignee });
    }

    lines.song("Song", mw.living_as_christians.living_as_christians_song);
    for part in &mw.living_as_christians.assignments {
        lines.part(part.time, &part.title, "", part.assignee.as_ref());
    }

    lines.song("Song", mw.closing_song);
    lines.part(mw.closing_time, "Closing prayer", "", mw.closing_prayer.as_ref());
}

fn weekend_lines(we: &WeekendMeeting, talk_title: &str, lines: &mut Lines<'_>) {
    lines.part(we.calculated_time, "Chairman", "", we.chairman.as_ref());
    lines.song("Song", we.opening_song);
    lines.part(we.public_talk.time, "Public talk", talk_title, we.public_talk.speaker.as_ref());
    lines.song("Song", we.middle_song);
    lines.part(we.watchtower_study.time, "Watchtower study", &we.watchtower_study.title, we.watchtower_study.conductor.as_ref());
    lines.song("Song", we.closing_song);
    lines.part(we.closing_time, "Closing prayer", "", we.closing_prayer.as_ref());
}

/// Printable midweek and weekend blocks of a freshly recomputed document.
pub fn build_schedule(
    doc: &WeekDocument,
    names: &HashMap<i64, String>,
    talk_title: &str,
    format: TimeFormat,
) -> (ScheduleMeeting, ScheduleMeeting) {
    let mw = &doc.midweek_meeting;
    let mut lines = Lines { names, format, lines: Vec::new() };
    midweek_lines(mw, &mut lines);
    let midweek = ScheduleMeeting {
        heading: "Life and Ministry Meeting".to_string(),
        date: format_meeting_date(mw.calculated_date),
        start: format.display(mw.calculated_time),
        lines: std::mem::take(&mut lines.lines),
    };

    let we = &doc.weekend_meeting;
    weekend_lines(we, talk_title, &mut lines);
    let weekend = ScheduleMeeting {
        heading: "Weekend Meeting".to_string(),
        date: format_meeting_date(we.calculated_date),
        start: format.display(we.calculated_time),
        lines: lines.lines,
    };
    (midweek, weekend)
}

pub async fn week_schedule(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let date = NaiveDate::parse_from_str(&path.into_inner(), "%Y-%m-%d").map_err(|_| AppError::NotFound)?;
    let stored = week::find_by_start_date(&pool, date).await?.ok_or(AppError::NotFound)?;

    let settings = CongregationSettings::load(&pool).await?;
    let doc = recompute_for_display(&stored.document, &settings);
    let names = week::assignee_names(&pool, &doc.references()).await?;
    let talk_title = match doc.weekend_meeting.public_talk.title {
        Some(id) => public_talk::find_by_id(&pool, id).await?.map(|t| t.numbered_title()).unwrap_or_default(),
        None => String::new(),
    };

    let (midweek, weekend) = build_schedule(&doc, &names, &talk_title, settings.time_format);
    let app_name = if settings.name.is_empty() { "Versammlung".to_string() } else { settings.name.clone() };
    render(ScheduleTemplate {
        app_name,
        week_label: format!("Week of {}", date.format("%d.%m.%Y")),
        midweek,
        weekend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::week::{AssigneeRef, FieldMinistryPart};

    fn hm(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    #[test]
    fn lines_carry_times_and_names() {
        let mut doc = WeekDocument::default();
        let mw = &mut doc.midweek_meeting;
        mw.calculated_date = NaiveDate::from_ymd_opt(2025, 3, 6);
        mw.calculated_time = hm(19, 0);
        mw.chairman = Some(Assignee::Reference(AssigneeRef::publisher(1)));
        mw.opening_song = Some(77);
        mw.apply_yourself_to_field_ministry.field_ministry_assignments.push(FieldMinistryPart {
            title: "Starting a conversation".to_string(),
            lesson: "lmd lesson 1".to_string(),
            assignee: Some(Assignee::Reference(AssigneeRef::publisher(1))),
            assistant: Some(Assignee::Reference(AssigneeRef::visitor(2))),
            duration: Some(3),
            time: hm(19, 40),
        });
        let names = HashMap::from([(1, "Anna Lind".to_string()), (2, "Carl Gast".to_string())]);

        let (midweek, weekend) = build_schedule(&doc, &names, "", TimeFormat::TwentyFourHour);
        assert_eq!(midweek.date, "Thu 06.03.");
        assert_eq!(midweek.start, "19:00");
        assert_eq!(midweek.lines[0].assignee, "Anna Lind");
        assert_eq!(midweek.lines[1].title, "Song 77");
        let fm = midweek.lines.iter().find(|l| l.title == "Starting a conversation").unwrap();
        assert_eq!(fm.time, "19:40");
        assert_eq!(fm.assignee, "Anna Lind / Carl Gast");
        assert_eq!(weekend.date, "Not set");
    }

    #[test]
    fn unknown_references_render_blank() {
        let mut doc = WeekDocument::default();
        doc.weekend_meeting.chairman = Some(Assignee::Reference(AssigneeRef::publisher(99)));
        let (_, weekend) = build_schedule(&doc, &HashMap::new(), "12. Talk", TimeFormat::TwelveHour);
        assert_eq!(weekend.lines[0].assignee, "");
        let talk = weekend.lines.iter().find(|l| l.title == "Public talk").unwrap();
        assert_eq!(talk.detail, "12. Talk");
    }
}
