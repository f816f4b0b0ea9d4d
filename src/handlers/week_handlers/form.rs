//! Week form: flat form fields to [`WeekDocument`] and back.
//!
//! Field names are the document paths (`midweekMeeting.openingSong`,
//! `...fieldMinistryAssignments.2.title`). An assignment slot submits its
//! select under the slot path and the typed name under `<path>__name`.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveTime};

use crate::assignments::{Candidate, SlotPath, SlotRole, filter_candidates};
use crate::handlers::form::FormData;
use crate::models::congregation::CongregationSettings;
use crate::models::public_talk::PublicTalkTitle;
use crate::models::week::{Assignee, AssigneeRef, FieldMinistryPart, LivingPart, WeekDocument};
use crate::schedule::format_meeting_date;
use crate::templates_structs::{FieldMinistryRowView, LivingRowView, SelectOption, SlotView, WeekFormView};
use super::save::{FM_PREFIX, FieldMessage, LAC_PREFIX, START_DATE_PATH};

/// Rows always offered, filled or not.
const MIN_FIELD_MINISTRY_ROWS: usize = 4;
const MIN_LIVING_ROWS: usize = 3;


struct Reader<'a> {
    form: &'a FormData,
    errors: Vec<FieldMessage>,
}

impl Reader<'_> {
    fn text(&self, key: &str) -> String {
        self.form.get(key).trim().to_string()
    }

    fn number(&mut self, key: &str) -> Option<u32> {
        self.number_at(key, key)
    }

    /// Reads form field `key`, reporting problems under document `path`.
    fn number_at(&mut self, key: &str, path: &str) -> Option<u32> {
        let raw = self.form.get(key).trim();
        if raw.is_empty() {
            return None;
        }
        match raw.parse() {
            Ok(n) => Some(n),
            Err(_) => {
                self.errors.push(FieldMessage::new(path, format!("'{raw}' is not a whole number")));
                None
            }
        }
    }

    fn slot(&mut self, path: SlotPath) -> Option<Assignee> {
        self.slot_at(&path.to_string(), path)
    }

    fn slot_at(&mut self, key: &str, path: SlotPath) -> Option<Assignee> {
        let typed = self.form.get(&format!("{key}__name")).trim();
        if !typed.is_empty() {
            return Some(Assignee::Name(typed.to_string()));
        }
        let selected = self.form.get(key).trim();
        if selected.is_empty() {
            return None;
        }
        match AssigneeRef::parse_option_value(selected) {
            Some(r) => Some(Assignee::Reference(r)),
            None => {
                self.errors.push(FieldMessage::new(path.to_string(), format!("Unknown selection '{selected}'")));
                None
            }
        }
    }

    fn blank(&self, keys: &[String]) -> bool {
        keys.iter().all(|k| self.form.get(k).trim().is_empty())
    }
}

/// Build a document from the submitted week form. Computed fields are left
/// empty. Rows with nothing filled in are dropped, and messages for the kept
/// rows use their position in the document.
pub fn parse_week_form(form: &FormData) -> (WeekDocument, Vec<FieldMessage>) {
    let mut r = Reader { form, errors: Vec::new() };
    let mut doc = WeekDocument::default();

    let start = form.get(START_DATE_PATH).trim();
    if !start.is_empty() {
        match NaiveDate::parse_from_str(start, "%Y-%m-%d") {
            Ok(d) => doc.week_start_date = Some(d),
            Err(_) => r.errors.push(FieldMessage::new(START_DATE_PATH, "Week start date must be YYYY-MM-DD")),
        }
    }

    let mw = &mut doc.midweek_meeting;
    mw.chairman = r.slot(SlotPath::new(SlotRole::MidweekChairman));
    mw.opening_song = r.number("midweekMeeting.openingSong");
    mw.opening_prayer = r.slot(SlotPath::new(SlotRole::MidweekOpeningPrayer));

    let t = &mut mw.treasures_from_gods_word;
    t.talk_title = r.text("midweekMeeting.treasuresFromGodsWord.talkTitle");
    t.talk_duration = r.number("midweekMeeting.treasuresFromGodsWord.talkDuration");
    t.talk_assignee = r.slot(SlotPath::new(SlotRole::TalkAssignee));
    t.spiritual_gems_duration = r.number("midweekMeeting.treasuresFromGodsWord.spiritualGemsDuration");
    t.spiritual_gems_assignee = r.slot(SlotPath::new(SlotRole::SpiritualGemsAssignee));
    t.bible_reading_scripture = r.text("midweekMeeting.treasuresFromGodsWord.bibleReadingScripture");
    t.bible_reading_lesson = r.text("midweekMeeting.treasuresFromGodsWord.bibleReadingLesson");
    t.bible_reading_duration = r.number("midweekMeeting.treasuresFromGodsWord.bibleReadingDuration");
    t.bible_reading_assignee = r.slot(SlotPath::new(SlotRole::BibleReadingAssignee));

    let fm_parts = &mut mw.apply_yourself_to_field_ministry.field_ministry_assignments;
    let mut i = 0;
    while form.contains(&format!("{FM_PREFIX}.{i}.title")) {
        let field = |name: &str| format!("{FM_PREFIX}.{i}.{name}");
        let inputs = ["title", "lesson", "duration", "assignee", "assignee__name", "assistant", "assistant__name"];
        if !r.blank(&inputs.map(field)) {
            let n = fm_parts.len();
            fm_parts.push(FieldMinistryPart {
                title: r.text(&field("title")),
                lesson: r.text(&field("lesson")),
                duration: r.number_at(&field("duration"), &format!("{FM_PREFIX}.{n}.duration")),
                assignee: r.slot_at(&field("assignee"), SlotPath::indexed(SlotRole::FieldMinistryAssignee, n)),
                assistant: r.slot_at(&field("assistant"), SlotPath::indexed(SlotRole::FieldMinistryAssistant, n)),
                time: None,
            });
        }
        i += 1;
    }

    mw.living_as_christians.living_as_christians_song =
        r.number("midweekMeeting.livingAsChristians.livingAsChristiansSong");
    let lac_parts = &mut mw.living_as_christians.assignments;
    let mut i = 0;
    while form.contains(&format!("{LAC_PREFIX}.{i}.title")) {
        let field = |name: &str| format!("{LAC_PREFIX}.{i}.{name}");
        if !r.blank(&["title", "duration", "assignee", "assignee__name"].map(field)) {
            let n = lac_parts.len();
            lac_parts.push(LivingPart {
                title: r.text(&field("title")),
                duration: r.number_at(&field("duration"), &format!("{LAC_PREFIX}.{n}.duration")),
                assignee: r.slot_at(&field("assignee"), SlotPath::indexed(SlotRole::LivingAsChristiansAssignee, n)),
                time: None,
            });
        }
        i += 1;
    }

    mw.closing_song = r.number("midweekMeeting.closingSong");
    mw.closing_prayer = r.slot(SlotPath::new(SlotRole::MidweekClosingPrayer));

    let we = &mut doc.weekend_meeting;
    we.chairman = r.slot(SlotPath::new(SlotRole::WeekendChairman));
    we.opening_song = r.number("weekendMeeting.openingSong");
    we.public_talk.title = form.get_id("weekendMeeting.publicTalk.title");
    we.public_talk.duration = r.number("weekendMeeting.publicTalk.duration");
    we.public_talk.speaker = r.slot(SlotPath::new(SlotRole::PublicTalkSpeaker));
    we.middle_song = r.number("weekendMeeting.middleSong");
    we.watchtower_study.title = r.text("weekendMeeting.watchtowerStudy.title");
    we.watchtower_study.duration = r.number("weekendMeeting.watchtowerStudy.duration");
    we.watchtower_study.conductor = r.slot(SlotPath::new(SlotRole::WatchtowerConductor));
    we.closing_song = r.number("weekendMeeting.closingSong");
    we.closing_prayer = r.slot(SlotPath::new(SlotRole::WeekendClosingPrayer));

    (doc, r.errors)
}

fn slot_label(role: SlotRole) -> &'static str {
    match role {
        SlotRole::MidweekChairman | SlotRole::WeekendChairman => "Chairman",
        SlotRole::MidweekOpeningPrayer => "Opening prayer",
        SlotRole::TalkAssignee => "Speaker",
        SlotRole::SpiritualGemsAssignee => "Spiritual gems",
        SlotRole::BibleReadingAssignee => "Reader",
        SlotRole::FieldMinistryAssignee => "Student",
        SlotRole::FieldMinistryAssistant => "Assistant",
        SlotRole::LivingAsChristiansAssignee => "Assigned to",
        SlotRole::MidweekClosingPrayer | SlotRole::WeekendClosingPrayer => "Closing prayer",
        SlotRole::PublicTalkSpeaker => "Speaker",
        SlotRole::WatchtowerConductor => "Conductor",
    }
}

/// Inputs shared by every slot of one form rendering.
pub struct SlotContext<'a> {
    pub candidates: &'a [Candidate],
    /// Display names of everyone the document references.
    pub names: &'a HashMap<i64, String>,
    pub errors: &'a [FieldMessage],
}

impl SlotContext<'_> {
    fn view(&self, path: SlotPath, value: Option<&Assignee>) -> SlotView {
        let key = path.to_string();
        let current = value.and_then(Assignee::reference);
        let mut options: Vec<SelectOption> = filter_candidates(path.role, self.candidates.to_vec())
            .into_iter()
            .map(|c| {
                let r = c.reference();
                SelectOption::new(r.option_value(), c.display_name(), current == Some(&r))
            })
            .collect();

        // keep a stored assignee selectable even when no longer eligible
        if let Some(r) = current {
            if !options.iter().any(|o| o.selected) {
                let name = self.names.get(&r.value).cloned().unwrap_or_else(|| format!("#{}", r.value));
                options.insert(0, SelectOption::new(r.option_value(), format!("{name} (not eligible)"), true));
            }
        }

        let free_text = match value {
            Some(Assignee::Name(n)) => n.clone(),
            _ => String::new(),
        };
        let error = self.errors.iter().find(|e| e.path == key).map(|e| e.message.clone());

        SlotView { key, label: slot_label(path.role).to_string(), options, free_text, error }
    }
}

fn num(n: Option<u32>) -> String {
    n.map(|n| n.to_string()).unwrap_or_default()
}

/// Assemble the form view. `doc` should already carry fresh computed fields.
pub fn build_view(
    doc: &WeekDocument,
    slots: &SlotContext<'_>,
    talks: &[PublicTalkTitle],
    settings: &CongregationSettings,
) -> WeekFormView {
    let time = |t: Option<NaiveTime>| settings.time_format.display(t);
    let mw = &doc.midweek_meeting;
    let t = &mw.treasures_from_gods_word;
    let we = &doc.weekend_meeting;

    let fm_parts = &mw.apply_yourself_to_field_ministry.field_ministry_assignments;
    let fm_rows = (fm_parts.len() + 1).max(MIN_FIELD_MINISTRY_ROWS);
    let field_ministry = (0..fm_rows)
        .map(|i| {
            let blank = FieldMinistryPart::default();
            let part = fm_parts.get(i).unwrap_or(&blank);
            FieldMinistryRowView {
                index: i,
                title: part.title.clone(),
                lesson: part.lesson.clone(),
                duration: num(part.duration),
                time: if i < fm_parts.len() { time(part.time) } else { String::new() },
                assignee: slots.view(SlotPath::indexed(SlotRole::FieldMinistryAssignee, i), part.assignee.as_ref()),
                assistant: slots.view(SlotPath::indexed(SlotRole::FieldMinistryAssistant, i), part.assistant.as_ref()),
            }
        })
        .collect();

    let lac_parts = &mw.living_as_christians.assignments;
    let lac_rows = (lac_parts.len() + 1).max(MIN_LIVING_ROWS);
    let living = (0..lac_rows)
        .map(|i| {
            let blank = LivingPart::default();
            let part = lac_parts.get(i).unwrap_or(&blank);
            LivingRowView {
                index: i,
                title: part.title.clone(),
                duration: num(part.duration),
                time: if i < lac_parts.len() { time(part.time) } else { String::new() },
                assignee: slots.view(SlotPath::indexed(SlotRole::LivingAsChristiansAssignee, i), part.assignee.as_ref()),
            }
        })
        .collect();

    let public_talks = talks
        .iter()
        .map(|talk| SelectOption::new(talk.id.to_string(), talk.numbered_title(), we.public_talk.title == Some(talk.id)))
        .collect();

    WeekFormView {
        week_start_date: doc.week_start_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
        year_week: doc
            .week_start_date
            .map(|d| format!("{}-{:02}", d.iso_week().year(), d.iso_week().week()))
            .unwrap_or_default(),
        midweek_date: format_meeting_date(mw.calculated_date),
        midweek_time: time(mw.calculated_time),
        chairman: slots.view(SlotPath::new(SlotRole::MidweekChairman), mw.chairman.as_ref()),
        opening_song: num(mw.opening_song),
        opening_prayer: slots.view(SlotPath::new(SlotRole::MidweekOpeningPrayer), mw.opening_prayer.as_ref()),
        talk_title: t.talk_title.clone(),
        talk_duration: num(t.talk_duration),
        talk_time: time(t.talk_time),
        talk: slots.view(SlotPath::new(SlotRole::TalkAssignee), t.talk_assignee.as_ref()),
        gems_duration: num(t.spiritual_gems_duration),
        gems_time: time(t.spiritual_gems_time),
        gems: slots.view(SlotPath::new(SlotRole::SpiritualGemsAssignee), t.spiritual_gems_assignee.as_ref()),
        reading_scripture: t.bible_reading_scripture.clone(),
        reading_lesson: t.bible_reading_lesson.clone(),
        reading_duration: num(t.bible_reading_duration),
        reading_time: time(t.bible_reading_time),
        reading: slots.view(SlotPath::new(SlotRole::BibleReadingAssignee), t.bible_reading_assignee.as_ref()),
        field_ministry,
        living_song: num(mw.living_as_christians.living_as_christians_song),
        living,
        closing_song: num(mw.closing_song),
        closing_prayer: slots.view(SlotPath::new(SlotRole::MidweekClosingPrayer), mw.closing_prayer.as_ref()),
        closing_time: time(mw.closing_time),
        weekend_date: format_meeting_date(we.calculated_date),
        weekend_time: time(we.calculated_time),
        weekend_chairman: slots.view(SlotPath::new(SlotRole::WeekendChairman), we.chairman.as_ref()),
        weekend_opening_song: num(we.opening_song),
        public_talks,
        public_talk_duration: num(we.public_talk.duration),
        public_talk_time: time(we.public_talk.time),
        speaker: slots.view(SlotPath::new(SlotRole::PublicTalkSpeaker), we.public_talk.speaker.as_ref()),
        middle_song: num(we.middle_song),
        watchtower_title: we.watchtower_study.title.clone(),
        watchtower_duration: num(we.watchtower_study.duration),
        watchtower_time: time(we.watchtower_study.time),
        conductor: slots.view(SlotPath::new(SlotRole::WatchtowerConductor), we.watchtower_study.conductor.as_ref()),
        weekend_closing_song: num(we.closing_song),
        weekend_closing_prayer: slots.view(SlotPath::new(SlotRole::WeekendClosingPrayer), we.closing_prayer.as_ref()),
        weekend_closing_time: time(we.closing_time),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignments::{AssignmentPermission as P, PublisherRecord, VisitorRecord};

    fn parse(body: &str) -> (WeekDocument, Vec<FieldMessage>) {
        parse_week_form(&FormData::parse(body))
    }

    #[test]
    fn reads_slots_as_reference_or_typed_name() {
        let (doc, errors) = parse(
            "weekStartDate=2025-03-03\
             &midweekMeeting.chairman=users%3A12\
             &midweekMeeting.openingPrayer=users%3A12\
             &midweekMeeting.openingPrayer__name=Gast+Redner\
             &weekendMeeting.publicTalk.speaker=visitors%3A4",
        );
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(doc.week_start_date, NaiveDate::from_ymd_opt(2025, 3, 3));
        let mw = &doc.midweek_meeting;
        assert_eq!(mw.chairman, Some(Assignee::Reference(AssigneeRef::publisher(12))));
        // typed name wins over the select
        assert_eq!(mw.opening_prayer, Some(Assignee::Name("Gast Redner".to_string())));
        assert_eq!(
            doc.weekend_meeting.public_talk.speaker,
            Some(Assignee::Reference(AssigneeRef::visitor(4)))
        );
    }

    #[test]
    fn drops_blank_rows_and_keeps_filled_ones() {
        let fm = FM_PREFIX;
        let body = format!(
            "{fm}.0.title=Starting+a+conversation&{fm}.0.duration=3&{fm}.0.assignee=users%3A1\
             &{fm}.1.title=&{fm}.1.lesson=&{fm}.1.duration=\
             &{fm}.2.title=Making+disciples&{fm}.2.duration=5\
             &{LAC_PREFIX}.0.title=Local+needs&{LAC_PREFIX}.0.duration=15\
             &{LAC_PREFIX}.1.title="
        );
        let (doc, errors) = parse(&body);
        assert!(errors.is_empty());
        let parts = &doc.midweek_meeting.apply_yourself_to_field_ministry.field_ministry_assignments;
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].title, "Making disciples");
        assert_eq!(parts[1].duration, Some(5));
        assert_eq!(doc.midweek_meeting.living_as_christians.assignments.len(), 1);
    }

    #[test]
    fn messages_follow_rows_after_blank_ones_are_dropped() {
        let fm = FM_PREFIX;
        let body = format!(
            "{fm}.0.title=&{fm}.0.duration=&{fm}.0.assignee=\
             &{fm}.1.title=Return+visit&{fm}.1.duration=four&{fm}.1.assistant=nobody%3A3\
             &{LAC_PREFIX}.0.title=&{LAC_PREFIX}.1.title=&{LAC_PREFIX}.2.title=Needs&{LAC_PREFIX}.2.duration=x"
        );
        let (doc, errors) = parse(&body);
        let parts = &doc.midweek_meeting.apply_yourself_to_field_ministry.field_ministry_assignments;
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].title, "Return visit");
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "midweekMeeting.applyYourselfToFieldMinistry.fieldMinistryAssignments.0.duration",
                "midweekMeeting.applyYourselfToFieldMinistry.fieldMinistryAssignments.0.assistant",
                "midweekMeeting.livingAsChristians.assignments.0.duration",
            ]
        );
    }

    #[test]
    fn row_with_only_a_typed_name_is_kept() {
        let body = format!("{FM_PREFIX}.0.title=&{FM_PREFIX}.0.assistant__name=Clara+Vogt");
        let (doc, errors) = parse(&body);
        assert!(errors.is_empty());
        let parts = &doc.midweek_meeting.apply_yourself_to_field_ministry.field_ministry_assignments;
        assert_eq!(parts[0].assistant, Some(Assignee::Name("Clara Vogt".to_string())));
    }

    #[test]
    fn reports_bad_numbers_and_dates_by_path() {
        let (doc, errors) = parse("weekStartDate=03.03.2025&midweekMeeting.openingSong=abc");
        assert_eq!(doc.week_start_date, None);
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec![START_DATE_PATH, "midweekMeeting.openingSong"]);
    }

    #[test]
    fn slot_options_are_filtered_by_role() {
        let candidates = vec![
            Candidate::Publisher(PublisherRecord {
                id: 1,
                display_name: "Anna Lind".to_string(),
                assignment_permissions: [P::FieldMinistry].into_iter().collect(),
            }),
            Candidate::Publisher(PublisherRecord {
                id: 2,
                display_name: "Ben Kraus".to_string(),
                assignment_permissions: [P::Chairman, P::Prayer].into_iter().collect(),
            }),
            Candidate::Visitor(VisitorRecord { id: 9, name: "Carl Gast".to_string() }),
        ];
        let names = HashMap::from([(1, "Anna Lind".to_string())]);
        let ctx = SlotContext { candidates: &candidates, names: &names, errors: &[] };

        let chairman = Assignee::Reference(AssigneeRef::publisher(1));
        let view = ctx.view(SlotPath::new(SlotRole::MidweekChairman), Some(&chairman));
        let labels: Vec<&str> = view.options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["Anna Lind (not eligible)", "Ben Kraus", "Carl Gast"]);
        assert!(view.options[0].selected);
        assert_eq!(view.key, "midweekMeeting.chairman");
        assert_eq!(view.name_field(), "midweekMeeting.chairman__name");
    }

    #[test]
    fn view_pads_rows_and_marks_errors() {
        let errors = vec![FieldMessage::new("weekendMeeting.chairman", "Publisher 3 does not exist")];
        let names = HashMap::new();
        let ctx = SlotContext { candidates: &[], names: &names, errors: &errors };
        let view = build_view(&WeekDocument::default(), &ctx, &[], &CongregationSettings::default());
        assert_eq!(view.field_ministry.len(), MIN_FIELD_MINISTRY_ROWS);
        assert_eq!(view.living.len(), MIN_LIVING_ROWS);
        assert_eq!(view.weekend_chairman.error.as_deref(), Some("Publisher 3 does not exist"));
        assert_eq!(view.midweek_date, "Not set");
        assert!(view.year_week.is_empty());
    }
}
