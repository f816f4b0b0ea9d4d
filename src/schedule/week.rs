use chrono::NaiveDate;

use crate::models::congregation::{CongregationSettings, MeetingSlotSetting};
use crate::models::week::{MidweekMeeting, WeekDocument, WeekendMeeting};
use super::dates::calculate_meeting_date;
use super::timing::{Part, PartDurations, PartKind, schedule_parts};

/// Overwrite every computed date and time field of `doc` from its week start
/// date, the congregation settings and the per-part durations.
///
/// Previously stored computed values are never read. Fields whose inputs are
/// missing are cleared rather than left stale.
pub fn compute_derived_fields(doc: &mut WeekDocument, settings: &CongregationSettings) {
    let week_start = doc.week_start_date;
    if week_start.is_none() {
        log::debug!("Week has no start date, meeting dates not computed");
    }
    compute_midweek(&mut doc.midweek_meeting, week_start, &settings.midweek, &settings.durations);
    compute_weekend(&mut doc.weekend_meeting, week_start, &settings.weekend, &settings.durations);
}

/// After-read transform: a copy of the stored document with fresh computed fields.
pub fn recompute_for_display(doc: &WeekDocument, settings: &CongregationSettings) -> WeekDocument {
    let mut fresh = doc.clone();
    compute_derived_fields(&mut fresh, settings);
    fresh
}

fn meeting_date(week_start: Option<NaiveDate>, slot: &MeetingSlotSetting) -> Option<NaiveDate> {
    let date = week_start.and_then(|start| calculate_meeting_date(start, slot.weekday));
    if week_start.is_some() && date.is_none() {
        log::debug!("Meeting weekday not configured, date not computed");
    }
    date
}

fn compute_midweek(
    meeting: &mut MidweekMeeting,
    week_start: Option<NaiveDate>,
    slot: &MeetingSlotSetting,
    durations: &PartDurations,
) {
    meeting.calculated_date = meeting_date(week_start, slot);
    meeting.calculated_time = slot.time;

    let treasures = &meeting.treasures_from_gods_word;
    let field_ministry = &meeting.apply_yourself_to_field_ministry.field_ministry_assignments;
    let living = &meeting.living_as_christians.assignments;

    let mut parts = vec![
        Part::new(PartKind::MidweekOpening, None),
        Part::new(PartKind::Talk, treasures.talk_duration),
        Part::new(PartKind::SpiritualGems, treasures.spiritual_gems_duration),
        Part::new(PartKind::BibleReading, treasures.bible_reading_duration),
    ];
    parts.extend(field_ministry.iter().map(|p| Part::new(PartKind::FieldMinistry, p.duration)));
    parts.push(Part::new(PartKind::Song, None));
    parts.extend(living.iter().map(|p| Part::new(PartKind::LivingAsChristians, p.duration)));
    parts.push(Part::new(PartKind::Closing, None));

    if slot.time.is_none() {
        log::debug!("Midweek meeting time not configured, part times not computed");
    }
    let mut starts = schedule_parts(slot.time, &parts, durations).part_starts.into_iter();
    let mut next = move || starts.next().flatten();

    next(); // opening
    let treasures = &mut meeting.treasures_from_gods_word;
    treasures.talk_time = next();
    treasures.spiritual_gems_time = next();
    treasures.bible_reading_time = next();
    for part in &mut meeting.apply_yourself_to_field_ministry.field_ministry_assignments {
        part.time = next();
    }
    next(); // song
    for part in &mut meeting.living_as_christians.assignments {
        part.time = next();
    }
    meeting.closing_time = next();
}

fn compute_weekend(
    meeting: &mut WeekendMeeting,
    week_start: Option<NaiveDate>,
    slot: &MeetingSlotSetting,
    durations: &PartDurations,
) {
    meeting.calculated_date = meeting_date(week_start, slot);
    meeting.calculated_time = slot.time;

    let parts = [
        Part::new(PartKind::WeekendOpening, None),
        Part::new(PartKind::PublicTalk, meeting.public_talk.duration),
        Part::new(PartKind::Song, None),
        Part::new(PartKind::WatchtowerStudy, meeting.watchtower_study.duration),
        Part::new(PartKind::Closing, None),
    ];

    if slot.time.is_none() {
        log::debug!("Weekend meeting time not configured, part times not computed");
    }
    let starts = schedule_parts(slot.time, &parts, durations).part_starts;
    meeting.public_talk.time = starts[1];
    meeting.watchtower_study.time = starts[3];
    meeting.closing_time = starts[4];
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Weekday};
    use crate::models::week::{FieldMinistryPart, LivingPart};

    fn hm(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    fn settings() -> CongregationSettings {
        CongregationSettings {
            midweek: MeetingSlotSetting { weekday: Some(Weekday::Thu), time: hm(19, 0) },
            weekend: MeetingSlotSetting { weekday: Some(Weekday::Sun), time: hm(10, 0) },
            ..CongregationSettings::default()
        }
    }

    fn sample_week() -> WeekDocument {
        let mut doc = WeekDocument {
            week_start_date: NaiveDate::from_ymd_opt(2025, 3, 3),
            ..WeekDocument::default()
        };
        let mw = &mut doc.midweek_meeting;
        mw.treasures_from_gods_word.talk_duration = Some(10);
        mw.apply_yourself_to_field_ministry.field_ministry_assignments = vec![
            FieldMinistryPart { duration: Some(3), ..FieldMinistryPart::default() },
            FieldMinistryPart { duration: Some(5), ..FieldMinistryPart::default() },
        ];
        mw.living_as_christians.assignments = vec![
            LivingPart { duration: Some(15), ..LivingPart::default() },
            LivingPart { duration: Some(30), ..LivingPart::default() },
        ];
        doc
    }

    #[test]
    fn midweek_programme_runs_on_a_single_clock() {
        let mut doc = sample_week();
        compute_derived_fields(&mut doc, &settings());

        let mw = &doc.midweek_meeting;
        assert_eq!(mw.calculated_date, NaiveDate::from_ymd_opt(2025, 3, 6));
        assert_eq!(mw.calculated_time, hm(19, 0));
        let t = &mw.treasures_from_gods_word;
        assert_eq!(t.talk_time, hm(19, 6));
        assert_eq!(t.spiritual_gems_time, hm(19, 16));
        assert_eq!(t.bible_reading_time, hm(19, 26));
        let fm = &mw.apply_yourself_to_field_ministry.field_ministry_assignments;
        assert_eq!(fm[0].time, hm(19, 30));
        assert_eq!(fm[1].time, hm(19, 33));
        let lac = &mw.living_as_christians.assignments;
        // 19:38 + 5 minute song
        assert_eq!(lac[0].time, hm(19, 43));
        assert_eq!(lac[1].time, hm(19, 58));
        assert_eq!(mw.closing_time, hm(20, 28));
    }

    #[test]
    fn weekend_programme_uses_defaults() {
        let mut doc = sample_week();
        compute_derived_fields(&mut doc, &settings());

        let we = &doc.weekend_meeting;
        assert_eq!(we.calculated_date, NaiveDate::from_ymd_opt(2025, 3, 9));
        assert_eq!(we.public_talk.time, hm(10, 5));
        assert_eq!(we.watchtower_study.time, hm(10, 40));
        assert_eq!(we.closing_time, hm(11, 40));
    }

    #[test]
    fn unset_weekday_leaves_date_not_computed() {
        let mut s = settings();
        s.midweek.weekday = None;
        let mut doc = sample_week();
        doc.midweek_meeting.calculated_date = NaiveDate::from_ymd_opt(2000, 1, 1);
        compute_derived_fields(&mut doc, &s);
        assert_eq!(doc.midweek_meeting.calculated_date, None);
        assert_eq!(doc.weekend_meeting.calculated_date, NaiveDate::from_ymd_opt(2025, 3, 9));
    }

    #[test]
    fn unset_time_clears_stale_part_times() {
        let mut s = settings();
        s.weekend.time = None;
        let mut doc = sample_week();
        doc.weekend_meeting.public_talk.time = hm(9, 0);
        compute_derived_fields(&mut doc, &s);
        assert_eq!(doc.weekend_meeting.calculated_time, None);
        assert_eq!(doc.weekend_meeting.public_talk.time, None);
        assert_eq!(doc.weekend_meeting.closing_time, None);
    }

    #[test]
    fn recomputation_ignores_previous_output() {
        let s = settings();
        let first = recompute_for_display(&sample_week(), &s);
        let second = recompute_for_display(&first, &s);
        assert_eq!(first, second);
    }
}
