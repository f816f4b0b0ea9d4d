use std::ops::RangeInclusive;

use chrono::{Datelike, Weekday};
use serde::Serialize;
use sqlx::PgPool;

use crate::assignments::{AssignmentError, Operation, resolve_and_validate};
use crate::audit;
use crate::db::is_unique_violation;
use crate::errors::AppError;
use crate::models::congregation::CongregationSettings;
use crate::models::directory::PgDirectory;
use crate::models::week::{self, StoredWeek, WeekDocument};
use crate::schedule::compute_derived_fields;

pub const START_DATE_PATH: &str = "weekStartDate";
pub const FM_PREFIX: &str = "midweekMeeting.applyYourselfToFieldMinistry.fieldMinistryAssignments";
pub const LAC_PREFIX: &str = "midweekMeeting.livingAsChristians.assignments";

const TALK_MINUTES: RangeInclusive<u32> = 5..=30;
const READING_MINUTES: RangeInclusive<u32> = 1..=10;
const PART_MINUTES: RangeInclusive<u32> = 1..=30;
const SONG_NUMBERS: RangeInclusive<u32> = 1..=151;

/// A problem attributed to one field of the week document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMessage {
    pub path: String,
    pub message: String,
}

impl FieldMessage {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { path: path.into(), message: message.into() }
    }
}

impl From<&AssignmentError> for FieldMessage {
    fn from(e: &AssignmentError) -> Self {
        FieldMessage::new(e.slot().to_string(), e.to_string())
    }
}

#[derive(Debug)]
pub enum SaveOutcome {
    Saved(StoredWeek),
    /// Another week already starts on this date.
    Duplicate { document: WeekDocument, existing_id: i64 },
    /// Field errors; `document` carries the submitted values for redisplay.
    Rejected { document: WeekDocument, errors: Vec<FieldMessage> },
}

fn duplicate_message(doc: &WeekDocument) -> FieldMessage {
    let date = doc.week_start_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
    FieldMessage::new(START_DATE_PATH, format!("A week starting {date} already exists"))
}

impl SaveOutcome {
    /// Every field message, including the duplicate start date.
    pub fn messages(&self) -> Vec<FieldMessage> {
        match self {
            SaveOutcome::Saved(_) => Vec::new(),
            SaveOutcome::Duplicate { document, .. } => vec![duplicate_message(document)],
            SaveOutcome::Rejected { errors, .. } => errors.clone(),
        }
    }
}

fn check_range(
    errors: &mut Vec<FieldMessage>,
    path: impl Into<String>,
    value: Option<u32>,
    range: &RangeInclusive<u32>,
    what: &str,
) {
    if let Some(v) = value.filter(|v| !range.contains(v)) {
        errors.push(FieldMessage::new(
            path,
            format!("{what} must be between {} and {}, got {v}", range.start(), range.end()),
        ));
    }
}

/// Durations and song numbers outside their allowed ranges. Unset values pass.
pub fn range_errors(doc: &WeekDocument) -> Vec<FieldMessage> {
    let mut errors = Vec::new();
    let e = &mut errors;
    let mw = &doc.midweek_meeting;
    let t = &mw.treasures_from_gods_word;
    let we = &doc.weekend_meeting;
    let song = "Song number";
    let minutes = "Duration in minutes";

    check_range(e, "midweekMeeting.openingSong", mw.opening_song, &SONG_NUMBERS, song);
    check_range(e, "midweekMeeting.treasuresFromGodsWord.talkDuration", t.talk_duration, &TALK_MINUTES, minutes);
    check_range(
        e,
        "midweekMeeting.treasuresFromGodsWord.spiritualGemsDuration",
        t.spiritual_gems_duration,
        &TALK_MINUTES,
        minutes,
    );
    check_range(
        e,
        "midweekMeeting.treasuresFromGodsWord.bibleReadingDuration",
        t.bible_reading_duration,
        &READING_MINUTES,
        minutes,
    );
    for (i, part) in mw.apply_yourself_to_field_ministry.field_ministry_assignments.iter().enumerate() {
        check_range(e, format!("{FM_PREFIX}.{i}.duration"), part.duration, &PART_MINUTES, minutes);
    }
    check_range(
        e,
        "midweekMeeting.livingAsChristians.livingAsChristiansSong",
        mw.living_as_christians.living_as_christians_song,
        &SONG_NUMBERS,
        song,
    );
    for (i, part) in mw.living_as_christians.assignments.iter().enumerate() {
        check_range(e, format!("{LAC_PREFIX}.{i}.duration"), part.duration, &PART_MINUTES, minutes);
    }
    check_range(e, "midweekMeeting.closingSong", mw.closing_song, &SONG_NUMBERS, song);
    check_range(e, "weekendMeeting.openingSong", we.opening_song, &SONG_NUMBERS, song);
    check_range(e, "weekendMeeting.middleSong", we.middle_song, &SONG_NUMBERS, song);
    check_range(e, "weekendMeeting.closingSong", we.closing_song, &SONG_NUMBERS, song);
    errors
}

/// Outcome of a write that hit the start-date unique constraint: the week
/// that holds the date, or the original error when it cannot be found.
fn lost_race(existing: Option<StoredWeek>, document: WeekDocument, error: sqlx::Error) -> Result<SaveOutcome, AppError> {
    match existing {
        Some(existing) => Ok(SaveOutcome::Duplicate { document, existing_id: existing.id }),
        None => Err(AppError::Db(error)),
    }
}

/// Store a week: assignment slots are materialized and validated against the
/// directory, the derived dates and times recomputed, then the document is
/// written. `id` is `None` for a new week.
pub async fn save_week(
    pool: &PgPool,
    id: Option<i64>,
    mut doc: WeekDocument,
    user_id: i64,
) -> Result<SaveOutcome, AppError> {
    let Some(start) = doc.week_start_date else {
        let errors = vec![FieldMessage::new(START_DATE_PATH, "Week start date is required")];
        return Ok(SaveOutcome::Rejected { document: doc, errors });
    };
    if start.weekday() != Weekday::Mon {
        log::warn!("Week start {start} is a {}, not a Monday; saving as given", start.weekday());
    }

    let errors = range_errors(&doc);
    if !errors.is_empty() {
        return Ok(SaveOutcome::Rejected { document: doc, errors });
    }

    if let Some(existing) = week::find_by_start_date(pool, start).await? {
        if Some(existing.id) != id {
            return Ok(SaveOutcome::Duplicate { document: doc, existing_id: existing.id });
        }
    }

    let previous = match id {
        Some(id) => Some(week::find_by_id(pool, id).await?.ok_or(AppError::NotFound)?),
        None => None,
    };
    let operation = if previous.is_some() { Operation::Update } else { Operation::Create };

    let directory = PgDirectory::new(pool);
    if let Err(errors) = resolve_and_validate(&directory, &mut doc, previous.as_ref().map(|p| &p.document), operation).await {
        log::info!("Week {start} rejected: {} assignment error(s)", errors.len());
        let errors = errors.iter().map(FieldMessage::from).collect();
        return Ok(SaveOutcome::Rejected { document: doc, errors });
    }

    let settings = CongregationSettings::load(pool).await?;
    compute_derived_fields(&mut doc, &settings);

    let written = match id {
        Some(id) => week::update(pool, id, start, &doc).await.map(|()| id),
        None => week::create(pool, start, &doc).await,
    };
    let saved_id = match written {
        Ok(saved_id) => saved_id,
        // lost a race against a concurrent save of the same start date
        Err(e) if is_unique_violation(&e) => {
            let existing = week::find_by_start_date(pool, start).await?;
            return lost_race(existing, doc, e);
        }
        Err(e) => return Err(e.into()),
    };

    let (action, verb) = if id.is_some() { ("week.updated", "Updated") } else { ("week.created", "Created") };
    let details = serde_json::json!({
        "week_start_date": start.format("%Y-%m-%d").to_string(),
        "summary": format!("{verb} week of {}", start.format("%d.%m.%Y"))
    });
    let _ = audit::log(pool, user_id, action, "week", saved_id, details).await;
    log::info!("{verb} week {start} (#{saved_id})");

    Ok(SaveOutcome::Saved(StoredWeek { id: saved_id, document: doc }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignments::{AssignmentPermission, SlotPath, SlotRole};

    #[test]
    fn assignment_errors_keep_their_slot_path() {
        let e = AssignmentError::PermissionDenied {
            slot: SlotPath::indexed(SlotRole::FieldMinistryAssistant, 1),
            required: AssignmentPermission::FieldMinistry,
            candidate: 7,
        };
        let msg = FieldMessage::from(&e);
        assert_eq!(
            msg.path,
            "midweekMeeting.applyYourselfToFieldMinistry.fieldMinistryAssignments.1.assistant"
        );
        assert_eq!(msg.message, e.to_string());
    }

    #[test]
    fn durations_and_songs_outside_their_ranges_are_reported() {
        let mut doc = WeekDocument::default();
        let t = &mut doc.midweek_meeting.treasures_from_gods_word;
        t.talk_duration = Some(0);
        t.spiritual_gems_duration = Some(10);
        t.bible_reading_duration = Some(11);
        doc.midweek_meeting.apply_yourself_to_field_ministry.field_ministry_assignments = vec![
            crate::models::week::FieldMinistryPart { duration: Some(3), ..Default::default() },
            crate::models::week::FieldMinistryPart { duration: Some(1_000_000), ..Default::default() },
        ];
        doc.weekend_meeting.middle_song = Some(152);

        let errors = range_errors(&doc);
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "midweekMeeting.treasuresFromGodsWord.talkDuration",
                "midweekMeeting.treasuresFromGodsWord.bibleReadingDuration",
                "midweekMeeting.applyYourselfToFieldMinistry.fieldMinistryAssignments.1.duration",
                "weekendMeeting.middleSong",
            ]
        );
        assert_eq!(errors[0].message, "Duration in minutes must be between 5 and 30, got 0");
    }

    #[test]
    fn unset_and_boundary_values_pass_range_checks() {
        let mut doc = WeekDocument::default();
        assert!(range_errors(&doc).is_empty());

        let t = &mut doc.midweek_meeting.treasures_from_gods_word;
        t.talk_duration = Some(30);
        t.bible_reading_duration = Some(1);
        doc.midweek_meeting.living_as_christians.assignments =
            vec![crate::models::week::LivingPart { duration: Some(30), ..Default::default() }];
        doc.midweek_meeting.closing_song = Some(151);
        assert!(range_errors(&doc).is_empty());
    }

    #[test]
    fn unique_violation_without_a_holder_is_an_error() {
        let doc = WeekDocument::default();
        let result = lost_race(None, doc.clone(), sqlx::Error::RowNotFound);
        assert!(matches!(result, Err(AppError::Db(_))));

        let holder = StoredWeek { id: 12, document: doc.clone() };
        match lost_race(Some(holder), doc, sqlx::Error::RowNotFound) {
            Ok(SaveOutcome::Duplicate { existing_id, .. }) => assert_eq!(existing_id, 12),
            other => panic!("expected duplicate, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_reports_the_start_date() {
        let outcome = SaveOutcome::Duplicate {
            document: WeekDocument {
                week_start_date: chrono::NaiveDate::from_ymd_opt(2025, 3, 3),
                ..WeekDocument::default()
            },
            existing_id: 4,
        };
        let messages = outcome.messages();
        assert_eq!(messages[0].path, START_DATE_PATH);
        assert!(messages[0].message.contains("2025-03-03"));
    }
}
