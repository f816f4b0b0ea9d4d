use std::collections::HashMap;

use chrono::{NaiveTime, TimeDelta};

/// Placeholder shown for a time or date that could not be computed.
pub const NOT_COMPUTED: &str = "Not set";

/// Kind of a scheduled meeting part. Each kind has a configurable default
/// duration used when the part itself carries none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    /// Song, prayer and opening comments of the midweek meeting.
    MidweekOpening,
    Talk,
    SpiritualGems,
    BibleReading,
    FieldMinistry,
    /// Song between two sections.
    Song,
    LivingAsChristians,
    /// Song and prayer before the public talk.
    WeekendOpening,
    PublicTalk,
    WatchtowerStudy,
    Closing,
}

impl PartKind {
    pub const ALL: [PartKind; 11] = [
        PartKind::MidweekOpening,
        PartKind::Talk,
        PartKind::SpiritualGems,
        PartKind::BibleReading,
        PartKind::FieldMinistry,
        PartKind::Song,
        PartKind::LivingAsChristians,
        PartKind::WeekendOpening,
        PartKind::PublicTalk,
        PartKind::WatchtowerStudy,
        PartKind::Closing,
    ];

    /// Suffix of the `schedule.default.<key>` setting.
    pub fn key(self) -> &'static str {
        match self {
            PartKind::MidweekOpening => "midweek_opening",
            PartKind::Talk => "talk",
            PartKind::SpiritualGems => "spiritual_gems",
            PartKind::BibleReading => "bible_reading",
            PartKind::FieldMinistry => "field_ministry",
            PartKind::Song => "song",
            PartKind::LivingAsChristians => "living_as_christians",
            PartKind::WeekendOpening => "weekend_opening",
            PartKind::PublicTalk => "public_talk",
            PartKind::WatchtowerStudy => "watchtower_study",
            PartKind::Closing => "closing",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PartKind::MidweekOpening => "Midweek opening (song, prayer, comments)",
            PartKind::Talk => "Treasures talk",
            PartKind::SpiritualGems => "Spiritual gems",
            PartKind::BibleReading => "Bible reading",
            PartKind::FieldMinistry => "Field ministry part",
            PartKind::Song => "Song",
            PartKind::LivingAsChristians => "Living as Christians part",
            PartKind::WeekendOpening => "Weekend opening (song, prayer)",
            PartKind::PublicTalk => "Public talk",
            PartKind::WatchtowerStudy => "Watchtower study",
            PartKind::Closing => "Closing",
        }
    }

    /// Built-in default, used when no setting overrides it.
    pub fn default_minutes(self) -> u32 {
        match self {
            PartKind::MidweekOpening => 6,
            PartKind::Talk => 10,
            PartKind::SpiritualGems => 10,
            PartKind::BibleReading => 4,
            PartKind::FieldMinistry => 4,
            PartKind::Song => 5,
            PartKind::LivingAsChristians => 10,
            PartKind::WeekendOpening => 5,
            PartKind::PublicTalk => 30,
            PartKind::WatchtowerStudy => 60,
            PartKind::Closing => 5,
        }
    }

    pub fn from_key(key: &str) -> Option<PartKind> {
        PartKind::ALL.into_iter().find(|k| k.key() == key)
    }
}

/// Fallback duration per part kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartDurations {
    minutes: HashMap<PartKind, u32>,
}

impl Default for PartDurations {
    fn default() -> Self {
        Self {
            minutes: PartKind::ALL.into_iter().map(|k| (k, k.default_minutes())).collect(),
        }
    }
}

impl PartDurations {
    pub fn with(mut self, kind: PartKind, minutes: u32) -> Self {
        self.minutes.insert(kind, minutes);
        self
    }

    pub fn set(&mut self, kind: PartKind, minutes: u32) {
        self.minutes.insert(kind, minutes);
    }

    pub fn get(&self, kind: PartKind) -> u32 {
        self.minutes.get(&kind).copied().unwrap_or_else(|| kind.default_minutes())
    }

    /// Effective duration of a part: its own duration if set, else the default for its kind.
    pub fn resolve(&self, part: &Part) -> u32 {
        part.duration.unwrap_or_else(|| self.get(part.kind))
    }
}

/// One entry of the ordered part list fed to [`schedule_parts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    pub kind: PartKind,
    pub duration: Option<u32>,
}

impl Part {
    pub fn new(kind: PartKind, duration: Option<u32>) -> Self {
        Self { kind, duration }
    }
}

/// Start times computed for a meeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartTimes {
    pub meeting_start: Option<NaiveTime>,
    /// One entry per input part, in input order.
    pub part_starts: Vec<Option<NaiveTime>>,
}

/// Running-clock schedule: the first part starts with the meeting, every
/// following part starts when the previous part's duration has elapsed.
///
/// An unset meeting start yields `None` for every part. The clock wraps at
/// midnight; there is no date component.
pub fn schedule_parts(
    meeting_start: Option<NaiveTime>,
    parts: &[Part],
    durations: &PartDurations,
) -> PartTimes {
    let Some(start) = meeting_start else {
        return PartTimes { meeting_start: None, part_starts: vec![None; parts.len()] };
    };

    let mut clock = start;
    let part_starts = parts
        .iter()
        .map(|part| {
            let begins = clock;
            let minutes = i64::from(durations.resolve(part));
            clock = clock.overflowing_add_signed(TimeDelta::minutes(minutes)).0;
            Some(begins)
        })
        .collect();

    PartTimes { meeting_start: Some(start), part_starts }
}

/// How clock times are rendered for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFormat {
    #[default]
    TwentyFourHour,
    TwelveHour,
}

impl TimeFormat {
    pub fn parse(s: &str) -> TimeFormat {
        match s.trim() {
            "12h" => TimeFormat::TwelveHour,
            _ => TimeFormat::TwentyFourHour,
        }
    }

    pub fn value(self) -> &'static str {
        match self {
            TimeFormat::TwentyFourHour => "24h",
            TimeFormat::TwelveHour => "12h",
        }
    }

    pub fn format(self, time: NaiveTime) -> String {
        match self {
            TimeFormat::TwentyFourHour => time.format("%H:%M").to_string(),
            TimeFormat::TwelveHour => time.format("%-I:%M %p").to_string(),
        }
    }

    /// Formatted time, or the "not computed" placeholder.
    pub fn display(self, time: Option<NaiveTime>) -> String {
        time.map(|t| self.format(t)).unwrap_or_else(|| NOT_COMPUTED.to_string())
    }
}

/// Parse a stored time-of-day value (`HH:MM` or `HH:MM:SS`).
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn running_clock_uses_previous_duration() {
        let parts = [
            Part::new(PartKind::Talk, Some(10)),
            Part::new(PartKind::Talk, Some(15)),
            Part::new(PartKind::BibleReading, Some(4)),
        ];
        let times = schedule_parts(Some(hm(9, 0)), &parts, &PartDurations::default());
        assert_eq!(times.meeting_start, Some(hm(9, 0)));
        assert_eq!(times.part_starts, vec![Some(hm(9, 0)), Some(hm(9, 10)), Some(hm(9, 25))]);
    }

    #[test]
    fn missing_durations_fall_back_to_configured_defaults() {
        let durations = PartDurations::default().with(PartKind::Talk, 12);
        let parts = [
            Part::new(PartKind::Talk, None),
            Part::new(PartKind::SpiritualGems, None),
            Part::new(PartKind::Closing, None),
        ];
        let times = schedule_parts(Some(hm(19, 0)), &parts, &durations);
        assert_eq!(times.part_starts, vec![Some(hm(19, 0)), Some(hm(19, 12)), Some(hm(19, 22))]);
    }

    #[test]
    fn unset_start_is_not_computed_for_every_part() {
        let parts = [Part::new(PartKind::Talk, Some(10)), Part::new(PartKind::Closing, None)];
        let times = schedule_parts(None, &parts, &PartDurations::default());
        assert_eq!(times.meeting_start, None);
        assert_eq!(times.part_starts, vec![None, None]);
    }

    #[test]
    fn identical_inputs_give_identical_outputs() {
        let parts = [Part::new(PartKind::PublicTalk, None), Part::new(PartKind::WatchtowerStudy, Some(60))];
        let durations = PartDurations::default();
        let a = schedule_parts(Some(hm(10, 0)), &parts, &durations);
        let b = schedule_parts(Some(hm(10, 0)), &parts, &durations);
        assert_eq!(a, b);
    }

    #[test]
    fn clock_wraps_past_midnight() {
        let parts = [Part::new(PartKind::Talk, Some(30)), Part::new(PartKind::Closing, None)];
        let times = schedule_parts(Some(hm(23, 45)), &parts, &PartDurations::default());
        assert_eq!(times.part_starts[1], Some(hm(0, 15)));
    }

    #[test]
    fn empty_part_list_still_reports_meeting_start() {
        let times = schedule_parts(Some(hm(18, 30)), &[], &PartDurations::default());
        assert_eq!(times.meeting_start, Some(hm(18, 30)));
        assert!(times.part_starts.is_empty());
    }

    #[test]
    fn formats_both_clock_styles() {
        assert_eq!(TimeFormat::TwentyFourHour.format(hm(19, 5)), "19:05");
        assert_eq!(TimeFormat::TwelveHour.format(hm(19, 5)), "7:05 PM");
        assert_eq!(TimeFormat::TwelveHour.format(hm(9, 30)), "9:30 AM");
        assert_eq!(TimeFormat::TwentyFourHour.display(None), NOT_COMPUTED);
    }

    #[test]
    fn parses_stored_times() {
        assert_eq!(parse_time_of_day("19:00"), Some(hm(19, 0)));
        assert_eq!(parse_time_of_day("09:30:00"), Some(hm(9, 30)));
        assert_eq!(parse_time_of_day(""), None);
        assert_eq!(parse_time_of_day("7pm"), None);
    }

    #[test]
    fn part_kind_keys_are_unique() {
        for kind in PartKind::ALL {
            assert_eq!(PartKind::from_key(kind.key()), Some(kind));
        }
    }
}
