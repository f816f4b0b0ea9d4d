use std::collections::HashMap;

use chrono::{NaiveTime, Weekday};
use sqlx::PgPool;

use crate::models::setting;
use crate::schedule::dates::parse_weekday;
use crate::schedule::timing::{PartDurations, PartKind, TimeFormat, parse_time_of_day};

pub const NAME: &str = "congregation.name";
pub const MIDWEEK_DAY: &str = "congregation.midweek_day";
pub const MIDWEEK_TIME: &str = "congregation.midweek_time";
pub const WEEKEND_DAY: &str = "congregation.weekend_day";
pub const WEEKEND_TIME: &str = "congregation.weekend_time";
pub const TIME_FORMAT: &str = "schedule.time_format";
pub const DURATION_PREFIX: &str = "schedule.default.";

/// Weekday and start time of one meeting type. Either half may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeetingSlotSetting {
    pub weekday: Option<Weekday>,
    pub time: Option<NaiveTime>,
}

/// Congregation-wide scheduling configuration, read once and passed into
/// every computation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CongregationSettings {
    pub name: String,
    pub midweek: MeetingSlotSetting,
    pub weekend: MeetingSlotSetting,
    pub time_format: TimeFormat,
    pub durations: PartDurations,
}

impl CongregationSettings {
    /// Build from raw setting values keyed by setting name. Missing or
    /// unparseable values leave the corresponding field unset.
    pub fn from_values(values: &HashMap<String, String>) -> Self {
        let get = |key: &str| values.get(key).map(String::as_str).unwrap_or("");

        let mut durations = PartDurations::default();
        for kind in PartKind::ALL {
            let key = format!("{DURATION_PREFIX}{}", kind.key());
            if let Ok(minutes) = get(&key).trim().parse::<u32>() {
                durations.set(kind, minutes);
            }
        }

        Self {
            name: get(NAME).to_string(),
            midweek: MeetingSlotSetting {
                weekday: parse_weekday(get(MIDWEEK_DAY)),
                time: parse_time_of_day(get(MIDWEEK_TIME)),
            },
            weekend: MeetingSlotSetting {
                weekday: parse_weekday(get(WEEKEND_DAY)),
                time: parse_time_of_day(get(WEEKEND_TIME)),
            },
            time_format: TimeFormat::parse(get(TIME_FORMAT)),
            durations,
        }
    }

    pub async fn load(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let values = setting::find_all(pool)
            .await?
            .into_iter()
            .map(|s| (s.name, s.value))
            .collect();
        Ok(Self::from_values(&values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn parses_complete_settings() {
        let s = CongregationSettings::from_values(&values(&[
            (NAME, "Nord"),
            (MIDWEEK_DAY, "thursday"),
            (MIDWEEK_TIME, "19:00"),
            (WEEKEND_DAY, "sunday"),
            (WEEKEND_TIME, "10:00"),
            (TIME_FORMAT, "12h"),
            ("schedule.default.talk", "12"),
        ]));
        assert_eq!(s.name, "Nord");
        assert_eq!(s.midweek.weekday, Some(Weekday::Thu));
        assert_eq!(s.midweek.time, NaiveTime::from_hms_opt(19, 0, 0));
        assert_eq!(s.weekend.weekday, Some(Weekday::Sun));
        assert_eq!(s.time_format, TimeFormat::TwelveHour);
        assert_eq!(s.durations.get(PartKind::Talk), 12);
        assert_eq!(s.durations.get(PartKind::BibleReading), 4);
    }

    #[test]
    fn blank_values_stay_unset() {
        let s = CongregationSettings::from_values(&values(&[(MIDWEEK_DAY, ""), (MIDWEEK_TIME, "soon")]));
        assert_eq!(s.midweek, MeetingSlotSetting::default());
        assert_eq!(s.time_format, TimeFormat::TwentyFourHour);
    }
}
