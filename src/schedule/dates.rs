use chrono::{Days, NaiveDate, Weekday};

/// Parse a weekday setting value (`"monday"` … `"sunday"`).
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    match s.trim().to_lowercase().as_str() {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Setting value for a weekday, the inverse of [`parse_weekday`].
pub fn weekday_value(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Days between the Monday that starts a week and `day` (monday = 0 … sunday = 6).
pub fn offset_from_monday(day: Weekday) -> u64 {
    u64::from(day.num_days_from_monday())
}

/// Calendar date of a meeting held on `weekday` in the week starting `week_start`.
///
/// Returns `None` ("not computed") when the weekday is not configured. The
/// start date is used as given: it is expected to be a Monday but a different
/// day is not corrected, the offset is simply added to it.
pub fn calculate_meeting_date(week_start: NaiveDate, weekday: Option<Weekday>) -> Option<NaiveDate> {
    let weekday = weekday?;
    week_start.checked_add_days(Days::new(offset_from_monday(weekday)))
}

/// Meeting date as printed on schedules (`Thu 06.03.`), or the "not computed" placeholder.
pub fn format_meeting_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%a %d.%m.").to_string())
        .unwrap_or_else(|| super::timing::NOT_COMPUTED.to_string())
}
