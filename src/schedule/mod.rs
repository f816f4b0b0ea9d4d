//! Derived date and time fields of a week's meetings.
//!
//! Everything here is pure: inputs are the week document and an explicit
//! [`CongregationSettings`](crate::models::congregation::CongregationSettings)
//! value, outputs are written back onto the document.

pub mod dates;
pub mod timing;
pub mod week;

pub use dates::{calculate_meeting_date, format_meeting_date};
pub use timing::{Part, PartDurations, PartKind, PartTimes, TimeFormat, schedule_parts};
pub use week::{compute_derived_fields, recompute_for_display};
