use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::assignments::roles::{SlotPath, SlotRole};

/// Collection a normalized assignee points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationTo {
    Users,
    Visitors,
}

impl RelationTo {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationTo::Users => "users",
            RelationTo::Visitors => "visitors",
        }
    }
}

/// Normalized reference stored in every assignment slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeRef {
    pub relation_to: RelationTo,
    pub value: i64,
}

impl AssigneeRef {
    pub fn publisher(id: i64) -> Self {
        Self { relation_to: RelationTo::Users, value: id }
    }

    pub fn visitor(id: i64) -> Self {
        Self { relation_to: RelationTo::Visitors, value: id }
    }

    /// Compact form used as a `<select>` option value, e.g. `users:12`.
    pub fn option_value(&self) -> String {
        format!("{}:{}", self.relation_to.as_str(), self.value)
    }

    pub fn parse_option_value(s: &str) -> Option<Self> {
        let (kind, id) = s.trim().split_once(':')?;
        let value = id.parse().ok()?;
        match kind {
            "users" => Some(Self::publisher(value)),
            "visitors" => Some(Self::visitor(value)),
            _ => None,
        }
    }
}

/// Value of an assignment slot as submitted: either an existing reference or
/// a name typed in directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Assignee {
    Reference(AssigneeRef),
    Name(String),
}

impl Assignee {
    pub fn reference(&self) -> Option<&AssigneeRef> {
        match self {
            Assignee::Reference(r) => Some(r),
            Assignee::Name(_) => None,
        }
    }
}

/// The full programme of one calendar week.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeekDocument {
    pub week_start_date: Option<NaiveDate>,
    pub midweek_meeting: MidweekMeeting,
    pub weekend_meeting: WeekendMeeting,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MidweekMeeting {
    pub calculated_date: Option<NaiveDate>,
    pub calculated_time: Option<NaiveTime>,
    pub chairman: Option<Assignee>,
    pub opening_song: Option<u32>,
    pub opening_prayer: Option<Assignee>,
    pub treasures_from_gods_word: Treasures,
    pub apply_yourself_to_field_ministry: FieldMinistrySection,
    pub living_as_christians: LivingAsChristiansSection,
    pub closing_song: Option<u32>,
    pub closing_prayer: Option<Assignee>,
    pub closing_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Treasures {
    pub talk_title: String,
    pub talk_assignee: Option<Assignee>,
    pub talk_duration: Option<u32>,
    pub talk_time: Option<NaiveTime>,
    pub spiritual_gems_assignee: Option<Assignee>,
    pub spiritual_gems_duration: Option<u32>,
    pub spiritual_gems_time: Option<NaiveTime>,
    pub bible_reading_scripture: String,
    pub bible_reading_lesson: String,
    pub bible_reading_assignee: Option<Assignee>,
    pub bible_reading_duration: Option<u32>,
    pub bible_reading_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldMinistrySection {
    pub field_ministry_assignments: Vec<FieldMinistryPart>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldMinistryPart {
    pub title: String,
    pub lesson: String,
    pub assignee: Option<Assignee>,
    pub assistant: Option<Assignee>,
    pub duration: Option<u32>,
    pub time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LivingAsChristiansSection {
    pub living_as_christians_song: Option<u32>,
    pub assignments: Vec<LivingPart>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LivingPart {
    pub title: String,
    pub assignee: Option<Assignee>,
    pub duration: Option<u32>,
    pub time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeekendMeeting {
    pub calculated_date: Option<NaiveDate>,
    pub calculated_time: Option<NaiveTime>,
    pub chairman: Option<Assignee>,
    pub opening_song: Option<u32>,
    pub public_talk: PublicTalk,
    pub middle_song: Option<u32>,
    pub watchtower_study: WatchtowerStudy,
    pub closing_song: Option<u32>,
    pub closing_prayer: Option<Assignee>,
    pub closing_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublicTalk {
    /// Id of a `public_talk_title` entity.
    pub title: Option<i64>,
    pub speaker: Option<Assignee>,
    pub duration: Option<u32>,
    pub time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WatchtowerStudy {
    pub title: String,
    pub conductor: Option<Assignee>,
    pub duration: Option<u32>,
    pub time: Option<NaiveTime>,
}

impl WeekDocument {
    /// Every assignment slot of the week, mutable, in programme order.
    pub fn slots_mut(&mut self) -> Vec<(SlotPath, &mut Option<Assignee>)> {
        let mut slots = Vec::new();

        let mw = &mut self.midweek_meeting;
        slots.push((SlotPath::new(SlotRole::MidweekChairman), &mut mw.chairman));
        slots.push((SlotPath::new(SlotRole::MidweekOpeningPrayer), &mut mw.opening_prayer));
        let t = &mut mw.treasures_from_gods_word;
        slots.push((SlotPath::new(SlotRole::TalkAssignee), &mut t.talk_assignee));
        slots.push((SlotPath::new(SlotRole::SpiritualGemsAssignee), &mut t.spiritual_gems_assignee));
        slots.push((SlotPath::new(SlotRole::BibleReadingAssignee), &mut t.bible_reading_assignee));
        for (i, part) in mw.apply_yourself_to_field_ministry.field_ministry_assignments.iter_mut().enumerate() {
            slots.push((SlotPath::indexed(SlotRole::FieldMinistryAssignee, i), &mut part.assignee));
            slots.push((SlotPath::indexed(SlotRole::FieldMinistryAssistant, i), &mut part.assistant));
        }
        for (i, part) in mw.living_as_christians.assignments.iter_mut().enumerate() {
            slots.push((SlotPath::indexed(SlotRole::LivingAsChristiansAssignee, i), &mut part.assignee));
        }
        slots.push((SlotPath::new(SlotRole::MidweekClosingPrayer), &mut mw.closing_prayer));

        let we = &mut self.weekend_meeting;
        slots.push((SlotPath::new(SlotRole::WeekendChairman), &mut we.chairman));
        slots.push((SlotPath::new(SlotRole::PublicTalkSpeaker), &mut we.public_talk.speaker));
        slots.push((SlotPath::new(SlotRole::WatchtowerConductor), &mut we.watchtower_study.conductor));
        slots.push((SlotPath::new(SlotRole::WeekendClosingPrayer), &mut we.closing_prayer));

        slots
    }

    /// Read-only view of every assignment slot, in programme order.
    pub fn slots(&self) -> Vec<(SlotPath, Option<&Assignee>)> {
        let mut slots = Vec::new();

        let mw = &self.midweek_meeting;
        let t = &mw.treasures_from_gods_word;
        slots.push((SlotPath::new(SlotRole::MidweekChairman), mw.chairman.as_ref()));
        slots.push((SlotPath::new(SlotRole::MidweekOpeningPrayer), mw.opening_prayer.as_ref()));
        slots.push((SlotPath::new(SlotRole::TalkAssignee), t.talk_assignee.as_ref()));
        slots.push((SlotPath::new(SlotRole::SpiritualGemsAssignee), t.spiritual_gems_assignee.as_ref()));
        slots.push((SlotPath::new(SlotRole::BibleReadingAssignee), t.bible_reading_assignee.as_ref()));
        for (i, part) in mw.apply_yourself_to_field_ministry.field_ministry_assignments.iter().enumerate() {
            slots.push((SlotPath::indexed(SlotRole::FieldMinistryAssignee, i), part.assignee.as_ref()));
            slots.push((SlotPath::indexed(SlotRole::FieldMinistryAssistant, i), part.assistant.as_ref()));
        }
        for (i, part) in mw.living_as_christians.assignments.iter().enumerate() {
            slots.push((SlotPath::indexed(SlotRole::LivingAsChristiansAssignee, i), part.assignee.as_ref()));
        }
        slots.push((SlotPath::new(SlotRole::MidweekClosingPrayer), mw.closing_prayer.as_ref()));

        let we = &self.weekend_meeting;
        slots.push((SlotPath::new(SlotRole::WeekendChairman), we.chairman.as_ref()));
        slots.push((SlotPath::new(SlotRole::PublicTalkSpeaker), we.public_talk.speaker.as_ref()));
        slots.push((SlotPath::new(SlotRole::WatchtowerConductor), we.watchtower_study.conductor.as_ref()));
        slots.push((SlotPath::new(SlotRole::WeekendClosingPrayer), we.closing_prayer.as_ref()));

        slots
    }

    /// Ids of every referenced publisher or visitor.
    pub fn references(&self) -> Vec<AssigneeRef> {
        self.slots()
            .into_iter()
            .filter_map(|(_, a)| a.and_then(Assignee::reference).copied())
            .collect()
    }
}

/// Row for the weeks list page.
#[derive(Debug, Clone)]
pub struct WeekListItem {
    pub id: i64,
    pub week_start_date: String,
    pub midweek_date: String,
    pub weekend_date: String,
}

/// A stored week: entity id plus its document.
#[derive(Debug, Clone)]
pub struct StoredWeek {
    pub id: i64,
    pub document: WeekDocument,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignee_accepts_reference_or_name() {
        let r: Assignee = serde_json::from_str(r#"{"relationTo":"users","value":7}"#).unwrap();
        assert_eq!(r, Assignee::Reference(AssigneeRef::publisher(7)));
        let n: Assignee = serde_json::from_str(r#""Maria Schmidt""#).unwrap();
        assert_eq!(n, Assignee::Name("Maria Schmidt".to_string()));
    }

    #[test]
    fn document_fills_missing_sections_with_defaults() {
        let doc: WeekDocument = serde_json::from_str(r#"{"weekStartDate":"2024-03-04"}"#).unwrap();
        assert_eq!(doc.week_start_date, NaiveDate::from_ymd_opt(2024, 3, 4));
        assert!(doc.midweek_meeting.chairman.is_none());
        assert!(doc.midweek_meeting.apply_yourself_to_field_ministry.field_ministry_assignments.is_empty());
    }

    #[test]
    fn slot_list_includes_each_repeated_part() {
        let mut doc = WeekDocument::default();
        doc.midweek_meeting.apply_yourself_to_field_ministry.field_ministry_assignments =
            vec![FieldMinistryPart::default(), FieldMinistryPart::default()];
        doc.midweek_meeting.living_as_christians.assignments = vec![LivingPart::default()];
        // 10 fixed slots, 2 per field ministry part, 1 per living part
        assert_eq!(doc.slots().len(), 10 + 4 + 1);
        assert_eq!(doc.slots_mut().len(), doc.slots().len());
    }

    #[test]
    fn option_values_parse_back() {
        let r = AssigneeRef::visitor(31);
        assert_eq!(AssigneeRef::parse_option_value(&r.option_value()), Some(r));
        assert_eq!(AssigneeRef::parse_option_value("groups:1"), None);
        assert_eq!(AssigneeRef::parse_option_value(""), None);
    }
}
