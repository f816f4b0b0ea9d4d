use std::fmt;

/// Capability tag held by a publisher that gates which slots they may fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssignmentPermission {
    Chairman,
    Prayer,
    Talk,
    SpiritualGems,
    BibleReading,
    FieldMinistry,
    LivingAsChristians,
    PublicTalk,
    WatchtowerConductor,
}

impl AssignmentPermission {
    pub const ALL: [AssignmentPermission; 9] = [
        AssignmentPermission::Chairman,
        AssignmentPermission::Prayer,
        AssignmentPermission::Talk,
        AssignmentPermission::SpiritualGems,
        AssignmentPermission::BibleReading,
        AssignmentPermission::FieldMinistry,
        AssignmentPermission::LivingAsChristians,
        AssignmentPermission::PublicTalk,
        AssignmentPermission::WatchtowerConductor,
    ];

    /// Tag as stored (entity name of the `assignment_permission` entity).
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentPermission::Chairman => "chairman",
            AssignmentPermission::Prayer => "prayer",
            AssignmentPermission::Talk => "talk",
            AssignmentPermission::SpiritualGems => "spiritual-gems",
            AssignmentPermission::BibleReading => "bible-reading",
            AssignmentPermission::FieldMinistry => "field-ministry",
            AssignmentPermission::LivingAsChristians => "living-as-christians",
            AssignmentPermission::PublicTalk => "public-talk",
            AssignmentPermission::WatchtowerConductor => "watchtower-conductor",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AssignmentPermission::Chairman => "Chairman",
            AssignmentPermission::Prayer => "Prayer",
            AssignmentPermission::Talk => "Talk",
            AssignmentPermission::SpiritualGems => "Spiritual Gems",
            AssignmentPermission::BibleReading => "Bible Reading",
            AssignmentPermission::FieldMinistry => "Field Ministry",
            AssignmentPermission::LivingAsChristians => "Living as Christians",
            AssignmentPermission::PublicTalk => "Public Talk",
            AssignmentPermission::WatchtowerConductor => "Watchtower Conductor",
        }
    }

    pub fn parse(s: &str) -> Option<AssignmentPermission> {
        AssignmentPermission::ALL.into_iter().find(|p| p.as_str() == s.trim())
    }
}

impl fmt::Display for AssignmentPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every assignable slot of a week, independent of its position in any form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotRole {
    MidweekChairman,
    MidweekOpeningPrayer,
    TalkAssignee,
    SpiritualGemsAssignee,
    BibleReadingAssignee,
    FieldMinistryAssignee,
    FieldMinistryAssistant,
    LivingAsChristiansAssignee,
    MidweekClosingPrayer,
    WeekendChairman,
    PublicTalkSpeaker,
    WatchtowerConductor,
    WeekendClosingPrayer,
}

impl SlotRole {
    pub const ALL: [SlotRole; 13] = [
        SlotRole::MidweekChairman,
        SlotRole::MidweekOpeningPrayer,
        SlotRole::TalkAssignee,
        SlotRole::SpiritualGemsAssignee,
        SlotRole::BibleReadingAssignee,
        SlotRole::FieldMinistryAssignee,
        SlotRole::FieldMinistryAssistant,
        SlotRole::LivingAsChristiansAssignee,
        SlotRole::MidweekClosingPrayer,
        SlotRole::WeekendChairman,
        SlotRole::PublicTalkSpeaker,
        SlotRole::WatchtowerConductor,
        SlotRole::WeekendClosingPrayer,
    ];

    /// The permission a publisher must hold to fill this slot.
    pub fn required_permission(self) -> AssignmentPermission {
        use AssignmentPermission as P;
        match self {
            SlotRole::MidweekChairman | SlotRole::WeekendChairman => P::Chairman,
            SlotRole::MidweekOpeningPrayer
            | SlotRole::MidweekClosingPrayer
            | SlotRole::WeekendClosingPrayer => P::Prayer,
            SlotRole::TalkAssignee => P::Talk,
            SlotRole::SpiritualGemsAssignee => P::SpiritualGems,
            SlotRole::BibleReadingAssignee => P::BibleReading,
            SlotRole::FieldMinistryAssignee | SlotRole::FieldMinistryAssistant => P::FieldMinistry,
            SlotRole::LivingAsChristiansAssignee => P::LivingAsChristians,
            SlotRole::PublicTalkSpeaker => P::PublicTalk,
            SlotRole::WatchtowerConductor => P::WatchtowerConductor,
        }
    }

    /// Stable identifier used by `/api/v1/candidates?role=`.
    pub fn key(self) -> &'static str {
        match self {
            SlotRole::MidweekChairman => "midweek-chairman",
            SlotRole::MidweekOpeningPrayer => "midweek-opening-prayer",
            SlotRole::TalkAssignee => "talk-assignee",
            SlotRole::SpiritualGemsAssignee => "spiritual-gems-assignee",
            SlotRole::BibleReadingAssignee => "bible-reading-assignee",
            SlotRole::FieldMinistryAssignee => "field-ministry-assignee",
            SlotRole::FieldMinistryAssistant => "field-ministry-assistant",
            SlotRole::LivingAsChristiansAssignee => "living-as-christians-assignee",
            SlotRole::MidweekClosingPrayer => "midweek-closing-prayer",
            SlotRole::WeekendChairman => "weekend-chairman",
            SlotRole::PublicTalkSpeaker => "public-talk-speaker",
            SlotRole::WatchtowerConductor => "watchtower-conductor",
            SlotRole::WeekendClosingPrayer => "weekend-closing-prayer",
        }
    }

    pub fn parse(key: &str) -> Option<SlotRole> {
        SlotRole::ALL.into_iter().find(|r| r.key() == key.trim())
    }

    /// Document path with `{}` standing in for the list index of repeated parts.
    fn path_template(self) -> &'static str {
        match self {
            SlotRole::MidweekChairman => "midweekMeeting.chairman",
            SlotRole::MidweekOpeningPrayer => "midweekMeeting.openingPrayer",
            SlotRole::TalkAssignee => "midweekMeeting.treasuresFromGodsWord.talkAssignee",
            SlotRole::SpiritualGemsAssignee => "midweekMeeting.treasuresFromGodsWord.spiritualGemsAssignee",
            SlotRole::BibleReadingAssignee => "midweekMeeting.treasuresFromGodsWord.bibleReadingAssignee",
            SlotRole::FieldMinistryAssignee => {
                "midweekMeeting.applyYourselfToFieldMinistry.fieldMinistryAssignments.{}.assignee"
            }
            SlotRole::FieldMinistryAssistant => {
                "midweekMeeting.applyYourselfToFieldMinistry.fieldMinistryAssignments.{}.assistant"
            }
            SlotRole::LivingAsChristiansAssignee => "midweekMeeting.livingAsChristians.assignments.{}.assignee",
            SlotRole::MidweekClosingPrayer => "midweekMeeting.closingPrayer",
            SlotRole::WeekendChairman => "weekendMeeting.chairman",
            SlotRole::PublicTalkSpeaker => "weekendMeeting.publicTalk.speaker",
            SlotRole::WatchtowerConductor => "weekendMeeting.watchtowerStudy.conductor",
            SlotRole::WeekendClosingPrayer => "weekendMeeting.closingPrayer",
        }
    }
}

/// A concrete slot in one week document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotPath {
    pub role: SlotRole,
    /// Position within the field ministry or living-as-christians list.
    pub index: Option<usize>,
}

impl SlotPath {
    pub fn new(role: SlotRole) -> Self {
        Self { role, index: None }
    }

    pub fn indexed(role: SlotRole, index: usize) -> Self {
        Self { role, index: Some(index) }
    }
}

impl fmt::Display for SlotPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let template = self.role.path_template();
        match self.index {
            Some(i) => f.write_str(&template.replacen("{}", &i.to_string(), 1)),
            None => f.write_str(template),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_table_covers_every_slot() {
        assert_eq!(SlotRole::MidweekChairman.required_permission(), AssignmentPermission::Chairman);
        assert_eq!(SlotRole::TalkAssignee.required_permission(), AssignmentPermission::Talk);
        assert_eq!(
            SlotRole::FieldMinistryAssistant.required_permission(),
            AssignmentPermission::FieldMinistry
        );
        assert_eq!(
            SlotRole::WatchtowerConductor.required_permission(),
            AssignmentPermission::WatchtowerConductor
        );
        assert_eq!(SlotRole::WeekendClosingPrayer.required_permission(), AssignmentPermission::Prayer);
    }

    #[test]
    fn keys_and_tags_parse_back() {
        for role in SlotRole::ALL {
            assert_eq!(SlotRole::parse(role.key()), Some(role));
        }
        for perm in AssignmentPermission::ALL {
            assert_eq!(AssignmentPermission::parse(perm.as_str()), Some(perm));
        }
        assert_eq!(AssignmentPermission::parse("elder"), None);
    }

    #[test]
    fn indexed_paths_render_position() {
        let path = SlotPath::indexed(SlotRole::FieldMinistryAssistant, 2);
        assert_eq!(
            path.to_string(),
            "midweekMeeting.applyYourselfToFieldMinistry.fieldMinistryAssignments.2.assistant"
        );
        assert_eq!(SlotPath::new(SlotRole::WeekendChairman).to_string(), "weekendMeeting.chairman");
    }
}
