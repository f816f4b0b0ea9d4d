use std::collections::HashMap;

use crate::models::week::{Assignee, AssigneeRef, WeekDocument};
use super::directory::Directory;
use super::error::AssignmentError;
use super::roles::SlotPath;
use super::validate::{Operation, validate_assignment};
use super::visitors::resolve_assignee;

/// Before-save pass over every assignment slot of `doc`.
///
/// Each slot is materialized into a reference, then validated when its value
/// differs from `previous` (the stored version, if any). All slot errors are
/// collected; a slot whose materialization failed keeps its submitted value.
pub async fn resolve_and_validate<D: Directory>(
    directory: &D,
    doc: &mut WeekDocument,
    previous: Option<&WeekDocument>,
    operation: Operation,
) -> Result<(), Vec<AssignmentError>> {
    let before: HashMap<SlotPath, AssigneeRef> = previous
        .map(|p| {
            p.slots()
                .into_iter()
                .filter_map(|(path, value)| value.and_then(Assignee::reference).map(|r| (path, *r)))
                .collect()
        })
        .unwrap_or_default();

    let mut errors = Vec::new();
    for (path, slot) in doc.slots_mut() {
        let resolved = match resolve_assignee(directory, path, slot.as_ref()).await {
            Ok(r) => r,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };
        *slot = resolved.map(Assignee::Reference);

        let unchanged = resolved.is_some() && before.get(&path) == resolved.as_ref();
        if unchanged {
            continue;
        }
        if let Err(e) = validate_assignment(directory, path, resolved.as_ref(), operation).await {
            errors.push(e);
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignments::memory::MemoryDirectory;
    use crate::assignments::roles::{AssignmentPermission as P, SlotRole};
    use crate::models::week::FieldMinistryPart;

    fn directory() -> MemoryDirectory {
        MemoryDirectory::new()
            .with_publisher(1, "Anna Lind", &[P::FieldMinistry])
            .with_publisher(2, "Ben Kraus", &[P::Chairman, P::Prayer])
    }

    #[tokio::test]
    async fn materializes_and_validates_every_slot() {
        let dir = directory();
        let mut doc = WeekDocument::default();
        doc.midweek_meeting.chairman = Some(Assignee::Name("Ben Kraus".to_string()));
        doc.midweek_meeting.apply_yourself_to_field_ministry.field_ministry_assignments = vec![FieldMinistryPart {
            assignee: Some(Assignee::Reference(AssigneeRef::publisher(1))),
            assistant: Some(Assignee::Name("Clara Vogt".to_string())),
            ..FieldMinistryPart::default()
        }];

        resolve_and_validate(&dir, &mut doc, None, Operation::Create).await.unwrap();

        assert_eq!(doc.midweek_meeting.chairman, Some(Assignee::Reference(AssigneeRef::publisher(2))));
        let part = &doc.midweek_meeting.apply_yourself_to_field_ministry.field_ministry_assignments[0];
        let visitor_id = dir.visitors()[0].id;
        assert_eq!(part.assistant, Some(Assignee::Reference(AssigneeRef::visitor(visitor_id))));
    }

    #[tokio::test]
    async fn collects_errors_with_slot_paths() {
        let dir = directory();
        let mut doc = WeekDocument::default();
        doc.midweek_meeting.chairman = Some(Assignee::Reference(AssigneeRef::publisher(1)));
        doc.weekend_meeting.watchtower_study.conductor = Some(Assignee::Reference(AssigneeRef::publisher(99)));

        let errors = resolve_and_validate(&dir, &mut doc, None, Operation::Create).await.unwrap_err();
        let paths: Vec<String> = errors.iter().map(|e| e.slot().to_string()).collect();
        assert_eq!(paths, vec!["midweekMeeting.chairman", "weekendMeeting.watchtowerStudy.conductor"]);
    }

    #[tokio::test]
    async fn unchanged_slots_are_not_revalidated() {
        // publisher 1 lacks the chairman tag
        let dir = directory();
        let mut previous = WeekDocument::default();
        previous.midweek_meeting.chairman = Some(Assignee::Reference(AssigneeRef::publisher(1)));
        let mut doc = previous.clone();

        assert!(resolve_and_validate(&dir, &mut doc, Some(&previous), Operation::Update).await.is_ok());

        doc.weekend_meeting.chairman = Some(Assignee::Reference(AssigneeRef::publisher(1)));
        let errors = resolve_and_validate(&dir, &mut doc, Some(&previous), Operation::Update)
            .await
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].slot(), SlotPath::new(SlotRole::WeekendChairman));
    }

    #[tokio::test]
    async fn failed_materialization_preserves_input() {
        let dir = directory().failing_writes();
        let mut doc = WeekDocument::default();
        doc.midweek_meeting.opening_prayer = Some(Assignee::Name("Unknown Guest".to_string()));

        let errors = resolve_and_validate(&dir, &mut doc, None, Operation::Create).await.unwrap_err();
        assert!(matches!(errors[0], AssignmentError::DirectoryWriteFailed { .. }));
        assert_eq!(doc.midweek_meeting.opening_prayer, Some(Assignee::Name("Unknown Guest".to_string())));
    }
}
