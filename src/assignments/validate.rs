use crate::models::week::{AssigneeRef, RelationTo};
use super::directory::{Directory, DirectoryError};
use super::error::AssignmentError;
use super::roles::SlotPath;

/// Lifecycle context a value is checked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Read,
}

/// Confirm that `candidate` may fill `slot`.
///
/// Passes without a lookup for reads and for empty slots. A visitor must
/// exist as a visitor but holds no permissions. A publisher must exist and
/// hold the slot's required permission. A failed lookup is an error, never
/// a pass.
pub async fn validate_assignment<D: Directory>(
    directory: &D,
    slot: SlotPath,
    candidate: Option<&AssigneeRef>,
    operation: Operation,
) -> Result<(), AssignmentError> {
    if operation == Operation::Read {
        return Ok(());
    }
    let Some(candidate) = candidate else {
        return Ok(());
    };
    let lookup_failed = |e: DirectoryError| AssignmentError::DirectoryLookupFailed { slot, reason: e.to_string() };
    let not_found = AssignmentError::ReferenceNotFound { slot, candidate: *candidate };

    if candidate.relation_to == RelationTo::Visitors {
        return match directory.find_visitor(candidate.value).await.map_err(lookup_failed)? {
            Some(_) => Ok(()),
            None => Err(not_found),
        };
    }

    let required = slot.role.required_permission();
    let publisher = directory
        .find_publisher(candidate.value)
        .await
        .map_err(lookup_failed)?
        .ok_or(not_found)?;

    if publisher.assignment_permissions.contains(&required) {
        Ok(())
    } else {
        log::warn!(
            "Rejected publisher {} for {slot}: missing permission '{required}'",
            publisher.id
        );
        Err(AssignmentError::PermissionDenied { slot, required, candidate: candidate.value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignments::memory::MemoryDirectory;
    use crate::assignments::roles::{AssignmentPermission, SlotRole};

    fn chairman_slot() -> SlotPath {
        SlotPath::new(SlotRole::MidweekChairman)
    }

    #[tokio::test]
    async fn publisher_without_tag_is_rejected() {
        let dir = MemoryDirectory::new().with_publisher(1, "Jonas Berg", &[AssignmentPermission::Talk]);
        let err = validate_assignment(&dir, chairman_slot(), Some(&AssigneeRef::publisher(1)), Operation::Create)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AssignmentError::PermissionDenied {
                slot: chairman_slot(),
                required: AssignmentPermission::Chairman,
                candidate: 1,
            }
        );
    }

    #[tokio::test]
    async fn publisher_with_tag_is_accepted() {
        let dir = MemoryDirectory::new()
            .with_publisher(1, "Jonas Berg", &[AssignmentPermission::Talk, AssignmentPermission::Chairman]);
        let result =
            validate_assignment(&dir, chairman_slot(), Some(&AssigneeRef::publisher(1)), Operation::Update).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn empty_slots_and_reads_skip_lookup() {
        let dir = MemoryDirectory::new().failing_lookups();
        let slot = chairman_slot();
        assert!(validate_assignment(&dir, slot, None, Operation::Create).await.is_ok());
        assert!(validate_assignment(&dir, slot, Some(&AssigneeRef::publisher(1)), Operation::Read).await.is_ok());
        assert!(validate_assignment(&dir, slot, Some(&AssigneeRef::visitor(9)), Operation::Read).await.is_ok());
    }

    #[tokio::test]
    async fn existing_visitor_needs_no_permission() {
        let dir = MemoryDirectory::new().with_visitor(9, "Carl Gast");
        let result =
            validate_assignment(&dir, chairman_slot(), Some(&AssigneeRef::visitor(9)), Operation::Create).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn visitor_tag_on_a_publisher_id_is_not_found() {
        let dir = MemoryDirectory::new().with_publisher(1, "Jonas Berg", &[AssignmentPermission::Talk]);
        let slot = chairman_slot();

        let err = validate_assignment(&dir, slot, Some(&AssigneeRef::visitor(1)), Operation::Create)
            .await
            .unwrap_err();
        assert_eq!(err, AssignmentError::ReferenceNotFound { slot, candidate: AssigneeRef::visitor(1) });
        assert_eq!(err.to_string(), "Visitor 1 does not exist");

        let err = validate_assignment(&dir, slot, Some(&AssigneeRef::visitor(424242)), Operation::Update)
            .await
            .unwrap_err();
        assert_eq!(err, AssignmentError::ReferenceNotFound { slot, candidate: AssigneeRef::visitor(424242) });
    }

    #[tokio::test]
    async fn visitor_lookup_failure_surfaces() {
        let dir = MemoryDirectory::new().with_visitor(9, "Carl Gast").failing_lookups();
        let err = validate_assignment(&dir, chairman_slot(), Some(&AssigneeRef::visitor(9)), Operation::Create)
            .await
            .unwrap_err();
        assert!(matches!(err, AssignmentError::DirectoryLookupFailed { .. }));
    }

    #[tokio::test]
    async fn unknown_publisher_and_lookup_failure_surface() {
        let slot = SlotPath::new(SlotRole::WatchtowerConductor);
        let dir = MemoryDirectory::new();
        let err = validate_assignment(&dir, slot, Some(&AssigneeRef::publisher(77)), Operation::Create)
            .await
            .unwrap_err();
        assert_eq!(err, AssignmentError::ReferenceNotFound { slot, candidate: AssigneeRef::publisher(77) });
        assert_eq!(err.to_string(), "Publisher 77 does not exist");

        let dir = MemoryDirectory::new().failing_lookups();
        let err = validate_assignment(&dir, slot, Some(&AssigneeRef::publisher(77)), Operation::Create)
            .await
            .unwrap_err();
        assert!(matches!(err, AssignmentError::DirectoryLookupFailed { .. }));
    }
}
