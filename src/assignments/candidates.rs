use super::directory::{Candidate, Directory, DirectoryError, PublisherFilter};
use super::roles::SlotRole;

/// Narrow an option list to the people eligible for `role`: publishers
/// holding the required permission, and every visitor. Input order is kept.
///
/// This only shapes what editors are offered; saving still runs
/// [`validate_assignment`](super::validate_assignment).
pub fn filter_candidates(role: SlotRole, candidates: Vec<Candidate>) -> Vec<Candidate> {
    let required = role.required_permission();
    candidates
        .into_iter()
        .filter(|c| match c {
            Candidate::Publisher(p) => p.assignment_permissions.contains(&required),
            Candidate::Visitor(_) => true,
        })
        .collect()
}

/// Eligible candidates for `role`, publishers first. The permission is passed
/// to the directory as a query filter.
pub async fn load_candidates<D: Directory>(directory: &D, role: SlotRole) -> Result<Vec<Candidate>, DirectoryError> {
    let filter = PublisherFilter::with_permission(role.required_permission());
    let publishers = directory.find_publishers(&filter).await?;
    let visitors = directory.find_visitors().await?;
    Ok(publishers
        .into_iter()
        .map(Candidate::Publisher)
        .chain(visitors.into_iter().map(Candidate::Visitor))
        .collect())
}

/// Every publisher and visitor, unfiltered. Feed to [`filter_candidates`] per slot.
pub async fn load_all_candidates<D: Directory>(directory: &D) -> Result<Vec<Candidate>, DirectoryError> {
    let publishers = directory.find_publishers(&PublisherFilter::default()).await?;
    let visitors = directory.find_visitors().await?;
    Ok(publishers
        .into_iter()
        .map(Candidate::Publisher)
        .chain(visitors.into_iter().map(Candidate::Visitor))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignments::directory::{PublisherRecord, VisitorRecord};
    use crate::assignments::memory::MemoryDirectory;
    use crate::assignments::roles::AssignmentPermission as P;

    fn publisher(id: i64, perms: &[P]) -> Candidate {
        Candidate::Publisher(PublisherRecord {
            id,
            display_name: format!("P{id}"),
            assignment_permissions: perms.iter().copied().collect(),
        })
    }

    fn visitor(id: i64) -> Candidate {
        Candidate::Visitor(VisitorRecord { id, name: format!("V{id}") })
    }

    #[test]
    fn keeps_tagged_publishers_and_all_visitors_in_order() {
        let input = vec![
            publisher(1, &[P::Talk]),
            visitor(2),
            publisher(3, &[P::Prayer]),
            publisher(4, &[P::Chairman, P::Talk]),
            visitor(5),
        ];
        let ids: Vec<i64> = filter_candidates(SlotRole::TalkAssignee, input)
            .iter()
            .map(|c| c.reference().value)
            .collect();
        assert_eq!(ids, vec![1, 2, 4, 5]);
    }

    #[tokio::test]
    async fn loaded_candidates_match_pure_filter() {
        let dir = MemoryDirectory::new()
            .with_publisher(1, "Anna Lind", &[P::BibleReading])
            .with_publisher(2, "Ben Kraus", &[P::Talk])
            .with_visitor(9, "Guest");

        let loaded = load_candidates(&dir, SlotRole::BibleReadingAssignee).await.unwrap();
        let all = load_all_candidates(&dir).await.unwrap();
        assert_eq!(loaded, filter_candidates(SlotRole::BibleReadingAssignee, all));
        assert_eq!(loaded.len(), 2);
    }
}
