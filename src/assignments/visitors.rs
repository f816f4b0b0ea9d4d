use crate::models::week::{Assignee, AssigneeRef};
use super::directory::{Directory, PublisherFilter};
use super::error::AssignmentError;
use super::roles::SlotPath;

/// Normalize a submitted slot value into a reference.
///
/// References pass through. A typed name resolves to the first publisher
/// whose display name matches exactly (case-sensitive, surrounding whitespace
/// ignored); otherwise a visitor with that name is created. A blank name
/// clears the slot.
///
/// Creation is not deduplicated beyond that single lookup: submitting the same
/// unknown name twice creates two visitors.
pub async fn resolve_assignee<D: Directory>(
    directory: &D,
    slot: SlotPath,
    input: Option<&Assignee>,
) -> Result<Option<AssigneeRef>, AssignmentError> {
    let raw = match input {
        None => return Ok(None),
        Some(Assignee::Reference(r)) => return Ok(Some(*r)),
        Some(Assignee::Name(raw)) => raw,
    };

    let name = raw.trim();
    if name.is_empty() {
        return Ok(None);
    }

    let matches = directory
        .find_publishers(&PublisherFilter::by_name(name))
        .await
        .map_err(|e| AssignmentError::DirectoryLookupFailed { slot, reason: e.to_string() })?;
    if let Some(publisher) = matches.first() {
        if matches.len() > 1 {
            log::debug!("{} publishers named '{name}', using id {}", matches.len(), publisher.id);
        }
        return Ok(Some(AssigneeRef::publisher(publisher.id)));
    }

    let visitor = directory.create_visitor(name).await.map_err(|e| {
        AssignmentError::DirectoryWriteFailed { slot, input: raw.clone(), reason: e.to_string() }
    })?;
    log::info!("Created visitor '{}' (id {}) for {slot}", visitor.name, visitor.id);
    Ok(Some(AssigneeRef::visitor(visitor.id)))
}
