use std::fmt;

use crate::models::week::{AssigneeRef, RelationTo};
use super::roles::{AssignmentPermission, SlotPath};

/// A field-attributed failure that aborts saving a week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    /// The publisher lacks the tag the slot requires.
    PermissionDenied { slot: SlotPath, required: AssignmentPermission, candidate: i64 },
    /// No publisher or visitor of the referenced kind has this id.
    ReferenceNotFound { slot: SlotPath, candidate: AssigneeRef },
    /// Creating a visitor for a typed-in name failed. `input` is the name as submitted.
    DirectoryWriteFailed { slot: SlotPath, input: String, reason: String },
    DirectoryLookupFailed { slot: SlotPath, reason: String },
}

impl AssignmentError {
    pub fn slot(&self) -> SlotPath {
        match self {
            AssignmentError::PermissionDenied { slot, .. }
            | AssignmentError::ReferenceNotFound { slot, .. }
            | AssignmentError::DirectoryWriteFailed { slot, .. }
            | AssignmentError::DirectoryLookupFailed { slot, .. } => *slot,
        }
    }
}

impl fmt::Display for AssignmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentError::PermissionDenied { required, candidate, .. } => write!(
                f,
                "Publisher {candidate} does not have the '{}' permission required for this assignment",
                required.label()
            ),
            AssignmentError::ReferenceNotFound { candidate, .. } => {
                let kind = match candidate.relation_to {
                    RelationTo::Users => "Publisher",
                    RelationTo::Visitors => "Visitor",
                };
                write!(f, "{kind} {} does not exist", candidate.value)
            }
            AssignmentError::DirectoryWriteFailed { input, reason, .. } => {
                write!(f, "Could not create visitor '{input}': {reason}")
            }
            AssignmentError::DirectoryLookupFailed { reason, .. } => {
                write!(f, "Directory lookup failed: {reason}")
            }
        }
    }
}

impl std::error::Error for AssignmentError {}
