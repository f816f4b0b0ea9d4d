//! Who may be assigned where.
//!
//! The units here run around every save of a week: free-text names are
//! materialized into references ([`visitors`]), references are checked against
//! the slot's required permission ([`validate`]), and editors are offered only
//! eligible candidates ([`candidates`]). All directory access goes through the
//! [`Directory`] trait.

pub mod candidates;
pub mod directory;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod roles;
pub mod validate;
pub mod visitors;

pub use candidates::{filter_candidates, load_all_candidates, load_candidates};
pub use directory::{Candidate, Directory, DirectoryError, PublisherFilter, PublisherRecord, VisitorRecord};
pub use error::AssignmentError;
pub use pipeline::resolve_and_validate;
pub use roles::{AssignmentPermission, SlotPath, SlotRole};
pub use validate::{Operation, validate_assignment};
pub use visitors::resolve_assignee;
