use std::collections::BTreeSet;
use std::fmt;

use crate::models::week::AssigneeRef;
use super::roles::AssignmentPermission;

/// Failure talking to the directory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryError(pub String);

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for DirectoryError {}

impl From<sqlx::Error> for DirectoryError {
    fn from(e: sqlx::Error) -> Self {
        DirectoryError(e.to_string())
    }
}

/// Criteria passed to [`Directory::find_publishers`]. Every set field narrows the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublisherFilter {
    /// Exact, case-sensitive display name.
    pub name: Option<String>,
    pub permission: Option<AssignmentPermission>,
}

impl PublisherFilter {
    pub fn by_name(name: &str) -> Self {
        Self { name: Some(name.to_string()), permission: None }
    }

    pub fn with_permission(permission: AssignmentPermission) -> Self {
        Self { name: None, permission: Some(permission) }
    }

    pub fn matches(&self, publisher: &PublisherRecord) -> bool {
        self.name.as_ref().is_none_or(|n| *n == publisher.display_name)
            && self.permission.is_none_or(|p| publisher.assignment_permissions.contains(&p))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherRecord {
    pub id: i64,
    pub display_name: String,
    pub assignment_permissions: BTreeSet<AssignmentPermission>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorRecord {
    pub id: i64,
    pub name: String,
}

/// A person selectable for an assignment slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    Publisher(PublisherRecord),
    Visitor(VisitorRecord),
}

impl Candidate {
    pub fn reference(&self) -> AssigneeRef {
        match self {
            Candidate::Publisher(p) => AssigneeRef::publisher(p.id),
            Candidate::Visitor(v) => AssigneeRef::visitor(v.id),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Candidate::Publisher(p) => &p.display_name,
            Candidate::Visitor(v) => &v.name,
        }
    }
}

/// Lookup and create operations on the publisher and visitor collections.
#[allow(async_fn_in_trait)]
pub trait Directory {
    /// Publishers matching `filter`, ordered by display name then id.
    async fn find_publishers(&self, filter: &PublisherFilter) -> Result<Vec<PublisherRecord>, DirectoryError>;

    async fn find_publisher(&self, id: i64) -> Result<Option<PublisherRecord>, DirectoryError>;

    async fn find_visitors(&self) -> Result<Vec<VisitorRecord>, DirectoryError>;

    async fn find_visitor(&self, id: i64) -> Result<Option<VisitorRecord>, DirectoryError>;

    async fn create_visitor(&self, name: &str) -> Result<VisitorRecord, DirectoryError>;
}
